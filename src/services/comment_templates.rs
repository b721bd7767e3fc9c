use crate::constants::markers::ANSWER_COMMAND;
use crate::models::domain::{Decision, GradeResult, Quiz, SubmissionError};
use crate::services::answer_key_codec::{self, DecisionMarker};

/// Keeps model or user text from opening or closing an HTML comment.
pub fn escape_visible(text: &str) -> String {
    text.replace("<!--", "&lt;!--").replace("-->", "--&gt;")
}

fn answer_template(count: usize) -> String {
    let items: Vec<String> = (1..=count)
        .map(|i| format!("{}. <your answer to question {}>", i, i))
        .collect();
    format!("```\n{}\n{}\n```", ANSWER_COMMAND, items.join("\n"))
}

pub fn render_quiz_comment(quiz: &Quiz) -> String {
    let count = quiz.question_count();
    let mut body = String::from(
        "## 🔐 Passmatic: Comprehension Check Required\n\n\
         **The only change that merges is an understood one.**\n\n\
         Before this PR can be approved, the author must answer the following \
         questions about the changes.\n\n---\n",
    );

    for question in quiz.questions().iter() {
        body.push_str(&format!(
            "\n### Question {}\n\n{}\n",
            question.index,
            escape_visible(&question.prompt)
        ));
    }

    body.push_str(&format!(
        "\n---\n\n### How to respond\n\nReply with a new comment in this format, one numbered \
         answer per question:\n\n{}\n\nIf a newer quiz is posted, answer that one instead.\n\n",
        answer_template(count)
    ));
    body.push_str(&answer_key_codec::encode(quiz));
    body
}

pub fn render_generation_failure() -> String {
    "## ⚠️ Passmatic: Could Not Generate Questions\n\n\
     The comprehension check could not be created this time. Please re-run the \
     workflow to try again."
        .to_string()
}

pub fn render_no_active_quiz() -> String {
    format!(
        "## ⚠️ Passmatic: No Active Quiz\n\n\
         There is no comprehension quiz on this pull request yet, so this `{}` \
         comment was not graded. A quiz is posted when the pull request is opened \
         or updated.",
        ANSWER_COMMAND
    )
}

pub fn render_stale_submission() -> String {
    format!(
        "## ⚠️ Passmatic: Quiz Was Replaced\n\n\
         A newer quiz was posted after this `{}` comment, so it was not graded. \
         Please answer the latest quiz.",
        ANSWER_COMMAND
    )
}

pub fn render_malformed_submission(err: &SubmissionError, count: usize) -> String {
    format!(
        "## ❌ Passmatic: Could Not Read Your Answers\n\n\
         **Problem:** {}.\n\n\
         Please post a new comment that answers every question exactly once:\n\n{}",
        err,
        answer_template(count)
    )
}

pub fn render_grading_failure() -> String {
    "## ⚠️ Passmatic: Could Not Grade Answers\n\n\
     Your answers could not be graded this time. This is not a problem with your \
     answers; please post them again to retry."
        .to_string()
}

pub fn render_decision(grade: &GradeResult, marker: &DecisionMarker) -> String {
    let mut body = match marker.decision {
        Decision::Approved => String::from(
            "## ✅ Passmatic: Comprehension Check Passed\n\n\
             **The change is understood.** All answers were accepted and this PR \
             has been approved.\n",
        ),
        Decision::NeedsRevision => {
            let mut body = format!(
                "## ❌ Passmatic: Comprehension Check Not Passed\n\n\
                 {} of {} answers were accepted. The following still need work:\n",
                grade.passed_count(),
                grade.grades.len()
            );
            for failed in grade.failed() {
                body.push_str(&format!(
                    "\n**Question {}:** {}\n",
                    failed.index,
                    escape_visible(&failed.feedback)
                ));
            }
            body.push_str(&format!(
                "\nPlease post a new `{}` comment with all answers; the questions \
                 have not changed.\n",
                ANSWER_COMMAND
            ));
            body
        }
    };
    body.push('\n');
    body.push_str(&answer_key_codec::encode_decision(marker));
    body
}

pub fn render_approval_failed() -> String {
    "## ⚠️ Passmatic: Answers Accepted, Approval Failed\n\n\
     All answers were accepted, but the approval could not be submitted. You did \
     nothing wrong; a maintainer can approve manually or re-run the check."
        .to_string()
}
