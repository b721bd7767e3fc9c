use std::sync::Arc;

use crate::{
    auth::require_pr_author,
    errors::{AppError, AppResult},
    models::domain::{thread::same_login, Decision, Submission},
    repositories::PullRequestRepository,
    services::{
        answer_parser::{is_answer_command, parse_answers},
        comment_templates::{
            render_grading_failure, render_malformed_submission, render_no_active_quiz,
            render_stale_submission,
        },
        decision_service::DecisionService,
        grading_service::GradingService,
        retry::{run_with_retry, RetryPolicy},
        thread_reconstructor::ThreadState,
    },
};

/// The comment event that triggered a validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingComment {
    pub id: u64,
    pub author: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotACommand,
    OwnComment,
    /// A newer quiz was posted after the submission.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Ignored(IgnoreReason),
    /// The submission was decided by an earlier run; nothing was redone.
    AlreadyDecided(Decision),
    Decided(Decision),
}

/// Handles one `!answer` comment from reconstruction through decision.
pub struct SubmissionService {
    repository: Arc<dyn PullRequestRepository>,
    grading: GradingService,
    decisions: DecisionService,
    bot_login: String,
    policy: RetryPolicy,
}

impl SubmissionService {
    pub fn new(
        repository: Arc<dyn PullRequestRepository>,
        grading: GradingService,
        decisions: DecisionService,
        bot_login: &str,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            repository,
            grading,
            decisions,
            bot_login: bot_login.to_string(),
            policy,
        }
    }

    async fn post_notice(&self, body: &str) {
        let once = self.policy.with_max_timeout_retries(0);
        let repository = self.repository.as_ref();
        if let Err(err) = run_with_retry(&once, "comment post", move || repository.post_comment(body)).await {
            log::warn!("Could not post notice: {}", err);
        }
    }

    /// Validates one comment against the quiz active in the thread.
    ///
    /// The thread is read once. A quiz posted after that read is invisible to
    /// this run, so a submission racing a new `issue` run is graded against the
    /// quiz that was active when the comments were listed.
    pub async fn handle_comment(&self, comment: &IncomingComment) -> AppResult<ValidationOutcome> {
        if !is_answer_command(&comment.body) {
            log::debug!("Comment {} is not a submission", comment.id);
            return Ok(ValidationOutcome::Ignored(IgnoreReason::NotACommand));
        }
        if same_login(&comment.author, &self.bot_login) {
            return Ok(ValidationOutcome::Ignored(IgnoreReason::OwnComment));
        }

        let repository = self.repository.as_ref();
        let pull_request = run_with_retry(&self.policy, "pull request lookup", move || {
            repository.pull_request()
        })
        .await?;
        require_pr_author(&comment.author, &pull_request)?;

        let comments = run_with_retry(&self.policy, "comment listing", move || {
            repository.list_comments()
        })
        .await?;
        let state = ThreadState::new(comments, &self.bot_login);

        if let Some(marker) = state.decision_for(comment.id) {
            log::info!(
                "Submission {} was already decided ({}), skipping",
                comment.id,
                marker.decision
            );
            return Ok(ValidationOutcome::AlreadyDecided(marker.decision));
        }

        let Some(active) = state.active_quiz() else {
            log::warn!("No active quiz for submission {}", comment.id);
            self.post_notice(&render_no_active_quiz()).await;
            return Err(AppError::NoActiveQuiz);
        };

        if let Some(position) = state.position_of(comment.id) {
            if position < active.position {
                log::info!(
                    "Submission {} predates quiz comment {}, not grading",
                    comment.id,
                    active.comment_id
                );
                self.post_notice(&render_stale_submission()).await;
                return Ok(ValidationOutcome::Ignored(IgnoreReason::Stale));
            }
        }

        let count = active.quiz.question_count();
        let answers = match parse_answers(&comment.body, count) {
            Ok(answers) => answers,
            Err(err) => {
                log::info!("Submission {} is malformed: {}", comment.id, err);
                self.post_notice(&render_malformed_submission(&err, count)).await;
                return Err(AppError::MalformedSubmission(err));
            }
        };
        let submission = Submission {
            comment_id: comment.id,
            author: comment.author.clone(),
            answers,
        };

        let grade = match self.grading.grade(&active.quiz, &submission).await {
            Ok(grade) => grade,
            Err(err) => {
                log::error!("Grading submission {} failed: {}", comment.id, err);
                self.post_notice(&render_grading_failure()).await;
                return Err(err);
            }
        };

        let decision = self
            .decisions
            .publish(&grade, active.quiz.round_id, comment.id)
            .await?;
        Ok(ValidationOutcome::Decided(decision))
    }
}
