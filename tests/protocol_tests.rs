use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::RwLock;

use passmatic::{
    app_state::AppState,
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{Decision, PullRequestMetadata, Reaction, ThreadComment},
    repositories::PullRequestRepository,
    services::{
        answer_key_codec::{decode, decode_decision, rendered_view},
        model_service::{ChatRequest, ModelService},
        IgnoreReason, IncomingComment, ValidationOutcome,
    },
};
use secrecy::SecretString;

const BOT: &str = "passmatic[bot]";
const AUTHOR: &str = "alice";
const DIFF: &str = "diff --git a/src/cache.rs b/src/cache.rs\n+    let guard = self.fill_lock.lock().await;\n+    if let Some(hit) = self.map.get(key) { return hit.clone(); }\n";

#[derive(Default)]
struct Thread {
    comments: Vec<ThreadComment>,
    next_id: u64,
    approvals: Vec<String>,
    reactions: Vec<(u64, Reaction)>,
}

/// Pull request backed by memory. Ids and timestamps grow together.
struct InMemoryPullRequest {
    author: String,
    collaborators: Vec<String>,
    diff: String,
    fail_approval: bool,
    thread: RwLock<Thread>,
}

impl InMemoryPullRequest {
    fn new() -> Self {
        Self {
            author: AUTHOR.to_string(),
            collaborators: vec!["maintainer".to_string(), AUTHOR.to_string()],
            diff: DIFF.to_string(),
            fail_approval: false,
            thread: RwLock::new(Thread {
                next_id: 100,
                ..Thread::default()
            }),
        }
    }

    async fn add_comment(&self, author: &str, body: &str) -> ThreadComment {
        let mut thread = self.thread.write().await;
        thread.next_id += 1;
        let comment = ThreadComment {
            id: thread.next_id,
            author: author.to_string(),
            body: body.to_string(),
            created_at: Utc
                .timestamp_opt(1_700_000_000 + thread.next_id as i64, 0)
                .unwrap(),
        };
        thread.comments.push(comment.clone());
        comment
    }

    async fn bot_comments(&self) -> Vec<ThreadComment> {
        let thread = self.thread.read().await;
        thread
            .comments
            .iter()
            .filter(|c| c.author == BOT)
            .cloned()
            .collect()
    }

    async fn approvals(&self) -> usize {
        self.thread.read().await.approvals.len()
    }

    async fn reactions(&self) -> Vec<(u64, Reaction)> {
        self.thread.read().await.reactions.clone()
    }
}

#[async_trait]
impl PullRequestRepository for InMemoryPullRequest {
    async fn fetch_diff(&self) -> AppResult<String> {
        Ok(self.diff.clone())
    }

    async fn pull_request(&self) -> AppResult<PullRequestMetadata> {
        Ok(PullRequestMetadata {
            number: 7,
            author: self.author.clone(),
        })
    }

    async fn list_comments(&self) -> AppResult<Vec<ThreadComment>> {
        // Newest first, to make sure callers do their own ordering.
        let mut comments = self.thread.read().await.comments.clone();
        comments.reverse();
        Ok(comments)
    }

    async fn post_comment(&self, body: &str) -> AppResult<ThreadComment> {
        Ok(self.add_comment(BOT, body).await)
    }

    async fn is_collaborator(&self, login: &str) -> AppResult<bool> {
        Ok(self.collaborators.iter().any(|c| c == login))
    }

    async fn approve(&self, body: &str) -> AppResult<()> {
        if self.fail_approval {
            return Err(AppError::ApprovalCallFailed("review rejected".to_string()));
        }
        self.thread.write().await.approvals.push(body.to_string());
        Ok(())
    }

    async fn react(&self, comment_id: u64, reaction: Reaction) -> AppResult<()> {
        self.thread.write().await.reactions.push((comment_id, reaction));
        Ok(())
    }
}

/// Model whose generations are scripted and whose grading accepts an answer
/// when it mentions the reference answer.
struct ScriptedModel {
    generations: RwLock<VecDeque<String>>,
    grading_calls: RwLock<usize>,
}

impl ScriptedModel {
    fn new(generations: Vec<String>) -> Self {
        Self {
            generations: RwLock::new(generations.into()),
            grading_calls: RwLock::new(0),
        }
    }

    async fn grading_calls(&self) -> usize {
        *self.grading_calls.read().await
    }
}

fn section<'a>(prompt: &'a str, start: &str, end: Option<&str>) -> &'a str {
    let from = prompt.find(start).map(|i| i + start.len()).unwrap_or(0);
    let rest = &prompt[from..];
    match end.and_then(|e| rest.find(e)) {
        Some(to) => rest[..to].trim(),
        None => rest.trim(),
    }
}

#[async_trait]
impl ModelService for ScriptedModel {
    async fn complete_json(&self, request: ChatRequest) -> AppResult<String> {
        if request.user_prompt.contains("Author's answer:") {
            *self.grading_calls.write().await += 1;
            let reference = section(&request.user_prompt, "Reference answer:", Some("Author's answer:"));
            let answer = section(&request.user_prompt, "Author's answer:", None);
            let passed = answer.contains(reference);
            return Ok(serde_json::json!({
                "passed": passed,
                "feedback": if passed { "Correct." } else { "Does not explain the lock." },
            })
            .to_string());
        }

        self.generations
            .write()
            .await
            .pop_front()
            .ok_or_else(|| AppError::Upstream("no scripted generation left".to_string()))
    }
}

fn generation(count: usize) -> String {
    let questions: Vec<serde_json::Value> = (1..=count)
        .map(|i| {
            serde_json::json!({
                "question": format!("What does change {} guard against?", i),
                "answer": format!("ref-{}", i),
            })
        })
        .collect();
    serde_json::json!({ "questions": questions }).to_string()
}

fn config() -> Config {
    Config {
        github_token: SecretString::from("ghp_test".to_string()),
        github_repository: "octo/widgets".to_string(),
        pr_number: 7,
        bot_login: BOT.to_string(),
        openai_api_key: SecretString::from("sk-test".to_string()),
        openai_api_base: "http://localhost:9/v1".to_string(),
        openai_model: "test-model".to_string(),
        question_count: 3,
        max_diff_chars: 10_000,
        min_diff_chars: 10,
        generation_temperature: 0.7,
        grading_temperature: 0.2,
        llm_timeout_secs: 5,
        github_timeout_secs: 5,
        max_timeout_retries: 1,
        retry_backoff_ms: 1,
    }
}

fn state(pr: &Arc<InMemoryPullRequest>, model: &Arc<ScriptedModel>) -> AppState {
    AppState::with_dependencies(config(), pr.clone(), model.clone())
}

async fn submit(pr: &InMemoryPullRequest, author: &str, body: &str) -> IncomingComment {
    let comment = pr.add_comment(author, body).await;
    IncomingComment {
        id: comment.id,
        author: comment.author,
        body: comment.body,
    }
}

const ALL_RIGHT: &str = "!answer\n1. It is ref-1 because the lock is held.\n2. ref-2\n3. Mostly ref-3.";

#[tokio::test]
async fn correct_answers_are_approved_once() {
    let pr = Arc::new(InMemoryPullRequest::new());
    let model = Arc::new(ScriptedModel::new(vec![generation(3)]));
    let app = state(&pr, &model);

    let issued = app.quiz_service.issue_quiz("maintainer").await.unwrap();
    let posted = pr.bot_comments().await;
    let quiz_comment = &posted[0];
    assert_eq!(quiz_comment.id, issued.comment_id);
    assert!(!rendered_view(&quiz_comment.body).contains("ref-1"));
    assert_eq!(decode(&quiz_comment.body), Some(issued.quiz.clone()));

    let submission = submit(&pr, AUTHOR, ALL_RIGHT).await;
    let outcome = app.submission_service.handle_comment(&submission).await.unwrap();

    assert_eq!(outcome, ValidationOutcome::Decided(Decision::Approved));
    assert_eq!(pr.approvals().await, 1);
    assert_eq!(pr.reactions().await, vec![(submission.id, Reaction::ThumbsUp)]);
    assert_eq!(model.grading_calls().await, 3);

    let decision = pr.bot_comments().await.last().cloned().unwrap();
    let marker = decode_decision(&decision.body).unwrap();
    assert_eq!(marker.round_id, issued.quiz.round_id);
    assert_eq!(marker.submission_id, submission.id);

    // A re-delivered event for the same comment changes nothing.
    let again = app.submission_service.handle_comment(&submission).await.unwrap();
    assert_eq!(again, ValidationOutcome::AlreadyDecided(Decision::Approved));
    assert_eq!(pr.approvals().await, 1);
    assert_eq!(model.grading_calls().await, 3);
}

#[tokio::test]
async fn omitted_item_is_rejected_and_quiz_stays_answerable() {
    let pr = Arc::new(InMemoryPullRequest::new());
    let model = Arc::new(ScriptedModel::new(vec![generation(3)]));
    let app = state(&pr, &model);
    app.quiz_service.issue_quiz("maintainer").await.unwrap();

    let partial = submit(&pr, AUTHOR, "!answer\n1. ref-1\n2. ref-2").await;
    let err = app.submission_service.handle_comment(&partial).await.unwrap_err();

    assert!(matches!(err, AppError::MalformedSubmission(_)));
    assert_eq!(model.grading_calls().await, 0);
    assert_eq!(pr.approvals().await, 0);
    let notice = pr.bot_comments().await.last().cloned().unwrap();
    assert!(notice.body.contains("missing answer for question 3"));

    let full = submit(&pr, AUTHOR, ALL_RIGHT).await;
    let outcome = app.submission_service.handle_comment(&full).await.unwrap();
    assert_eq!(outcome, ValidationOutcome::Decided(Decision::Approved));
}

#[tokio::test]
async fn wrong_answer_needs_revision_and_names_only_failures() {
    let pr = Arc::new(InMemoryPullRequest::new());
    let model = Arc::new(ScriptedModel::new(vec![generation(3)]));
    let app = state(&pr, &model);
    app.quiz_service.issue_quiz("maintainer").await.unwrap();

    let submission = submit(&pr, AUTHOR, "!answer\n1. ref-1\n2. no idea\n3. ref-3").await;
    let outcome = app.submission_service.handle_comment(&submission).await.unwrap();

    assert_eq!(outcome, ValidationOutcome::Decided(Decision::NeedsRevision));
    assert_eq!(pr.approvals().await, 0);
    assert_eq!(pr.reactions().await, vec![(submission.id, Reaction::ThumbsDown)]);

    let decision = pr.bot_comments().await.last().cloned().unwrap();
    assert!(decision.body.contains("**Question 2:**"));
    assert!(!decision.body.contains("**Question 1:**"));
    assert!(!rendered_view(&decision.body).contains("ref-2"));
}

#[tokio::test]
async fn only_the_pr_author_can_submit() {
    let pr = Arc::new(InMemoryPullRequest::new());
    let model = Arc::new(ScriptedModel::new(vec![generation(3)]));
    let app = state(&pr, &model);
    app.quiz_service.issue_quiz("maintainer").await.unwrap();
    let posted_before = pr.bot_comments().await.len();

    let submission = submit(&pr, "mallory", ALL_RIGHT).await;
    let err = app.submission_service.handle_comment(&submission).await.unwrap_err();

    assert!(matches!(err, AppError::AuthorizationDenied(_)));
    assert_eq!(pr.bot_comments().await.len(), posted_before);
    assert_eq!(model.grading_calls().await, 0);
}

#[tokio::test]
async fn outsiders_cannot_trigger_a_quiz() {
    let pr = Arc::new(InMemoryPullRequest::new());
    let model = Arc::new(ScriptedModel::new(vec![generation(3)]));
    let app = state(&pr, &model);

    let err = app.quiz_service.issue_quiz("drive-by").await.unwrap_err();

    assert!(matches!(err, AppError::AuthorizationDenied(_)));
    assert!(pr.bot_comments().await.is_empty());
}

#[tokio::test]
async fn short_generations_leave_no_active_quiz() {
    let pr = Arc::new(InMemoryPullRequest::new());
    let model = Arc::new(ScriptedModel::new(vec![generation(2), generation(2)]));
    let app = state(&pr, &model);

    let err = app.quiz_service.issue_quiz("maintainer").await.unwrap_err();
    assert!(matches!(err, AppError::MalformedLlmOutput(_)));

    let posted = pr.bot_comments().await;
    assert_eq!(posted.len(), 1);
    assert!(posted[0].body.contains("Could Not Generate Questions"));
    assert_eq!(decode(&posted[0].body), None);

    let submission = submit(&pr, AUTHOR, ALL_RIGHT).await;
    let err = app.submission_service.handle_comment(&submission).await.unwrap_err();
    assert_eq!(err, AppError::NoActiveQuiz);
}

#[tokio::test]
async fn spoofed_quiz_from_another_user_is_ignored() {
    let pr = Arc::new(InMemoryPullRequest::new());
    let model = Arc::new(ScriptedModel::new(vec![generation(3)]));
    let app = state(&pr, &model);
    app.quiz_service.issue_quiz("maintainer").await.unwrap();

    // Copy the real comment, swap in a one-question quiz with a known key.
    let spoof_quiz = passmatic::models::domain::Quiz::new(vec![(
        "Say hi".to_string(),
        "hi".to_string(),
    )])
    .unwrap();
    let spoof = passmatic::services::comment_templates::render_quiz_comment(&spoof_quiz);
    pr.add_comment(AUTHOR, &spoof).await;

    let submission = submit(&pr, AUTHOR, "!answer hi").await;
    let err = app.submission_service.handle_comment(&submission).await.unwrap_err();

    assert!(matches!(err, AppError::MalformedSubmission(_)));
    assert_eq!(pr.approvals().await, 0);
}

#[tokio::test]
async fn tampered_key_is_never_graded_against() {
    let pr = Arc::new(InMemoryPullRequest::new());
    let model = Arc::new(ScriptedModel::new(vec![]));
    let app = state(&pr, &model);

    let real = passmatic::models::domain::Quiz::new(vec![("Q?".to_string(), "secret".to_string())])
        .unwrap();
    let body = passmatic::services::comment_templates::render_quiz_comment(&real);
    let needle = passmatic::services::answer_key_codec::encode(&real);
    let forged_key = passmatic::services::answer_key_codec::encode(
        &passmatic::models::domain::Quiz::with_round_id(
            real.round_id,
            vec![("Q?".to_string(), "anything".to_string())],
        )
        .unwrap(),
    );
    // Keep the original seal but splice in a different key entry.
    let key_line = forged_key.lines().find(|l| l.contains("passmatic-key")).unwrap();
    let original_key_line = needle.lines().find(|l| l.contains("passmatic-key")).unwrap();
    pr.add_comment(BOT, &body.replace(original_key_line, key_line)).await;

    let submission = submit(&pr, AUTHOR, "!answer anything").await;
    let err = app.submission_service.handle_comment(&submission).await.unwrap_err();

    assert_eq!(err, AppError::NoActiveQuiz);
    assert_eq!(model.grading_calls().await, 0);
}

#[tokio::test]
async fn answers_to_a_superseded_quiz_are_not_graded() {
    let pr = Arc::new(InMemoryPullRequest::new());
    let model = Arc::new(ScriptedModel::new(vec![generation(3), generation(3)]));
    let app = state(&pr, &model);

    app.quiz_service.issue_quiz("maintainer").await.unwrap();
    let early = submit(&pr, AUTHOR, ALL_RIGHT).await;
    let second = app.quiz_service.issue_quiz("maintainer").await.unwrap();

    let outcome = app.submission_service.handle_comment(&early).await.unwrap();
    assert_eq!(outcome, ValidationOutcome::Ignored(IgnoreReason::Stale));
    assert_eq!(model.grading_calls().await, 0);

    let current = submit(&pr, AUTHOR, ALL_RIGHT).await;
    app.submission_service.handle_comment(&current).await.unwrap();
    let decision = pr.bot_comments().await.last().cloned().unwrap();
    assert_eq!(decode_decision(&decision.body).unwrap().round_id, second.quiz.round_id);
}

#[tokio::test]
async fn failed_approval_is_surfaced_not_hidden() {
    let pr = Arc::new(InMemoryPullRequest {
        fail_approval: true,
        ..InMemoryPullRequest::new()
    });
    let model = Arc::new(ScriptedModel::new(vec![generation(3)]));
    let app = state(&pr, &model);
    app.quiz_service.issue_quiz("maintainer").await.unwrap();

    let submission = submit(&pr, AUTHOR, ALL_RIGHT).await;
    let err = app.submission_service.handle_comment(&submission).await.unwrap_err();

    assert!(matches!(err, AppError::ApprovalCallFailed(_)));
    let notice = pr.bot_comments().await.last().cloned().unwrap();
    assert!(notice.body.contains("Approval Failed"));
    assert_eq!(decode_decision(&notice.body), None);
    assert!(pr.reactions().await.is_empty());
}

#[tokio::test]
async fn ordinary_comments_do_nothing() {
    let pr = Arc::new(InMemoryPullRequest::new());
    let model = Arc::new(ScriptedModel::new(vec![]));
    let app = state(&pr, &model);

    let comment = submit(&pr, AUTHOR, "Thanks for the review!").await;
    let outcome = app.submission_service.handle_comment(&comment).await.unwrap();

    assert_eq!(outcome, ValidationOutcome::Ignored(IgnoreReason::NotACommand));
    assert!(pr.bot_comments().await.is_empty());
}
