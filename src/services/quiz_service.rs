use std::sync::Arc;

use crate::{
    auth::require_collaborator,
    config::Config,
    constants::{
        markers::DIFF_TRUNCATION_MARKER,
        prompts::{QUESTION_GENERATION_SYSTEM_PROMPT, QUESTION_GENERATION_USER_PROMPT},
    },
    errors::{AppError, AppResult},
    models::{
        domain::{Quiz, ThreadComment},
        dto::quiz_dto::{parse_model_json, schema_json, GeneratedQuizDto},
    },
    repositories::PullRequestRepository,
    services::{
        answer_key_codec,
        comment_templates::{render_generation_failure, render_quiz_comment},
        model_service::{ChatRequest, ModelService},
        retry::{run_with_retry, RetryPolicy},
    },
};

#[derive(Debug, Clone)]
pub struct QuizSettings {
    pub question_count: usize,
    pub min_diff_chars: usize,
    pub max_diff_chars: usize,
    pub temperature: f32,
    pub model_policy: RetryPolicy,
    pub github_policy: RetryPolicy,
}

impl QuizSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            question_count: config.question_count,
            min_diff_chars: config.min_diff_chars,
            max_diff_chars: config.max_diff_chars,
            temperature: config.generation_temperature,
            model_policy: config.model_retry_policy(),
            github_policy: config.github_retry_policy(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedQuiz {
    pub comment_id: u64,
    pub quiz: Quiz,
}

/// Issues comprehension quizzes for the pull request's current diff.
pub struct QuizService {
    repository: Arc<dyn PullRequestRepository>,
    model: Arc<dyn ModelService>,
    settings: QuizSettings,
}

impl QuizService {
    pub fn new(
        repository: Arc<dyn PullRequestRepository>,
        model: Arc<dyn ModelService>,
        settings: QuizSettings,
    ) -> Self {
        Self {
            repository,
            model,
            settings,
        }
    }

    /// Generates a quiz from the diff and appends it to the thread.
    ///
    /// Each call posts a new quiz comment; earlier ones are never edited and
    /// are superseded by position.
    pub async fn issue_quiz(&self, actor: &str) -> AppResult<IssuedQuiz> {
        require_collaborator(self.repository.as_ref(), &self.settings.github_policy, actor).await?;
        log::info!("Issuing a {}-question quiz for {}", self.settings.question_count, actor);

        let (quiz, body) = match self.prepare_quiz().await {
            Ok(prepared) => prepared,
            Err(err) => {
                log::error!("Quiz generation failed: {}", err);
                if let Err(post_err) = self.post_once(&render_generation_failure()).await {
                    log::warn!("Could not post generation failure notice: {}", post_err);
                }
                return Err(err);
            }
        };

        let comment = self.post_once(&body).await?;
        log::info!(
            "Published quiz round {} in comment {}",
            quiz.round_id,
            comment.id
        );

        Ok(IssuedQuiz {
            comment_id: comment.id,
            quiz,
        })
    }

    async fn post_once(&self, body: &str) -> AppResult<ThreadComment> {
        let once = self.settings.github_policy.with_max_timeout_retries(0);
        let repository = self.repository.as_ref();
        run_with_retry(&once, "comment post", move || repository.post_comment(body)).await
    }

    async fn prepare_quiz(&self) -> AppResult<(Quiz, String)> {
        let repository = self.repository.as_ref();
        let raw_diff = run_with_retry(&self.settings.github_policy, "diff fetch", move || {
            repository.fetch_diff()
        })
        .await?;
        let diff = prepare_diff(
            &raw_diff,
            self.settings.min_diff_chars,
            self.settings.max_diff_chars,
        )?;

        let request = &self.generation_request(&diff);
        let model = self.model.as_ref();
        let count = self.settings.question_count;

        run_with_retry(&self.settings.model_policy, "question generation", move || async move {
            let raw = model.complete_json(request.clone()).await?;
            let quiz = parse_model_json::<GeneratedQuizDto>(&raw)?.into_quiz(count)?;
            let body = render_quiz_comment(&quiz);
            if answer_key_codec::decode(&body).as_ref() != Some(&quiz) {
                return Err(AppError::MalformedLlmOutput(
                    "generated quiz does not survive encoding".to_string(),
                ));
            }
            Ok((quiz, body))
        })
        .await
    }

    fn generation_request(&self, diff: &str) -> ChatRequest {
        let count = self.settings.question_count.to_string();
        ChatRequest {
            system_prompt: QUESTION_GENERATION_SYSTEM_PROMPT
                .replace("{count}", &count)
                .replace("{schema}", &schema_json::<GeneratedQuizDto>()),
            user_prompt: QUESTION_GENERATION_USER_PROMPT
                .replace("{count}", &count)
                .replace("{diff}", diff),
            temperature: self.settings.temperature,
        }
    }
}

/// Rejects empty diffs and caps oversized ones at `max_chars` characters,
/// appending an explicit truncation marker.
pub fn prepare_diff(diff: &str, min_chars: usize, max_chars: usize) -> AppResult<String> {
    if diff.trim().chars().count() < min_chars {
        return Err(AppError::ValidationError(
            "Pull request diff is empty or too small to quiz on".to_string(),
        ));
    }

    match diff.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            log::warn!(
                "Diff truncated from {} to {} bytes",
                diff.len(),
                cut
            );
            Ok(format!("{}\n{}", &diff[..cut], DIFF_TRUNCATION_MARKER))
        }
        None => Ok(diff.to_string()),
    }
}
