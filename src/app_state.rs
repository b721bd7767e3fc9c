use std::sync::Arc;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    repositories::{GitHubPullRequestRepository, PullRequestRepository},
    services::{
        DecisionService, GradingService, ModelService, OpenAiModelService, QuizService,
        QuizSettings, SubmissionService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: Arc<QuizService>,
    pub submission_service: Arc<SubmissionService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let (owner, repo) = config.repository_parts().ok_or_else(|| {
            AppError::ConfigError(format!(
                "Invalid GITHUB_REPOSITORY '{}'",
                config.github_repository
            ))
        })?;
        let repository: Arc<dyn PullRequestRepository> = Arc::new(GitHubPullRequestRepository::new(
            &config.github_token,
            owner,
            repo,
            config.pr_number,
        )?);
        let model: Arc<dyn ModelService> = Arc::new(OpenAiModelService::new(
            &config.openai_api_key,
            &config.openai_api_base,
            &config.openai_model,
        ));

        Ok(Self::with_dependencies(config, repository, model))
    }

    /// Wires the services around already-built upstream clients.
    pub fn with_dependencies(
        config: Config,
        repository: Arc<dyn PullRequestRepository>,
        model: Arc<dyn ModelService>,
    ) -> Self {
        let quiz_service = Arc::new(QuizService::new(
            repository.clone(),
            model.clone(),
            QuizSettings::from_config(&config),
        ));
        let submission_service = Arc::new(SubmissionService::new(
            repository.clone(),
            GradingService::from_config(model, &config),
            DecisionService::new(repository, config.github_retry_policy()),
            &config.bot_login,
            config.github_retry_policy(),
        ));

        Self {
            quiz_service,
            submission_service,
            config: Arc::new(config),
        }
    }
}
