use thiserror::Error;

use crate::models::domain::submission::SubmissionError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Not authorized: {0}")]
    AuthorizationDenied(String),

    #[error("Malformed model output: {0}")]
    MalformedLlmOutput(String),

    #[error("No active quiz on this pull request")]
    NoActiveQuiz,

    #[error("Malformed submission: {0}")]
    MalformedSubmission(SubmissionError),

    #[error("Timed out waiting for {0}")]
    UpstreamTimeout(String),

    #[error("Approval call failed: {0}")]
    ApprovalCallFailed(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::AuthorizationDenied(_) => "AUTHORIZATION_DENIED",
            AppError::MalformedLlmOutput(_) => "MALFORMED_LLM_OUTPUT",
            AppError::NoActiveQuiz => "NO_ACTIVE_QUIZ",
            AppError::MalformedSubmission(_) => "MALFORMED_SUBMISSION",
            AppError::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            AppError::ApprovalCallFailed(_) => "APPROVAL_CALL_FAILED",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    /// Whether running the same operation again could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::UpstreamTimeout(_) | AppError::MalformedLlmOutput(_) | AppError::Upstream(_)
        )
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        AppError::MalformedSubmission(err)
    }
}
impl From<octocrab::Error> for AppError {
    fn from(err: octocrab::Error) -> Self {
        AppError::Upstream(format!("GitHub API error: {}", err))
    }
}
impl From<async_openai::error::OpenAIError> for AppError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        AppError::Upstream(format!("Model API error: {}", err))
    }
}
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedLlmOutput(format!("JSON error: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
