use std::env;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::errors::{AppError, AppResult};
use crate::services::retry::RetryPolicy;

#[derive(Clone, Debug)]
pub struct Config {
    pub github_token: SecretString,
    pub github_repository: String,
    pub pr_number: u64,
    pub bot_login: String,
    pub openai_api_key: SecretString,
    pub openai_api_base: String,
    pub openai_model: String,
    pub question_count: usize,
    pub max_diff_chars: usize,
    pub min_diff_chars: usize,
    pub generation_temperature: f32,
    pub grading_temperature: f32,
    pub llm_timeout_secs: u64,
    pub github_timeout_secs: u64,
    pub max_timeout_retries: u32,
    pub retry_backoff_ms: u64,
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            github_token: SecretString::from(env::var("GITHUB_TOKEN").unwrap_or_default()),
            github_repository: env::var("GITHUB_REPOSITORY").unwrap_or_default(),
            pr_number: parsed_or("PR_NUMBER", 0),
            bot_login: env::var("PASSMATIC_BOT_LOGIN")
                .unwrap_or_else(|_| "github-actions[bot]".to_string()),
            openai_api_key: SecretString::from(env::var("OPENAI_API_KEY").unwrap_or_default()),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            question_count: parsed_or("QUESTION_COUNT", 3),
            max_diff_chars: parsed_or("MAX_DIFF_CHARS", 60_000),
            min_diff_chars: parsed_or("MIN_DIFF_CHARS", 50),
            generation_temperature: parsed_or("GENERATION_TEMPERATURE", 0.7),
            grading_temperature: parsed_or("GRADING_TEMPERATURE", 0.2),
            llm_timeout_secs: parsed_or("LLM_TIMEOUT_SECS", 60),
            github_timeout_secs: parsed_or("GITHUB_TIMEOUT_SECS", 30),
            max_timeout_retries: parsed_or("MAX_TIMEOUT_RETRIES", 2),
            retry_backoff_ms: parsed_or("RETRY_BACKOFF_MS", 1_000),
        }
    }

    /// Check that everything needed to talk to GitHub and the model is present.
    pub fn validate(&self) -> AppResult<()> {
        if self.github_token.expose_secret().is_empty() {
            return Err(AppError::ConfigError("GITHUB_TOKEN is not set".to_string()));
        }
        if self.openai_api_key.expose_secret().is_empty() {
            return Err(AppError::ConfigError("OPENAI_API_KEY is not set".to_string()));
        }
        if self.repository_parts().is_none() {
            return Err(AppError::ConfigError(format!(
                "GITHUB_REPOSITORY must look like owner/repo, got '{}'",
                self.github_repository
            )));
        }
        if self.pr_number == 0 {
            return Err(AppError::ConfigError("PR_NUMBER is not set".to_string()));
        }
        if self.question_count == 0 {
            return Err(AppError::ConfigError(
                "QUESTION_COUNT must be at least 1".to_string(),
            ));
        }
        if self.bot_login.trim().is_empty() {
            return Err(AppError::ConfigError(
                "PASSMATIC_BOT_LOGIN must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Splits `owner/repo`.
    pub fn repository_parts(&self) -> Option<(&str, &str)> {
        let (owner, repo) = self.github_repository.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some((owner, repo))
    }

    pub fn model_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_secs(self.llm_timeout_secs))
            .with_max_timeout_retries(self.max_timeout_retries)
            .with_max_malformed_retries(1)
            .with_backoff(Duration::from_millis(self.retry_backoff_ms))
    }

    pub fn github_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_secs(self.github_timeout_secs))
            .with_max_timeout_retries(self.max_timeout_retries)
            .with_max_malformed_retries(0)
            .with_backoff(Duration::from_millis(self.retry_backoff_ms))
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            github_token: SecretString::from("ghp_test".to_string()),
            github_repository: "octo/widgets".to_string(),
            pr_number: 7,
            bot_login: "passmatic[bot]".to_string(),
            openai_api_key: SecretString::from("sk-test".to_string()),
            openai_api_base: "http://localhost:9999/v1".to_string(),
            openai_model: "test-model".to_string(),
            question_count: 3,
            max_diff_chars: 1_000,
            min_diff_chars: 10,
            generation_temperature: 0.7,
            grading_temperature: 0.2,
            llm_timeout_secs: 5,
            github_timeout_secs: 5,
            max_timeout_retries: 2,
            retry_backoff_ms: 1,
        }
    }
}
