use crate::{
    errors::{AppError, AppResult},
    models::domain::{thread::same_login, PullRequestMetadata},
    repositories::PullRequestRepository,
    services::retry::{run_with_retry, RetryPolicy},
};

const DENIED: &str = "this action is not available to you";

pub fn is_pr_author(login: &str, pull_request: &PullRequestMetadata) -> bool {
    same_login(login, &pull_request.author)
}

pub fn require_pr_author(login: &str, pull_request: &PullRequestMetadata) -> AppResult<()> {
    if !is_pr_author(login, pull_request) {
        return Err(AppError::AuthorizationDenied(DENIED.to_string()));
    }
    Ok(())
}

/// Only collaborators may trigger a quiz, since issuing one spends a model call.
pub async fn require_collaborator(
    repository: &dyn PullRequestRepository,
    policy: &RetryPolicy,
    login: &str,
) -> AppResult<()> {
    if login.trim().is_empty() {
        return Err(AppError::AuthorizationDenied(DENIED.to_string()));
    }
    let collaborator = run_with_retry(policy, "collaborator check", move || {
        repository.is_collaborator(login)
    })
    .await?;

    if !collaborator {
        return Err(AppError::AuthorizationDenied(DENIED.to_string()));
    }
    Ok(())
}
