use async_trait::async_trait;
use octocrab::{models::issues::Comment, Octocrab};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{PullRequestMetadata, Reaction, ThreadComment},
};

/// Everything the protocol needs from the pull request it is bound to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PullRequestRepository: Send + Sync {
    async fn fetch_diff(&self) -> AppResult<String>;
    async fn pull_request(&self) -> AppResult<PullRequestMetadata>;
    /// All conversation comments, in the order the platform returns them.
    async fn list_comments(&self) -> AppResult<Vec<ThreadComment>>;
    async fn post_comment(&self, body: &str) -> AppResult<ThreadComment>;
    async fn is_collaborator(&self, login: &str) -> AppResult<bool>;
    async fn approve(&self, body: &str) -> AppResult<()>;
    async fn react(&self, comment_id: u64, reaction: Reaction) -> AppResult<()>;
}

pub struct GitHubPullRequestRepository {
    client: Octocrab,
    owner: String,
    repo: String,
    number: u64,
}

impl GitHubPullRequestRepository {
    pub fn new(token: &SecretString, owner: &str, repo: &str, number: u64) -> AppResult<Self> {
        let client = Octocrab::builder()
            .personal_token(token.expose_secret().to_string())
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build GitHub client: {}", e)))?;

        Ok(Self {
            client,
            owner: owner.to_string(),
            repo: repo.to_string(),
            number,
        })
    }

    fn reviews_route(&self) -> String {
        format!(
            "/repos/{}/{}/pulls/{}/reviews",
            self.owner, self.repo, self.number
        )
    }

    fn reactions_route(&self, comment_id: u64) -> String {
        format!(
            "/repos/{}/{}/issues/comments/{}/reactions",
            self.owner, self.repo, comment_id
        )
    }
}

impl From<Comment> for ThreadComment {
    fn from(comment: Comment) -> Self {
        ThreadComment {
            id: comment.id.into_inner(),
            author: comment.user.login,
            body: comment.body.unwrap_or_default(),
            created_at: comment.created_at,
        }
    }
}

#[async_trait]
impl PullRequestRepository for GitHubPullRequestRepository {
    async fn fetch_diff(&self) -> AppResult<String> {
        log::info!(
            "Fetching diff for PR #{} in {}/{}",
            self.number,
            self.owner,
            self.repo
        );
        let diff = self
            .client
            .pulls(self.owner.as_str(), self.repo.as_str())
            .get_diff(self.number)
            .await?;
        log::info!("Fetched diff ({} bytes)", diff.len());
        Ok(diff)
    }

    async fn pull_request(&self) -> AppResult<PullRequestMetadata> {
        let pr = self
            .client
            .pulls(self.owner.as_str(), self.repo.as_str())
            .get(self.number)
            .await?;
        let author = pr
            .user
            .map(|user| user.login)
            .ok_or_else(|| AppError::Upstream("Pull request has no author".to_string()))?;

        Ok(PullRequestMetadata {
            number: self.number,
            author,
        })
    }

    async fn list_comments(&self) -> AppResult<Vec<ThreadComment>> {
        let first_page = self
            .client
            .issues(self.owner.as_str(), self.repo.as_str())
            .list_comments(self.number)
            .per_page(100)
            .send()
            .await?;
        let comments = self.client.all_pages(first_page).await?;
        log::info!(
            "Found {} comments on PR #{}",
            comments.len(),
            self.number
        );

        Ok(comments.into_iter().map(ThreadComment::from).collect())
    }

    async fn post_comment(&self, body: &str) -> AppResult<ThreadComment> {
        let comment = self
            .client
            .issues(self.owner.as_str(), self.repo.as_str())
            .create_comment(self.number, body)
            .await?;
        log::info!("Posted comment {} on PR #{}", comment.id, self.number);
        Ok(comment.into())
    }

    async fn is_collaborator(&self, login: &str) -> AppResult<bool> {
        let collaborator = self
            .client
            .repos(self.owner.as_str(), self.repo.as_str())
            .is_collaborator(login)
            .await?;
        Ok(collaborator)
    }

    async fn approve(&self, body: &str) -> AppResult<()> {
        let payload = json!({ "event": "APPROVE", "body": body });
        let _review: serde_json::Value = self
            .client
            .post(self.reviews_route(), Some(&payload))
            .await
            .map_err(|e| AppError::ApprovalCallFailed(e.to_string()))?;
        log::info!("Approved PR #{}", self.number);
        Ok(())
    }

    async fn react(&self, comment_id: u64, reaction: Reaction) -> AppResult<()> {
        let payload = json!({ "content": reaction.content() });
        let _reaction: serde_json::Value = self
            .client
            .post(self.reactions_route(comment_id), Some(&payload))
            .await?;
        Ok(())
    }
}
