pub mod pull_request_repository;

pub use pull_request_repository::{GitHubPullRequestRepository, PullRequestRepository};
