use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pull-request conversation comment, independent of the hosting platform.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThreadComment {
    pub id: u64,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PullRequestMetadata {
    pub number: u64,
    pub author: String,
}

/// Reactions the bot leaves on a submission comment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reaction {
    ThumbsUp,
    ThumbsDown,
}

impl Reaction {
    pub fn content(&self) -> &'static str {
        match self {
            Reaction::ThumbsUp => "+1",
            Reaction::ThumbsDown => "-1",
        }
    }
}

/// Sorts comments into canonical thread order: creation time, then id.
pub fn sort_thread(comments: &mut [ThreadComment]) {
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

/// GitHub logins are case-insensitive.
pub fn same_login(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
