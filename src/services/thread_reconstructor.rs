use crate::constants::markers::{KEY_SENTINEL, SEAL_SENTINEL};
use crate::models::domain::thread::{same_login, sort_thread};
use crate::models::domain::{Quiz, ThreadComment};
use crate::services::answer_key_codec::{self, DecisionMarker};

/// The quiz currently in force and where it sits in the thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveQuiz {
    pub comment_id: u64,
    pub position: usize,
    pub quiz: Quiz,
}

/// Protocol state derived from a pull request's comments. Nothing here is
/// cached between runs; every run rebuilds it from the thread.
#[derive(Debug, Clone)]
pub struct ThreadState {
    comments: Vec<ThreadComment>,
    system_login: String,
}

impl ThreadState {
    /// Puts `comments` into canonical order (creation time, then id).
    pub fn new(mut comments: Vec<ThreadComment>, system_login: &str) -> Self {
        sort_thread(&mut comments);
        Self {
            comments,
            system_login: system_login.to_string(),
        }
    }

    fn system_comments(&self) -> impl DoubleEndedIterator<Item = (usize, &ThreadComment)> {
        self.comments
            .iter()
            .enumerate()
            .filter(|(_, c)| same_login(&c.author, &self.system_login))
    }

    /// Latest decodable quiz posted by the system identity. Sentinels in
    /// comments from anyone else are ignored.
    pub fn active_quiz(&self) -> Option<ActiveQuiz> {
        for comment in &self.comments {
            if !same_login(&comment.author, &self.system_login)
                && (comment.body.contains(SEAL_SENTINEL) || comment.body.contains(KEY_SENTINEL))
            {
                log::warn!(
                    "Ignoring quiz markers in comment {} from {}",
                    comment.id,
                    comment.author
                );
            }
        }

        self.system_comments().rev().find_map(|(position, comment)| {
            answer_key_codec::decode(&comment.body).map(|quiz| ActiveQuiz {
                comment_id: comment.id,
                position,
                quiz,
            })
        })
    }

    pub fn position_of(&self, comment_id: u64) -> Option<usize> {
        self.comments.iter().position(|c| c.id == comment_id)
    }

    /// A decision the system already published for this submission comment.
    pub fn decision_for(&self, submission_id: u64) -> Option<DecisionMarker> {
        self.system_comments()
            .rev()
            .filter_map(|(_, comment)| answer_key_codec::decode_decision(&comment.body))
            .find(|marker| marker.submission_id == submission_id)
    }
}

/// Most recent quiz in `comments` authored by `system_login`.
pub fn reconstruct(comments: Vec<ThreadComment>, system_login: &str) -> Option<ActiveQuiz> {
    ThreadState::new(comments, system_login).active_quiz()
}

/// Decision already published by `system_login` for `submission_id`.
pub fn find_decision(
    comments: Vec<ThreadComment>,
    system_login: &str,
    submission_id: u64,
) -> Option<DecisionMarker> {
    ThreadState::new(comments, system_login).decision_for(submission_id)
}
