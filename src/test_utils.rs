#[cfg(test)]
pub mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::models::domain::{Quiz, ThreadComment};

    pub const BOT_LOGIN: &str = "passmatic[bot]";

    /// A quiz of `count` questions with answers `A1..An`.
    pub fn sample_quiz(count: usize) -> Quiz {
        Quiz::new(
            (1..=count)
                .map(|i| (format!("Q{}?", i), format!("A{}", i)))
                .collect(),
        )
        .expect("sample quiz is valid")
    }

    /// A comment whose creation time grows with its id, so ids give thread order.
    pub fn comment_at(id: u64, author: &str, body: &str) -> ThreadComment {
        ThreadComment {
            id,
            author: author.to_string(),
            body: body.to_string(),
            created_at: Utc
                .timestamp_opt(1_700_000_000 + id as i64, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    pub fn bot_comment(id: u64, body: &str) -> ThreadComment {
        comment_at(id, BOT_LOGIN, body)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_sample_quiz() {
        let quiz = sample_quiz(3);
        assert_eq!(quiz.question_count(), 3);
        assert_eq!(quiz.key().get(3), Some("A3"));
    }

    #[test]
    fn test_fixtures_comment_order_follows_id() {
        let first = comment_at(1, "alice", "a");
        let second = bot_comment(2, "b");
        assert!(first.created_at < second.created_at);
        assert_eq!(second.author, BOT_LOGIN);
    }
}
