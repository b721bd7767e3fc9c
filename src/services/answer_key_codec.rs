//! Hidden spans carried inside bot comments.
//!
//! A quiz is stored as one HTML comment per question followed by a seal:
//!
//! ```text
//! <!-- passmatic-key:1:<base64 prompt>:<base64 answer> -->
//! <!-- passmatic-seal:<round id>:<question count>:<sha256 hex> -->
//! ```
//!
//! GitHub drops HTML comments when rendering markdown, so none of this is
//! visible, while the raw body returned by the API keeps it byte for byte.
//! Payloads use URL-safe base64 without padding, which can never contain `-->`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::constants::markers::{DECISION_SENTINEL, KEY_SENTINEL, SEAL_SENTINEL};
use crate::models::domain::{Decision, Quiz};

static KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"<!-- {}:(\d+):([A-Za-z0-9_-]*):([A-Za-z0-9_-]*) -->",
        KEY_SENTINEL
    ))
    .expect("KEY_RE is a valid regex pattern")
});

static SEAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"<!-- {}:([0-9a-f-]{{36}}):(\d+):([0-9a-f]{{64}}) -->",
        SEAL_SENTINEL
    ))
    .expect("SEAL_RE is a valid regex pattern")
});

static DECISION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"<!-- {}:([0-9a-f-]{{36}}):(\d+):([a-z-]+) -->",
        DECISION_SENTINEL
    ))
    .expect("DECISION_RE is a valid regex pattern")
});

static HTML_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("HTML_COMMENT_RE is a valid regex pattern"));

fn seal_digest(quiz: &Quiz) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}\n{}\n", quiz.round_id, quiz.question_count()));
    for (question, answer) in quiz.items() {
        hasher.update(format!(
            "{}\n{}:{}\n{}:{}\n",
            question.index,
            question.prompt.len(),
            question.prompt,
            answer.len(),
            answer
        ));
    }
    format!("{:x}", hasher.finalize())
}

/// Hidden span for `quiz`: one key line per question, then the seal.
pub fn encode(quiz: &Quiz) -> String {
    let mut span = String::new();
    for (question, answer) in quiz.items() {
        span.push_str(&format!(
            "<!-- {}:{}:{}:{} -->\n",
            KEY_SENTINEL,
            question.index,
            URL_SAFE_NO_PAD.encode(question.prompt.as_bytes()),
            URL_SAFE_NO_PAD.encode(answer.as_bytes())
        ));
    }
    span.push_str(&format!(
        "<!-- {}:{}:{}:{} -->",
        SEAL_SENTINEL,
        quiz.round_id,
        quiz.question_count(),
        seal_digest(quiz)
    ));
    span
}

fn decode_text(payload: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    String::from_utf8(bytes).ok()
}

/// Recovers the quiz hidden in `body`.
///
/// Returns `None` unless there is exactly one well-formed seal, every key
/// sentinel is well formed, the indices are exactly `1..=N` and the digest
/// matches. A wrong key is never returned.
pub fn decode(body: &str) -> Option<Quiz> {
    // Only sentinels that open an HTML comment count; visible text is escaped
    // so it can name a sentinel without ever opening one.
    let seal_opener = format!("<!-- {}", SEAL_SENTINEL);
    let key_opener = format!("<!-- {}", KEY_SENTINEL);
    if body.matches(seal_opener.as_str()).count() != 1 {
        return None;
    }
    let seal = SEAL_RE.captures(body)?;
    let round_id = Uuid::parse_str(&seal[1]).ok()?;
    let count: usize = seal[2].parse().ok()?;
    let expected_digest = &seal[3];

    let keys: Vec<_> = KEY_RE.captures_iter(body).collect();
    if body.matches(key_opener.as_str()).count() != keys.len() || keys.len() != count || count == 0 {
        return None;
    }

    let mut entries: Vec<Option<(String, String)>> = vec![None; count];
    for capture in keys {
        let index: usize = capture[1].parse().ok()?;
        let slot = entries.get_mut(index.checked_sub(1)?)?;
        if slot.is_some() {
            return None;
        }
        *slot = Some((decode_text(&capture[2])?, decode_text(&capture[3])?));
    }

    let pairs: Vec<(String, String)> = entries.into_iter().collect::<Option<_>>()?;
    let quiz = Quiz::with_round_id(round_id, pairs).ok()?;
    if seal_digest(&quiz) != expected_digest {
        log::warn!("Ignoring quiz {} with a mismatched seal", round_id);
        return None;
    }
    Some(quiz)
}

/// A decision already published for one submission comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionMarker {
    pub round_id: Uuid,
    pub submission_id: u64,
    pub decision: Decision,
}

pub fn encode_decision(marker: &DecisionMarker) -> String {
    format!(
        "<!-- {}:{}:{}:{} -->",
        DECISION_SENTINEL,
        marker.round_id,
        marker.submission_id,
        marker.decision.as_str()
    )
}

pub fn decode_decision(body: &str) -> Option<DecisionMarker> {
    let capture = DECISION_RE.captures(body)?;
    Some(DecisionMarker {
        round_id: Uuid::parse_str(&capture[1]).ok()?,
        submission_id: capture[2].parse().ok()?,
        decision: Decision::parse(&capture[3])?,
    })
}

/// What a reader sees once markdown is rendered: HTML comments removed.
pub fn rendered_view(body: &str) -> String {
    HTML_COMMENT_RE.replace_all(body, "").into_owned()
}
