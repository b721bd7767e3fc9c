/// Command that opens a submission comment.
pub const ANSWER_COMMAND: &str = "!answer";

/// Sentinel for one hidden question/answer entry.
pub const KEY_SENTINEL: &str = "passmatic-key";

/// Sentinel for the seal that closes a hidden answer key.
pub const SEAL_SENTINEL: &str = "passmatic-seal";

/// Sentinel for a published decision on one submission.
pub const DECISION_SENTINEL: &str = "passmatic-decision";

/// Appended to diffs cut down to the configured size.
pub const DIFF_TRUNCATION_MARKER: &str = "[... diff truncated by passmatic ...]";
