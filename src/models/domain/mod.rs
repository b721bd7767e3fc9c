pub mod quiz;
pub mod quiz_attempt;
pub mod quiz_question;
pub mod submission;
pub mod thread;
pub use quiz::{AnswerKey, Quiz};
pub use quiz_attempt::{Decision, GradeResult, QuestionGrade, Verdict};
pub use quiz_question::{QuestionSet, QuizQuestion};
pub use submission::{Submission, SubmissionError, SubmittedAnswer};
pub use thread::{PullRequestMetadata, Reaction, ThreadComment};
