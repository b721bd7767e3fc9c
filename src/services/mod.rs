pub mod answer_key_codec;
pub mod answer_parser;
pub mod comment_templates;
pub mod decision_service;
pub mod grading_service;
pub mod model_service;
pub mod quiz_service;
pub mod retry;
pub mod submission_service;
pub mod thread_reconstructor;

pub use decision_service::DecisionService;
pub use grading_service::GradingService;
pub use model_service::{ModelService, OpenAiModelService};
pub use quiz_service::{IssuedQuiz, QuizService, QuizSettings};
pub use submission_service::{IgnoreReason, IncomingComment, SubmissionService, ValidationOutcome};
