use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::domain::Quiz;

/// One generated question with its reference answer.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct GeneratedQuestionDto {
    /// Question about the diff, answerable only by someone who understands it.
    pub question: String,
    /// Reference answer in two or three sentences.
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct GeneratedQuizDto {
    pub questions: Vec<GeneratedQuestionDto>,
}

impl GeneratedQuizDto {
    /// Converts model output into a quiz of exactly `expected` questions.
    /// Any other count is malformed output, never truncated or padded.
    pub fn into_quiz(self, expected: usize) -> AppResult<Quiz> {
        if self.questions.len() != expected {
            return Err(AppError::MalformedLlmOutput(format!(
                "expected {} questions, got {}",
                expected,
                self.questions.len()
            )));
        }
        if let Some(pos) = self
            .questions
            .iter()
            .position(|q| q.question.trim().is_empty() || q.answer.trim().is_empty())
        {
            return Err(AppError::MalformedLlmOutput(format!(
                "question {} is missing its text or answer",
                pos + 1
            )));
        }

        Quiz::new(
            self.questions
                .into_iter()
                .map(|q| (q.question.trim().to_string(), q.answer.trim().to_string()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct GradingVerdictDto {
    /// Whether the answer shows correct understanding of the change.
    pub passed: bool,
    /// One or two sentences of feedback for the author.
    pub feedback: String,
}

/// Pretty JSON schema for `T`, embedded in prompts.
pub fn schema_json<T: JsonSchema>() -> String {
    let schema = schemars::schema_for!(T);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
}

/// Parses a model reply as JSON, tolerating a surrounding markdown code fence.
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> AppResult<T> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(body.trim()).map_err(AppError::from)
}
