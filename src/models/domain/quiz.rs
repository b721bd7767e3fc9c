use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::domain::quiz_question::{QuestionSet, QuizQuestion};

/// Reference answers keyed by question index. Only ever read by grading.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnswerKey {
    answers: BTreeMap<usize, String>,
}

impl AnswerKey {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

/// One quiz round: a question set and its answer key, created together.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    pub round_id: Uuid,
    questions: QuestionSet,
    key: AnswerKey,
}

impl Quiz {
    /// Builds a fresh round from `(prompt, reference answer)` pairs.
    pub fn new(pairs: Vec<(String, String)>) -> AppResult<Self> {
        Self::with_round_id(Uuid::new_v4(), pairs)
    }

    pub fn with_round_id(round_id: Uuid, pairs: Vec<(String, String)>) -> AppResult<Self> {
        if pairs.is_empty() {
            return Err(AppError::ValidationError(
                "A quiz needs at least one question".to_string(),
            ));
        }
        if let Some(pos) = pairs
            .iter()
            .position(|(q, a)| q.trim().is_empty() || a.trim().is_empty())
        {
            return Err(AppError::ValidationError(format!(
                "Question {} has an empty prompt or answer",
                pos + 1
            )));
        }

        let (prompts, answers): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();
        let key = AnswerKey {
            answers: answers
                .into_iter()
                .enumerate()
                .map(|(i, answer)| (i + 1, answer))
                .collect(),
        };

        Ok(Self {
            round_id,
            questions: QuestionSet::from_prompts(prompts),
            key,
        })
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn key(&self) -> &AnswerKey {
        &self.key
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Questions paired with their reference answers, in index order.
    pub fn items(&self) -> impl Iterator<Item = (&QuizQuestion, &str)> {
        self.questions
            .iter()
            .filter_map(|q| self.key.get(q.index).map(|a| (q, a)))
    }
}
