use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizQuestion {
    pub index: usize, // 1-based, stable for the life of the quiz
    pub prompt: String,
}

/// Ordered questions with indices 1..=N.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionSet {
    questions: Vec<QuizQuestion>,
}

impl QuestionSet {
    pub fn from_prompts(prompts: Vec<String>) -> Self {
        let questions = prompts
            .into_iter()
            .enumerate()
            .map(|(i, prompt)| QuizQuestion {
                index: i + 1,
                prompt,
            })
            .collect();
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QuizQuestion> {
        index
            .checked_sub(1)
            .and_then(|i| self.questions.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuizQuestion> {
        self.questions.iter()
    }
}
