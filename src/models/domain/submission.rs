use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedAnswer {
    pub index: usize,
    pub text: String,
}

/// A parsed `!answer` comment covering every question exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub comment_id: u64,
    pub author: String,
    pub answers: Vec<SubmittedAnswer>,
}

impl Submission {
    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers
            .iter()
            .find(|a| a.index == index)
            .map(|a| a.text.as_str())
    }
}

/// Why a submission body could not be turned into a [`Submission`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("comment does not start with !answer")]
    MissingCommand,

    #[error("no answers found after !answer")]
    NoAnswers,

    #[error("text found before the first numbered answer")]
    TextBeforeFirstItem,

    #[error("{}", plural(.0, "missing answer for question", "missing answers for questions"))]
    MissingIndices(Vec<usize>),

    #[error("{}", plural(.0, "question answered more than once:", "questions answered more than once:"))]
    DuplicateIndices(Vec<usize>),

    #[error("answer numbered {index} but this quiz only has questions 1 to {count}")]
    OutOfRange { index: usize, count: usize },

    #[error("{}", plural(.0, "empty answer for question", "empty answers for questions"))]
    EmptyAnswers(Vec<usize>),
}

fn join_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn plural(indices: &[usize], one: &str, many: &str) -> String {
    if indices.len() == 1 {
        format!("{} {}", one, indices[0])
    } else {
        format!("{} {}", many, join_indices(indices))
    }
}
