use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionGrade {
    pub index: usize,
    pub verdict: Verdict,
    pub feedback: String,
}

/// Outcome of grading one submission.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct GradeResult {
    pub grades: Vec<QuestionGrade>,
}

impl GradeResult {
    pub fn new(mut grades: Vec<QuestionGrade>) -> Self {
        grades.sort_by_key(|g| g.index);
        Self { grades }
    }

    /// True only when there is at least one grade and every grade passed.
    pub fn overall_pass(&self) -> bool {
        !self.grades.is_empty() && self.grades.iter().all(|g| g.verdict == Verdict::Pass)
    }

    /// Grades that still need work; passed items are never reported back.
    pub fn failed(&self) -> impl Iterator<Item = &QuestionGrade> {
        self.grades.iter().filter(|g| g.verdict == Verdict::Fail)
    }

    pub fn passed_count(&self) -> usize {
        self.grades
            .iter()
            .filter(|g| g.verdict == Verdict::Pass)
            .count()
    }
}

/// Terminal record of one submission attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Decision {
    Approved,
    NeedsRevision,
}

impl Decision {
    pub fn from_grade(grade: &GradeResult) -> Self {
        if grade.overall_pass() {
            Decision::Approved
        } else {
            Decision::NeedsRevision
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::NeedsRevision => "needs-revision",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "approved" => Some(Decision::Approved),
            "needs-revision" => Some(Decision::NeedsRevision),
            _ => None,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
