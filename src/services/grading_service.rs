use std::sync::Arc;

use crate::{
    config::Config,
    constants::prompts::{GRADING_SYSTEM_PROMPT, GRADING_USER_PROMPT},
    errors::{AppError, AppResult},
    models::{
        domain::{GradeResult, QuestionGrade, Quiz, Submission, Verdict},
        dto::quiz_dto::{parse_model_json, schema_json, GradingVerdictDto},
    },
    services::{
        model_service::{ChatRequest, ModelService},
        retry::{run_with_retry, RetryPolicy},
    },
};

pub struct GradingService {
    model: Arc<dyn ModelService>,
    temperature: f32,
    policy: RetryPolicy,
}

impl GradingService {
    pub fn new(model: Arc<dyn ModelService>, temperature: f32, policy: RetryPolicy) -> Self {
        Self {
            model,
            temperature,
            policy,
        }
    }

    pub fn from_config(model: Arc<dyn ModelService>, config: &Config) -> Self {
        Self::new(model, config.grading_temperature, config.model_retry_policy())
    }

    /// Grades every item of `submission` against the quiz key.
    ///
    /// Each question is judged in its own model call so one answer cannot
    /// influence the verdict on another. If any call fails for good, the
    /// whole grading fails and no partial result is returned.
    pub async fn grade(&self, quiz: &Quiz, submission: &Submission) -> AppResult<GradeResult> {
        let mut grades = Vec::with_capacity(quiz.question_count());

        for (question, reference) in quiz.items() {
            let answer = submission.answer(question.index).ok_or_else(|| {
                AppError::ValidationError(format!(
                    "Submission has no answer for question {}",
                    question.index
                ))
            })?;

            let grade = self
                .grade_question(question.index, &question.prompt, reference, answer)
                .await?;
            log::debug!("Question {} graded {:?}", grade.index, grade.verdict);
            grades.push(grade);
        }

        let result = GradeResult::new(grades);
        log::info!(
            "Graded submission {}: {} of {} accepted",
            submission.comment_id,
            result.passed_count(),
            result.grades.len()
        );
        Ok(result)
    }

    async fn grade_question(
        &self,
        index: usize,
        prompt: &str,
        reference: &str,
        answer: &str,
    ) -> AppResult<QuestionGrade> {
        let request = &ChatRequest {
            system_prompt: GRADING_SYSTEM_PROMPT.replace("{schema}", &schema_json::<GradingVerdictDto>()),
            user_prompt: GRADING_USER_PROMPT
                .replace("{question}", prompt)
                .replace("{reference}", reference)
                .replace("{answer}", answer),
            temperature: self.temperature,
        };
        let model = self.model.as_ref();
        let operation = format!("grading of question {}", index);

        let verdict = run_with_retry(&self.policy, &operation, move || async move {
            let raw = model.complete_json(request.clone()).await?;
            parse_model_json::<GradingVerdictDto>(&raw)
        })
        .await?;

        Ok(QuestionGrade {
            index,
            verdict: if verdict.passed {
                Verdict::Pass
            } else {
                Verdict::Fail
            },
            feedback: verdict.feedback.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::SubmittedAnswer;
    use crate::services::model_service::MockModelService;
    use std::time::Duration;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(Duration::from_secs(1))
            .with_max_timeout_retries(1)
            .with_max_malformed_retries(1)
            .with_backoff(Duration::from_millis(1))
    }

    fn quiz() -> Quiz {
        Quiz::new(vec![
            ("Why add the lock?".to_string(), "To stop double fills.".to_string()),
            ("What is the TTL?".to_string(), "Five minutes.".to_string()),
        ])
        .unwrap()
    }

    fn submission(answers: &[&str]) -> Submission {
        Submission {
            comment_id: 42,
            author: "alice".to_string(),
            answers: answers
                .iter()
                .enumerate()
                .map(|(i, text)| SubmittedAnswer {
                    index: i + 1,
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn grades_each_question_in_isolation() {
        let mut model = MockModelService::new();
        model
            .expect_complete_json()
            .withf(|request| {
                request.user_prompt.contains("Why add the lock?")
                    && !request.user_prompt.contains("TTL")
                    && request.temperature < 0.5
            })
            .times(1)
            .returning(|_| Ok(r#"{"passed": true, "feedback": "Right."}"#.to_string()));
        model
            .expect_complete_json()
            .withf(|request| request.user_prompt.contains("What is the TTL?"))
            .times(1)
            .returning(|_| Ok(r#"{"passed": false, "feedback": " It is five minutes. "}"#.to_string()));

        let service = GradingService::new(Arc::new(model), 0.2, policy());
        let result = service
            .grade(&quiz(), &submission(&["prevents double fills", "an hour"]))
            .await
            .unwrap();

        assert!(!result.overall_pass());
        assert_eq!(result.passed_count(), 1);
        assert_eq!(result.grades[1].feedback, "It is five minutes.");
    }

    #[tokio::test]
    async fn malformed_verdict_is_retried_once() {
        let mut model = MockModelService::new();
        let mut sequence = mockall::Sequence::new();
        model
            .expect_complete_json()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok("{\"verdict\": \"yes\"}".to_string()));
        model
            .expect_complete_json()
            .times(2)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(r#"{"passed": true, "feedback": "ok"}"#.to_string()));

        let service = GradingService::new(Arc::new(model), 0.2, policy());
        let result = service.grade(&quiz(), &submission(&["a", "b"])).await.unwrap();

        assert!(result.overall_pass());
    }

    #[tokio::test]
    async fn persistent_failure_fails_the_whole_grading() {
        let mut model = MockModelService::new();
        model
            .expect_complete_json()
            .returning(|_| Ok("not json".to_string()));

        let service = GradingService::new(Arc::new(model), 0.2, policy());
        let err = service.grade(&quiz(), &submission(&["a", "b"])).await.unwrap_err();

        assert!(matches!(err, AppError::MalformedLlmOutput(_)));
    }
}
