use std::sync::Arc;

use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Decision, GradeResult, Reaction},
    repositories::PullRequestRepository,
    services::{
        answer_key_codec::DecisionMarker,
        comment_templates::{render_approval_failed, render_decision},
        retry::{run_with_retry, RetryPolicy},
    },
};

const APPROVAL_BODY: &str = "Passmatic: the author answered every comprehension question correctly.";

/// Turns a grade into the visible outcome on the pull request.
pub struct DecisionService {
    repository: Arc<dyn PullRequestRepository>,
    policy: RetryPolicy,
}

impl DecisionService {
    pub fn new(repository: Arc<dyn PullRequestRepository>, policy: RetryPolicy) -> Self {
        Self { repository, policy }
    }

    /// Writes are never retried after an attempt may have reached the
    /// platform; only the timeout applies.
    fn write_policy(&self) -> RetryPolicy {
        self.policy.with_max_timeout_retries(0)
    }

    /// Publishes the decision for `submission_id`.
    ///
    /// On a pass the approval is submitted first; the decision comment is only
    /// posted once it succeeded. A failed approval is reported on the thread
    /// and returned as [`AppError::ApprovalCallFailed`].
    pub async fn publish(
        &self,
        grade: &GradeResult,
        round_id: Uuid,
        submission_id: u64,
    ) -> AppResult<Decision> {
        let decision = Decision::from_grade(grade);
        let marker = DecisionMarker {
            round_id,
            submission_id,
            decision,
        };
        let repository = self.repository.as_ref();
        let policy = self.write_policy();

        if decision == Decision::Approved {
            let approved = run_with_retry(&policy, "approval", move || {
                repository.approve(APPROVAL_BODY)
            })
            .await;

            if let Err(err) = approved {
                log::error!("Approval for submission {} failed: {}", submission_id, err);
                let notice = render_approval_failed();
                let notice = notice.as_str();
                if let Err(post_err) = run_with_retry(&policy, "comment post", move || {
                    repository.post_comment(notice)
                })
                .await
                {
                    log::warn!("Could not post approval failure notice: {}", post_err);
                }
                return Err(match err {
                    AppError::ApprovalCallFailed(_) => err,
                    other => AppError::ApprovalCallFailed(other.to_string()),
                });
            }
        }

        let body = render_decision(grade, &marker);
        let body = body.as_str();
        if let Err(err) =
            run_with_retry(&policy, "comment post", move || repository.post_comment(body)).await
        {
            if decision == Decision::Approved {
                log::error!(
                    "Pull request approved for submission {} but the decision comment failed: {}. \
                     No decision marker was written, so a re-run will grade it again",
                    submission_id,
                    err
                );
            }
            return Err(err);
        }
        log::info!("Submission {} decided: {}", submission_id, decision);

        let reaction = match decision {
            Decision::Approved => Reaction::ThumbsUp,
            Decision::NeedsRevision => Reaction::ThumbsDown,
        };
        if let Err(err) = run_with_retry(&self.policy, "reaction", move || {
            repository.react(submission_id, reaction)
        })
        .await
        {
            log::warn!("Could not react to comment {}: {}", submission_id, err);
        }

        Ok(decision)
    }
}
