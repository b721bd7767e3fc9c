use clap::{Parser, Subcommand};

use crate::{
    errors::{AppError, AppResult},
    models::domain::Decision,
    services::ValidationOutcome,
};

#[derive(Parser, Debug, PartialEq)]
#[command(name = "passmatic", author, version, about = "Comprehension quizzes that gate pull request approval", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Generate a quiz from the pull request diff and post it.
    Issue {
        /// Login of the user who triggered the run.
        #[arg(long, env = "TRIGGER_ACTOR")]
        actor: String,
    },
    /// Grade an `!answer` comment and publish the decision.
    Validate {
        #[arg(long, env = "COMMENT_ID")]
        comment_id: u64,
        #[arg(long, env = "COMMENT_AUTHOR")]
        comment_author: String,
        #[arg(long, env = "COMMENT_BODY")]
        comment_body: String,
    },
}

/// Process exit status for a run. Denied and ignored runs exit cleanly so
/// they do not show up as failed checks; anything short of a decision that
/// lets the pull request proceed exits non-zero.
pub fn exit_status<T>(result: &AppResult<T>, succeeded: impl Fn(&T) -> bool) -> u8 {
    match result {
        Ok(value) if succeeded(value) => 0,
        Ok(_) => 1,
        Err(AppError::AuthorizationDenied(_)) => 0,
        Err(_) => 1,
    }
}

pub fn validation_succeeded(outcome: &ValidationOutcome) -> bool {
    match outcome {
        ValidationOutcome::Ignored(_) => true,
        ValidationOutcome::AlreadyDecided(decision) | ValidationOutcome::Decided(decision) => {
            *decision == Decision::Approved
        }
    }
}
