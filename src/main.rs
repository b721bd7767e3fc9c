use std::process::ExitCode;

use clap::Parser;

use passmatic::{
    app_state::AppState,
    cli::{exit_status, validation_succeeded, Cli, Command},
    config::Config,
    errors::AppError,
    services::IncomingComment,
};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::from_env();
    if let Err(err) = config.validate() {
        log::error!("{}", err);
        return ExitCode::FAILURE;
    }

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(err) => {
            log::error!("Failed to initialise: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let status = match cli.command {
        Command::Issue { actor } => {
            let result = state.quiz_service.issue_quiz(&actor).await;
            match &result {
                Ok(issued) => log::info!(
                    "Quiz with {} questions posted as comment {}",
                    issued.quiz.question_count(),
                    issued.comment_id
                ),
                Err(AppError::AuthorizationDenied(_)) => {
                    log::info!("Quiz not issued: trigger is not allowed to request one")
                }
                Err(err) => log::error!("Quiz not issued: {}", err),
            }
            exit_status(&result, |_| true)
        }
        Command::Validate {
            comment_id,
            comment_author,
            comment_body,
        } => {
            let comment = IncomingComment {
                id: comment_id,
                author: comment_author,
                body: comment_body,
            };
            let result = state.submission_service.handle_comment(&comment).await;
            match &result {
                Ok(outcome) => log::info!("Comment {}: {:?}", comment_id, outcome),
                Err(AppError::AuthorizationDenied(_)) => {
                    log::info!("Comment {} ignored: not the pull request author", comment_id)
                }
                Err(err) => log::error!("Comment {} [{}]: {}", comment_id, err.error_code(), err),
            }
            exit_status(&result, validation_succeeded)
        }
    };

    ExitCode::from(status)
}
