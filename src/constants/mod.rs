pub mod markers;
pub mod prompts;
