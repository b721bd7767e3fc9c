pub mod utils;

pub use utils::{is_pr_author, require_collaborator, require_pr_author};
