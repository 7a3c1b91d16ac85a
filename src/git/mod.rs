pub mod repo;
pub use repo::{ApplyCheck, GitRepo, RebaseOutcome};
#[cfg(feature = "test-support")]
pub mod test_utils;
