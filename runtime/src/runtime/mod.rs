mod config;
mod executor;
mod score;
mod worker;

pub use config::JudgeConfig;
pub use executor::Judge;
pub use score::{calculate_score, first_failure};

use std::io;
use thiserror::Error;

/// Errors that can occur while setting up a judge
#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("failed to spawn judge worker: {0}")]
    Spawn(#[from] io::Error),
}

/// Result type for judge operations
pub type JudgeResult<T> = Result<T, JudgeError>;
