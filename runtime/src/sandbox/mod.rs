//! Deterministic, time-boxed Lua interpreter used by script-based checkers
//! and generators.
//!
//! Every invocation gets a fresh interpreter: globals never leak between
//! tests, and the random generator starts from the same seed each time.

mod checker;
mod state;
mod test_data;

pub use checker::{ScriptChecker, ScriptMode};
pub use state::Sandbox;
pub use test_data::{get_tests, ScriptGenerator};

use std::time::Duration;
use thiserror::Error;

/// Errors raised inside the sandbox
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SandboxError {
    #[error("compilation failed: {0}")]
    Compile(String),

    #[error("{0}")]
    Runtime(String),

    #[error("execution timed out")]
    Timeout,

    #[error("either checker or solution must be defined")]
    NotAChecker,

    #[error("solution must return a string or number, got {0}")]
    BadReturn(&'static str),

    #[error("invalid test_data type")]
    InvalidTestData,

    #[error("table elements' types are invalid")]
    InvalidElement,

    #[error("nested table contains non string test")]
    NestedNonString,

    #[error("empty test data")]
    EmptyTestData,
}

impl From<mlua::Error> for SandboxError {
    fn from(err: mlua::Error) -> Self {
        SandboxError::Runtime(err.to_string())
    }
}

/// Result type for sandbox operations
pub type SandboxResult<T> = Result<T, SandboxError>;

/// Resource bounds applied to every sandbox instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SandboxLimits {
    /// Budget for compiling a script and running its top level
    pub init_timeout: Duration,
    /// Budget for one checker call or one generator run
    pub call_timeout: Duration,
    /// Maximum Lua heap size in bytes
    pub memory_limit: usize,
    /// Lua instructions executed between two deadline checks
    pub hook_interval: u32,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            init_timeout: Duration::from_millis(100),
            call_timeout: Duration::from_secs(2),
            memory_limit: 64 * 1024 * 1024,
            hook_interval: 1000,
        }
    }
}

impl SandboxLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = timeout;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = bytes;
        self
    }

    /// Set how often the deadline is checked; clamped to at least 1
    pub fn with_hook_interval(mut self, instructions: u32) -> Self {
        self.hook_interval = instructions.max(1);
        self
    }
}
