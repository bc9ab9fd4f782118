//! Judge configuration options

use std::thread;

/// Configuration options for a [`Judge`](crate::runtime::Judge)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JudgeConfig {
    pub workers: usize,
    pub thread_name: String,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        let workers = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            workers,
            thread_name: "judge-worker".to_string(),
        }
    }
}

impl JudgeConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads, at least one
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the name prefix of worker threads
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Worker count as used by the judge
    pub fn workers(&self) -> usize {
        self.workers.max(1)
    }
}
