use std::io;
use thiserror::Error;

/// Terminal errors of a tape-machine execution.
///
/// Every variant ends the run. The error is retained by the machine, so it is
/// `Clone` and stream failures are flattened into their message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VMError {
    #[error("runtime error: head underflow")]
    HeadUnderflow,

    #[error("runtime error: memory limit")]
    MemoryLimit,

    #[error("runtime error: step limit")]
    StepLimit,

    #[error("unexpected end of input")]
    EndOfInput,

    #[error("{0}")]
    Stream(String),
}

impl From<io::Error> for VMError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => VMError::EndOfInput,
            _ => VMError::Stream(err.to_string()),
        }
    }
}

/// Result type for VM operations
pub type VMResult<T> = Result<T, VMError>;
