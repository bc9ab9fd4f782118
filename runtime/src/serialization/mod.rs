//! Versioned binary persistence of problems and bytecode

mod problem;
pub mod wire;

use thiserror::Error;
use crate::bytecode::CompileError;
use crate::sandbox::SandboxError;

/// Current problem wire format
pub const WIRE_FORMAT_V1: u64 = 1;

/// Deepest allowed nesting of combined generators
pub const MAX_GENERATOR_DEPTH: usize = 16;

/// Errors produced while decoding binary data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed varint at offset {0}")]
    BadVarint(usize),

    #[error("unexpected end of buffer ({0} bytes)")]
    UnexpectedEnd(usize),

    #[error("incorrect buffer length: expected {expected} bytes, found {found}")]
    BadLength { expected: usize, found: usize },

    #[error("invalid bytecode: {0}")]
    InvalidBytecode(#[from] CompileError),

    #[error("invalid lua script: {0}")]
    InvalidScript(#[from] SandboxError),

    #[error("serialized version {0}, but parser only recognizes v1")]
    UnsupportedVersion(u64),

    #[error("unknown {kind} variant tag {tag}")]
    UnknownVariant { kind: &'static str, tag: u64 },

    #[error("generators nested deeper than {0} levels")]
    TooDeep(usize),

    #[error("integer {0} does not fit this platform")]
    Overflow(u64),

    #[error("buffer contains {0} trailing junk bytes")]
    TrailingBytes(usize),

    #[error("text is not valid UTF-8")]
    InvalidText,
}

/// Result type for decoding operations
pub type DecodeResult<T> = Result<T, DecodeError>;
