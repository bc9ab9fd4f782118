// braincode - judge for programs written in an eight-instruction tape language

pub mod bytecode;
pub mod problem;
pub mod runtime;
pub mod sandbox;
pub mod serialization;
pub mod utils;
pub mod vm;

pub use bytecode::{compile, compile_bytes, ByteCode, CompileError};
pub use problem::{Checker, Generator, Limits, Problem, ProblemDefinition, Status, Verdict, Verdicts};
pub use runtime::{calculate_score, first_failure, Judge, JudgeConfig};
pub use sandbox::SandboxLimits;
pub use serialization::DecodeError;
pub use vm::{VMError, VM};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
