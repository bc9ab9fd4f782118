mod error;
mod execution_context;
mod interpreter;
mod streams;

pub use error::{VMError, VMResult};
pub use execution_context::ExecutionContext;
pub use interpreter::VM;
pub use streams::{ClosedOutput, NoInput};
