mod codec;
mod compiler;
mod instruction;
mod opcode;

pub use compiler::{compile, compile_bytes, strip_comment_loop, CompileError, CompileResult};
pub use instruction::Instruction;
pub use opcode::OpCode;

use std::fmt;
use std::sync::Arc;

/// Compiled tape-machine program.
///
/// ByteCode is immutable; clones share the same instruction buffer, so one
/// compiled program can be handed to any number of concurrent executions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteCode {
    instructions: Arc<[Instruction]>,
}

impl ByteCode {
    /// Compile source text, see [`compile`]
    pub fn compile(source: &str, instruction_limit: Option<usize>) -> CompileResult<Self> {
        compile(source, instruction_limit)
    }

    /// Compile raw source bytes, see [`compile_bytes`]
    pub fn compile_bytes(source: &[u8], instruction_limit: Option<usize>) -> CompileResult<Self> {
        compile_bytes(source, instruction_limit)
    }

    pub(crate) fn from_instructions(instructions: Vec<Instruction>) -> Self {
        Self {
            instructions: instructions.into(),
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl Default for ByteCode {
    fn default() -> Self {
        Self::from_instructions(Vec::new())
    }
}

/// Canonical form: opcodes only, comments and the leading comment loop removed
impl fmt::Display for ByteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = self
            .instructions
            .iter()
            .map(|instruction| char::from(instruction.opcode))
            .collect();
        f.write_str(&text)
    }
}
