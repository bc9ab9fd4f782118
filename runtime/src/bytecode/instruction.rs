use crate::bytecode::OpCode;

/// A single compiled instruction.
///
/// Loop brackets carry the index of their matching partner. The target is
/// resolved once by the compiler and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub target: u32,
}

impl Instruction {
    pub fn new(opcode: OpCode) -> Self {
        Self {
            opcode,
            target: 0,
        }
    }

    pub fn with_target(mut self, target: u32) -> Self {
        self.target = target;
        self
    }

    /// Jump target as an instruction index
    pub fn jump_target(&self) -> usize {
        self.target as usize
    }
}
