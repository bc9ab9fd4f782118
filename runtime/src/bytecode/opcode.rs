/// Opcodes of the tape machine

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    Left = b'<',       // Move head left. Underflow is a runtime error
    Right = b'>',      // Move head right. May grow the tape
    Increment = b'+',  // Increment current cell, wrapping
    Decrement = b'-',  // Decrement current cell, wrapping
    Input = b',',      // Read one byte into current cell
    Output = b'.',     // Write current cell
    LoopStart = b'[',  // Skip loop if current cell is zero
    LoopEnd = b']',    // Repeat loop if current cell is nonzero
}

const LEFT: u8 = OpCode::Left as u8;
const RIGHT: u8 = OpCode::Right as u8;
const INCREMENT: u8 = OpCode::Increment as u8;
const DECREMENT: u8 = OpCode::Decrement as u8;
const INPUT: u8 = OpCode::Input as u8;
const OUTPUT: u8 = OpCode::Output as u8;
const LOOP_START: u8 = OpCode::LoopStart as u8;
const LOOP_END: u8 = OpCode::LoopEnd as u8;

/// Order of opcodes in the 3-bit packed encoding.
const PACKED_ORDER: [OpCode; 8] = [
    OpCode::Decrement,
    OpCode::Increment,
    OpCode::Left,
    OpCode::Right,
    OpCode::Input,
    OpCode::Output,
    OpCode::LoopStart,
    OpCode::LoopEnd,
];

impl OpCode {
    /// Convert a source byte to an opcode, `None` for comment bytes
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            LEFT => Some(OpCode::Left),
            RIGHT => Some(OpCode::Right),
            INCREMENT => Some(OpCode::Increment),
            DECREMENT => Some(OpCode::Decrement),
            INPUT => Some(OpCode::Input),
            OUTPUT => Some(OpCode::Output),
            LOOP_START => Some(OpCode::LoopStart),
            LOOP_END => Some(OpCode::LoopEnd),
            _ => None,
        }
    }

    /// Convert an opcode to its source byte
    pub fn to_byte(&self) -> u8 {
        *self as u8
    }

    /// Whether the instruction carries a jump target
    pub fn is_jump(&self) -> bool {
        matches!(self, OpCode::LoopStart | OpCode::LoopEnd)
    }

    /// 3-bit index used by the packed bytecode encoding
    pub fn packed_index(&self) -> u8 {
        match self {
            OpCode::Decrement => 0,
            OpCode::Increment => 1,
            OpCode::Left => 2,
            OpCode::Right => 3,
            OpCode::Input => 4,
            OpCode::Output => 5,
            OpCode::LoopStart => 6,
            OpCode::LoopEnd => 7,
        }
    }

    /// Inverse of [`OpCode::packed_index`]. Only the low 3 bits are used.
    pub fn from_packed_index(index: u8) -> Self {
        PACKED_ORDER[(index & 7) as usize]
    }
}

impl From<OpCode> for u8 {
    fn from(opcode: OpCode) -> Self {
        opcode.to_byte()
    }
}

impl From<OpCode> for char {
    fn from(opcode: OpCode) -> Self {
        opcode.to_byte() as char
    }
}
