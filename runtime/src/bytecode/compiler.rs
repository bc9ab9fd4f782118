use thiserror::Error;
use crate::bytecode::{ByteCode, Instruction, OpCode};

/// Compilation failures. Offsets are byte offsets into the source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("compilation error: bracket '{bracket}' at offset {offset} is unmatched")]
    UnmatchedBracket { bracket: char, offset: usize },

    #[error("compilation error: instruction limit, first offending instruction at {offset}")]
    InstructionLimit { offset: usize },
}

impl CompileError {
    /// Byte offset of the offending instruction
    pub fn offset(&self) -> usize {
        match self {
            CompileError::UnmatchedBracket { offset, .. } => *offset,
            CompileError::InstructionLimit { offset } => *offset,
        }
    }
}

/// Result type for compilation
pub type CompileResult<T> = Result<T, CompileError>;

/// Compile source text into bytecode.
///
/// A leading comment loop is stripped first. Every byte that is not one of the
/// eight opcodes is ignored. `instruction_limit` of `None` means unlimited.
pub fn compile(source: &str, instruction_limit: Option<usize>) -> CompileResult<ByteCode> {
    compile_bytes(source.as_bytes(), instruction_limit)
}

/// Compile raw source bytes, see [`compile`]. Source need not be UTF-8.
pub fn compile_bytes(source: &[u8], instruction_limit: Option<usize>) -> CompileResult<ByteCode> {
    let stripped = strip_comment_loop(source);
    assemble(stripped, source.len() - stripped.len(), instruction_limit)
}

/// Resolve jumps for an opcode stream without stripping anything.
///
/// `base_offset` is added to every reported error offset.
pub(crate) fn assemble(
    source: &[u8],
    base_offset: usize,
    instruction_limit: Option<usize>,
) -> CompileResult<ByteCode> {
    // Jump targets are stored as u32
    let limit = instruction_limit
        .unwrap_or(usize::MAX)
        .min(u32::MAX as usize);

    let mut instructions: Vec<Instruction> = Vec::new();
    // (instruction index, byte offset) of every open '['
    let mut open_loops: Vec<(usize, usize)> = Vec::new();

    for (offset, &byte) in source.iter().enumerate() {
        let Some(opcode) = OpCode::from_byte(byte) else {
            continue;
        };

        if instructions.len() >= limit {
            return Err(CompileError::InstructionLimit {
                offset: offset + base_offset,
            });
        }

        match opcode {
            OpCode::LoopStart => {
                open_loops.push((instructions.len(), offset));
                instructions.push(Instruction::new(OpCode::LoopStart));
            },
            OpCode::LoopEnd => {
                let Some((start, _)) = open_loops.pop() else {
                    return Err(CompileError::UnmatchedBracket {
                        bracket: ']',
                        offset: offset + base_offset,
                    });
                };
                let end = instructions.len();
                instructions[start].target = end as u32;
                instructions.push(Instruction::new(OpCode::LoopEnd).with_target(start as u32));
            },
            _ => instructions.push(Instruction::new(opcode)),
        }
    }

    if let Some(&(_, offset)) = open_loops.last() {
        return Err(CompileError::UnmatchedBracket {
            bracket: '[',
            offset: offset + base_offset,
        });
    }

    Ok(ByteCode::from_instructions(instructions))
}

/// Strip balanced loops that precede the first non-bracket opcode.
///
/// Returns the source unchanged when the leading loops are not balanced.
pub fn strip_comment_loop(source: &[u8]) -> &[u8] {
    let mut depth = 0usize;

    for (index, &byte) in source.iter().enumerate() {
        match OpCode::from_byte(byte) {
            None => {},
            Some(OpCode::LoopStart) => depth += 1,
            Some(OpCode::LoopEnd) => {
                if depth == 0 {
                    return source;
                }
                depth -= 1;
            },
            Some(_) => {
                if depth == 0 {
                    return &source[index..];
                }
            },
        }
    }

    if depth != 0 {
        return source;
    }

    &source[source.len()..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(source: &str) -> &str {
        std::str::from_utf8(strip_comment_loop(source.as_bytes())).unwrap()
    }

    #[test]
    fn test_strip_comment_loop_table() {
        let cases = [
            ("", ""),
            ("[][][][]+-+-", "+-+-"),
            ("[Hello world!  +++] ", ""),
            ("123 [<>+-[].,] 678  [<>+-[].,]  ", ""),
            ("123 [<>+-].,] 678  [<>+-[].,]", ".,] 678  [<>+-[].,]"),
            ("[[]", "[[]"),
            ("[]]", "[]]"),
            ("asd [[", "asd [["),
            ("[[[][][[[[[]][[]]]]]]]--[+-]", "--[+-]"),
        ];

        for (source, want) in cases {
            assert_eq!(strip(source), want, "stripping {:?}", source);
        }
    }

    #[test]
    fn test_strip_keeps_code_without_leading_loop() {
        assert_eq!(strip("+[-]"), "+[-]");
        assert_eq!(strip("  ,."), ",.");
    }

    #[test]
    fn test_compile_resolves_jumps() {
        let code = compile("+[->+<]", None).unwrap();
        let instructions = code.instructions();

        assert_eq!(instructions.len(), 7);
        assert_eq!(instructions[1].opcode, OpCode::LoopStart);
        assert_eq!(instructions[1].jump_target(), 6);
        assert_eq!(instructions[6].opcode, OpCode::LoopEnd);
        assert_eq!(instructions[6].jump_target(), 1);
    }

    #[test]
    fn test_compile_nested_loops() {
        let code = compile("+[[-]>]", None).unwrap();
        let instructions = code.instructions();

        assert_eq!(instructions[1].jump_target(), 6);
        assert_eq!(instructions[2].jump_target(), 4);
        assert_eq!(instructions[4].jump_target(), 2);
        assert_eq!(instructions[6].jump_target(), 1);
    }

    #[test]
    fn test_compile_ignores_comments() {
        let code = compile("add: + and + then print .", None).unwrap();
        assert_eq!(code.to_string(), "++.");
    }

    #[test]
    fn test_unmatched_loop_end() {
        let err = compile("+]", None).unwrap_err();
        assert_eq!(err, CompileError::UnmatchedBracket { bracket: ']', offset: 1 });
    }

    #[test]
    fn test_unmatched_loop_start_reports_innermost() {
        let err = compile("+[[-]x[", None).unwrap_err();
        assert_eq!(err, CompileError::UnmatchedBracket { bracket: '[', offset: 6 });

        let err = compile("+[ [", None).unwrap_err();
        assert_eq!(err.offset(), 3);
    }

    #[test]
    fn test_error_offset_accounts_for_stripped_prefix() {
        // "[c]" is stripped, the stray ']' sits at byte 5 of the source text
        let err = compile("[c] +]", None).unwrap_err();
        assert_eq!(err, CompileError::UnmatchedBracket { bracket: ']', offset: 5 });
    }

    #[test]
    fn test_unbalanced_prefix_is_not_stripped() {
        let err = compile("[]]", None).unwrap_err();
        assert_eq!(err, CompileError::UnmatchedBracket { bracket: ']', offset: 2 });
    }

    #[test]
    fn test_instruction_limit() {
        assert!(compile("+++", Some(3)).is_ok());

        let err = compile("+ + + +", Some(3)).unwrap_err();
        assert_eq!(err, CompileError::InstructionLimit { offset: 6 });
    }

    #[test]
    fn test_zero_instruction_limit_allows_empty_program() {
        let code = compile("just a comment", Some(0)).unwrap();
        assert!(code.is_empty());
        assert!(compile("+", Some(0)).is_err());
    }

    #[test]
    fn test_compile_bytes_offsets_count_raw_bytes() {
        let err = compile_bytes(b"+\xff\xfe ]", None).unwrap_err();
        assert_eq!(err, CompileError::UnmatchedBracket { bracket: ']', offset: 4 });

        let code = compile_bytes(b"\x80+[-]\xc3", None).unwrap();
        assert_eq!(code.to_string(), "+[-]");
    }

    #[test]
    fn test_error_messages() {
        let err = CompileError::UnmatchedBracket { bracket: '[', offset: 4 };
        assert_eq!(err.to_string(), "compilation error: bracket '[' at offset 4 is unmatched");

        let err = CompileError::InstructionLimit { offset: 10 };
        assert_eq!(err.to_string(), "compilation error: instruction limit, first offending instruction at 10");
    }

    #[test]
    fn test_opcode_roundtrip_without_comments() {
        let sources = [
            "",
            "+",
            "+[->+<]>.",
            ",[.,]",
            "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.",
        ];

        for source in sources {
            assert_eq!(compile(source, None).unwrap().to_string(), source);
        }
    }
}
