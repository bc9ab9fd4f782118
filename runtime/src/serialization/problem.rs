//! Problem wire format, version 1:
//!
//! ```text
//! varint version
//! varint instructions   0 = unlimited
//! varint memory         0 = unlimited
//! varint steps          0 = unlimited
//! generator             varint tag + payload
//! checker               varint tag + payload
//! ```

use crate::bytecode::ByteCode;
use crate::problem::{Checker, Generator, Limits, ListChecker, Problem, TestGroups, VmSolution};
use crate::sandbox::{SandboxLimits, ScriptChecker, ScriptGenerator};
use crate::serialization::wire::{Decoder, WireWrite};
use crate::serialization::{DecodeError, DecodeResult, MAX_GENERATOR_DEPTH, WIRE_FORMAT_V1};

const GENERATOR_LIST: u64 = 1;
const GENERATOR_VM: u64 = 2;
const GENERATOR_LUA: u64 = 3;
const GENERATOR_COMBINED: u64 = 4;

const CHECKER_LIST: u64 = 1;
const CHECKER_VM: u64 = 2;
const CHECKER_SOLUTION: u64 = 3;
const CHECKER_LUA: u64 = 4;

impl Problem {
    /// Encode into a fresh buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }

    /// Append the binary form to `buf`. The generator is stored in its
    /// current, possibly cached, state.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        let limits = self.limits();
        buf.put_uvarint(WIRE_FORMAT_V1);
        buf.put_uvarint(limits.instructions().unwrap_or(0) as u64);
        buf.put_uvarint(limits.memory().unwrap_or(0) as u64);
        buf.put_uvarint(limits.steps().unwrap_or(0));

        encode_generator(&self.generator().snapshot(), buf);
        encode_checker(self.checker(), buf);
    }

    /// Decode a buffer holding exactly one problem.
    ///
    /// Lua sources are validated again and run with default sandbox limits.
    pub fn from_bytes(data: &[u8]) -> DecodeResult<Self> {
        Self::from_bytes_with(data, SandboxLimits::default())
    }

    /// Decode, attaching `sandbox` limits to every Lua part
    pub fn from_bytes_with(data: &[u8], sandbox: SandboxLimits) -> DecodeResult<Self> {
        let mut decoder = Decoder::new(data);

        let version = decoder.read_uvarint()?;
        if version != WIRE_FORMAT_V1 {
            return Err(DecodeError::UnsupportedVersion(version));
        }

        let instructions = decoder.read_usize()?;
        let memory = decoder.read_usize()?;
        let steps = decoder.read_uvarint()?;
        let limits = Limits::new(instructions, steps, memory);

        let generator = decode_generator(&mut decoder, sandbox, 0)?;
        let checker = decode_checker(&mut decoder, sandbox)?;
        decoder.finish()?;

        Ok(Problem::new(generator, checker, limits))
    }
}

fn encode_generator(generator: &Generator, buf: &mut Vec<u8>) {
    match generator {
        Generator::List(groups) => {
            buf.put_uvarint(GENERATOR_LIST);
            buf.put_uvarint(groups.len() as u64);
            for group in groups {
                buf.put_uvarint(group.len() as u64);
                for test in group {
                    buf.put_bytes(test);
                }
            }
        },
        Generator::Vm(code) => {
            buf.put_uvarint(GENERATOR_VM);
            code.encode(buf);
        },
        Generator::Lua(script) => {
            buf.put_uvarint(GENERATOR_LUA);
            buf.put_bytes(script.source().as_bytes());
        },
        Generator::Combined(generators) => {
            buf.put_uvarint(GENERATOR_COMBINED);
            buf.put_uvarint(generators.len() as u64);
            for generator in generators {
                encode_generator(generator, buf);
            }
        },
    }
}

fn decode_generator(decoder: &mut Decoder<'_>, sandbox: SandboxLimits, depth: usize) -> DecodeResult<Generator> {
    if depth > MAX_GENERATOR_DEPTH {
        return Err(DecodeError::TooDeep(MAX_GENERATOR_DEPTH));
    }

    match decoder.read_uvarint()? {
        GENERATOR_LIST => {
            // capacity capped by the bytes left
            let group_count = decoder.read_usize()?;
            let mut groups: TestGroups = Vec::with_capacity(group_count.min(decoder.remaining()));
            for _ in 0..group_count {
                let test_count = decoder.read_usize()?;
                let mut group = Vec::with_capacity(test_count.min(decoder.remaining()));
                for _ in 0..test_count {
                    group.push(decoder.read_bytes()?.to_vec());
                }
                groups.push(group);
            }
            Ok(Generator::List(groups))
        },
        GENERATOR_VM => Ok(Generator::Vm(ByteCode::decode(decoder)?)),
        GENERATOR_LUA => {
            let source = decoder.read_text()?;
            Ok(Generator::Lua(ScriptGenerator::new(source, sandbox)))
        },
        GENERATOR_COMBINED => {
            let count = decoder.read_usize()?;
            let mut generators = Vec::with_capacity(count.min(decoder.remaining()));
            for _ in 0..count {
                generators.push(decode_generator(decoder, sandbox, depth + 1)?);
            }
            Ok(Generator::Combined(generators))
        },
        tag => Err(DecodeError::UnknownVariant { kind: "generator", tag }),
    }
}

fn encode_checker(checker: &Checker, buf: &mut Vec<u8>) {
    match checker {
        Checker::List(list) => {
            buf.put_uvarint(CHECKER_LIST);
            let pairs = list.sorted_pairs();
            buf.put_uvarint(pairs.len() as u64);
            for (input, output) in pairs {
                buf.put_bytes(input);
                buf.put_bytes(output);
            }
        },
        Checker::Vm(code) => {
            buf.put_uvarint(CHECKER_VM);
            code.encode(buf);
        },
        Checker::Solution(solution) => {
            buf.put_uvarint(CHECKER_SOLUTION);
            solution.code().encode(buf);
            buf.put_uvarint(solution.steps().unwrap_or(0));
            buf.put_uvarint(solution.memory().unwrap_or(0) as u64);
        },
        Checker::Lua(script) => {
            buf.put_uvarint(CHECKER_LUA);
            buf.put_bytes(script.source().as_bytes());
        },
    }
}

fn decode_checker(decoder: &mut Decoder<'_>, sandbox: SandboxLimits) -> DecodeResult<Checker> {
    match decoder.read_uvarint()? {
        CHECKER_LIST => {
            let count = decoder.read_usize()?;
            let mut pairs = Vec::with_capacity(count.min(decoder.remaining()));
            for _ in 0..count {
                let input = decoder.read_bytes()?.to_vec();
                let output = decoder.read_bytes()?.to_vec();
                pairs.push((input, output));
            }
            Ok(Checker::List(ListChecker::new(pairs)))
        },
        CHECKER_VM => Ok(Checker::Vm(ByteCode::decode(decoder)?)),
        CHECKER_SOLUTION => {
            let code = ByteCode::decode(decoder)?;
            let steps = decoder.read_uvarint()?;
            let memory = decoder.read_usize()?;
            Ok(Checker::Solution(VmSolution::new(code, Some(steps), Some(memory))))
        },
        CHECKER_LUA => {
            let source = decoder.read_text()?;
            Ok(Checker::Lua(ScriptChecker::new(source, sandbox)?))
        },
        tag => Err(DecodeError::UnknownVariant { kind: "checker", tag }),
    }
}
