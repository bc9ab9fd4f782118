use std::io::{self, Write};
use thiserror::Error;
use crate::bytecode::{ByteCode, CompileResult};
use crate::sandbox::{SandboxError, SandboxLimits, ScriptGenerator};
use crate::vm::{NoInput, VMError, VM};

/// Test inputs: groups of tests, each test a byte string
pub type TestGroups = Vec<Vec<Vec<u8>>>;

/// Step budget of a tape-program generator
pub const GENERATOR_STEPS: u64 = 1_000_000_000;

/// Memory budget of a tape-program generator
pub const GENERATOR_MEMORY: usize = 64 * 1024 * 1024;

/// Errors produced while generating test data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error(transparent)]
    Vm(#[from] VMError),

    #[error("{0}")]
    Protocol(&'static str),

    #[error(transparent)]
    Script(#[from] SandboxError),
}

/// Result type for generator operations
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Anything that can produce grouped test inputs
pub trait InputGenerator {
    fn generate_input(&self) -> GeneratorResult<TestGroups>;
}

/// Source of test inputs for a problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generator {
    /// Fixed table of tests
    List(TestGroups),
    /// Tape program writing delimited tests to its output
    Vm(ByteCode),
    /// Lua script defining `test_data`
    Lua(ScriptGenerator),
    /// Groups of several generators, in order
    Combined(Vec<Generator>),
}

impl Generator {
    /// Compile a tape-program generator
    pub fn vm(source: &str) -> CompileResult<Self> {
        Ok(Generator::Vm(ByteCode::compile(source, None)?))
    }

    pub fn lua(source: &str, limits: SandboxLimits) -> Self {
        Generator::Lua(ScriptGenerator::new(source, limits))
    }

    /// Merge generators; a single generator is returned unchanged
    pub fn combine(mut generators: Vec<Generator>) -> Self {
        if generators.len() == 1 {
            return generators.remove(0);
        }
        Generator::Combined(generators)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Generator::List(_))
    }
}

impl InputGenerator for Generator {
    fn generate_input(&self) -> GeneratorResult<TestGroups> {
        match self {
            Generator::List(groups) => Ok(groups.clone()),
            Generator::Vm(code) => run_tape_generator(code),
            Generator::Lua(script) => Ok(script.generate()?),
            Generator::Combined(generators) => {
                let mut groups = Vec::new();
                for generator in generators {
                    groups.extend(generator.generate_input()?);
                }
                Ok(groups)
            },
        }
    }
}

/// Total number of input bytes across all tests
pub fn input_size(groups: &TestGroups) -> usize {
    groups.iter().flatten().map(Vec::len).sum()
}

fn run_tape_generator(code: &ByteCode) -> GeneratorResult<TestGroups> {
    let mut vm = VM::new(code.clone(), NoInput, TestSplitter::default(), GENERATOR_STEPS, GENERATOR_MEMORY);
    vm.run()?;
    vm.into_output().finish()
}

/// Splits a generator's output stream into groups and tests.
///
/// The first byte written is the group delimiter, the second the test
/// delimiter; the two must differ.
#[derive(Debug, Default)]
struct TestSplitter {
    written: usize,
    group_delimiter: u8,
    test_delimiter: u8,
    groups: TestGroups,
    group: Vec<Vec<u8>>,
    test: Vec<u8>,
}

impl TestSplitter {
    fn push(&mut self, byte: u8) -> io::Result<()> {
        let offset = self.written;
        self.written += 1;

        match offset {
            0 => {
                self.group_delimiter = byte;
                return Ok(());
            },
            1 => {
                if byte == self.group_delimiter {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "test delimiter and group delimiters must be different",
                    ));
                }
                self.test_delimiter = byte;
                return Ok(());
            },
            _ => {},
        }

        if byte != self.test_delimiter && byte != self.group_delimiter {
            self.test.push(byte);
            return Ok(());
        }

        self.group.push(std::mem::take(&mut self.test));
        if byte == self.group_delimiter {
            self.groups.push(std::mem::take(&mut self.group));
        }
        Ok(())
    }

    /// Flush the unterminated tail and return every group
    fn finish(mut self) -> GeneratorResult<TestGroups> {
        if self.written <= 1 {
            return Err(GeneratorError::Protocol("test header not found (expected at least 2 bytes)"));
        }

        if !self.test.is_empty() {
            self.group.push(std::mem::take(&mut self.test));
        }
        if !self.group.is_empty() {
            self.groups.push(std::mem::take(&mut self.group));
        }
        Ok(self.groups)
    }
}

impl Write for TestSplitter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            self.push(byte)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
