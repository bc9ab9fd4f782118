use rustc_hash::FxHashMap;
use crate::bytecode::{ByteCode, CompileResult};
use crate::problem::{Status, Verdict};
use crate::sandbox::ScriptChecker;
use crate::vm::VM;

/// Step budget of a tape-program checker
pub const CHECKER_STEPS: u64 = 1_000_000_000;

/// Memory budget of a tape-program checker
pub const CHECKER_MEMORY: usize = 64 * 1024 * 1024;

/// Anything that can judge one (input, output) pair
pub trait OutputChecker {
    fn check_output(&self, input: &[u8], output: &[u8]) -> Verdict;
}

/// Strategy deciding whether a submission's output is correct
#[derive(Debug, Clone)]
pub enum Checker {
    /// Expected output per known input
    List(ListChecker),
    /// Tape program fed `input 0x00 output`; any output is a failure comment
    Vm(ByteCode),
    /// Reference tape program whose output must match exactly
    Solution(VmSolution),
    /// Lua `checker`/`solution` script
    Lua(ScriptChecker),
}

impl Checker {
    /// Compile a tape-program checker
    pub fn vm(source: &str) -> CompileResult<Self> {
        Ok(Checker::Vm(ByteCode::compile(source, None)?))
    }
}

impl OutputChecker for Checker {
    fn check_output(&self, input: &[u8], output: &[u8]) -> Verdict {
        match self {
            Checker::List(list) => list.check_output(input, output),
            Checker::Vm(code) => run_tape_checker(code, input, output),
            Checker::Solution(solution) => solution.check_output(input, output),
            Checker::Lua(script) => match script.check(input, output) {
                Ok(comment) if comment.is_empty() => Verdict::accept(),
                Ok(comment) => Verdict::new(Status::WrongAnswer, comment),
                Err(err) => Verdict::new(Status::CheckerFailed, err.to_string()),
            },
        }
    }
}

fn run_tape_checker(code: &ByteCode, input: &[u8], output: &[u8]) -> Verdict {
    let mut stream = Vec::with_capacity(input.len() + output.len() + 1);
    stream.extend_from_slice(input);
    stream.push(0);
    stream.extend_from_slice(output);

    let mut vm = VM::new(code.clone(), stream.as_slice(), Vec::new(), CHECKER_STEPS, CHECKER_MEMORY);
    if let Err(err) = vm.run() {
        return Verdict::new(Status::CheckerFailed, err.to_string());
    }

    let comment = vm.into_output();
    if comment.is_empty() {
        Verdict::accept()
    } else {
        Verdict::new(Status::WrongAnswer, String::from_utf8_lossy(&comment))
    }
}

/// Table of expected outputs keyed by input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListChecker {
    answers: FxHashMap<Vec<u8>, Vec<u8>>,
}

impl ListChecker {
    pub fn new<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
    {
        Self {
            answers: answers.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn answer(&self, input: &[u8]) -> Option<&[u8]> {
        self.answers.get(input).map(Vec::as_slice)
    }

    /// Pairs ordered by input, giving a stable encoding
    pub fn sorted_pairs(&self) -> Vec<(&[u8], &[u8])> {
        let mut pairs: Vec<_> = self
            .answers
            .iter()
            .map(|(input, output)| (input.as_slice(), output.as_slice()))
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

impl OutputChecker for ListChecker {
    fn check_output(&self, input: &[u8], output: &[u8]) -> Verdict {
        match self.answer(input) {
            None => Verdict::new(Status::CheckerFailed, "checker has no answer"),
            Some(expected) if expected == output => Verdict::accept(),
            Some(_) => Verdict::from(Status::WrongAnswer),
        }
    }
}

/// Reference tape program; a submission must reproduce its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmSolution {
    code: ByteCode,
    steps: Option<u64>,
    memory: Option<usize>,
}

impl VmSolution {
    /// Zero budgets mean unlimited
    pub fn new(code: ByteCode, steps: Option<u64>, memory: Option<usize>) -> Self {
        Self {
            code,
            steps: steps.filter(|&steps| steps > 0),
            memory: memory.filter(|&memory| memory > 0),
        }
    }

    /// Compile a reference solution under an instruction cap
    pub fn compile(
        source: &str,
        instructions: Option<usize>,
        steps: Option<u64>,
        memory: Option<usize>,
    ) -> CompileResult<Self> {
        Ok(Self::new(ByteCode::compile(source, instructions)?, steps, memory))
    }

    pub fn code(&self) -> &ByteCode {
        &self.code
    }

    pub fn steps(&self) -> Option<u64> {
        self.steps
    }

    pub fn memory(&self) -> Option<usize> {
        self.memory
    }
}

impl OutputChecker for VmSolution {
    fn check_output(&self, input: &[u8], output: &[u8]) -> Verdict {
        let mut vm = VM::new(
            self.code.clone(),
            input,
            Vec::new(),
            self.steps.unwrap_or(u64::MAX),
            self.memory.unwrap_or(usize::MAX),
        );
        if let Err(err) = vm.run() {
            return Verdict::new(Status::CheckerFailed, err.to_string());
        }

        if vm.into_output() == output {
            Verdict::accept()
        } else {
            Verdict::from(Status::WrongAnswer)
        }
    }
}
