//! Problems: resource limits plus a test generator and an output checker

mod cache;
mod checker;
mod definition;
mod generator;
mod verdict;

pub use cache::{CachedGenerator, MAX_CACHEABLE};
pub use checker::{Checker, ListChecker, OutputChecker, VmSolution, CHECKER_MEMORY, CHECKER_STEPS};
pub use definition::ProblemDefinition;
pub use generator::{
    input_size, Generator, GeneratorError, GeneratorResult, InputGenerator, TestGroups, GENERATOR_MEMORY,
    GENERATOR_STEPS,
};
pub use verdict::{Status, Verdict, Verdicts};

use std::sync::Arc;
use thiserror::Error;
use crate::bytecode::CompileError;
use crate::sandbox::SandboxError;

/// Errors raised while assembling a problem
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProblemError {
    #[error("provided input generator is invalid: {0}")]
    InvalidGenerator(CompileError),

    #[error("provided output checker is invalid: {0}")]
    InvalidChecker(CompileError),

    #[error("provided solution is invalid: {0}")]
    InvalidSolution(CompileError),

    #[error("provided lua source is invalid: {0}")]
    InvalidScript(SandboxError),

    #[error("checker / solution defined multiple times")]
    ManyCheckers,

    #[error("no checker provided")]
    NoChecker,

    #[error("no input generator provided")]
    NoGenerator,
}

/// Result type for problem assembly
pub type ProblemResult<T> = Result<T, ProblemError>;

/// Resource limits of a submission. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limits {
    instructions: Option<usize>,
    steps: Option<u64>,
    memory: Option<usize>,
}

impl Limits {
    /// Build limits from raw values; zero means unlimited
    pub fn new(instructions: usize, steps: u64, memory: usize) -> Self {
        Self::unlimited()
            .with_instructions(Some(instructions))
            .with_steps(Some(steps))
            .with_memory(Some(memory))
    }

    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Maximum compiled program length
    pub fn with_instructions(mut self, instructions: Option<usize>) -> Self {
        self.instructions = instructions.filter(|&limit| limit > 0);
        self
    }

    /// Maximum executed instructions
    pub fn with_steps(mut self, steps: Option<u64>) -> Self {
        self.steps = steps.filter(|&limit| limit > 0);
        self
    }

    /// Maximum tape length in bytes
    pub fn with_memory(mut self, memory: Option<usize>) -> Self {
        self.memory = memory.filter(|&limit| limit > 0);
        self
    }

    pub fn instructions(&self) -> Option<usize> {
        self.instructions
    }

    pub fn steps(&self) -> Option<u64> {
        self.steps
    }

    pub fn memory(&self) -> Option<usize> {
        self.memory
    }

    /// Step budget handed to the VM
    pub fn step_budget(&self) -> u64 {
        self.steps.unwrap_or(u64::MAX)
    }

    /// Memory budget handed to the VM
    pub fn memory_budget(&self) -> usize {
        self.memory.unwrap_or(usize::MAX)
    }
}

/// A judgeable task.
///
/// Cloning is cheap for the checker, which is shared; the generator is
/// copied in its current state.
#[derive(Debug, Clone)]
pub struct Problem {
    limits: Limits,
    generator: CachedGenerator,
    checker: Arc<Checker>,
}

impl Problem {
    pub fn new(generator: Generator, checker: Checker, limits: Limits) -> Self {
        Self {
            limits,
            generator: CachedGenerator::new(generator),
            checker: Arc::new(checker),
        }
    }

    /// Assemble a problem from its source parts, see [`ProblemDefinition`]
    pub fn from_definition(definition: &ProblemDefinition) -> ProblemResult<Self> {
        definition.build()
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn generator(&self) -> &CachedGenerator {
        &self.generator
    }

    pub fn checker(&self) -> &Arc<Checker> {
        &self.checker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_limits_are_unlimited() {
        let limits = Limits::new(0, 0, 0);
        assert_eq!(limits, Limits::unlimited());
        assert_eq!(limits.instructions(), None);
        assert_eq!(limits.step_budget(), u64::MAX);
        assert_eq!(limits.memory_budget(), usize::MAX);
    }

    #[test]
    fn test_limits_accessors() {
        let limits = Limits::new(100, 10_000, 200);
        assert_eq!(limits.instructions(), Some(100));
        assert_eq!(limits.steps(), Some(10_000));
        assert_eq!(limits.memory(), Some(200));
        assert_eq!(limits.step_budget(), 10_000);
        assert_eq!(limits.memory_budget(), 200);

        let limits = limits.with_steps(None).with_memory(Some(0));
        assert_eq!(limits.steps(), None);
        assert_eq!(limits.memory(), None);
    }

    #[test]
    fn test_problem_clone_shares_checker() {
        let problem = Problem::new(
            Generator::List(vec![vec![b"a".to_vec()]]),
            Checker::List(ListChecker::new(vec![(b"a".to_vec(), b"a".to_vec())])),
            Limits::unlimited(),
        );
        let copy = problem.clone();
        assert!(Arc::ptr_eq(problem.checker(), copy.checker()));
        assert_eq!(copy.generator().snapshot(), problem.generator().snapshot());
    }
}
