use crate::vm::{VMError, VMResult};

/// Mutable state of one execution: tape, head, program counter and budgets.
///
/// A context is created per run and never reused.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    tape: Vec<u8>,
    head: usize,
    pc: usize,
    remaining_steps: u64,
    memory_limit: usize,
}

impl ExecutionContext {
    pub fn new(step_limit: u64, memory_limit: usize) -> Self {
        Self {
            tape: vec![0],
            head: 0,
            pc: 0,
            remaining_steps: step_limit,
            memory_limit,
        }
    }

    /// Get the current program counter
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Set the program counter
    pub fn set_pc(&mut self, pc: usize) {
        self.pc = pc;
    }

    /// Increment the program counter
    pub fn increment_pc(&mut self) {
        self.pc += 1;
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tape(&self) -> &[u8] {
        &self.tape
    }

    pub fn remaining_steps(&self) -> u64 {
        self.remaining_steps
    }

    pub fn memory_limit(&self) -> usize {
        self.memory_limit
    }

    /// Take one unit of the step budget
    pub fn consume_step(&mut self) -> VMResult<()> {
        if self.remaining_steps == 0 {
            return Err(VMError::StepLimit);
        }
        self.remaining_steps -= 1;
        Ok(())
    }

    /// Value under the head
    pub fn cell(&self) -> u8 {
        self.tape[self.head]
    }

    pub fn set_cell(&mut self, value: u8) {
        self.tape[self.head] = value;
    }

    pub fn increment(&mut self) {
        self.tape[self.head] = self.tape[self.head].wrapping_add(1);
    }

    pub fn decrement(&mut self) {
        self.tape[self.head] = self.tape[self.head].wrapping_sub(1);
    }

    pub fn move_left(&mut self) -> VMResult<()> {
        if self.head == 0 {
            return Err(VMError::HeadUnderflow);
        }
        self.head -= 1;
        Ok(())
    }

    /// Move right, growing the tape by one zero byte when needed
    pub fn move_right(&mut self) -> VMResult<()> {
        let head = self.head + 1;
        if head >= self.memory_limit {
            return Err(VMError::MemoryLimit);
        }
        self.head = head;
        if self.tape.len() <= head {
            self.tape.push(0);
        }
        Ok(())
    }
}
