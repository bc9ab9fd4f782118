use std::io::{Read, Write};
use crate::bytecode::{ByteCode, OpCode};
use crate::vm::{ExecutionContext, VMError, VMResult};

/// The tape machine executing one compiled program.
///
/// Input and output are plain byte streams; use [`NoInput`](crate::vm::NoInput)
/// and [`ClosedOutput`](crate::vm::ClosedOutput) for programs that must not
/// read or write. A VM is not meant to be shared; create one per execution.
pub struct VM<R, W> {
    code: ByteCode,
    input: R,
    output: W,
    context: ExecutionContext,
    error: Option<VMError>,
}

impl<R: Read, W: Write> VM<R, W> {
    /// Create a machine ready to run `code`.
    ///
    /// A memory limit below 1 byte finishes the machine immediately with
    /// [`VMError::MemoryLimit`].
    pub fn new(code: ByteCode, input: R, output: W, step_limit: u64, memory_limit: usize) -> Self {
        let mut vm = Self {
            code,
            input,
            output,
            context: ExecutionContext::new(step_limit, memory_limit),
            error: None,
        };
        if memory_limit < 1 {
            vm.finish(VMError::MemoryLimit);
        }
        vm
    }

    /// Whether the program completed. Steps are no-ops afterwards.
    pub fn finished(&self) -> bool {
        self.context.pc() >= self.code.len()
    }

    /// The terminal error, if the run ended with one
    pub fn error(&self) -> Option<&VMError> {
        self.error.as_ref()
    }

    /// Number of tape bytes ever used
    pub fn used_memory(&self) -> usize {
        self.context.tape().len()
    }

    pub fn remaining_steps(&self) -> u64 {
        self.context.remaining_steps()
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Step until the program finishes; returns the terminal error if any
    pub fn run(&mut self) -> VMResult<()> {
        while !self.finished() {
            // errors are retained by step() and reported below
            let _ = self.step();
        }
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Execute a single instruction.
    ///
    /// Any error terminates the program. Calling step on a finished machine
    /// returns the result of the last step again.
    pub fn step(&mut self) -> VMResult<()> {
        if self.finished() {
            return match &self.error {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            };
        }

        match self.execute() {
            Ok(()) => {
                self.context.increment_pc();
                Ok(())
            },
            Err(err) => {
                self.finish(err.clone());
                Err(err)
            },
        }
    }

    fn execute(&mut self) -> VMResult<()> {
        self.context.consume_step()?;

        let pc = self.context.pc();
        let instruction = self.code.instructions()[pc];

        match instruction.opcode {
            OpCode::Increment => self.context.increment(),
            OpCode::Decrement => self.context.decrement(),
            OpCode::Left => self.context.move_left()?,
            OpCode::Right => self.context.move_right()?,

            OpCode::Input => {
                let mut byte = [0u8; 1];
                self.input.read_exact(&mut byte)?;
                self.context.set_cell(byte[0]);
            },

            OpCode::Output => {
                self.output.write_all(&[self.context.cell()])?;
            },

            OpCode::LoopStart => {
                let target = instruction.jump_target();
                if target > pc && self.context.cell() == 0 {
                    // skip the loop body; increment lands past the ']'
                    self.context.set_pc(target);
                }
            },

            OpCode::LoopEnd => {
                let target = instruction.jump_target();
                if target < pc && self.context.cell() != 0 {
                    self.context.set_pc(target);
                }
            },
        }

        Ok(())
    }

    fn finish(&mut self, err: VMError) {
        self.error = Some(err);
        self.context.set_pc(self.code.len());
    }
}
