//! Core interpreter implementation.
//!
//! The interpreter manages the fetch-decode-execute loop for a single
//! Intcode program.

use crate::interpreter::decode::Instruction;
use crate::interpreter::execute::{self, ExecuteResult};
use crate::interpreter::state::{ExecutionContext, Memory};
use crate::interpreter::traits::{AddressError, ExecError, Input, Output};
use crate::program::Program;

/// Interpreter status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoreStatus {
    /// Ready to execute the instruction at `pc`.
    #[default]
    Ready,
    /// Executed Halt (normal termination).
    Halted,
    /// Stopped on a fatal error.
    Faulted,
}

/// Result of a single successful step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Continue with the next instruction.
    Continue,
    /// Program halted.
    Halt,
}

/// Intcode interpreter.
///
/// Owns a private copy of the program. Input and output are borrowed per
/// call, so the same interpreter can be driven by different hosts between
/// steps.
#[derive(Debug, Clone)]
pub struct CoreInterpreter {
    /// Processor state and memory.
    ctx: ExecutionContext,
    /// Current status.
    status: CoreStatus,
    /// Error that stopped the interpreter, if any.
    fault: Option<ExecError>,
    /// Last decoded instruction (for debugging).
    last_instruction: Option<Instruction>,
}

impl CoreInterpreter {
    /// Create an interpreter with a deep copy of `program`.
    pub fn new(program: &Program) -> Self {
        Self {
            ctx: ExecutionContext::new(program.words()),
            status: CoreStatus::Ready,
            fault: None,
            last_instruction: None,
        }
    }

    /// Overwrite a memory cell before running.
    pub fn patch(&mut self, address: i64, value: i64) -> Result<(), AddressError> {
        self.ctx.write(address, value)
    }

    /// Read a memory cell without growing memory.
    ///
    /// Cells past the end read as zero; `None` for unmappable addresses.
    pub fn peek(&self, address: i64) -> Option<i64> {
        self.ctx.memory.peek(address)
    }

    /// Current memory image.
    pub fn memory(&self) -> &Memory {
        &self.ctx.memory
    }

    /// Processor state.
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Get the current status.
    pub fn status(&self) -> CoreStatus {
        self.status
    }

    /// Check if the interpreter halted.
    pub fn is_halted(&self) -> bool {
        self.status == CoreStatus::Halted
    }

    /// Error that stopped the interpreter, if it faulted.
    pub fn fault(&self) -> Option<&ExecError> {
        self.fault.as_ref()
    }

    /// Get the last decoded instruction (for debugging).
    pub fn last_instruction(&self) -> Option<&Instruction> {
        self.last_instruction.as_ref()
    }

    /// Execute exactly one instruction.
    ///
    /// A halted interpreter keeps returning [`StepResult::Halt`]; a faulted
    /// one keeps returning its error.
    pub fn step<I, O>(&mut self, input: &mut I, output: &mut O) -> Result<StepResult, ExecError>
    where
        I: Input + ?Sized,
        O: Output + ?Sized,
    {
        match self.status {
            CoreStatus::Halted => return Ok(StepResult::Halt),
            CoreStatus::Faulted => {
                if let Some(err) = &self.fault {
                    return Err(err.clone());
                }
            }
            CoreStatus::Ready => {}
        }

        match self.execute_one(input, output) {
            Ok(result) => Ok(result),
            Err(err) => {
                log::debug!("interpreter faulted: {}", err);
                self.status = CoreStatus::Faulted;
                self.fault = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Run until Halt or the first fatal error.
    ///
    /// Returns the number of instructions executed by this call.
    pub fn run<I, O>(&mut self, input: &mut I, output: &mut O) -> Result<u64, ExecError>
    where
        I: Input + ?Sized,
        O: Output + ?Sized,
    {
        let start = self.ctx.instructions;
        while self.step(input, output)? == StepResult::Continue {}
        Ok(self.ctx.instructions - start)
    }

    fn execute_one<I, O>(&mut self, mut input: &mut I, mut output: &mut O) -> Result<StepResult, ExecError>
    where
        I: Input + ?Sized,
        O: Output + ?Sized,
    {
        let pc = self.ctx.pc();
        let word = self.ctx.fetch()?;
        let inst = Instruction::decode(word, pc)?;
        log::trace!("{}", inst);
        self.last_instruction = Some(inst);

        let result = match execute::execute(&inst, &mut self.ctx, &mut input, &mut output)? {
            ExecuteResult::Continue => {
                self.ctx.advance_pc(inst.width());
                StepResult::Continue
            }
            ExecuteResult::Jump { target } => {
                self.ctx.set_pc(target)?;
                StepResult::Continue
            }
            ExecuteResult::Halt => {
                self.status = CoreStatus::Halted;
                StepResult::Halt
            }
        };
        self.ctx.instructions += 1;
        Ok(result)
    }
}
