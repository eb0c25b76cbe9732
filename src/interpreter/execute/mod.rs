//! Execution units for Intcode operations.
//!
//! Each unit handles one category of operations:
//!
//! | Unit | Operations |
//! |------|------------|
//! | Arith | add, mul, lt, eq |
//! | Control | jnz, jz, arb, halt |
//! | I/O | in, out |
//!
//! Units read operands and write results through the
//! [`ExecutionContext`]; they never move `pc` themselves. The outcome is
//! reported as an [`ExecuteResult`] and the core applies it.

mod arith;
mod control;
mod io;

pub use arith::ArithUnit;
pub use control::ControlUnit;
pub use io::IoUnit;

use crate::interpreter::decode::Instruction;
use crate::interpreter::state::ExecutionContext;
use crate::interpreter::traits::{ExecError, Input, Output};

/// What the core should do after an instruction completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteResult {
    /// Fall through to `pc + width`.
    Continue,
    /// Set `pc` to the given target.
    Jump { target: i64 },
    /// Stop; `pc` stays on the halt instruction.
    Halt,
}

/// Dispatch a decoded instruction to the unit that owns it.
pub fn execute(
    inst: &Instruction,
    ctx: &mut ExecutionContext,
    input: &mut dyn Input,
    output: &mut dyn Output,
) -> Result<ExecuteResult, ExecError> {
    if let Some(result) = ArithUnit::execute(inst, ctx) {
        return result;
    }
    if let Some(result) = IoUnit::execute(inst, ctx, input, output) {
        return result;
    }
    if let Some(result) = ControlUnit::execute(inst, ctx) {
        return result;
    }
    // Every Opcode variant belongs to exactly one unit above.
    unreachable!("no execution unit for {}", inst.opcode)
}
