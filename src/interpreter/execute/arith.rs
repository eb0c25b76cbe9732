//! Arithmetic and comparison unit.
//!
//! Handles the four three-parameter operations:
//!
//! - **Add / Multiply**: wrapping 64-bit arithmetic
//! - **LessThan / Equals**: store 1 or 0

use crate::interpreter::decode::{Instruction, Opcode};
use crate::interpreter::state::ExecutionContext;
use crate::interpreter::traits::ExecError;

use super::ExecuteResult;

/// Arithmetic and comparison unit.
pub struct ArithUnit;

impl ArithUnit {
    /// Execute an arithmetic or comparison instruction.
    ///
    /// Returns `None` if the opcode belongs to another unit.
    pub fn execute(
        inst: &Instruction,
        ctx: &mut ExecutionContext,
    ) -> Option<Result<ExecuteResult, ExecError>> {
        let compute: fn(i64, i64) -> i64 = match inst.opcode {
            Opcode::Add => i64::wrapping_add,
            Opcode::Multiply => i64::wrapping_mul,
            Opcode::LessThan => |a, b| i64::from(a < b),
            Opcode::Equals => |a, b| i64::from(a == b),
            _ => return None,
        };
        Some(Self::binary(inst, ctx, compute))
    }

    fn binary(
        inst: &Instruction,
        ctx: &mut ExecutionContext,
        compute: fn(i64, i64) -> i64,
    ) -> Result<ExecuteResult, ExecError> {
        let a = ctx.operand(inst, 1)?;
        let b = ctx.operand(inst, 2)?;
        let dest = ctx.target(inst, 3)?;
        ctx.write(dest, compute(a, b))?;
        Ok(ExecuteResult::Continue)
    }
}
