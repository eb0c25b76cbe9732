//! Control unit execution.
//!
//! Handles control flow and relative-base operations:
//!
//! - **Jump**: JumpIfTrue / JumpIfFalse on the first operand
//! - **AdjustRelativeBase**: add the operand to the relative base
//! - **Halt**: stop the interpreter

use crate::interpreter::decode::{Instruction, Opcode};
use crate::interpreter::state::ExecutionContext;
use crate::interpreter::traits::ExecError;

use super::ExecuteResult;

/// Control unit for jumps, relative base and halt.
pub struct ControlUnit;

impl ControlUnit {
    /// Execute a control operation.
    ///
    /// Returns `None` if not a control op.
    pub fn execute(
        inst: &Instruction,
        ctx: &mut ExecutionContext,
    ) -> Option<Result<ExecuteResult, ExecError>> {
        match inst.opcode {
            Opcode::JumpIfTrue => Some(Self::jump(inst, ctx, |v| v != 0)),
            Opcode::JumpIfFalse => Some(Self::jump(inst, ctx, |v| v == 0)),
            Opcode::AdjustRelativeBase => Some(Self::adjust_base(inst, ctx)),
            Opcode::Halt => Some(Ok(ExecuteResult::Halt)),
            _ => None,
        }
    }

    fn jump(
        inst: &Instruction,
        ctx: &mut ExecutionContext,
        taken: fn(i64) -> bool,
    ) -> Result<ExecuteResult, ExecError> {
        let condition = ctx.operand(inst, 1)?;
        let target = ctx.operand(inst, 2)?;
        if taken(condition) {
            Ok(ExecuteResult::Jump { target })
        } else {
            Ok(ExecuteResult::Continue)
        }
    }

    fn adjust_base(inst: &Instruction, ctx: &mut ExecutionContext) -> Result<ExecuteResult, ExecError> {
        let delta = ctx.operand(inst, 1)?;
        ctx.adjust_relative_base(delta);
        Ok(ExecuteResult::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_one(words: &[i64]) -> (ExecutionContext, Option<Result<ExecuteResult, ExecError>>) {
        let mut ctx = ExecutionContext::new(words);
        let inst = Instruction::decode(words[0], 0).unwrap();
        let result = ControlUnit::execute(&inst, &mut ctx);
        (ctx, result)
    }

    #[test]
    fn test_jump_if_true() {
        let (_, result) = run_one(&[1105, 1, 9]);
        assert_eq!(result, Some(Ok(ExecuteResult::Jump { target: 9 })));

        let (_, result) = run_one(&[1105, 0, 9]);
        assert_eq!(result, Some(Ok(ExecuteResult::Continue)));
    }

    #[test]
    fn test_jump_if_false_position() {
        // Condition at address 3 is zero, target at address 4 is 12.
        let (_, result) = run_one(&[6, 3, 4, 0, 12]);
        assert_eq!(result, Some(Ok(ExecuteResult::Jump { target: 12 })));
    }

    #[test]
    fn test_adjust_relative_base() {
        let (ctx, result) = run_one(&[109, -7]);
        assert_eq!(result, Some(Ok(ExecuteResult::Continue)));
        assert_eq!(ctx.relative_base(), -7);
    }

    #[test]
    fn test_halt() {
        let (_, result) = run_one(&[99]);
        assert_eq!(result, Some(Ok(ExecuteResult::Halt)));
    }

    #[test]
    fn test_not_control() {
        let (_, result) = run_one(&[1, 0, 0, 0]);
        assert!(result.is_none());
    }
}
