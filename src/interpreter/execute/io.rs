//! Host I/O unit.
//!
//! Input resolves its destination before asking the host for a value, so a
//! bad address never swallows input. Host failures are tagged with the pc
//! of the requesting instruction.

use crate::interpreter::decode::{Instruction, Opcode};
use crate::interpreter::state::ExecutionContext;
use crate::interpreter::traits::{ExecError, Input, Output};

use super::ExecuteResult;

/// Input/Output unit.
pub struct IoUnit;

impl IoUnit {
    /// Execute an I/O instruction.
    ///
    /// Returns `None` if not an I/O op.
    pub fn execute(
        inst: &Instruction,
        ctx: &mut ExecutionContext,
        input: &mut dyn Input,
        output: &mut dyn Output,
    ) -> Option<Result<ExecuteResult, ExecError>> {
        match inst.opcode {
            Opcode::Input => Some(Self::input(inst, ctx, input)),
            Opcode::Output => Some(Self::output(inst, ctx, output)),
            _ => None,
        }
    }

    fn input(
        inst: &Instruction,
        ctx: &mut ExecutionContext,
        input: &mut dyn Input,
    ) -> Result<ExecuteResult, ExecError> {
        let dest = ctx.target(inst, 1)?;
        let value = input
            .request_input()
            .map_err(|violation| ExecError::Contract { pc: inst.pc, violation })?;
        ctx.write(dest, value)?;
        log::trace!("pc {}: in {} -> [{}]", inst.pc, value, dest);
        Ok(ExecuteResult::Continue)
    }

    fn output(
        inst: &Instruction,
        ctx: &mut ExecutionContext,
        output: &mut dyn Output,
    ) -> Result<ExecuteResult, ExecError> {
        let value = ctx.operand(inst, 1)?;
        output
            .deliver_output(value)
            .map_err(|violation| ExecError::Contract { pc: inst.pc, violation })?;
        log::trace!("pc {}: out {}", inst.pc, value);
        Ok(ExecuteResult::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::traits::ContractViolation;

    struct Script(Vec<i64>);

    impl Input for Script {
        fn request_input(&mut self) -> Result<i64, ContractViolation> {
            if self.0.is_empty() {
                Err(ContractViolation::InputExhausted)
            } else {
                Ok(self.0.remove(0))
            }
        }
    }

    #[derive(Default)]
    struct Sink(Vec<i64>);

    impl Output for Sink {
        fn deliver_output(&mut self, value: i64) -> Result<(), ContractViolation> {
            self.0.push(value);
            Ok(())
        }
    }

    #[test]
    fn test_input_writes_destination() {
        let mut ctx = ExecutionContext::new(&[3, 3, 99, 0]);
        let inst = Instruction::decode(3, 0).unwrap();
        let result = IoUnit::execute(&inst, &mut ctx, &mut Script(vec![17]), &mut Sink::default());

        assert_eq!(result, Some(Ok(ExecuteResult::Continue)));
        assert_eq!(ctx.memory.cells()[3], 17);
    }

    #[test]
    fn test_relative_input() {
        let mut ctx = ExecutionContext::new(&[203, 1, 0, 0]);
        ctx.adjust_relative_base(2);
        let inst = Instruction::decode(203, 0).unwrap();
        IoUnit::execute(&inst, &mut ctx, &mut Script(vec![5]), &mut Sink::default());

        assert_eq!(ctx.memory.cells()[3], 5);
    }

    #[test]
    fn test_output_immediate() {
        let mut ctx = ExecutionContext::new(&[104, -12]);
        let inst = Instruction::decode(104, 0).unwrap();
        let mut sink = Sink::default();
        IoUnit::execute(&inst, &mut ctx, &mut Script(vec![]), &mut sink);

        assert_eq!(sink.0, vec![-12]);
    }

    #[test]
    fn test_exhausted_input_tagged_with_pc() {
        let mut ctx = ExecutionContext::new(&[0, 0, 3, 0]);
        let inst = Instruction::decode(3, 2).unwrap();
        let result = IoUnit::execute(&inst, &mut ctx, &mut Script(vec![]), &mut Sink::default());

        assert_eq!(
            result,
            Some(Err(ExecError::Contract { pc: 2, violation: ContractViolation::InputExhausted }))
        );
    }
}
