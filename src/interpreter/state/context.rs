//! Execution context for one interpreter.
//!
//! The `ExecutionContext` holds everything an instruction can observe or
//! change: the program counter, the relative base and memory. Operand
//! resolution lives here too, so the execution units only see values and
//! addresses, never raw parameters.

use super::memory::{Memory, Unmapped, MAX_ADDRESS};
use crate::interpreter::decode::{Instruction, ParamMode};
use crate::interpreter::traits::AddressError;

/// Processor state of a single interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Program counter. Never negative at an instruction boundary.
    pc: i64,
    /// Base for Relative-mode parameters.
    relative_base: i64,
    /// Private copy of the program plus everything it wrote.
    pub memory: Memory,
    /// Instructions completed so far.
    pub instructions: u64,
}

impl ExecutionContext {
    /// Fresh context with `pc = 0`, `rb = 0` and memory seeded from `words`.
    pub fn new(words: &[i64]) -> Self {
        Self {
            pc: 0,
            relative_base: 0,
            memory: Memory::from_words(words),
            instructions: 0,
        }
    }

    /// Current program counter.
    #[inline]
    pub fn pc(&self) -> i64 {
        self.pc
    }

    /// Jump to `target`. Negative targets are rejected.
    pub fn set_pc(&mut self, target: i64) -> Result<(), AddressError> {
        if target < 0 {
            return Err(AddressError::Negative { address: target, pc: self.pc });
        }
        self.pc = target;
        Ok(())
    }

    /// Move past the current instruction.
    #[inline]
    pub fn advance_pc(&mut self, width: i64) {
        self.pc += width;
    }

    /// Current relative base.
    #[inline]
    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    /// Add `delta` to the relative base.
    #[inline]
    pub fn adjust_relative_base(&mut self, delta: i64) {
        self.relative_base = self.relative_base.wrapping_add(delta);
    }

    /// Read memory at an absolute address.
    pub fn read(&mut self, address: i64) -> Result<i64, AddressError> {
        let pc = self.pc;
        self.memory.read(address).map_err(|e| Self::address_error(e, address, pc))
    }

    /// Write memory at an absolute address.
    pub fn write(&mut self, address: i64, value: i64) -> Result<(), AddressError> {
        let pc = self.pc;
        self.memory.write(address, value).map_err(|e| Self::address_error(e, address, pc))
    }

    /// Fetch the word at `pc`.
    pub fn fetch(&mut self) -> Result<i64, AddressError> {
        self.read(self.pc)
    }

    /// Value of a 1-based parameter, honouring its mode.
    pub fn operand(&mut self, inst: &Instruction, param: usize) -> Result<i64, AddressError> {
        let raw = self.read(inst.pc + param as i64)?;
        match inst.mode(param).resolve_address(raw, self.relative_base) {
            Some(address) => self.read(address),
            None => Ok(raw),
        }
    }

    /// Address named by a 1-based parameter, for writes.
    ///
    /// The decoder already refused Immediate destinations, so every mode
    /// reaching this point resolves to an address. A returned address is
    /// always writable.
    pub fn target(&mut self, inst: &Instruction, param: usize) -> Result<i64, AddressError> {
        let raw = self.read(inst.pc + param as i64)?;
        let mode = match inst.mode(param) {
            ParamMode::Immediate => ParamMode::Position,
            mode => mode,
        };
        let address = mode.resolve_address(raw, self.relative_base).unwrap_or(raw);
        if address < 0 {
            return Err(AddressError::Negative { address, pc: self.pc });
        }
        if address > MAX_ADDRESS {
            return Err(AddressError::OutOfRange { address, pc: self.pc });
        }
        Ok(address)
    }

    fn address_error(reason: Unmapped, address: i64, pc: i64) -> AddressError {
        match reason {
            Unmapped::Negative => AddressError::Negative { address, pc },
            Unmapped::TooLarge => AddressError::OutOfRange { address, pc },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(word: i64) -> Instruction {
        Instruction::decode(word, 0).unwrap()
    }

    #[test]
    fn test_new_context() {
        let ctx = ExecutionContext::new(&[99]);
        assert_eq!(ctx.pc(), 0);
        assert_eq!(ctx.relative_base(), 0);
        assert_eq!(ctx.instructions, 0);
        assert_eq!(ctx.memory.cells(), &[99]);
    }

    #[test]
    fn test_operand_modes_on_fixed_snapshot() {
        // Parameter words are 4, 4, 4 for each mode combination below.
        let snapshot = [0, 4, 4, 4, 40, 50, 60, 70];

        let mut ctx = ExecutionContext::new(&snapshot);
        assert_eq!(ctx.operand(&decode(1), 1).unwrap(), 40);

        let mut ctx = ExecutionContext::new(&snapshot);
        assert_eq!(ctx.operand(&decode(101), 1).unwrap(), 4);

        let mut ctx = ExecutionContext::new(&snapshot);
        ctx.adjust_relative_base(3);
        assert_eq!(ctx.operand(&decode(201), 1).unwrap(), 70);
    }

    #[test]
    fn test_target_modes_on_fixed_snapshot() {
        let snapshot = [0, 0, 0, 6, 0, 0, 0];

        let mut ctx = ExecutionContext::new(&snapshot);
        assert_eq!(ctx.target(&decode(1), 3).unwrap(), 6);

        let mut ctx = ExecutionContext::new(&snapshot);
        ctx.adjust_relative_base(-2);
        assert_eq!(ctx.target(&decode(20001), 3).unwrap(), 4);
    }

    #[test]
    fn test_negative_target_rejected() {
        let mut ctx = ExecutionContext::new(&[20001, 0, 0, 1]);
        ctx.adjust_relative_base(-5);
        assert_eq!(
            ctx.target(&decode(20001), 3),
            Err(AddressError::Negative { address: -4, pc: 0 })
        );
    }

    #[test]
    fn test_set_pc_rejects_negative() {
        let mut ctx = ExecutionContext::new(&[99]);
        assert!(ctx.set_pc(-1).is_err());
        assert_eq!(ctx.pc(), 0);
        ctx.set_pc(12).unwrap();
        assert_eq!(ctx.pc(), 12);
    }
}
