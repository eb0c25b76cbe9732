//! Instruction word decoder.
//!
//! An instruction word packs the operation in its two lowest decimal
//! digits and one addressing-mode digit per parameter above that:
//!
//! ```text
//!   1002  ->  ABCDE = 01002
//!             DE = 02  multiply
//!             C  = 0   parameter 1 in position mode
//!             B  = 1   parameter 2 in immediate mode
//!             A  = 0   parameter 3 in position mode
//! ```

use std::fmt;

use crate::interpreter::traits::DecodeError;

/// Operation selected by the low two digits of an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Multiply,
    Input,
    Output,
    JumpIfTrue,
    JumpIfFalse,
    LessThan,
    Equals,
    AdjustRelativeBase,
    Halt,
}

impl Opcode {
    /// Map a numeric opcode to an operation.
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            1 => Self::Add,
            2 => Self::Multiply,
            3 => Self::Input,
            4 => Self::Output,
            5 => Self::JumpIfTrue,
            6 => Self::JumpIfFalse,
            7 => Self::LessThan,
            8 => Self::Equals,
            9 => Self::AdjustRelativeBase,
            99 => Self::Halt,
            _ => return None,
        })
    }

    /// Numeric code of this operation.
    pub fn code(self) -> i64 {
        match self {
            Self::Add => 1,
            Self::Multiply => 2,
            Self::Input => 3,
            Self::Output => 4,
            Self::JumpIfTrue => 5,
            Self::JumpIfFalse => 6,
            Self::LessThan => 7,
            Self::Equals => 8,
            Self::AdjustRelativeBase => 9,
            Self::Halt => 99,
        }
    }

    /// Number of parameters following the instruction word.
    pub fn param_count(self) -> usize {
        match self {
            Self::Add | Self::Multiply | Self::LessThan | Self::Equals => 3,
            Self::JumpIfTrue | Self::JumpIfFalse => 2,
            Self::Input | Self::Output | Self::AdjustRelativeBase => 1,
            Self::Halt => 0,
        }
    }

    /// Distance to the next instruction when no jump is taken.
    pub fn width(self) -> i64 {
        self.param_count() as i64 + 1
    }

    /// 1-based index of the parameter this operation writes, if any.
    pub fn write_param(self) -> Option<usize> {
        match self {
            Self::Add | Self::Multiply | Self::LessThan | Self::Equals => Some(3),
            Self::Input => Some(1),
            _ => None,
        }
    }

    /// Mnemonic used in logs.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Multiply => "mul",
            Self::Input => "in",
            Self::Output => "out",
            Self::JumpIfTrue => "jnz",
            Self::JumpIfFalse => "jz",
            Self::LessThan => "lt",
            Self::Equals => "eq",
            Self::AdjustRelativeBase => "arb",
            Self::Halt => "halt",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Addressing mode of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamMode {
    /// Parameter is an address.
    #[default]
    Position,
    /// Parameter is the value itself.
    Immediate,
    /// Parameter is an offset from the relative base.
    Relative,
}

impl ParamMode {
    /// Map a mode digit to a mode.
    pub fn from_digit(digit: i64) -> Option<Self> {
        match digit {
            0 => Some(Self::Position),
            1 => Some(Self::Immediate),
            2 => Some(Self::Relative),
            _ => None,
        }
    }

    /// Effective address for a raw parameter, or `None` in Immediate mode.
    ///
    /// The result may be negative; callers reject that when they touch memory.
    #[inline]
    pub fn resolve_address(self, raw: i64, relative_base: i64) -> Option<i64> {
        match self {
            Self::Position => Some(raw),
            Self::Immediate => None,
            Self::Relative => Some(relative_base.wrapping_add(raw)),
        }
    }
}

/// A decoded instruction. Built fresh for every step, never stored in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The operation.
    pub opcode: Opcode,
    /// Modes for parameters 1..=3. Unused parameters are Position.
    pub modes: [ParamMode; 3],
    /// The raw instruction word.
    pub word: i64,
    /// Address the word was fetched from.
    pub pc: i64,
}

impl Instruction {
    /// Decode the word fetched from `pc`.
    pub fn decode(word: i64, pc: i64) -> Result<Self, DecodeError> {
        let opcode =
            Opcode::from_code(word % 100).ok_or(DecodeError::UnknownOpcode { word, pc })?;

        let mut modes = [ParamMode::Position; 3];
        let mut digits = word / 100;
        for (index, mode) in modes.iter_mut().take(opcode.param_count()).enumerate() {
            *mode = ParamMode::from_digit(digits % 10).ok_or(DecodeError::InvalidMode {
                word,
                pc,
                param: index + 1,
            })?;
            digits /= 10;
        }

        if let Some(param) = opcode.write_param() {
            if modes[param - 1] == ParamMode::Immediate {
                return Err(DecodeError::ImmediateWrite { word, pc, param });
            }
        }

        Ok(Self { opcode, modes, word, pc })
    }

    /// Mode of a 1-based parameter.
    #[inline]
    pub fn mode(&self, param: usize) -> ParamMode {
        self.modes[param - 1]
    }

    /// Operation width in words.
    #[inline]
    pub fn width(&self) -> i64 {
        self.opcode.width()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5}: {}", self.pc, self.opcode)?;
        for mode in self.modes.iter().take(self.opcode.param_count()) {
            let tag = match mode {
                ParamMode::Position => "p",
                ParamMode::Immediate => "i",
                ParamMode::Relative => "r",
            };
            write!(f, " {}", tag)?;
        }
        Ok(())
    }
}
