//! Instruction decoder.
//!
//! Turns the integer at `pc` into an [`Instruction`]: the [`Opcode`] and
//! one [`ParamMode`] per parameter. Decoding never touches memory beyond
//! the word itself, so a decode failure cannot corrupt state.
//!
//! # Example
//!
//! ```
//! use intcode_emu::interpreter::decode::{Instruction, Opcode, ParamMode};
//!
//! let inst = Instruction::decode(1002, 0).unwrap();
//! assert_eq!(inst.opcode, Opcode::Multiply);
//! assert_eq!(inst.mode(2), ParamMode::Immediate);
//! ```

mod decoder;

pub use decoder::{Instruction, Opcode, ParamMode};
