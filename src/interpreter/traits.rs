//! Host I/O contract and error types for the interpreter.
//!
//! The interpreter talks to the outside world through exactly two
//! capabilities, supplied by whoever hosts it:
//!
//! - [`Input`]: called by opcode 3 to obtain the next value
//! - [`Output`]: called by opcode 4 with each produced value
//!
//! Implementations decide the policy. A pipeline link blocks until its
//! neighbour is ready; a network card returns a `-1` sentinel instead of
//! blocking. The core never knows which one it is driving.
//!
//! # Example
//!
//! ```
//! use intcode_emu::interpreter::{ContractViolation, Input, Output};
//!
//! struct Countdown(i64);
//!
//! impl Input for Countdown {
//!     fn request_input(&mut self) -> Result<i64, ContractViolation> {
//!         self.0 -= 1;
//!         Ok(self.0)
//!     }
//! }
//!
//! struct Sum(i64);
//!
//! impl Output for Sum {
//!     fn deliver_output(&mut self, value: i64) -> Result<(), ContractViolation> {
//!         self.0 += value;
//!         Ok(())
//!     }
//! }
//! ```

use thiserror::Error;

/// Source of values for the Input instruction.
pub trait Input {
    /// Produce the next input value.
    ///
    /// May block, or may return a sentinel when nothing is ready. An
    /// `Err` aborts the requesting interpreter.
    fn request_input(&mut self) -> Result<i64, ContractViolation>;
}

/// Sink for values produced by the Output instruction.
pub trait Output {
    /// Accept one output value.
    fn deliver_output(&mut self, value: i64) -> Result<(), ContractViolation>;

    /// Called once when the owning execution unit stops, whether it halted
    /// or failed. Sinks that feed another unit release their link here.
    fn finish(&mut self) {}
}

impl<T: Input + ?Sized> Input for &mut T {
    fn request_input(&mut self) -> Result<i64, ContractViolation> {
        (**self).request_input()
    }
}

impl<T: Input + ?Sized> Input for Box<T> {
    fn request_input(&mut self) -> Result<i64, ContractViolation> {
        (**self).request_input()
    }
}

impl<T: Output + ?Sized> Output for &mut T {
    fn deliver_output(&mut self, value: i64) -> Result<(), ContractViolation> {
        (**self).deliver_output(value)
    }

    fn finish(&mut self) {
        (**self).finish()
    }
}

impl<T: Output + ?Sized> Output for Box<T> {
    fn deliver_output(&mut self, value: i64) -> Result<(), ContractViolation> {
        (**self).deliver_output(value)
    }

    fn finish(&mut self) {
        (**self).finish()
    }
}

/// Errors that can occur while decoding the instruction word at `pc`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The low two digits do not name a known operation.
    #[error("unknown opcode in word {word} at pc {pc}")]
    UnknownOpcode {
        /// The raw instruction word.
        word: i64,
        /// Program counter where decoding failed.
        pc: i64,
    },

    /// A parameter mode digit is not 0, 1 or 2.
    #[error("invalid mode for parameter {param} of word {word} at pc {pc}")]
    InvalidMode {
        /// The raw instruction word.
        word: i64,
        /// Program counter where decoding failed.
        pc: i64,
        /// 1-based parameter index.
        param: usize,
    },

    /// The destination parameter is encoded in Immediate mode.
    #[error("parameter {param} of word {word} at pc {pc} writes in immediate mode")]
    ImmediateWrite {
        /// The raw instruction word.
        word: i64,
        /// Program counter where decoding failed.
        pc: i64,
        /// 1-based parameter index.
        param: usize,
    },
}

impl DecodeError {
    /// Program counter of the offending instruction.
    pub fn pc(&self) -> i64 {
        match self {
            Self::UnknownOpcode { pc, .. }
            | Self::InvalidMode { pc, .. }
            | Self::ImmediateWrite { pc, .. } => *pc,
        }
    }
}

/// Errors raised when an operand resolves to an unusable address.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    /// Resolved address is below zero.
    #[error("negative address {address} at pc {pc}")]
    Negative {
        /// The resolved address.
        address: i64,
        /// Program counter of the instruction.
        pc: i64,
    },

    /// Resolved address is beyond the largest memory the interpreter grows to.
    #[error("address {address} at pc {pc} exceeds the memory limit")]
    OutOfRange {
        /// The resolved address.
        address: i64,
        /// Program counter of the instruction.
        pc: i64,
    },
}

/// The host I/O contract was used in a state it cannot serve.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// A scripted input source ran dry.
    #[error("input requested but no values remain")]
    InputExhausted,

    /// A blocking input's producer stopped without sending another value.
    #[error("input requested but the producer has stopped")]
    InputDisconnected,

    /// A network packet named a destination outside the network.
    #[error("packet addressed to unknown destination {dest}")]
    UnknownDestination {
        /// The destination value from the framed output.
        dest: i64,
    },

    /// The network router was torn down.
    #[error("network router has shut down")]
    RouterShutdown,
}

/// Fatal execution error. The interpreter stops at the first one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// Instruction could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Operand or jump target resolved to a bad address.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Host I/O failed.
    #[error("host contract violated at pc {pc}: {violation}")]
    Contract {
        /// Program counter of the I/O instruction.
        pc: i64,
        /// What went wrong.
        violation: ContractViolation,
    },
}

impl ExecError {
    /// The contract violation, if this error is one.
    pub fn violation(&self) -> Option<&ContractViolation> {
        match self {
            Self::Contract { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(i64);

    impl Input for Fixed {
        fn request_input(&mut self) -> Result<i64, ContractViolation> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_input_through_reference_and_box() {
        let mut fixed = Fixed(7);
        let by_ref: &mut dyn Input = &mut fixed;
        assert_eq!(by_ref.request_input(), Ok(7));

        let mut boxed: Box<dyn Input> = Box::new(Fixed(9));
        assert_eq!(boxed.request_input(), Ok(9));
    }

    #[test]
    fn test_decode_error_pc() {
        let err = DecodeError::UnknownOpcode { word: 42, pc: 12 };
        assert_eq!(err.pc(), 12);
        assert_eq!(err.to_string(), "unknown opcode in word 42 at pc 12");
    }

    #[test]
    fn test_exec_error_from_conversions() {
        let err: ExecError = AddressError::Negative { address: -3, pc: 0 }.into();
        assert!(matches!(err, ExecError::Address(_)));
        assert!(err.violation().is_none());

        let err = ExecError::Contract { pc: 4, violation: ContractViolation::InputExhausted };
        assert_eq!(err.violation(), Some(&ContractViolation::InputExhausted));
    }
}
