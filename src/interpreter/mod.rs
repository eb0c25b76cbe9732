//! Intcode interpreter.
//!
//! A small virtual machine over a growable memory of signed 64-bit words.
//! Every interpreter owns a private copy of its program and talks to the
//! outside world only through the [`Input`] and [`Output`] traits.
//!
//! # Architecture
//!
//! - [`traits`]: host I/O contract and error types
//! - [`decode`]: instruction word decoder
//! - [`state`]: program counter, relative base, memory
//! - [`execute`]: execution units (arith, control, I/O)
//! - [`core`]: the fetch-decode-execute loop
//!
//! # Example
//!
//! ```
//! use intcode_emu::host::{CollectOutput, QueueInput};
//! use intcode_emu::interpreter::CoreInterpreter;
//! use intcode_emu::Program;
//!
//! let program = Program::from(vec![1, 0, 0, 0, 99]);
//! let mut interpreter = CoreInterpreter::new(&program);
//! interpreter.run(&mut QueueInput::default(), &mut CollectOutput::default()).unwrap();
//! assert_eq!(interpreter.peek(0), Some(2));
//! ```

pub mod traits;
pub mod decode;
pub mod state;
pub mod execute;
pub mod core;

// Re-export key types for convenience
pub use traits::{AddressError, ContractViolation, DecodeError, ExecError, Input, Output};

// Decoder types
pub use decode::{Instruction, Opcode, ParamMode};

// State types
pub use state::{ExecutionContext, Memory};

// Core types
pub use core::{CoreInterpreter, CoreStatus, StepResult};
