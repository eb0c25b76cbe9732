//! Intcode interpreter core.
//!
//! The `CoreInterpreter` ties together the decoder and the execution units
//! to run a single program. It manages the execution loop and tracks
//! status.
//!
//! # Execution Model
//!
//! 1. Fetch the word at `pc`
//! 2. Decode it into an [`Instruction`](crate::interpreter::decode::Instruction)
//! 3. Execute it against the context and the host I/O
//! 4. Handle the result (advance `pc`, jump, or halt)
//!
//! # Example
//!
//! ```
//! use intcode_emu::host::{CollectOutput, QueueInput};
//! use intcode_emu::interpreter::CoreInterpreter;
//! use intcode_emu::Program;
//!
//! let program: Program = "3,0,4,0,99".parse().unwrap();
//! let mut interpreter = CoreInterpreter::new(&program);
//! let mut output = CollectOutput::default();
//!
//! interpreter.run(&mut QueueInput::from(vec![17]), &mut output).unwrap();
//! assert_eq!(output.last(), Some(17));
//! ```

mod interpreter;

pub use interpreter::{CoreInterpreter, CoreStatus, StepResult};
