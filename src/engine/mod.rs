//! Multi-unit execution engine.
//!
//! Runs several interpreters at once, each on its own thread, and wires
//! them together:
//!
//! - [`unit`]: one interpreter + identity + I/O wiring
//! - [`pipeline`]: linear or feedback chains over single-slot links
//!
//! # Example
//!
//! ```
//! use intcode_emu::engine::Pipeline;
//! use intcode_emu::Program;
//!
//! let program: Program = "3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0".parse().unwrap();
//! let signal = Pipeline::new(program, vec![4, 3, 2, 1, 0]).run(0).unwrap();
//! assert_eq!(signal, 43210);
//! ```

pub mod pipeline;
pub mod unit;

pub use pipeline::{LinkInput, LinkOutput, Pipeline};
pub use unit::{join_all, ExecutionUnit, Identity, UnitHandle, UnitReport};
