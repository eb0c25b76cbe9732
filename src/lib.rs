//! intcode-emu library
//!
//! An Intcode interpreter plus the machinery to run many of them at once:
//! linear and feedback pipelines over single-slot links, and addressed
//! networks with a NAT and idle detection.
//!
//! - [`program`]: text loader
//! - [`interpreter`]: the virtual machine and its host I/O contract
//! - [`host`]: stock input/output adapters
//! - [`engine`]: execution units and pipelines
//! - [`network`]: router, network cards and idle monitor
//! - [`config`]: layered TOML/environment configuration

pub mod config;
pub mod engine;
pub mod host;
pub mod interpreter;
pub mod network;
pub mod program;

pub use engine::Pipeline;
pub use interpreter::{CoreInterpreter, ExecError, Input, Output};
pub use network::{Network, NetworkConfig, NetworkOutcome};
pub use program::Program;
