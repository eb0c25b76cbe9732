//! Interpreter state.
//!
//! | Piece | Purpose |
//! |-------|---------|
//! | `pc` | address of the next instruction word |
//! | relative base | offset for Relative-mode parameters |
//! | [`Memory`] | private, growable copy of the program |
//!
//! # Example
//!
//! ```
//! use intcode_emu::interpreter::state::ExecutionContext;
//!
//! let mut ctx = ExecutionContext::new(&[1, 0, 0, 0, 99]);
//! ctx.write(20, 42).unwrap();
//! assert_eq!(ctx.memory.len(), 21);
//! assert_eq!(ctx.read(20).unwrap(), 42);
//! ```

mod context;
mod memory;

pub use context::ExecutionContext;
pub use memory::{Memory, Unmapped, MAX_ADDRESS};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_do_not_share_memory() {
        let words = [1, 2, 3];
        let mut a = ExecutionContext::new(&words);
        let b = ExecutionContext::new(&words);

        a.write(0, 100).unwrap();

        assert_eq!(a.memory.cells()[0], 100);
        assert_eq!(b.memory.cells()[0], 1);
    }
}
