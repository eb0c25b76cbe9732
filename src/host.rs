//! Stock host adapters.
//!
//! Ready-made [`Input`] and [`Output`] implementations for driving a single
//! interpreter without writing a peripheral by hand:
//!
//! | Adapter | Behaviour |
//! |---------|-----------|
//! | [`QueueInput`] | scripted FIFO, fails when empty |
//! | [`CollectOutput`] | records every value |
//! | [`FnInput`] / [`FnOutput`] | closure-backed peripherals |
//!
//! # Example
//!
//! ```
//! use intcode_emu::host;
//! use intcode_emu::Program;
//!
//! let program: Program = "3,0,4,0,99".parse().unwrap();
//! assert_eq!(host::run_program(&program, &[5]).unwrap(), vec![5]);
//! ```

use std::collections::VecDeque;

use crate::interpreter::{ContractViolation, CoreInterpreter, ExecError, Input, Output};
use crate::program::Program;

/// Scripted input. Requests past the end fail with
/// [`ContractViolation::InputExhausted`].
#[derive(Debug, Clone, Default)]
pub struct QueueInput {
    values: VecDeque<i64>,
}

impl QueueInput {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one value.
    pub fn push(&mut self, value: i64) {
        self.values.push_back(value);
    }

    /// Append a line of ASCII text followed by a newline.
    pub fn push_line(&mut self, line: &str) {
        self.values.extend(line.bytes().map(i64::from));
        self.values.push_back(i64::from(b'\n'));
    }

    /// Values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl From<Vec<i64>> for QueueInput {
    fn from(values: Vec<i64>) -> Self {
        Self { values: values.into() }
    }
}

impl FromIterator<i64> for QueueInput {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

impl Input for QueueInput {
    fn request_input(&mut self) -> Result<i64, ContractViolation> {
        self.values.pop_front().ok_or(ContractViolation::InputExhausted)
    }
}

/// Records every output value in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectOutput {
    values: Vec<i64>,
}

impl CollectOutput {
    /// All values so far.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Consume the sink, returning its values.
    pub fn into_values(self) -> Vec<i64> {
        self.values
    }

    /// Most recent value.
    pub fn last(&self) -> Option<i64> {
        self.values.last().copied()
    }

    /// Render the ASCII values as text, skipping anything outside 0..=127.
    pub fn to_ascii(&self) -> String {
        self.values
            .iter()
            .filter_map(|&v| u8::try_from(v).ok().filter(u8::is_ascii))
            .map(char::from)
            .collect()
    }

    /// Last value that is not an ASCII code.
    ///
    /// Terminal programs print their answer this way after the text.
    pub fn non_ascii(&self) -> Option<i64> {
        self.values.iter().rev().copied().find(|&v| !(0..=127).contains(&v))
    }
}

impl Output for CollectOutput {
    fn deliver_output(&mut self, value: i64) -> Result<(), ContractViolation> {
        self.values.push(value);
        Ok(())
    }
}

/// Input backed by a closure. `None` means the source is exhausted.
pub struct FnInput<F>(pub F);

impl<F> Input for FnInput<F>
where
    F: FnMut() -> Option<i64>,
{
    fn request_input(&mut self) -> Result<i64, ContractViolation> {
        (self.0)().ok_or(ContractViolation::InputExhausted)
    }
}

/// Output backed by a closure.
pub struct FnOutput<F>(pub F);

impl<F> Output for FnOutput<F>
where
    F: FnMut(i64),
{
    fn deliver_output(&mut self, value: i64) -> Result<(), ContractViolation> {
        (self.0)(value);
        Ok(())
    }
}

/// Run `program` to completion on the given inputs and return its outputs.
pub fn run_program(program: &Program, inputs: &[i64]) -> Result<Vec<i64>, ExecError> {
    let mut interpreter = CoreInterpreter::new(program);
    let mut input = QueueInput::from(inputs.to_vec());
    let mut output = CollectOutput::default();
    interpreter.run(&mut input, &mut output)?;
    Ok(output.into_values())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_input_order_and_exhaustion() {
        let mut input: QueueInput = [1, 2].into_iter().collect();
        input.push(3);
        assert_eq!(input.remaining(), 3);
        assert_eq!(input.request_input(), Ok(1));
        assert_eq!(input.request_input(), Ok(2));
        assert_eq!(input.request_input(), Ok(3));
        assert_eq!(input.request_input(), Err(ContractViolation::InputExhausted));
    }

    #[test]
    fn test_push_line() {
        let mut input = QueueInput::new();
        input.push_line("NOT A J");
        let codes: Vec<i64> = std::iter::from_fn(|| input.request_input().ok()).collect();
        assert_eq!(codes, vec![78, 79, 84, 32, 65, 32, 74, 10]);
    }

    #[test]
    fn test_ascii_rendering() {
        let mut output = CollectOutput::default();
        for v in [b'o' as i64, b'k' as i64, 10, 19_352_638] {
            output.deliver_output(v).unwrap();
        }
        assert_eq!(output.to_ascii(), "ok\n");
        assert_eq!(output.non_ascii(), Some(19_352_638));
        assert_eq!(output.last(), Some(19_352_638));
    }

    #[test]
    fn test_closure_peripherals() {
        // Echo each input doubled until the source runs dry.
        let program = Program::from(vec![3, 11, 1002, 11, 2, 11, 4, 11, 1105, 1, 0]);
        let mut source = vec![4, 5].into_iter();
        let mut seen = Vec::new();

        let mut interpreter = CoreInterpreter::new(&program);
        let result = interpreter.run(&mut FnInput(|| source.next()), &mut FnOutput(|v| seen.push(v)));

        assert_eq!(seen, vec![8, 10]);
        assert_eq!(
            result.unwrap_err().violation(),
            Some(&ContractViolation::InputExhausted)
        );
    }

    #[test]
    fn test_run_program() {
        let program = Program::from(vec![3, 0, 4, 0, 99]);
        assert_eq!(run_program(&program, &[-7]).unwrap(), vec![-7]);
        assert!(run_program(&program, &[]).is_err());
    }
}
