//! Pipeline composition.
//!
//! Units are chained through single-slot links: a reader blocks until a
//! value is present and a writer blocks while the previous value is still
//! unconsumed. With feedback enabled, the last unit's output is linked
//! back to the first unit's input.
//!
//! ```text
//!   seed ─► [phase a] ─► [phase b] ─► ... ─► [phase z] ─► result
//!              ▲                                  │
//!              └────────── feedback only ─────────┘
//! ```

use std::collections::{HashSet, VecDeque};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use anyhow::{anyhow, bail, Context, Result};

use super::unit::{join_all, ExecutionUnit, Identity, UnitReport};
use crate::interpreter::{ContractViolation, Input, Output};
use crate::program::Program;

/// Receiving end of a link, with any values queued ahead of it.
pub struct LinkInput {
    pending: VecDeque<i64>,
    rx: Option<Receiver<i64>>,
}

impl LinkInput {
    fn new(pending: impl IntoIterator<Item = i64>, rx: Option<Receiver<i64>>) -> Self {
        Self { pending: pending.into_iter().collect(), rx }
    }
}

impl Input for LinkInput {
    fn request_input(&mut self) -> Result<i64, ContractViolation> {
        if let Some(value) = self.pending.pop_front() {
            return Ok(value);
        }
        let rx = self.rx.as_ref().ok_or(ContractViolation::InputDisconnected)?;
        rx.recv().map_err(|_| ContractViolation::InputDisconnected)
    }
}

/// Sending end of a link. Remembers the last value sent.
pub struct LinkOutput {
    tx: Option<SyncSender<i64>>,
    last: Option<i64>,
    sent: u64,
}

impl LinkOutput {
    fn new(tx: Option<SyncSender<i64>>) -> Self {
        Self { tx, last: None, sent: 0 }
    }

    /// Last value produced by the unit.
    pub fn last(&self) -> Option<i64> {
        self.last
    }

    /// Number of values produced.
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl Output for LinkOutput {
    fn deliver_output(&mut self, value: i64) -> Result<(), ContractViolation> {
        self.last = Some(value);
        self.sent += 1;
        if let Some(tx) = &self.tx {
            if tx.send(value).is_err() {
                // Downstream already stopped; keep recording the signal.
                log::debug!("link closed, dropping {}", value);
                self.tx = None;
            }
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.tx.take();
    }
}

/// A chain of units, one per phase setting.
#[derive(Debug, Clone)]
pub struct Pipeline {
    program: Program,
    phases: Vec<i64>,
    feedback: bool,
}

impl Pipeline {
    /// Linear pipeline running `program` once per phase.
    pub fn new(program: Program, phases: impl Into<Vec<i64>>) -> Self {
        Self { program, phases: phases.into(), feedback: false }
    }

    /// Link the last unit back to the first.
    pub fn with_feedback(mut self, feedback: bool) -> Self {
        self.feedback = feedback;
        self
    }

    /// Phase settings in chain order.
    pub fn phases(&self) -> &[i64] {
        &self.phases
    }

    /// Run every unit to completion and return the final unit's last output.
    pub fn run(&self, seed: i64) -> Result<i64> {
        self.validate()?;

        let count = self.phases.len();
        let (mut senders, mut receivers): (Vec<_>, Vec<_>) =
            (0..count).map(|_| sync_channel::<i64>(1)).map(|(tx, rx)| (Some(tx), Some(rx))).unzip();

        // Link k feeds unit k. Link 0 only exists with feedback.
        if !self.feedback {
            senders[0] = None;
            receivers[0] = None;
        }

        let mut handles = Vec::with_capacity(count);
        for (k, &phase) in self.phases.iter().enumerate() {
            let pending = if k == 0 { vec![phase, seed] } else { vec![phase] };
            let input = LinkInput::new(pending, receivers[k].take());
            let output = LinkOutput::new(senders[(k + 1) % count].take());

            let unit = ExecutionUnit::new(
                format!("pipeline-unit-{}", k),
                Identity::Phase(phase),
                &self.program,
                input,
                output,
            );
            handles.push(unit.spawn()?);
        }
        drop(senders);

        let reports = join_all(handles)?;

        if let Some(err) = Self::root_cause(&reports) {
            return Err(err);
        }

        let last = reports.last().ok_or_else(|| anyhow!("pipeline has no units"))?;
        let signal = last
            .output
            .last()
            .with_context(|| format!("{} halted without output", last.name))?;

        log::info!("pipeline {:?} (feedback: {}) -> {}", self.phases, self.feedback, signal);
        Ok(signal)
    }

    /// Try every permutation of `candidates` and return the best phases.
    ///
    /// Ties go to the permutation found first.
    pub fn best_phase_setting(
        program: &Program,
        candidates: &[i64],
        feedback: bool,
        seed: i64,
    ) -> Result<(Vec<i64>, i64)> {
        let mut best: Option<(Vec<i64>, i64)> = None;
        for phases in permutations(candidates) {
            let signal = Pipeline::new(program.clone(), phases.clone())
                .with_feedback(feedback)
                .run(seed)
                .with_context(|| format!("phase setting {:?}", phases))?;
            if best.as_ref().map_or(true, |(_, top)| signal > *top) {
                best = Some((phases, signal));
            }
        }
        best.ok_or_else(|| anyhow!("no candidate phases"))
    }

    fn validate(&self) -> Result<()> {
        if self.phases.is_empty() {
            bail!("pipeline needs at least one phase");
        }
        let mut seen = HashSet::new();
        for phase in &self.phases {
            if !seen.insert(phase) {
                bail!("phase {} appears more than once in {:?}", phase, self.phases);
            }
        }
        Ok(())
    }

    /// First failure that is not just a neighbour going away.
    fn root_cause(reports: &[UnitReport<LinkOutput>]) -> Option<anyhow::Error> {
        let failed: Vec<_> = reports.iter().filter(|r| !r.succeeded()).collect();
        let root = failed
            .iter()
            .find(|r| match &r.result {
                Err(err) => err.violation() != Some(&ContractViolation::InputDisconnected),
                Ok(_) => false,
            })
            .or_else(|| failed.first())?;

        for report in &failed {
            log::warn!("{} ({}) failed", report.name, report.identity);
        }

        let err = root.result.clone().err()?;
        Some(anyhow::Error::new(err).context(format!("{} ({}) failed", root.name, root.identity)))
    }
}

/// All orderings of `items`, by Heap's algorithm.
fn permutations(items: &[i64]) -> Vec<Vec<i64>> {
    let mut current = items.to_vec();
    let mut counters = vec![0usize; current.len()];
    let mut out = vec![current.clone()];

    let mut i = 1;
    while i < current.len() {
        if counters[i] < i {
            if i % 2 == 0 {
                current.swap(0, i);
            } else {
                current.swap(counters[i], i);
            }
            out.push(current.clone());
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn program(words: &[i64]) -> Program {
        Program::from(words)
    }

    const LINEAR_A: &[i64] = &[3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0];

    const FEEDBACK_A: &[i64] = &[
        3, 26, 1001, 26, -4, 26, 3, 27, 1002, 27, 2, 27, 1, 27, 26, 27, 4, 27, 1001, 28, -1, 28,
        1005, 28, 6, 99, 0, 0, 5,
    ];

    #[test]
    fn test_linear_pipeline() {
        init_logging();
        let signal = Pipeline::new(program(LINEAR_A), vec![4, 3, 2, 1, 0]).run(0).unwrap();
        assert_eq!(signal, 43210);
    }

    #[test]
    fn test_linear_pipeline_second_program() {
        init_logging();
        let words = [
            3, 23, 3, 24, 1002, 24, 10, 24, 1002, 23, -1, 23, 101, 5, 23, 23, 1, 24, 23, 23, 4, 23,
            99, 0, 0,
        ];
        let signal = Pipeline::new(program(&words), vec![0, 1, 2, 3, 4]).run(0).unwrap();
        assert_eq!(signal, 54321);
    }

    #[test]
    fn test_feedback_pipeline() {
        init_logging();
        let signal = Pipeline::new(program(FEEDBACK_A), vec![9, 8, 7, 6, 5])
            .with_feedback(true)
            .run(0)
            .unwrap();
        assert_eq!(signal, 139629729);
    }

    #[test]
    fn test_feedback_pipeline_second_program() {
        init_logging();
        let words = [
            3, 52, 1001, 52, -5, 52, 3, 53, 1, 52, 56, 54, 1007, 54, 5, 55, 1005, 55, 26, 1001, 54,
            -5, 54, 1105, 1, 12, 1, 53, 54, 53, 1008, 54, 0, 55, 1001, 55, 1, 55, 2, 53, 55, 53, 4,
            53, 1001, 56, -1, 56, 1005, 56, 6, 99, 0, 0, 0, 0, 10,
        ];
        let signal = Pipeline::new(program(&words), vec![9, 7, 8, 5, 6])
            .with_feedback(true)
            .run(0)
            .unwrap();
        assert_eq!(signal, 18216);
    }

    #[test]
    fn test_single_unit_feedback_loops_to_itself() {
        init_logging();
        // Reads phase and seed, outputs their sum, reads it back and outputs it doubled.
        let words = [3, 20, 3, 21, 1, 20, 21, 22, 4, 22, 3, 23, 1002, 23, 2, 23, 4, 23, 99];
        let signal = Pipeline::new(program(&words), vec![3]).with_feedback(true).run(4).unwrap();
        assert_eq!(signal, 14);
    }

    #[test]
    fn test_best_phase_setting() {
        init_logging();
        let (phases, signal) = Pipeline::best_phase_setting(&program(LINEAR_A), &[0, 1, 2, 3, 4], false, 0).unwrap();
        assert_eq!(phases, vec![4, 3, 2, 1, 0]);
        assert_eq!(signal, 43210);

        let (phases, signal) =
            Pipeline::best_phase_setting(&program(FEEDBACK_A), &[5, 6, 7, 8, 9], true, 0).unwrap();
        assert_eq!(phases, vec![9, 8, 7, 6, 5]);
        assert_eq!(signal, 139629729);
    }

    #[test]
    fn test_rejects_bad_phases() {
        init_logging();
        assert!(Pipeline::new(program(LINEAR_A), vec![]).run(0).is_err());

        let err = Pipeline::new(program(LINEAR_A), vec![1, 2, 1]).run(0).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_failure_unwinds_chain() {
        init_logging();
        // Every unit reads twice and then hits an unknown opcode.
        let words = [3, 10, 3, 11, 4, 11, 42, 99, 0, 0, 0, 0];
        let err = Pipeline::new(program(&words), vec![0, 1, 2])
            .with_feedback(true)
            .run(0)
            .unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.contains("unknown opcode"), "{}", message);
    }

    #[test]
    fn test_permutations() {
        init_logging();
        let perms = permutations(&[1, 2, 3]);
        assert_eq!(perms.len(), 6);
        assert_eq!(perms[0], vec![1, 2, 3]);

        let unique: HashSet<_> = perms.into_iter().collect();
        assert_eq!(unique.len(), 6);
    }
}
