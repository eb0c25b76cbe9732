//! Execution units.
//!
//! An execution unit is one interpreter bound to an identity and to the
//! input source and output sink that connect it to its neighbours. Units
//! run on their own named thread; the interpreter inside never yields
//! except inside an I/O call.

use std::fmt;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};

use crate::interpreter::{CoreInterpreter, ExecError, Input, Output};
use crate::program::Program;

/// What a unit is told first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Pipeline stage configured by a phase setting.
    Phase(i64),
    /// Network node at an address.
    Address(i64),
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Phase(phase) => write!(f, "phase {}", phase),
            Identity::Address(address) => write!(f, "address {}", address),
        }
    }
}

/// One interpreter plus its wiring.
pub struct ExecutionUnit<I, O> {
    name: String,
    identity: Identity,
    interpreter: CoreInterpreter,
    input: I,
    output: O,
}

/// What a unit left behind when it stopped.
#[derive(Debug)]
pub struct UnitReport<O> {
    /// Thread name of the unit.
    pub name: String,
    /// Identity the unit ran under.
    pub identity: Identity,
    /// Instructions executed, or the fatal error.
    pub result: Result<u64, ExecError>,
    /// The output sink, after `finish`.
    pub output: O,
    /// Final interpreter state.
    pub interpreter: CoreInterpreter,
}

impl<O> UnitReport<O> {
    /// True if the unit halted normally.
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

impl<I, O> ExecutionUnit<I, O>
where
    I: Input,
    O: Output,
{
    /// Bind a fresh copy of `program` to its identity and wiring.
    pub fn new(name: impl Into<String>, identity: Identity, program: &Program, input: I, output: O) -> Self {
        Self {
            name: name.into(),
            identity,
            interpreter: CoreInterpreter::new(program),
            input,
            output,
        }
    }

    /// Unit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run on the current thread until Halt or a fatal error.
    ///
    /// The input is dropped and the output finished before returning, so
    /// neighbours see the unit go away even when it failed.
    pub fn run(self) -> UnitReport<O> {
        let Self { name, identity, mut interpreter, mut input, mut output } = self;

        log::debug!("{} ({}) starting", name, identity);
        let result = interpreter.run(&mut input, &mut output);
        output.finish();
        drop(input);

        match &result {
            Ok(count) => log::debug!("{} halted after {} instructions", name, count),
            Err(err) => log::debug!("{} stopped: {}", name, err),
        }

        UnitReport { name, identity, result, output, interpreter }
    }
}

impl<I, O> ExecutionUnit<I, O>
where
    I: Input + Send + 'static,
    O: Output + Send + 'static,
{
    /// Run on a dedicated thread named after the unit.
    pub fn spawn(self) -> Result<UnitHandle<O>> {
        let name = self.name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || self.run())
            .with_context(|| format!("failed to spawn thread for {}", name))?;
        Ok(UnitHandle { name, handle })
    }
}

/// A unit running on its own thread.
pub struct UnitHandle<O> {
    name: String,
    handle: JoinHandle<UnitReport<O>>,
}

impl<O> UnitHandle<O> {
    /// Unit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the unit to stop.
    pub fn join(self) -> Result<UnitReport<O>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("{} panicked", self.name))
    }
}

/// Join every handle, in order.
///
/// All threads are waited for even when one of them panicked; the first
/// panic is reported after the last join.
pub fn join_all<O>(handles: impl IntoIterator<Item = UnitHandle<O>>) -> Result<Vec<UnitReport<O>>> {
    let mut reports = Vec::new();
    let mut first_panic = None;
    for handle in handles {
        match handle.join() {
            Ok(report) => reports.push(report),
            Err(err) => {
                log::warn!("{}", err);
                first_panic.get_or_insert(err);
            }
        }
    }
    match first_panic {
        Some(err) => Err(err),
        None => Ok(reports),
    }
}
