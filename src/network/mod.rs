//! Network composition.
//!
//! Runs one unit per address behind a shared [`Router`]. Every unit first
//! reads its own address, then polls for packets and sends framed
//! `(destination, x, y)` triplets. Packets addressed to the monitor
//! address land in the NAT register; when the whole network goes idle the
//! [`IdleMonitor`] re-injects the NAT packet into address 0. The run ends
//! once two consecutive re-injections repeat.
//!
//! # Example
//!
//! ```no_run
//! use intcode_emu::network::{Network, NetworkConfig};
//! use intcode_emu::Program;
//!
//! let program: Program = std::fs::read_to_string("network.txt")?.parse()?;
//! let outcome = Network::new(program, NetworkConfig::default()).run()?;
//! // or Network::configured(program) to honour intcode-emu.toml and INTCODE_* variables
//! println!("first NAT y = {:?}", outcome.first_nat.map(|p| p.y));
//! println!("repeated y  = {}", outcome.repeated.y);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod monitor;
pub mod nic;
pub mod router;

pub use monitor::{IdleMonitor, MonitorEvent, RepeatMatch};
pub use nic::{NicInput, NicOutput, NO_PACKET};
pub use router::{Packet, Router};

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};

use crate::config::Config;
use crate::engine::{join_all, ExecutionUnit, Identity, UnitReport};
use crate::interpreter::{ContractViolation, ExecError};
use crate::program::Program;

/// Network run parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Number of addresses, `0..size`.
    pub size: usize,
    /// Destination captured by the NAT.
    pub monitor_address: i64,
    /// Consecutive empty polls before a mailbox counts as idle.
    pub idle_threshold: u64,
    /// Sleep after an empty poll.
    pub poll_backoff: Duration,
    /// Pause between monitor scans.
    pub monitor_interval: Duration,
    /// Upper bound on a whole run.
    pub timeout: Duration,
    /// Repetition rule for NAT deliveries.
    pub repeat_match: RepeatMatch,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            size: 50,
            monitor_address: 255,
            idle_threshold: 2,
            poll_backoff: Duration::from_micros(50),
            monitor_interval: Duration::from_millis(1),
            timeout: Duration::from_secs(30),
            repeat_match: RepeatMatch::Y,
        }
    }
}

/// A unit that stopped for a reason other than shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub address: i64,
    pub error: ExecError,
}

/// Result of a network run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkOutcome {
    /// First packet ever sent to the monitor address.
    pub first_nat: Option<Packet>,
    /// The delivery that repeated its predecessor.
    pub repeated: Packet,
    /// Every NAT delivery to address 0, in order.
    pub deliveries: Vec<Packet>,
    /// Units that failed while the network kept running.
    pub failures: Vec<UnitFailure>,
}

/// A network of identical units.
#[derive(Debug, Clone)]
pub struct Network {
    program: Program,
    config: NetworkConfig,
}

impl Network {
    pub fn new(program: Program, config: NetworkConfig) -> Self {
        Self { program, config }
    }

    /// Network using the layered file/environment configuration.
    pub fn configured(program: Program) -> Self {
        Self::new(program, Config::get().network_config())
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Run until the NAT repeats, then shut down and join every unit.
    pub fn run(&self) -> Result<NetworkOutcome> {
        self.validate()?;
        let config = &self.config;
        let router = Arc::new(Router::new(config.size, config.monitor_address));

        let mut handles = Vec::with_capacity(config.size);
        for address in 0..config.size as i64 {
            let unit = ExecutionUnit::new(
                format!("nic-{}", address),
                Identity::Address(address),
                &self.program,
                NicInput::new(address, Arc::clone(&router), config.poll_backoff),
                NicOutput::new(address, Arc::clone(&router)),
            );
            match unit.spawn() {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    router.shutdown();
                    let _ = join_all(handles);
                    return Err(err);
                }
            }
        }
        log::debug!("network of {} units started", config.size);

        let mut monitor = IdleMonitor::new(Arc::clone(&router), config.idle_threshold, config.repeat_match);
        let watched = Self::watch(&router, &mut monitor, config);

        router.shutdown();
        let mut failures = Vec::new();
        for report in join_all(handles)? {
            if let Some(failure) = Self::failure(report) {
                log::warn!("address {} failed: {}", failure.address, failure.error);
                failures.push(failure);
            }
        }

        let repeated = watched?;
        let outcome = NetworkOutcome {
            first_nat: router.first_nat(),
            repeated,
            deliveries: monitor.into_deliveries(),
            failures,
        };
        log::info!(
            "network done: first NAT {:?}, repeated {} after {} deliveries",
            outcome.first_nat,
            outcome.repeated,
            outcome.deliveries.len()
        );
        Ok(outcome)
    }

    fn watch(router: &Router, monitor: &mut IdleMonitor, config: &NetworkConfig) -> Result<Packet> {
        let deadline = Instant::now() + config.timeout;
        loop {
            if let MonitorEvent::Repeated(packet) = monitor.poll() {
                return Ok(packet);
            }
            if router.live_count() == 0 {
                bail!("every unit stopped before the NAT repeated");
            }
            if Instant::now() >= deadline {
                return Err(anyhow!(
                    "network timed out after {:?} with {} deliveries",
                    config.timeout,
                    monitor.deliveries().len()
                ));
            }
            thread::sleep(config.monitor_interval);
        }
    }

    fn failure(report: UnitReport<NicOutput>) -> Option<UnitFailure> {
        let error = report.result.err()?;
        if error.violation() == Some(&ContractViolation::RouterShutdown) {
            return None;
        }
        let address = match report.identity {
            Identity::Address(address) => address,
            Identity::Phase(_) => return None,
        };
        Some(UnitFailure { address, error })
    }

    fn validate(&self) -> Result<()> {
        let config = &self.config;
        if config.size == 0 {
            bail!("network needs at least one address");
        }
        if (0..config.size as i64).contains(&config.monitor_address) {
            bail!(
                "monitor address {} collides with a unit address (size {})",
                config.monitor_address,
                config.size
            );
        }
        Ok(())
    }
}
