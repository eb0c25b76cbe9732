//! Packet router shared by every network unit.
//!
//! Each address owns a mailbox: an unbounded FIFO of packets plus a
//! counter of consecutive empty polls. One extra register, the NAT, holds
//! the latest packet sent to the monitor address.
//!
//! ```text
//!   nic 0 ──┐                 ┌──► mailbox 0
//!   nic 1 ──┼──► route(dest) ─┼──► mailbox 1
//!   ...     │                 ├──► ...
//!   nic n ──┘                 └──► NAT (dest == monitor)
//! ```
//!
//! Locks are held only for a single enqueue, dequeue or NAT access.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::interpreter::ContractViolation;

/// Two-value network payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packet {
    pub x: i64,
    pub y: i64,
}

impl Packet {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Default)]
struct Mailbox {
    packets: VecDeque<Packet>,
    /// Consecutive polls that found the queue empty.
    idle: u64,
    /// Unit has stopped; excluded from idle accounting.
    retired: bool,
}

/// Address-indexed mailboxes plus the NAT register.
#[derive(Debug)]
pub struct Router {
    mailboxes: Vec<Mutex<Mailbox>>,
    monitor_address: i64,
    nat: Mutex<Option<Packet>>,
    first_nat: OnceLock<Packet>,
    /// Packets routed so far, NAT deliveries included.
    traffic: AtomicU64,
    shutdown: AtomicBool,
}

impl Router {
    /// Router for addresses `0..size`.
    pub fn new(size: usize, monitor_address: i64) -> Self {
        Self {
            mailboxes: (0..size).map(|_| Mutex::new(Mailbox::default())).collect(),
            monitor_address,
            nat: Mutex::new(None),
            first_nat: OnceLock::new(),
            traffic: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Number of addresses.
    pub fn size(&self) -> usize {
        self.mailboxes.len()
    }

    /// Address captured by the NAT.
    pub fn monitor_address(&self) -> i64 {
        self.monitor_address
    }

    /// Send `packet` to `dest`.
    pub fn route(&self, dest: i64, packet: Packet) -> Result<(), ContractViolation> {
        self.check_running()?;

        if dest == self.monitor_address {
            *lock(&self.nat) = Some(packet);
            if self.first_nat.set(packet).is_ok() {
                log::info!("first packet to NAT: {}", packet);
            }
            log::debug!("NAT <- {}", packet);
        } else {
            let mut mailbox = self.mailbox(dest).ok_or(ContractViolation::UnknownDestination { dest })?;
            mailbox.packets.push_back(packet);
            mailbox.idle = 0;
            log::trace!("{} -> {}", packet, dest);
        }

        self.traffic.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Pop the next packet for `address`.
    ///
    /// An empty poll bumps the mailbox's idle counter; a successful one
    /// resets it.
    pub fn receive(&self, address: i64) -> Result<Option<Packet>, ContractViolation> {
        self.check_running()?;

        let mut mailbox = self.mailbox(address).ok_or(ContractViolation::UnknownDestination { dest: address })?;
        match mailbox.packets.pop_front() {
            Some(packet) => {
                mailbox.idle = 0;
                Ok(Some(packet))
            }
            None => {
                mailbox.idle += 1;
                Ok(None)
            }
        }
    }

    /// Re-inject the NAT packet into address 0.
    ///
    /// The register is read, not cleared.
    pub fn deliver_nat(&self) -> Option<Packet> {
        let packet = (*lock(&self.nat))?;
        let mut mailbox = self.mailbox(0)?;
        mailbox.packets.push_back(packet);
        mailbox.idle = 0;
        drop(mailbox);

        self.traffic.fetch_add(1, Ordering::SeqCst);
        Some(packet)
    }

    /// Latest packet sent to the monitor address.
    pub fn nat(&self) -> Option<Packet> {
        *lock(&self.nat)
    }

    /// First packet ever sent to the monitor address.
    pub fn first_nat(&self) -> Option<Packet> {
        self.first_nat.get().copied()
    }

    /// Packets routed so far.
    pub fn traffic(&self) -> u64 {
        self.traffic.load(Ordering::SeqCst)
    }

    /// True when every live mailbox is empty and has been polled empty at
    /// least `threshold` times in a row.
    pub fn all_idle(&self, threshold: u64) -> bool {
        self.mailboxes.iter().all(|slot| {
            let mailbox = lock(slot);
            mailbox.retired || (mailbox.packets.is_empty() && mailbox.idle >= threshold)
        })
    }

    /// Stop counting `address` towards idleness.
    pub fn retire(&self, address: i64) {
        if let Some(mut mailbox) = self.mailbox(address) {
            mailbox.retired = true;
        }
    }

    /// Units that have not retired.
    pub fn live_count(&self) -> usize {
        self.mailboxes.iter().filter(|&slot| !lock(slot).retired).count()
    }

    /// Fail every subsequent route/receive with `RouterShutdown`.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// True after [`Router::shutdown`].
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn check_running(&self) -> Result<(), ContractViolation> {
        if self.is_shut_down() {
            return Err(ContractViolation::RouterShutdown);
        }
        Ok(())
    }

    fn mailbox(&self, address: i64) -> Option<MutexGuard<'_, Mailbox>> {
        let index = usize::try_from(address).ok()?;
        self.mailboxes.get(index).map(lock)
    }
}

/// A unit that panicked while holding a lock leaves plain data behind.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
