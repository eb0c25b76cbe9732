//! Idle detection and NAT re-injection.
//!
//! The network counts as idle when every live mailbox is empty and has
//! been polled empty `idle_threshold` times, on two consecutive scans with
//! no packet routed in between. On idle, the NAT packet (if any) goes to
//! address 0. Two consecutive deliveries that match end the run.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Error};
use serde::{Deserialize, Serialize};

use super::router::{Packet, Router};

/// How two consecutive NAT deliveries are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMatch {
    /// Same `y` value.
    #[default]
    Y,
    /// Same `(x, y)` pair.
    Packet,
}

impl RepeatMatch {
    /// True if `next` repeats `prev` under this rule.
    pub fn matches(self, prev: Packet, next: Packet) -> bool {
        match self {
            RepeatMatch::Y => prev.y == next.y,
            RepeatMatch::Packet => prev == next,
        }
    }
}

impl FromStr for RepeatMatch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "y" => Ok(RepeatMatch::Y),
            "packet" => Ok(RepeatMatch::Packet),
            other => bail!("unknown repeat match {:?} (expected \"y\" or \"packet\")", other),
        }
    }
}

impl fmt::Display for RepeatMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeatMatch::Y => f.write_str("y"),
            RepeatMatch::Packet => f.write_str("packet"),
        }
    }
}

/// Result of one monitor scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Traffic is still flowing, or nothing to deliver yet.
    Busy,
    /// Network was idle; the NAT packet went to address 0.
    Delivered(Packet),
    /// Delivered a packet that repeats the previous delivery.
    ///
    /// The packet is already in mailbox 0 when this is returned; the caller
    /// ends the run and shuts the router down.
    Repeated(Packet),
}

/// Watches a [`Router`] for idleness.
pub struct IdleMonitor {
    router: Arc<Router>,
    idle_threshold: u64,
    repeat_match: RepeatMatch,
    quiet_scans: u32,
    last_traffic: u64,
    deliveries: Vec<Packet>,
}

impl IdleMonitor {
    pub fn new(router: Arc<Router>, idle_threshold: u64, repeat_match: RepeatMatch) -> Self {
        let last_traffic = router.traffic();
        Self {
            router,
            idle_threshold,
            repeat_match,
            quiet_scans: 0,
            last_traffic,
            deliveries: Vec::new(),
        }
    }

    /// Packets delivered to address 0 so far, in order.
    pub fn deliveries(&self) -> &[Packet] {
        &self.deliveries
    }

    /// Consume the monitor, returning its deliveries.
    pub fn into_deliveries(self) -> Vec<Packet> {
        self.deliveries
    }

    /// Scan once.
    pub fn poll(&mut self) -> MonitorEvent {
        let traffic = self.router.traffic();
        let idle = self.router.all_idle(self.idle_threshold);

        self.quiet_scans = match (idle, traffic == self.last_traffic) {
            (false, _) => 0,
            (true, true) => self.quiet_scans.saturating_add(1),
            (true, false) => 1,
        };
        self.last_traffic = traffic;

        if self.quiet_scans < 2 {
            return MonitorEvent::Busy;
        }

        let Some(packet) = self.router.deliver_nat() else {
            return MonitorEvent::Busy;
        };
        self.quiet_scans = 0;
        self.last_traffic = self.router.traffic();
        log::info!("network idle, NAT delivers {} to address 0", packet);

        let repeated = self
            .deliveries
            .last()
            .is_some_and(|&prev| self.repeat_match.matches(prev, packet));
        self.deliveries.push(packet);

        if repeated {
            MonitorEvent::Repeated(packet)
        } else {
            MonitorEvent::Delivered(packet)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_router(size: usize) -> Arc<Router> {
        let router = Arc::new(Router::new(size, 255));
        for address in 0..size as i64 {
            router.receive(address).unwrap();
            router.receive(address).unwrap();
        }
        router
    }

    fn drain(router: &Router) {
        while let Ok(Some(_)) = router.receive(0) {}
        router.receive(0).unwrap();
        router.receive(0).unwrap();
    }

    #[test]
    fn test_repeat_match_parse() {
        assert_eq!("y".parse::<RepeatMatch>().unwrap(), RepeatMatch::Y);
        assert_eq!(" Packet ".parse::<RepeatMatch>().unwrap(), RepeatMatch::Packet);
        assert!("xy".parse::<RepeatMatch>().is_err());
        assert_eq!(RepeatMatch::Packet.to_string(), "packet");
    }

    #[test]
    fn test_repeat_match_rules() {
        let a = Packet::new(1, 5);
        let b = Packet::new(2, 5);
        assert!(RepeatMatch::Y.matches(a, b));
        assert!(!RepeatMatch::Packet.matches(a, b));
        assert!(RepeatMatch::Packet.matches(a, a));
    }

    #[test]
    fn test_needs_two_quiet_scans() {
        let router = idle_router(2);
        router.route(255, Packet::new(1, 9)).unwrap();

        let mut monitor = IdleMonitor::new(Arc::clone(&router), 2, RepeatMatch::Y);
        assert_eq!(monitor.poll(), MonitorEvent::Busy);
        assert_eq!(monitor.poll(), MonitorEvent::Delivered(Packet::new(1, 9)));
        assert_eq!(router.receive(0), Ok(Some(Packet::new(1, 9))));
    }

    #[test]
    fn test_traffic_between_scans_resets() {
        let router = idle_router(2);
        let mut monitor = IdleMonitor::new(Arc::clone(&router), 2, RepeatMatch::Y);
        assert_eq!(monitor.poll(), MonitorEvent::Busy);

        // A NAT write between scans leaves mailboxes idle but counts as traffic.
        router.route(255, Packet::new(1, 9)).unwrap();
        assert_eq!(monitor.poll(), MonitorEvent::Busy);
        assert_eq!(monitor.poll(), MonitorEvent::Delivered(Packet::new(1, 9)));
    }

    #[test]
    fn test_idle_without_nat_is_busy() {
        let router = idle_router(1);
        let mut monitor = IdleMonitor::new(router, 2, RepeatMatch::Y);
        for _ in 0..5 {
            assert_eq!(monitor.poll(), MonitorEvent::Busy);
        }
        assert!(monitor.deliveries().is_empty());
    }

    #[test]
    fn test_repeated_delivery() {
        let router = idle_router(1);
        router.route(255, Packet::new(3, 4)).unwrap();
        let mut monitor = IdleMonitor::new(Arc::clone(&router), 2, RepeatMatch::Packet);

        monitor.poll();
        assert_eq!(monitor.poll(), MonitorEvent::Delivered(Packet::new(3, 4)));

        drain(&router);
        monitor.poll();
        assert_eq!(monitor.poll(), MonitorEvent::Repeated(Packet::new(3, 4)));
        assert_eq!(router.receive(0), Ok(Some(Packet::new(3, 4))));
        assert_eq!(monitor.into_deliveries(), vec![Packet::new(3, 4); 2]);
    }
}
