//! Network interface adapters.
//!
//! A unit's first input is its own address. After that:
//!
//! - input pops one packet and hands out `x`, then `y` on the next call;
//!   with nothing queued it backs off briefly and returns `-1`
//! - output is framed in threes: `(destination, x, y)`

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::router::{Packet, Router};
use crate::interpreter::{ContractViolation, Input, Output};

/// Value returned when no packet is waiting.
pub const NO_PACKET: i64 = -1;

/// Receive side of a network unit.
pub struct NicInput {
    address: i64,
    router: Arc<Router>,
    announced: bool,
    pending_y: Option<i64>,
    backoff: Duration,
}

impl NicInput {
    pub fn new(address: i64, router: Arc<Router>, backoff: Duration) -> Self {
        Self { address, router, announced: false, pending_y: None, backoff }
    }
}

impl Input for NicInput {
    fn request_input(&mut self) -> Result<i64, ContractViolation> {
        if !self.announced {
            self.announced = true;
            return Ok(self.address);
        }
        if let Some(y) = self.pending_y.take() {
            return Ok(y);
        }

        match self.router.receive(self.address)? {
            Some(packet) => {
                self.pending_y = Some(packet.y);
                Ok(packet.x)
            }
            None => {
                if !self.backoff.is_zero() {
                    thread::sleep(self.backoff);
                }
                Ok(NO_PACKET)
            }
        }
    }
}

/// Send side of a network unit.
pub struct NicOutput {
    address: i64,
    router: Arc<Router>,
    frame: Vec<i64>,
    sent: u64,
}

impl NicOutput {
    pub fn new(address: i64, router: Arc<Router>) -> Self {
        Self { address, router, frame: Vec::with_capacity(3), sent: 0 }
    }

    /// Complete packets sent.
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl Output for NicOutput {
    fn deliver_output(&mut self, value: i64) -> Result<(), ContractViolation> {
        self.frame.push(value);
        if let &[dest, x, y] = self.frame.as_slice() {
            self.frame.clear();
            self.router.route(dest, Packet::new(x, y))?;
            self.sent += 1;
        }
        Ok(())
    }

    fn finish(&mut self) {
        if !self.frame.is_empty() {
            log::warn!("address {} stopped mid-frame, dropping {:?}", self.address, self.frame);
        }
        self.router.retire(self.address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_announces_address_then_polls() {
        let router = Arc::new(Router::new(4, 255));
        let mut nic = NicInput::new(3, Arc::clone(&router), Duration::ZERO);

        assert_eq!(nic.request_input(), Ok(3));
        assert_eq!(nic.request_input(), Ok(NO_PACKET));

        router.route(3, Packet::new(7, 8)).unwrap();
        assert_eq!(nic.request_input(), Ok(7));
        assert_eq!(nic.request_input(), Ok(8));
        assert_eq!(nic.request_input(), Ok(NO_PACKET));
    }

    #[test]
    fn test_output_frames_triplets() {
        let router = Arc::new(Router::new(2, 255));
        let mut nic = NicOutput::new(0, Arc::clone(&router));

        nic.deliver_output(1).unwrap();
        nic.deliver_output(10).unwrap();
        assert_eq!(router.traffic(), 0);
        nic.deliver_output(20).unwrap();

        assert_eq!(nic.sent(), 1);
        assert_eq!(router.receive(1), Ok(Some(Packet::new(10, 20))));
    }

    #[test]
    fn test_output_to_unknown_destination_fails() {
        let router = Arc::new(Router::new(2, 255));
        let mut nic = NicOutput::new(0, router);

        nic.deliver_output(9).unwrap();
        nic.deliver_output(0).unwrap();
        assert_eq!(
            nic.deliver_output(0),
            Err(ContractViolation::UnknownDestination { dest: 9 })
        );
    }

    #[test]
    fn test_finish_retires_address() {
        let router = Arc::new(Router::new(2, 255));
        let mut nic = NicOutput::new(1, Arc::clone(&router));
        nic.finish();
        assert_eq!(router.live_count(), 1);
    }

    #[test]
    fn test_shutdown_stops_input() {
        let router = Arc::new(Router::new(1, 255));
        let mut nic = NicInput::new(0, Arc::clone(&router), Duration::ZERO);
        nic.request_input().unwrap();

        router.shutdown();
        assert_eq!(nic.request_input(), Err(ContractViolation::RouterShutdown));
    }
}
