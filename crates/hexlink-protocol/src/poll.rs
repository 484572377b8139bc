/// Sentinel wait shared by the handshake and the echo reader.
///
/// Each poll cycle drains whatever the link reports as pending, checks the
/// deadline, and only then suspends (sleep or yield) if nothing was pending.
/// The deadline check sits next to every byte read so a late ack is still
/// reported as a timeout.

use std::io;
use std::time::{Duration, Instant};

use crate::link::SerialLink;

/// Outcome of one synchronization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Pending,
    Confirmed,
    TimedOut,
}

pub(crate) struct SentinelWait {
    sentinel: u8,
    started: Instant,
    limit: Option<Duration>,
    poll_interval: Duration,
    state: HandshakeState,
}

impl SentinelWait {
    /// Start waiting now. `limit` of None waits forever.
    pub fn new(sentinel: u8, limit: Option<Duration>, poll_interval: Duration) -> Self {
        Self {
            sentinel,
            started: Instant::now(),
            limit,
            poll_interval,
            state: HandshakeState::Pending,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn expired(&self) -> bool {
        self.limit.is_some_and(|limit| self.started.elapsed() > limit)
    }

    /// Run a single poll cycle. Bytes other than the sentinel go to `on_byte`.
    pub fn poll<L, F>(&mut self, link: &mut L, on_byte: &mut F) -> io::Result<HandshakeState>
    where
        L: SerialLink + ?Sized,
        F: FnMut(u8),
    {
        if self.state != HandshakeState::Pending {
            return Ok(self.state);
        }

        let pending = link.bytes_available()?;
        for _ in 0..pending {
            let byte = link.read_byte()?;
            if self.expired() {
                self.state = HandshakeState::TimedOut;
                return Ok(self.state);
            }
            if byte == self.sentinel {
                self.state = HandshakeState::Confirmed;
                return Ok(self.state);
            }
            on_byte(byte);
        }

        if self.expired() {
            self.state = HandshakeState::TimedOut;
            return Ok(self.state);
        }

        if pending == 0 {
            if self.poll_interval.is_zero() {
                std::thread::yield_now();
            } else {
                std::thread::sleep(self.poll_interval);
            }
        }
        Ok(self.state)
    }

    /// Poll until the wait resolves.
    pub fn run<L, F>(&mut self, link: &mut L, mut on_byte: F) -> io::Result<HandshakeState>
    where
        L: SerialLink + ?Sized,
        F: FnMut(u8),
    {
        loop {
            match self.poll(&mut *link, &mut on_byte)? {
                HandshakeState::Pending => continue,
                resolved => return Ok(resolved),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkConfig;
    use crate::loopback::SimulatedPeer;

    fn peer() -> SimulatedPeer {
        SimulatedPeer::new(&LinkConfig::default())
    }

    #[test]
    fn pending_until_sentinel_arrives() {
        let mut link = peer();
        let mut wait = SentinelWait::new(b'\t', Some(Duration::from_secs(1)), Duration::ZERO);
        let mut seen = Vec::new();

        assert_eq!(
            wait.poll(&mut link, &mut |b| seen.push(b)).unwrap(),
            HandshakeState::Pending
        );

        link.inject(b"ab\tcd");
        assert_eq!(
            wait.poll(&mut link, &mut |b| seen.push(b)).unwrap(),
            HandshakeState::Confirmed
        );
        assert_eq!(seen, b"ab");
        // bytes after the sentinel stay on the link
        assert_eq!(link.bytes_available().unwrap(), 2);
    }

    #[test]
    fn times_out_without_sentinel() {
        let mut link = peer();
        link.inject(b"noise");
        let mut wait = SentinelWait::new(
            b'\t',
            Some(Duration::from_millis(20)),
            Duration::from_millis(1),
        );
        let state = wait.run(&mut link, |_| {}).unwrap();
        assert_eq!(state, HandshakeState::TimedOut);
        assert!(wait.elapsed() > Duration::from_millis(20));
    }

    #[test]
    fn resolved_state_is_sticky() {
        let mut link = peer();
        link.inject(b"\t");
        let mut wait = SentinelWait::new(b'\t', None, Duration::ZERO);
        assert_eq!(wait.run(&mut link, |_| {}).unwrap(), HandshakeState::Confirmed);

        link.inject(b"x");
        assert_eq!(
            wait.poll(&mut link, &mut |_| {}).unwrap(),
            HandshakeState::Confirmed
        );
        assert_eq!(link.bytes_available().unwrap(), 1);
    }

    #[test]
    fn ack_read_after_deadline_times_out() {
        let mut link = peer();
        let mut wait = SentinelWait::new(
            b'\t',
            Some(Duration::from_millis(20)),
            Duration::from_millis(1),
        );
        std::thread::sleep(Duration::from_millis(30));
        link.inject(b"\t");

        assert_eq!(
            wait.poll(&mut link, &mut |_| {}).unwrap(),
            HandshakeState::TimedOut
        );
        // the late ack was consumed, not left for the next exchange
        assert_eq!(link.bytes_available().unwrap(), 0);
    }
}
