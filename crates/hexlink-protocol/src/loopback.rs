/// In-memory peer for tests and dry runs.
///
/// `SimulatedPeer` implements `SerialLink` and plays the device side of the
/// upload protocol: it acks handshakes, reads the header and the length
/// prefixed chunks, and optionally answers each chunk with echo text. Replies
/// carry a release time so tests can model a slow or silent device.

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use crate::config::LinkConfig;
use crate::link::SerialLink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeerState {
    /// Waiting for the handshake that precedes the header
    AwaitStart,
    Header,
    /// Waiting for the handshake that precedes a chunk
    AwaitChunk,
    Length,
    Chunk { len: usize, remaining: usize },
    /// A short chunk was received
    Done,
}

pub struct SimulatedPeer {
    sentinel: u8,
    extension_len: usize,
    max_chunk: usize,
    echo: bool,
    ack_delay: Duration,
    noise: Vec<u8>,
    answer_limit: Option<usize>,

    state: PeerState,
    outbound: VecDeque<(Instant, u8)>,
    writes: Vec<Vec<u8>>,
    handshakes: usize,
    header: Vec<u8>,
    payload: Vec<u8>,
    chunk_sizes: Vec<usize>,
    unexpected: usize,
    closed: bool,
}

impl SimulatedPeer {
    /// A peer built with the same parameters as the host.
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            sentinel: config.sentinel,
            extension_len: config.extension_len,
            max_chunk: config.max_chunk,
            echo: config.echo,
            ack_delay: Duration::ZERO,
            noise: Vec::new(),
            answer_limit: None,
            state: PeerState::AwaitStart,
            outbound: VecDeque::new(),
            writes: Vec::new(),
            handshakes: 0,
            header: Vec::new(),
            payload: Vec::new(),
            chunk_sizes: Vec::new(),
            unexpected: 0,
            closed: false,
        }
    }

    /// Delay every handshake ack by `delay`.
    pub fn with_ack_delay(mut self, delay: Duration) -> Self {
        self.ack_delay = delay;
        self
    }

    /// Emit `noise` ahead of every handshake ack.
    pub fn with_noise(mut self, noise: &[u8]) -> Self {
        self.noise = noise.to_vec();
        self
    }

    /// Ack only the first `count` handshakes, then go silent.
    pub fn answer_first(mut self, count: usize) -> Self {
        self.answer_limit = Some(count);
        self
    }

    /// Queue bytes for the host, readable immediately.
    pub fn inject(&mut self, bytes: &[u8]) {
        let now = Instant::now();
        self.outbound.extend(bytes.iter().map(|&b| (now, b)));
    }

    /// Every byte the host wrote, in order.
    pub fn wire(&self) -> Vec<u8> {
        self.writes.concat()
    }

    /// Host writes as individual calls.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// Handshake requests received, answered or not.
    pub fn handshakes(&self) -> usize {
        self.handshakes
    }

    /// Extension header with its padding removed.
    pub fn extension(&self) -> Option<String> {
        if self.header.len() < self.extension_len {
            return None;
        }
        let text = String::from_utf8_lossy(&self.header);
        Some(text.trim_end_matches(' ').to_string())
    }

    /// Payload reassembled from the received chunks.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn chunk_sizes(&self) -> &[usize] {
        &self.chunk_sizes
    }

    /// True once the terminating short chunk has arrived.
    pub fn is_finished(&self) -> bool {
        self.state == PeerState::Done
    }

    /// Bytes that arrived where the protocol did not allow them.
    pub fn unexpected_bytes(&self) -> usize {
        self.unexpected
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ack(&mut self) {
        self.handshakes += 1;
        if self.answer_limit.is_some_and(|limit| self.handshakes > limit) {
            return;
        }
        let ready = Instant::now() + self.ack_delay;
        for &b in &self.noise {
            self.outbound.push_back((ready, b));
        }
        self.outbound.push_back((ready, self.sentinel));
    }

    fn finish_chunk(&mut self, len: usize) {
        self.chunk_sizes.push(len);
        if self.echo {
            let text = format!("chunk {}: {} bytes", self.chunk_sizes.len(), len);
            self.inject(text.as_bytes());
            let sentinel = self.sentinel;
            self.inject(&[sentinel]);
        }
        self.state = if len < self.max_chunk {
            PeerState::Done
        } else {
            PeerState::AwaitChunk
        };
    }

    fn receive(&mut self, byte: u8) {
        match self.state {
            PeerState::AwaitStart if byte == self.sentinel => {
                self.ack();
                self.state = PeerState::Header;
            }
            PeerState::Header => {
                self.header.push(byte);
                if self.header.len() == self.extension_len {
                    self.state = PeerState::AwaitChunk;
                }
            }
            PeerState::AwaitChunk if byte == self.sentinel => {
                self.ack();
                self.state = PeerState::Length;
            }
            PeerState::Length => {
                let len = byte as usize;
                if len == 0 {
                    self.finish_chunk(0);
                } else {
                    self.state = PeerState::Chunk { len, remaining: len };
                }
            }
            PeerState::Chunk { len, remaining } => {
                self.payload.push(byte);
                if remaining == 1 {
                    self.finish_chunk(len);
                } else {
                    self.state = PeerState::Chunk {
                        len,
                        remaining: remaining - 1,
                    };
                }
            }
            PeerState::AwaitStart | PeerState::AwaitChunk | PeerState::Done => {
                self.unexpected += 1;
            }
        }
    }
}

impl SerialLink for SimulatedPeer {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link closed"));
        }
        self.writes.push(bytes.to_vec());
        for &b in bytes {
            self.receive(b);
        }
        Ok(())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        let now = Instant::now();
        Ok(self
            .outbound
            .iter()
            .take_while(|(ready, _)| *ready <= now)
            .count())
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        match self.outbound.front() {
            Some(&(ready, b)) if ready <= Instant::now() => {
                self.outbound.pop_front();
                Ok(b)
            }
            _ => Err(io::Error::new(io::ErrorKind::WouldBlock, "no byte pending")),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}
