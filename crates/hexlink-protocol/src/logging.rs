/// Structured transfer events.
///
/// The orchestrator reports every protocol step through a `TransferLogger`
/// so callers can forward them to `tracing`, collect them, or drop them.

use std::fmt;

/// Structured log entry for a transfer operation.
#[derive(Debug, Clone)]
pub struct TransferLog {
    pub component: &'static str,
    pub endpoint: String,
    pub event: TransferEvent,
}

/// Transfer events that can be logged.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    /// Handshake ack received. `attempt` counts from 1 within a transfer.
    HandshakeConfirmed {
        attempt: usize,
        elapsed_ms: u64,
        discarded: usize,
    },
    /// Handshake bound exceeded
    HandshakeTimedOut {
        attempt: usize,
        limit_ms: u64,
    },
    /// Extension header written
    HeaderSent {
        extension: String,
        header: Vec<u8>,
    },
    /// Length prefix and chunk bytes written
    ChunkSent {
        chunk_idx: usize,
        size: usize,
        chunk_total: usize,
    },
    /// Peer diagnostic text after a chunk
    EchoReceived {
        chunk_idx: usize,
        text: String,
    },
    /// Transfer complete
    TransferComplete {
        total_bytes: usize,
        chunks: usize,
        duration_ms: u64,
    },
    /// Error occurred
    Error {
        message: String,
    },
}

impl fmt::Display for TransferEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandshakeConfirmed { attempt, elapsed_ms, discarded } => {
                write!(f, "handshake_confirmed attempt={} elapsed_ms={} discarded={}", attempt, elapsed_ms, discarded)
            }
            Self::HandshakeTimedOut { attempt, limit_ms } => {
                write!(f, "handshake_timed_out attempt={} limit_ms={}", attempt, limit_ms)
            }
            Self::HeaderSent { extension, header } => {
                write!(f, "header_sent extension={} bytes={}", extension, hex::encode(header))
            }
            Self::ChunkSent { chunk_idx, size, chunk_total } => {
                write!(f, "chunk_sent idx={}/{} size={}", chunk_idx + 1, chunk_total, size)
            }
            Self::EchoReceived { chunk_idx, text } => {
                write!(f, "echo idx={} text={:?}", chunk_idx, text)
            }
            Self::TransferComplete { total_bytes, chunks, duration_ms } => {
                write!(f, "transfer_complete bytes={} chunks={} duration_ms={}", total_bytes, chunks, duration_ms)
            }
            Self::Error { message } => {
                write!(f, "error: {}", message)
            }
        }
    }
}

/// Trait for transfer logging. Implementations can write to tracing,
/// collect entries, or discard them.
pub trait TransferLogger: Send + Sync {
    fn log(&self, entry: TransferLog);
}

/// Logger that uses the `tracing` crate.
pub struct TracingLogger;

impl TransferLogger for TracingLogger {
    fn log(&self, entry: TransferLog) {
        // Use info for lifecycle events, debug for per-chunk spam
        match &entry.event {
            TransferEvent::HeaderSent { .. }
            | TransferEvent::EchoReceived { .. }
            | TransferEvent::TransferComplete { .. } => {
                tracing::info!(
                    component = entry.component,
                    endpoint = %entry.endpoint,
                    "{}",
                    entry.event,
                );
            }
            TransferEvent::HandshakeTimedOut { .. } | TransferEvent::Error { .. } => {
                tracing::error!(
                    component = entry.component,
                    endpoint = %entry.endpoint,
                    "{}",
                    entry.event,
                );
            }
            _ => {
                tracing::debug!(
                    component = entry.component,
                    endpoint = %entry.endpoint,
                    "{}",
                    entry.event,
                );
            }
        }
    }
}

/// No-op logger that discards all log entries.
pub struct NullLogger;

impl TransferLogger for NullLogger {
    fn log(&self, _entry: TransferLog) {}
}
