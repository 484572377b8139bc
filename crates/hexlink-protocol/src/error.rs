use std::io;
use std::time::Duration;

use thiserror::Error;

/// Everything that can abort a transfer. None of these are retried
/// internally; the caller restarts the whole sequence.
#[derive(Debug, Error)]
pub enum TransferError {
    /// No handshake ack arrived within the configured bound.
    #[error("handshake time limit of {limit:?} exceeded")]
    HandshakeTimeout { limit: Duration },

    /// The extension cannot be encoded into the fixed-width header.
    #[error("malformed header for extension {extension:?}: {reason}")]
    MalformedHeader {
        extension: String,
        reason: &'static str,
    },

    /// I/O failure on the serial channel.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("invalid link config: {0}")]
    InvalidConfig(String),

    #[error("session is closed")]
    SessionClosed,
}

impl TransferError {
    pub(crate) fn malformed(extension: &str, reason: &'static str) -> Self {
        Self::MalformedHeader {
            extension: extension.to_string(),
            reason,
        }
    }
}
