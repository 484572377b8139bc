use std::time::Duration;

use crate::error::TransferError;
use crate::protocol::{EXTENSION_LEN, HANDSHAKE_BYTE, MAX_HANDSHAKE_SEC, MAX_HEX_CHUNK_BYTES};

/// Protocol parameters for one session.
///
/// `Default` gives the values the peer firmware is built with. Tests swap in
/// short timeouts without touching those.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Byte used to request and confirm handshakes and to end echo text.
    pub sentinel: u8,
    /// Width of the extension header.
    pub extension_len: usize,
    /// Largest chunk sent after a single handshake. Must fit in a u8.
    pub max_chunk: usize,
    /// Bound on a single handshake.
    pub handshake_timeout: Duration,
    /// Sleep between availability polls when nothing is pending.
    /// Zero yields the thread instead.
    pub poll_interval: Duration,
    /// Read and surface the peer's echo text after every chunk.
    pub echo: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            sentinel: HANDSHAKE_BYTE,
            extension_len: EXTENSION_LEN,
            max_chunk: MAX_HEX_CHUNK_BYTES,
            handshake_timeout: Duration::from_secs(MAX_HANDSHAKE_SEC),
            poll_interval: Duration::from_millis(1),
            echo: false,
        }
    }
}

impl LinkConfig {
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Reject parameters the wire format cannot carry.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.max_chunk == 0 || self.max_chunk > u8::MAX as usize {
            return Err(TransferError::InvalidConfig(format!(
                "max_chunk must be in 1..=255, got {}",
                self.max_chunk
            )));
        }
        if self.extension_len == 0 {
            return Err(TransferError::InvalidConfig(
                "extension_len must be non-zero".into(),
            ));
        }
        if self.handshake_timeout.is_zero() {
            return Err(TransferError::InvalidConfig(
                "handshake_timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
