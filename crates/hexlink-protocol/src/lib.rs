/// Hexlink: chunked file upload to a microcontroller over a serial link.
///
/// Provides the host side of a half-duplex, handshake-gated protocol:
/// - One-byte handshake before the header and before every chunk
/// - Fixed-width, space-padded extension header
/// - Chunks of at most 224 bytes behind a one-byte length prefix
/// - Optional echo text from the peer after each chunk
/// - Bounded handshake waits; any timeout aborts the transfer

pub mod chunker;
pub mod config;
pub mod echo;
pub mod error;
pub mod handshake;
pub mod header;
pub mod link;
pub mod logging;
pub mod loopback;
pub mod poll;
pub mod protocol;
pub mod transfer;

// Re-export key types for convenience.
pub use chunker::{Chunks, Segmenter, chunk_count};
pub use config::LinkConfig;
pub use echo::read_until_sentinel;
pub use error::TransferError;
pub use handshake::{Confirmation, synchronize};
pub use header::{encode_extension, encode_extension_with_width, extension_from_path};
pub use link::{SerialLink, Session, SessionState, open_serial};
pub use logging::{NullLogger, TracingLogger, TransferEvent, TransferLog, TransferLogger};
pub use loopback::SimulatedPeer;
pub use poll::HandshakeState;
pub use protocol::{
    DEFAULT_BAUD_RATE, EXTENSION_LEN, HANDSHAKE_BYTE, MAX_HANDSHAKE_SEC, MAX_HEX_CHUNK_BYTES,
};
pub use transfer::{SendResult, SenderConfig, send_file};
