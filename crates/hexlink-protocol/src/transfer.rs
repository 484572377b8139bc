/// Transfer orchestrator.
///
/// ```text
/// handshake -> header (10 bytes)
/// for each chunk:
///     handshake -> [len u8] -> chunk -> (echo text, debug only)
/// close
/// ```
///
/// Any failure aborts the whole transfer. Bytes already written are not
/// rolled back; the caller starts again from the first handshake. There is
/// no integrity check on the wire beyond the handshake's liveness signal.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::chunker::Segmenter;
use crate::config::LinkConfig;
use crate::echo::read_until_sentinel;
use crate::error::TransferError;
use crate::handshake::synchronize;
use crate::header::encode_extension_with_width;
use crate::link::{SerialLink, Session};
use crate::logging::{TransferEvent, TransferLog, TransferLogger};
use crate::protocol::encode_length_prefix;

const COMPONENT: &str = "sender";

/// Configuration for the sender.
#[derive(Clone, Default)]
pub struct SenderConfig {
    pub link: LinkConfig,
    pub logger: Option<Arc<dyn TransferLogger>>,
}

impl SenderConfig {
    pub fn new(link: LinkConfig) -> Self {
        Self { link, logger: None }
    }

    pub fn with_logger(mut self, logger: Arc<dyn TransferLogger>) -> Self {
        self.logger = Some(logger);
        self
    }
}

/// Result of a completed send operation.
#[derive(Debug, Clone, Serialize)]
pub struct SendResult {
    pub endpoint: String,
    pub extension: String,
    pub payload_bytes: usize,
    pub chunks_sent: usize,
    pub handshakes: usize,
    /// Echo text per chunk, empty unless echo is enabled.
    pub echoes: Vec<String>,
    /// SHA-256 of the payload, for comparing against what the peer stored.
    pub payload_sha256: String,
    pub elapsed_ms: u64,
}

struct EventSink<'a> {
    logger: Option<&'a dyn TransferLogger>,
    endpoint: String,
}

impl EventSink<'_> {
    fn emit(&self, event: TransferEvent) {
        if let Some(logger) = self.logger {
            logger.log(TransferLog {
                component: COMPONENT,
                endpoint: self.endpoint.clone(),
                event,
            });
        }
    }
}

/// Send `payload` with its extension header over `session`.
///
/// Consumes the session and closes it on success and on failure.
pub fn send_file<L: SerialLink>(
    mut session: Session<L>,
    extension: &str,
    payload: &[u8],
    config: &SenderConfig,
) -> Result<SendResult, TransferError> {
    let sink = EventSink {
        logger: config.logger.as_deref(),
        endpoint: session.endpoint().to_string(),
    };

    match run_transfer(&mut session, extension, payload, &config.link, &sink) {
        Ok(result) => {
            if let Err(e) = session.close() {
                sink.emit(TransferEvent::Error {
                    message: e.to_string(),
                });
                return Err(e);
            }
            sink.emit(TransferEvent::TransferComplete {
                total_bytes: result.payload_bytes,
                chunks: result.chunks_sent,
                duration_ms: result.elapsed_ms,
            });
            info!(
                "Sent {} bytes in {} chunks to {} ({} ms)",
                result.payload_bytes, result.chunks_sent, result.endpoint, result.elapsed_ms
            );
            Ok(result)
        }
        Err(e) => {
            sink.emit(TransferEvent::Error {
                message: e.to_string(),
            });
            if let Err(close_err) = session.close() {
                warn!("Failed to close session after error: {}", close_err);
            }
            Err(e)
        }
    }
}

fn run_transfer<L: SerialLink>(
    session: &mut Session<L>,
    extension: &str,
    payload: &[u8],
    config: &LinkConfig,
    sink: &EventSink<'_>,
) -> Result<SendResult, TransferError> {
    config.validate()?;
    let header = encode_extension_with_width(extension, config.extension_len)?;
    let segmenter = Segmenter::new(payload, config.max_chunk);
    let chunk_total = segmenter.len();

    info!(
        "Sending .{} payload ({} bytes, {} chunks) to {}",
        extension,
        payload.len(),
        chunk_total,
        session.endpoint()
    );

    let start = Instant::now();
    let mut handshakes = 0usize;

    gate(session, config, sink, &mut handshakes)?;
    session.write_all(&header)?;
    sink.emit(TransferEvent::HeaderSent {
        extension: extension.to_string(),
        header,
    });

    let mut chunks_sent = 0usize;
    let mut echoes = Vec::new();
    for (chunk_idx, chunk) in segmenter.iter().enumerate() {
        gate(session, config, sink, &mut handshakes)?;

        let prefix = encode_length_prefix(chunk.len()).ok_or_else(|| {
            TransferError::InvalidConfig(format!(
                "chunk of {} bytes overflows the length prefix",
                chunk.len()
            ))
        })?;
        session.write_all(&prefix)?;
        if !chunk.is_empty() {
            session.write_all(chunk)?;
        }
        chunks_sent += 1;
        sink.emit(TransferEvent::ChunkSent {
            chunk_idx,
            size: chunk.len(),
            chunk_total,
        });

        if config.echo {
            let text = read_until_sentinel(session, config)?;
            sink.emit(TransferEvent::EchoReceived {
                chunk_idx,
                text: text.clone(),
            });
            echoes.push(text);
        }
    }

    Ok(SendResult {
        endpoint: session.endpoint().to_string(),
        extension: extension.to_string(),
        payload_bytes: payload.len(),
        chunks_sent,
        handshakes,
        echoes,
        payload_sha256: hex::encode(Sha256::digest(payload)),
        elapsed_ms: start.elapsed().as_millis() as u64,
    })
}

/// One handshake, counted and reported.
fn gate<L: SerialLink>(
    session: &mut Session<L>,
    config: &LinkConfig,
    sink: &EventSink<'_>,
    handshakes: &mut usize,
) -> Result<(), TransferError> {
    let attempt = *handshakes + 1;
    match synchronize(session, config) {
        Ok(confirmation) => {
            *handshakes = attempt;
            sink.emit(TransferEvent::HandshakeConfirmed {
                attempt,
                elapsed_ms: confirmation.elapsed.as_millis() as u64,
                discarded: confirmation.discarded,
            });
            Ok(())
        }
        Err(e) => {
            if let TransferError::HandshakeTimeout { limit } = &e {
                sink.emit(TransferEvent::HandshakeTimedOut {
                    attempt,
                    limit_ms: limit.as_millis() as u64,
                });
            }
            Err(e)
        }
    }
}
