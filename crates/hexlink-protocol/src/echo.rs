use crate::config::LinkConfig;
use crate::error::TransferError;
use crate::link::{SerialLink, Session};
use crate::poll::SentinelWait;

/// Read the peer's diagnostic text up to (not including) the next sentinel.
///
/// There is no timeout: only call this right after a confirmed handshake for
/// the same exchange, when the peer is known to be answering.
pub fn read_until_sentinel<L: SerialLink>(
    session: &mut Session<L>,
    config: &LinkConfig,
) -> Result<String, TransferError> {
    let mut text = Vec::new();
    let mut wait = SentinelWait::new(config.sentinel, None, config.poll_interval);
    wait.run(session.link()?, |byte| text.push(byte))?;
    Ok(String::from_utf8_lossy(&text).into_owned())
}
