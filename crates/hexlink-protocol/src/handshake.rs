use std::time::Duration;

use tracing::{debug, warn};

use crate::config::LinkConfig;
use crate::error::TransferError;
use crate::link::{SerialLink, Session};
use crate::poll::{HandshakeState, SentinelWait};

/// A confirmed handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    /// Time from the request until the ack was read.
    pub elapsed: Duration,
    /// Bytes read and dropped before the ack.
    pub discarded: usize,
}

/// Ask the peer to move to its next state and wait for its ack.
///
/// Writes exactly one sentinel byte, then drains inbound bytes until the
/// sentinel comes back. Anything read before it is discarded. Fails with
/// `HandshakeTimeout` once `config.handshake_timeout` has passed.
pub fn synchronize<L: SerialLink>(
    session: &mut Session<L>,
    config: &LinkConfig,
) -> Result<Confirmation, TransferError> {
    session.write_all(&[config.sentinel])?;

    let mut wait = SentinelWait::new(
        config.sentinel,
        Some(config.handshake_timeout),
        config.poll_interval,
    );
    let mut discarded = 0usize;
    let state = wait.run(session.link()?, |_| discarded += 1)?;

    match state {
        HandshakeState::Confirmed => {
            if discarded > 0 {
                debug!("Discarded {} bytes before handshake ack", discarded);
            }
            Ok(Confirmation {
                elapsed: wait.elapsed(),
                discarded,
            })
        }
        _ => {
            warn!(
                "No handshake ack from {} within {:?}",
                session.endpoint(),
                config.handshake_timeout
            );
            Err(TransferError::HandshakeTimeout {
                limit: config.handshake_timeout,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::SimulatedPeer;

    fn fast_config() -> LinkConfig {
        LinkConfig::default()
            .with_handshake_timeout(Duration::from_millis(50))
            .with_poll_interval(Duration::from_millis(1))
    }

    #[test]
    fn confirms_and_writes_one_byte() {
        let config = fast_config();
        let mut peer = SimulatedPeer::new(&config).with_noise(b"boot ok\r\n");
        let mut session = Session::open(&mut peer, "sim", 115_200);

        let confirmation = synchronize(&mut session, &config).unwrap();
        assert_eq!(confirmation.discarded, 9);
        assert!(confirmation.elapsed < Duration::from_millis(50));
        drop(session);

        assert_eq!(peer.writes(), &[vec![9u8]]);
        assert_eq!(peer.handshakes(), 1);
    }

    #[test]
    fn ack_inside_window_succeeds() {
        let config = fast_config();
        let mut peer = SimulatedPeer::new(&config).with_ack_delay(Duration::from_millis(10));
        let mut session = Session::open(&mut peer, "sim", 115_200);

        assert!(synchronize(&mut session, &config).is_ok());
    }

    #[test]
    fn ack_after_window_times_out() {
        let config = fast_config();
        let mut peer = SimulatedPeer::new(&config).with_ack_delay(Duration::from_millis(200));
        let mut session = Session::open(&mut peer, "sim", 115_200);

        let err = synchronize(&mut session, &config).unwrap_err();
        match err {
            TransferError::HandshakeTimeout { limit } => {
                assert_eq!(limit, Duration::from_millis(50));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn silent_peer_times_out() {
        let config = fast_config();
        let mut peer = SimulatedPeer::new(&config).answer_first(0);
        let mut session = Session::open(&mut peer, "sim", 115_200);

        assert!(matches!(
            synchronize(&mut session, &config),
            Err(TransferError::HandshakeTimeout { .. })
        ));
    }
}
