/// Integration test: run complete uploads against the in-memory peer and
/// check what it reassembled and what went over the wire.

use std::sync::Arc;
use std::time::Duration;

use hexlink_protocol::{
    LinkConfig, MAX_HEX_CHUNK_BYTES, SenderConfig, Session, SimulatedPeer, TracingLogger,
    TransferError, send_file,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("hexlink_protocol=debug")
        .with_test_writer()
        .try_init();
}

fn test_config() -> LinkConfig {
    LinkConfig::default()
        .with_handshake_timeout(Duration::from_millis(50))
        .with_poll_interval(Duration::from_millis(1))
}

fn hex_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| b"0123456789abcdef"[i % 16]).collect()
}

#[test]
fn loopback_transfer_five_hundred_bytes() {
    init_logging();
    let config = SenderConfig::new(test_config()).with_logger(Arc::new(TracingLogger));
    let mut peer = SimulatedPeer::new(&config.link);
    let payload = hex_payload(500);

    let result = send_file(Session::open(&mut peer, "sim", 115_200), "png", &payload, &config)
        .unwrap();

    assert_eq!(result.chunks_sent, 3);
    assert_eq!(result.handshakes, 4);
    assert_eq!(peer.chunk_sizes(), &[224usize, 224, 52]);
    assert_eq!(peer.payload(), payload.as_slice());
    assert_eq!(peer.extension().as_deref(), Some("png"));
    assert!(peer.is_finished());
    assert!(peer.is_closed());
    assert_eq!(peer.unexpected_bytes(), 0);

    // handshake, header, then (handshake, prefix, chunk) per chunk
    let writes = peer.writes();
    assert_eq!(writes[0], vec![9u8]);
    assert_eq!(writes[1], vec![112u8, 110, 103, 32, 32, 32, 32, 32, 32, 32]);
    for (i, size) in [224usize, 224, 52].into_iter().enumerate() {
        let base = 2 + i * 3;
        assert_eq!(writes[base], vec![9u8]);
        assert_eq!(writes[base + 1], vec![size as u8]);
        assert_eq!(writes[base + 2].len(), size);
    }
    assert_eq!(writes.len(), 11);
}

#[test]
fn loopback_transfer_exact_chunk_boundary() {
    init_logging();
    let config = SenderConfig::new(test_config());
    let mut peer = SimulatedPeer::new(&config.link);
    let payload = hex_payload(MAX_HEX_CHUNK_BYTES * 3);

    let result = send_file(Session::open(&mut peer, "hex", 115_200), "hex", &payload, &config)
        .unwrap();

    // three full chunks, then the empty terminator
    assert_eq!(result.chunks_sent, 4);
    assert_eq!(peer.chunk_sizes(), &[224usize, 224, 224, 0]);
    assert_eq!(peer.payload(), payload.as_slice());
    assert!(peer.is_finished());

    let wire = peer.wire();
    assert_eq!(&wire[wire.len() - 2..], &[9u8, 0]);
}

#[test]
fn loopback_transfer_empty_payload() {
    let config = SenderConfig::new(test_config());
    let mut peer = SimulatedPeer::new(&config.link);

    let result = send_file(Session::open(&mut peer, "txt", 115_200), "txt", b"", &config).unwrap();

    assert_eq!(result.chunks_sent, 1);
    assert_eq!(peer.chunk_sizes(), &[0usize]);
    assert!(peer.payload().is_empty());
    assert_eq!(peer.wire(), b"\ttxt       \t\0");
}

#[test]
fn loopback_transfer_with_echo() {
    init_logging();
    let config = SenderConfig::new(test_config().with_echo(true));
    let mut peer = SimulatedPeer::new(&config.link).with_noise(b"ready");
    let payload = hex_payload(300);

    let result = send_file(Session::open(&mut peer, "bin", 115_200), "bin", &payload, &config)
        .unwrap();

    assert_eq!(
        result.echoes,
        vec!["chunk 1: 224 bytes".to_string(), "chunk 2: 76 bytes".to_string()]
    );
    assert_eq!(peer.payload(), payload.as_slice());
}

#[test]
fn silent_peer_aborts_without_further_writes() {
    init_logging();
    let config = SenderConfig::new(test_config());
    let mut peer = SimulatedPeer::new(&config.link).answer_first(2);
    let payload = hex_payload(1000);

    let err = send_file(Session::open(&mut peer, "png", 115_200), "png", &payload, &config)
        .unwrap_err();

    assert!(matches!(
        err,
        TransferError::HandshakeTimeout { limit } if limit == Duration::from_millis(50)
    ));
    assert_eq!(peer.handshakes(), 3);
    assert_eq!(peer.chunk_sizes(), &[224usize]);
    // the unanswered handshake request is the last thing written
    assert_eq!(peer.writes().last(), Some(&vec![9u8]));
    assert!(peer.is_closed());
}

#[test]
fn slow_peer_inside_window_succeeds() {
    let config = SenderConfig::new(test_config());
    let mut peer = SimulatedPeer::new(&config.link).with_ack_delay(Duration::from_millis(10));

    let result = send_file(
        Session::open(&mut peer, "sim", 115_200),
        "txt",
        &hex_payload(10),
        &config,
    );
    assert!(result.is_ok());
}

#[test]
fn slow_peer_outside_window_times_out() {
    let config = SenderConfig::new(test_config());
    let mut peer = SimulatedPeer::new(&config.link).with_ack_delay(Duration::from_millis(150));

    let err = send_file(
        Session::open(&mut peer, "sim", 115_200),
        "txt",
        &hex_payload(10),
        &config,
    )
    .unwrap_err();
    assert!(matches!(err, TransferError::HandshakeTimeout { .. }));
    assert_eq!(peer.wire(), b"\t");
}
