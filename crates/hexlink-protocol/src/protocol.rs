/// Wire format for the serial upload protocol.
///
/// ```text
/// host -> peer   [0x09]                         handshake request
/// peer -> host   .. [0x09]                      handshake ack (earlier bytes discarded)
/// host -> peer   [ext: 10 bytes, space padded]  header, once
///
/// then per chunk:
/// host -> peer   [0x09]                         handshake request
/// peer -> host   .. [0x09]                      handshake ack
/// host -> peer   [len: u8 LE][chunk: len bytes] len <= 224
/// peer -> host   [echo text][0x09]              only when the peer runs in debug mode
/// ```
///
/// 224 is a multiple of the radio's 32-byte FIFO and still fits the
/// peer's serial receive buffer. A chunk shorter than 224 bytes (possibly
/// empty) ends the payload.

/// Sentinel byte: requests a handshake, confirms it, and terminates echo text.
pub const HANDSHAKE_BYTE: u8 = b'\t';

/// Width of the extension header record.
pub const EXTENSION_LEN: usize = 10;

/// Fill byte for unused header positions.
pub const EXTENSION_PAD: u8 = b' ';

/// Largest chunk the peer can buffer.
pub const MAX_HEX_CHUNK_BYTES: usize = 224;

/// Default bound on a single handshake, in seconds.
pub const MAX_HANDSHAKE_SEC: u64 = 10;

/// Width of the chunk length prefix.
pub const LENGTH_PREFIX_BYTES: usize = 1;

/// Byte order of multi-byte fields. Every field is one byte wide today, but
/// the peer stores configured integers in little-endian unions.
pub const ENDIANNESS: Endianness = Endianness::Little;

/// Peer's default serial speed.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Byte order of a wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Encode a chunk length as its wire prefix. Returns None if the length
/// does not fit in `LENGTH_PREFIX_BYTES`.
pub fn encode_length_prefix(len: usize) -> Option<[u8; LENGTH_PREFIX_BYTES]> {
    let len = u8::try_from(len).ok()?;
    Some(match ENDIANNESS {
        Endianness::Little => len.to_le_bytes(),
        Endianness::Big => len.to_be_bytes(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_chunk_fits_prefix() {
        assert_eq!(encode_length_prefix(MAX_HEX_CHUNK_BYTES), Some([224]));
        assert_eq!(encode_length_prefix(0), Some([0]));
        assert_eq!(encode_length_prefix(255), Some([255]));
        assert_eq!(encode_length_prefix(256), None);
    }

    #[test]
    fn chunk_size_is_fifo_multiple() {
        assert_eq!(MAX_HEX_CHUNK_BYTES % 32, 0);
    }
}
