//! Pkt-line framing: a 4-hex-digit big-endian ASCII length (inclusive of
//! itself) followed by payload, with `0000` flush and `0001` (v2) delimiter
//! sentinels.

use crate::error::{GitError, Result};

pub const FLUSH: &[u8] = b"0000";
pub const DELIM: &[u8] = b"0001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PktLine {
    Flush,
    Delim,
    Data(Vec<u8>),
}

/// Encodes `payload` as a length-prefixed data pkt-line. The length is
/// always computed from the actual payload (never hard-coded), so this
/// never produces a mismatched frame regardless of payload size.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let total_len = payload.len() + 4;
    let mut out = format!("{total_len:04x}").into_bytes();
    out.extend(payload);
    out
}

pub fn flush() -> Vec<u8> {
    FLUSH.to_vec()
}

pub fn delim() -> Vec<u8> {
    DELIM.to_vec()
}

/// Decodes every pkt-line in `buf`, failing on a short read or a non-hex
/// length prefix.
pub fn decode_all(buf: &[u8]) -> Result<Vec<PktLine>> {
    let mut frames = Vec::new();
    let mut rest = buf;

    while !rest.is_empty() {
        let (frame, consumed) = decode_one(rest)?;
        frames.push(frame);
        rest = &rest[consumed..];
    }

    Ok(frames)
}

/// Decodes a single pkt-line from the front of `buf`, returning the frame
/// and the number of bytes consumed.
pub fn decode_one(buf: &[u8]) -> Result<(PktLine, usize)> {
    if buf.len() < 4 {
        return Err(GitError::ProtocolError("short read: incomplete pkt-line length prefix".into()));
    }

    let len_str = std::str::from_utf8(&buf[..4])
        .map_err(|_| GitError::ProtocolError("pkt-line length prefix is not ASCII".into()))?;
    let len = usize::from_str_radix(len_str, 16)
        .map_err(|_| GitError::ProtocolError(format!("non-hex pkt-line length '{len_str}'")))?;

    match len {
        0 => Ok((PktLine::Flush, 4)),
        1 => Ok((PktLine::Delim, 4)),
        2..=4 => Err(GitError::ProtocolError(format!("invalid pkt-line length {len}"))),
        _ => {
            if len > 65520 {
                return Err(GitError::ProtocolError(format!("pkt-line length {len} exceeds maximum")));
            }
            if buf.len() < len {
                return Err(GitError::ProtocolError("short read: pkt-line payload truncated".into()));
            }
            Ok((PktLine::Data(buf[4..len].to_vec()), len))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_length_matches_payload() {
        let frame = encode(b"want deadbeef\n");
        assert_eq!(&frame[..4], b"0012");
        assert_eq!(frame.len(), 0x12);
    }

    #[test]
    fn roundtrips_mixed_frame_sequence() {
        let mut buf = Vec::new();
        buf.extend(encode(b"hello\n"));
        buf.extend(delim());
        buf.extend(encode(b"world\n"));
        buf.extend(flush());

        let frames = decode_all(&buf).unwrap();
        assert_eq!(
            frames,
            vec![
                PktLine::Data(b"hello\n".to_vec()),
                PktLine::Delim,
                PktLine::Data(b"world\n".to_vec()),
                PktLine::Flush,
            ]
        );
    }

    #[test]
    fn rejects_non_hex_length() {
        let err = decode_all(b"zzzzpayload").unwrap_err();
        assert!(matches!(err, GitError::ProtocolError(_)));
    }

    #[test]
    fn rejects_short_read() {
        let err = decode_all(b"0020short").unwrap_err();
        assert!(matches!(err, GitError::ProtocolError(_)));
    }
}
