//! zlib deflate/inflate, including the streaming inflate contract the pack
//! decoder depends on: pack object streams are not length-delimited, so the
//! caller must learn exactly how many input bytes the decompressor consumed.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{GitError, Result};

/// Compresses `payload` at a fixed, fast compression level (the store does
/// not need maximum ratio; content addressing already dedupes).
pub fn deflate(payload: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(payload)?;
    Ok(encoder.finish()?)
}

/// Inflates a whole zlib buffer that is known to contain exactly one stream
/// and nothing else (the on-disk object format).
pub fn inflate_all(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| GitError::Corrupt(format!("zlib inflate failed: {e}")))?;
    Ok(out)
}

/// Inflates a zlib stream embedded in a larger buffer with trailing,
/// unrelated bytes (a pack object). Returns the inflated payload and the
/// exact number of input bytes the zlib stream consumed, so the caller can
/// locate the next object's header.
///
/// This is the central correctness hinge of pack parsing: `flate2` tracks
/// `total_in` across the underlying reader, which for a `&[u8]` source is
/// precisely the pack-stream byte offset to resume from.
pub fn inflate_stream(compressed: &[u8]) -> Result<(Vec<u8>, usize)> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| GitError::Corrupt(format!("zlib inflate failed: {e}")))?;
    let consumed = decoder.total_in() as usize;
    Ok((out, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate_inflate_roundtrips() {
        let payload = b"tree 6\0hello\n".to_vec();
        let compressed = deflate(&payload).unwrap();
        let inflated = inflate_all(&compressed).unwrap();
        assert_eq!(inflated, payload);
    }

    #[test]
    fn inflate_stream_reports_exact_consumption() {
        let payload = b"some payload bytes".to_vec();
        let compressed = deflate(&payload).unwrap();

        let mut buf = compressed.clone();
        buf.extend_from_slice(b"TRAILING-GARBAGE-NOT-PART-OF-STREAM");

        let (inflated, consumed) = inflate_stream(&buf).unwrap();
        assert_eq!(inflated, payload);
        assert_eq!(consumed, compressed.len());
    }
}
