//! Pack stream decoding: header parsing, per-object variable-length
//! type/size headers, and dispatch between base objects and ref-deltas.
//!
//! The central correctness hinge is that each object's zlib stream is not
//! length-delimited within the pack; `compress::inflate_stream`'s
//! `(bytes, consumed)` contract is what lets this decoder find the next
//! object's header at the right offset.

use tracing::{debug, warn};

use crate::compress::inflate_stream;
use crate::delta::apply_delta;
use crate::error::{GitError, Result};
use crate::object::ObjectType;
use crate::store::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawObjType {
    Commit,
    Tree,
    Blob,
    Tag,
    OfsDelta,
    RefDelta,
}

impl RawObjType {
    fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(RawObjType::Commit),
            2 => Ok(RawObjType::Tree),
            3 => Ok(RawObjType::Blob),
            4 => Ok(RawObjType::Tag),
            6 => Ok(RawObjType::OfsDelta),
            7 => Ok(RawObjType::RefDelta),
            other => Err(GitError::ProtocolError(format!(
                "unknown pack object type code {other}"
            ))),
        }
    }

    fn as_object_type(self) -> Option<ObjectType> {
        match self {
            RawObjType::Commit => Some(ObjectType::Commit),
            RawObjType::Tree => Some(ObjectType::Tree),
            RawObjType::Blob => Some(ObjectType::Blob),
            RawObjType::Tag => Some(ObjectType::Tag),
            RawObjType::OfsDelta | RawObjType::RefDelta => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PackStats {
    pub object_count: u32,
    pub resolved_deltas: usize,
}

/// Reads the variable-length type+size header. The first byte's high bit is
/// a continuation flag, bits 6-4 are the type code, and bits 3-0 are the low
/// four bits of the size; each further continuation byte contributes 7 more
/// bits, with the bit-shift offset starting at 4 and increasing by 7.
fn read_type_size_header(data: &[u8]) -> Result<(RawObjType, u64, usize)> {
    let first = *data
        .first()
        .ok_or_else(|| GitError::ProtocolError("pack truncated reading object header".into()))?;

    let obj_type = RawObjType::from_code((first >> 4) & 0x7)?;
    let mut size = (first & 0x0f) as u64;
    let mut shift = 4u32;
    let mut consumed = 1usize;
    let mut cont = first & 0x80 != 0;

    while cont {
        let byte = *data.get(consumed).ok_or_else(|| {
            GitError::ProtocolError("pack truncated reading object size continuation".into())
        })?;
        consumed += 1;
        size |= ((byte & 0x7f) as u64) << shift;
        shift += 7;
        cont = byte & 0x80 != 0;
    }

    Ok((obj_type, size, consumed))
}

/// Reads an ofs-delta's variable-length backward offset. This uses a
/// different, MSB-first encoding from the size headers above: each
/// continuation byte adds `1` to the accumulated value before shifting it
/// left by 7 and OR-ing in the new 7 bits (the "offset bias" convention).
fn read_ofs_delta_offset(data: &[u8]) -> Result<(u64, usize)> {
    let mut consumed = 0usize;
    let mut byte = *data
        .first()
        .ok_or_else(|| GitError::ProtocolError("pack truncated reading ofs-delta offset".into()))?;
    consumed += 1;
    let mut value = (byte & 0x7f) as u64;

    while byte & 0x80 != 0 {
        byte = *data.get(consumed).ok_or_else(|| {
            GitError::ProtocolError("pack truncated reading ofs-delta offset".into())
        })?;
        consumed += 1;
        value += 1;
        value = (value << 7) | (byte & 0x7f) as u64;
    }

    Ok((value, consumed))
}

/// Parses the 12-byte pack header, decodes every object, and writes base
/// objects and resolved ref-deltas into `store`.
///
/// Ref-deltas whose base isn't yet present are deferred to a second pass
/// that retries until a fixed point: if a full retry round resolves
/// nothing, the set can never shrink further and decoding fails.
pub fn decode_pack(store: &ObjectStore, pack: &[u8]) -> Result<PackStats> {
    if pack.len() < 12 {
        return Err(GitError::ProtocolError("pack shorter than its fixed header".into()));
    }
    if &pack[0..4] != b"PACK" {
        return Err(GitError::ProtocolError("missing PACK magic".into()));
    }

    let version = u32::from_be_bytes(pack[4..8].try_into().unwrap());
    if version != 2 && version != 3 {
        return Err(GitError::ProtocolError(format!(
            "unsupported pack version {version}"
        )));
    }

    let count = u32::from_be_bytes(pack[8..12].try_into().unwrap());
    debug!(count, version, "decoding pack");

    let mut pos = 12usize;
    let mut deferred: Vec<(String, Vec<u8>)> = Vec::new();
    let mut resolved_deltas = 0usize;

    for _ in 0..count {
        let (obj_type, declared_size, header_len) = read_type_size_header(&pack[pos..])?;
        pos += header_len;

        match obj_type {
            RawObjType::OfsDelta => {
                let (_, offset_len) = read_ofs_delta_offset(&pack[pos..])?;
                pos += offset_len;
                return Err(GitError::NotImplemented(
                    "ofs_delta pack objects are not supported".into(),
                ));
            }
            RawObjType::RefDelta => {
                if pos + 20 > pack.len() {
                    return Err(GitError::ProtocolError(
                        "pack truncated reading ref-delta base name".into(),
                    ));
                }
                let base_hex = hex::encode(&pack[pos..pos + 20]);
                pos += 20;

                let (delta_bytes, consumed) = inflate_stream(&pack[pos..])?;
                pos += consumed;

                if store.exists(&base_hex) {
                    resolve_ref_delta(store, &base_hex, &delta_bytes)?;
                    resolved_deltas += 1;
                } else {
                    deferred.push((base_hex, delta_bytes));
                }
            }
            _ => {
                let kind = obj_type
                    .as_object_type()
                    .expect("non-delta RawObjType always maps to an ObjectType");
                let (payload, consumed) = inflate_stream(&pack[pos..])?;
                pos += consumed;

                if payload.len() as u64 != declared_size {
                    warn!(
                        declared = declared_size,
                        actual = payload.len(),
                        "pack object inflated to a different size than its header declared"
                    );
                }

                store.write(kind, &payload)?;
            }
        }
    }

    resolved_deltas += resolve_deferred(store, deferred)?;

    debug!(resolved_deltas, "finished decoding pack");
    Ok(PackStats {
        object_count: count,
        resolved_deltas,
    })
}

fn resolve_ref_delta(store: &ObjectStore, base_hex: &str, delta_bytes: &[u8]) -> Result<()> {
    let (base_type, base_payload) = store.read(base_hex)?;
    let result = apply_delta(&base_payload, delta_bytes)?;
    store.write(base_type, &result)?;
    Ok(())
}

/// Retries deferred ref-deltas (those whose base wasn't written yet when
/// first encountered) until a fixed point: a pack may reference a base
/// before the base itself appears, so resolution can't assume order and
/// fails only once a full pass resolves nothing.
fn resolve_deferred(store: &ObjectStore, mut remaining: Vec<(String, Vec<u8>)>) -> Result<usize> {
    let mut resolved = 0usize;

    while !remaining.is_empty() {
        let before = remaining.len();
        let mut still_deferred = Vec::new();

        for (base_hex, delta_bytes) in remaining {
            if store.exists(&base_hex) {
                resolve_ref_delta(store, &base_hex, &delta_bytes)?;
                resolved += 1;
            } else {
                still_deferred.push((base_hex, delta_bytes));
            }
        }

        if still_deferred.len() == before {
            return Err(GitError::ProtocolError(format!(
                "{} ref-delta(s) never resolved: base object never appeared in the pack",
                still_deferred.len()
            )));
        }
        remaining = still_deferred;
    }

    Ok(resolved)
}
