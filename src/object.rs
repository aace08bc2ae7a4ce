use std::fmt;
use std::str::FromStr;

use sha1::{Digest, Sha1};

use crate::error::{GitError, Result};

/// The four object types recognized by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
            ObjectType::Tag => "tag",
        };
        f.write_str(s)
    }
}

impl FromStr for ObjectType {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            "tag" => Ok(ObjectType::Tag),
            other => Err(GitError::Corrupt(format!("unknown object type '{other}'"))),
        }
    }
}

/// Builds the canonical framing `"<type> <len>\0<payload>"` an object is hashed and stored under.
pub fn canonical_bytes(kind: ObjectType, payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(payload.len() + 32);
    framed.extend(kind.to_string().as_bytes());
    framed.push(b' ');
    framed.extend(payload.len().to_string().as_bytes());
    framed.push(0);
    framed.extend(payload);
    framed
}

/// SHA-1 of an object's canonical framing; this is the object's storage key.
pub fn hash_canonical(framed: &[u8]) -> [u8; 20] {
    Sha1::new().chain_update(framed).finalize().into()
}

/// Splits inflated object bytes into `(type, payload)`, validating the header framing.
///
/// Fails with `Corrupt` if there is no NUL terminator, the header isn't
/// `"<type> <len>"`, or the declared length doesn't match the payload.
pub fn parse_framed(framed: &[u8]) -> Result<(ObjectType, &[u8])> {
    let nul = framed
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| GitError::Corrupt("object header missing NUL terminator".into()))?;

    let header = std::str::from_utf8(&framed[..nul])
        .map_err(|_| GitError::Corrupt("object header is not valid UTF-8".into()))?;

    let (type_str, size_str) = header
        .split_once(' ')
        .ok_or_else(|| GitError::Corrupt(format!("malformed object header '{header}'")))?;

    let kind = type_str.parse::<ObjectType>()?;
    let declared_len: usize = size_str
        .parse()
        .map_err(|_| GitError::Corrupt(format!("non-numeric object length '{size_str}'")))?;

    let payload = &framed[nul + 1..];
    if payload.len() != declared_len {
        return Err(GitError::Corrupt(format!(
            "declared length {declared_len} does not match payload length {}",
            payload.len()
        )));
    }

    Ok((kind, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_framing_roundtrips() {
        let framed = canonical_bytes(ObjectType::Blob, b"hello\n");
        assert_eq!(framed, b"blob 6\0hello\n");
        let (kind, payload) = parse_framed(&framed).unwrap();
        assert_eq!(kind, ObjectType::Blob);
        assert_eq!(payload, b"hello\n");
    }

    #[test]
    fn hello_blob_hashes_to_known_digest() {
        let framed = canonical_bytes(ObjectType::Blob, b"hello\n");
        let digest = hash_canonical(&framed);
        assert_eq!(hex::encode(digest), "ce013625030ba8dba906f756967f9e9ca394464a");
    }

    #[test]
    fn rejects_length_mismatch() {
        let mut framed = canonical_bytes(ObjectType::Blob, b"hello\n");
        framed.push(b'!');
        assert!(matches!(parse_framed(&framed), Err(GitError::Corrupt(_))));
    }
}
