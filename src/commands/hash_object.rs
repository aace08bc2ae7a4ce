use std::fs;
use std::path::Path;

use crate::error::{GitError, Result};
use crate::object::{canonical_bytes, hash_canonical, ObjectType};
use crate::store::ObjectStore;

/// `hash-object -w <path>`: store `path`'s contents as a blob, printing its digest.
/// Without `-w`, just computes and prints the digest without writing.
pub fn invoke(store: &ObjectStore, path: &Path, write: bool) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| GitError::io(path, e))?;

    if write {
        store.write(ObjectType::Blob, &bytes)
    } else {
        let framed = canonical_bytes(ObjectType::Blob, &bytes);
        Ok(hex::encode(hash_canonical(&framed)))
    }
}
