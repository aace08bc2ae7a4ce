//! Path-sharded read/write of typed, framed, compressed objects by hex digest.

use std::fs;
use std::path::{Path, PathBuf};

use crate::compress::{deflate, inflate_all};
use crate::error::{GitError, Result};
use crate::object::{canonical_bytes, hash_canonical, parse_framed, ObjectType};

/// The object database rooted at a repository's `.git` directory.
pub struct ObjectStore {
    git_dir: PathBuf,
    check_integrity: bool,
}

impl ObjectStore {
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        ObjectStore {
            git_dir: git_dir.into(),
            check_integrity: true,
        }
    }

    pub fn without_integrity_check(mut self) -> Self {
        self.check_integrity = false;
        self
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn objects_dir(&self) -> PathBuf {
        self.git_dir.join("objects")
    }

    fn object_path(&self, hex: &str) -> PathBuf {
        self.objects_dir().join(&hex[..2]).join(&hex[2..])
    }

    pub fn exists(&self, hex: &str) -> bool {
        self.object_path(hex).is_file()
    }

    /// Computes the canonical framing, hashes it, zlib-deflates it, and
    /// writes it under its shard directory. Writing an already-present
    /// digest is a no-op beyond the redundant (but harmless) write, since
    /// identical content always produces identical bytes at the same path.
    pub fn write(&self, kind: ObjectType, payload: &[u8]) -> Result<String> {
        let framed = canonical_bytes(kind, payload);
        let digest = hash_canonical(&framed);
        let hex_digest = hex::encode(digest);

        let path = self.object_path(&hex_digest);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GitError::io(parent, e))?;
        }

        let compressed = deflate(&framed)?;
        self.write_atomic(&path, &compressed)?;

        Ok(hex_digest)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| GitError::io(parent, e))?;
        use std::io::Write;
        tmp.write_all(bytes).map_err(|e| GitError::io(path, e))?;
        tmp.persist(path)
            .map_err(|e| GitError::io(path, e.error))?;
        Ok(())
    }

    /// Reads an object by hex digest, returning its type and payload.
    pub fn read(&self, hex_digest: &str) -> Result<(ObjectType, Vec<u8>)> {
        let path = self.object_path(hex_digest);
        let compressed = fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::NotFound(hex_digest.to_string())
            } else {
                GitError::io(&path, e)
            }
        })?;

        let framed = inflate_all(&compressed)?;
        let (kind, payload) = parse_framed(&framed)?;

        if self.check_integrity {
            let rehashed = hex::encode(hash_canonical(&framed));
            if rehashed != hex_digest {
                return Err(GitError::Corrupt(format!(
                    "object {hex_digest} hashes to {rehashed} after decompression"
                )));
            }
        }

        Ok((kind, payload.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_store() -> (tempfile::TempDir, ObjectStore) {
        let dir = tempdir().unwrap();
        let git_dir = dir.path().join(".git");
        fs::create_dir_all(git_dir.join("objects")).unwrap();
        let store = ObjectStore::new(git_dir);
        (dir, store)
    }

    #[test]
    fn write_then_read_roundtrips() {
        let (_guard, store) = new_store();
        let digest = store.write(ObjectType::Blob, b"hello\n").unwrap();
        assert_eq!(digest, "ce013625030ba8dba906f756967f9e9ca394464a");

        let (kind, payload) = store.read(&digest).unwrap();
        assert_eq!(kind, ObjectType::Blob);
        assert_eq!(payload, b"hello\n");
    }

    #[test]
    fn write_is_idempotent() {
        let (_guard, store) = new_store();
        let first = store.write(ObjectType::Blob, b"same bytes").unwrap();
        let second = store.write(ObjectType::Blob, b"same bytes").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn read_missing_object_is_not_found() {
        let (_guard, store) = new_store();
        let err = store.read("0000000000000000000000000000000000000a").unwrap_err();
        assert!(matches!(err, GitError::NotFound(_)));
    }

    #[test]
    fn creates_shard_directory_on_write() {
        let (_guard, store) = new_store();
        let digest = store.write(ObjectType::Blob, b"shard me").unwrap();
        let path = store.object_path(&digest);
        assert!(path.exists());
        assert!(path.parent().unwrap().is_dir());
    }
}
