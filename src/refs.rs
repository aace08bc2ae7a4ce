//! `HEAD` and `refs/*` as plain text files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GitError, Result};

pub struct RefStore {
    git_dir: PathBuf,
}

impl RefStore {
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        RefStore {
            git_dir: git_dir.into(),
        }
    }

    /// Creates the initial skeleton: `objects/`, `refs/heads/`, `refs/tags/`,
    /// and a `HEAD` symref pointing at `refs/heads/main`.
    pub fn init_skeleton(&self) -> Result<()> {
        for sub in ["objects", "refs/heads", "refs/tags"] {
            let path = self.git_dir.join(sub);
            fs::create_dir_all(&path).map_err(|e| GitError::io(&path, e))?;
        }
        let head = self.git_dir.join("HEAD");
        fs::write(&head, "ref: refs/heads/main\n").map_err(|e| GitError::io(&head, e))?;
        Ok(())
    }

    /// Writes `<git_dir>/<name>` (e.g. `refs/heads/main`) as `"<hex>\n"`.
    pub fn write_ref(&self, name: &str, hex_digest: &str) -> Result<()> {
        let path = self.git_dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GitError::io(parent, e))?;
        }
        fs::write(&path, format!("{hex_digest}\n")).map_err(|e| GitError::io(&path, e))
    }

    /// Points `HEAD` directly at a digest (used by `clone`, which does not
    /// preserve symref-ness on the discovered `HEAD`).
    pub fn set_head_to_commit(&self, hex_digest: &str) -> Result<()> {
        let path = self.git_dir.join("HEAD");
        fs::write(&path, format!("{hex_digest}\n")).map_err(|e| GitError::io(&path, e))
    }

    pub fn read_ref(&self, name: &str) -> Result<String> {
        let path = self.git_dir.join(name);
        let content = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::NotFound(name.to_string())
            } else {
                GitError::io(&path, e)
            }
        })?;
        Ok(content.trim().to_string())
    }

    /// Resolves `HEAD`, following one level of symref indirection.
    pub fn resolve_head(&self) -> Result<String> {
        let content = self.read_ref("HEAD")?;
        if let Some(target) = content.strip_prefix("ref: ") {
            self.read_ref(target.trim())
        } else {
            Ok(content)
        }
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_writes_main_symref() {
        let dir = tempdir().unwrap();
        let store = RefStore::new(dir.path().join(".git"));
        store.init_skeleton().unwrap();

        let head = fs::read_to_string(dir.path().join(".git/HEAD")).unwrap();
        assert_eq!(head, "ref: refs/heads/main\n");
        assert!(dir.path().join(".git/refs/heads").is_dir());
        assert!(dir.path().join(".git/refs/tags").is_dir());
    }

    #[test]
    fn resolve_head_follows_symref() {
        let dir = tempdir().unwrap();
        let store = RefStore::new(dir.path().join(".git"));
        store.init_skeleton().unwrap();
        store.write_ref("refs/heads/main", "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef").unwrap();

        assert_eq!(
            store.resolve_head().unwrap(),
            "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef"
        );
    }
}
