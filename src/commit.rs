//! Commit object assembly: `tree <hex>\n(parent <hex>\n)*author ...\ncommitter ...\n\n<message>\n`.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{GitError, Result};
use crate::object::ObjectType;
use crate::store::ObjectStore;

/// Author/committer identity. Nothing upstream of this module sources one;
/// `Identity::placeholder` supplies a fixed stand-in when none is given.
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn placeholder() -> Self {
        Identity {
            name: "gitkit".to_string(),
            email: "gitkit@localhost".to_string(),
        }
    }
}

fn now_unix_seconds() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| GitError::Corrupt(format!("system clock before epoch: {e}")))?
        .as_secs())
}

/// Builds the canonical commit payload text.
pub fn build_commit_text(tree_hex: &str, parents: &[String], identity: &Identity, message: &str) -> Result<String> {
    let timestamp = now_unix_seconds()?;
    let mut text = format!("tree {tree_hex}\n");

    for parent in parents {
        text.push_str(&format!("parent {parent}\n"));
    }

    text.push_str(&format!(
        "author {} <{}> {timestamp} +0000\n",
        identity.name, identity.email
    ));
    text.push_str(&format!(
        "committer {} <{}> {timestamp} +0000\n",
        identity.name, identity.email
    ));
    text.push('\n');
    text.push_str(message);
    if !message.ends_with('\n') {
        text.push('\n');
    }

    Ok(text)
}

/// Writes a commit object for `tree_hex` with the given parents and message,
/// returning its digest.
pub fn write_commit(
    store: &ObjectStore,
    tree_hex: &str,
    parents: &[String],
    message: &str,
    identity: &Identity,
) -> Result<String> {
    if !store.exists(tree_hex) {
        return Err(GitError::NotFound(tree_hex.to_string()));
    }
    for parent in parents {
        if !store.exists(parent) {
            return Err(GitError::NotFound(parent.clone()));
        }
    }

    let text = build_commit_text(tree_hex, parents, identity, message)?;
    store.write(ObjectType::Commit, text.as_bytes())
}

/// Extracts the `tree <hex>` line from a commit payload by scanning headers
/// line-by-line (not by byte-index: the upstream-compatible header block
/// can, in general, vary in which line comes first).
pub fn tree_hex_from_commit(payload: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| GitError::Corrupt("commit payload is not valid UTF-8".into()))?;

    for line in text.lines() {
        if line.is_empty() {
            break; // header/message separator reached without finding a tree line
        }
        if let Some(hex) = line.strip_prefix("tree ") {
            return Ok(hex.trim().to_string());
        }
    }

    Err(GitError::Corrupt("commit has no tree header".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, ObjectStore) {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
        let store = ObjectStore::new(dir.path().join(".git"));
        (dir, store)
    }

    #[test]
    fn commit_text_has_expected_shape() {
        let identity = Identity::placeholder();
        let text = build_commit_text("deadbeef", &[], &identity, "init").unwrap();
        assert!(text.starts_with("tree deadbeef\nauthor "));
        assert!(text.ends_with("init\n"));
        assert!(text.contains("\n\ninit\n"));
    }

    #[test]
    fn multiple_parents_appear_before_author() {
        let identity = Identity::placeholder();
        let text = build_commit_text(
            "deadbeef",
            &["aaaa".to_string(), "bbbb".to_string()],
            &identity,
            "merge",
        )
        .unwrap();
        let parent_a = text.find("parent aaaa").unwrap();
        let parent_b = text.find("parent bbbb").unwrap();
        let author = text.find("author ").unwrap();
        assert!(parent_a < parent_b);
        assert!(parent_b < author);
    }

    #[test]
    fn tree_hex_found_even_when_not_first_line() {
        let payload = b"parent aaaa\ntree deadbeef\nauthor x\n\nmsg\n";
        assert_eq!(tree_hex_from_commit(payload).unwrap(), "deadbeef");
    }

    #[test]
    fn write_commit_rejects_missing_tree() {
        let (_guard, store) = store();
        let identity = Identity::placeholder();
        let err = write_commit(&store, "0000000000000000000000000000000000000a", &[], "msg", &identity)
            .unwrap_err();
        assert!(matches!(err, GitError::NotFound(_)));
    }
}
