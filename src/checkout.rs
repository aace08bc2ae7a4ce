//! Materializes a commit's tree onto the filesystem.

use std::fs;
use std::path::Path;

use crate::commit::tree_hex_from_commit;
use crate::error::{GitError, Result};
use crate::object::ObjectType;
use crate::store::ObjectStore;
use crate::tree::{parse_entries, EntryKind};

/// Reads `commit_hex`, finds its tree, and recursively writes that tree's
/// contents under `dest`.
pub fn checkout_commit(store: &ObjectStore, commit_hex: &str, dest: &Path) -> Result<()> {
    let (kind, payload) = store.read(commit_hex)?;
    if kind != ObjectType::Commit {
        return Err(GitError::Corrupt(format!(
            "{commit_hex} is a {kind}, not a commit"
        )));
    }

    let tree_hex = tree_hex_from_commit(&payload)?;
    checkout_tree(store, &tree_hex, dest)
}

fn checkout_tree(store: &ObjectStore, tree_hex: &str, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).map_err(|e| GitError::io(dest, e))?;

    let (_, payload) = store.read(tree_hex)?;
    let entries = parse_entries(&payload)?;

    for entry in entries {
        let path = dest.join(entry_name_as_path(&entry.name));

        match entry.kind {
            EntryKind::Tree => {
                checkout_tree(store, &entry.hex(), &path)?;
            }
            EntryKind::Blob => {
                let (_, content) = store.read(&entry.hex())?;
                fs::write(&path, &content).map_err(|e| GitError::io(&path, e))?;
                if entry.mode == 0o100755 {
                    set_executable(&path)?;
                }
            }
            EntryKind::Symlink => {
                let (_, target) = store.read(&entry.hex())?;
                write_symlink(&target, &path)?;
            }
            EntryKind::Submodule => {
                return Err(GitError::NotImplemented(
                    "checkout of submodule (mode 160000) entries".into(),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path).map_err(|e| GitError::io(path, e))?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms).map_err(|e| GitError::io(path, e))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn write_symlink(target: &[u8], path: &Path) -> Result<()> {
    use std::os::unix::ffi::OsStrExt;
    let target_os = std::ffi::OsStr::from_bytes(target);
    std::os::unix::fs::symlink(target_os, path).map_err(|e| GitError::io(path, e))
}

#[cfg(not(unix))]
fn write_symlink(_target: &[u8], _path: &Path) -> Result<()> {
    Err(GitError::NotImplemented(
        "symlink checkout is only supported on unix platforms".into(),
    ))
}

/// Tree entry names are arbitrary bytes. On a POSIX-like filesystem a path
/// component can be built directly from those bytes with no encoding
/// round-trip.
#[cfg(unix)]
fn entry_name_as_path(name: &[u8]) -> &Path {
    use std::os::unix::ffi::OsStrExt;
    Path::new(std::ffi::OsStr::from_bytes(name))
}

#[cfg(not(unix))]
fn entry_name_as_path(name: &[u8]) -> std::path::PathBuf {
    std::path::PathBuf::from(String::from_utf8_lossy(name).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::{write_commit, Identity};
    use crate::tree::write_tree;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn checkout_reproduces_working_tree_bytes() {
        let src = tempdir().unwrap();
        fs::create_dir_all(src.path().join(".git/objects")).unwrap();
        let store = ObjectStore::new(src.path().join(".git"));

        let work = tempdir().unwrap();
        fs::write(work.path().join("a"), b"A\n").unwrap();
        fs::create_dir(work.path().join("b")).unwrap();
        fs::write(work.path().join("b/c"), b"C\n").unwrap();

        let tree_hex = write_tree(&store, work.path()).unwrap().unwrap();
        let identity = Identity::placeholder();
        let commit_hex = write_commit(&store, &tree_hex, &[], "init", &identity).unwrap();

        let dest = tempdir().unwrap();
        checkout_commit(&store, &commit_hex, dest.path()).unwrap();

        assert_eq!(fs::read(dest.path().join("a")).unwrap(), b"A\n");
        assert_eq!(fs::read(dest.path().join("b/c")).unwrap(), b"C\n");
    }

    #[test]
    fn checkout_rejects_non_commit_object() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
        let store = ObjectStore::new(dir.path().join(".git"));
        let blob_hex = store.write(ObjectType::Blob, b"not a commit").unwrap();

        let dest = tempdir().unwrap();
        let err = checkout_commit(&store, &blob_hex, dest.path()).unwrap_err();
        assert!(matches!(err, GitError::Corrupt(_)));
    }
}
