use std::path::Path;

use crate::error::{GitError, Result};
use crate::store::ObjectStore;
use crate::tree::write_tree;

/// `write-tree`: snapshot the current directory into tree objects, printing
/// the root digest.
pub fn invoke(store: &ObjectStore, cwd: &Path) -> Result<String> {
    write_tree(store, cwd)?.ok_or_else(|| GitError::Corrupt("cannot build a tree object for an empty directory".into()))
}
