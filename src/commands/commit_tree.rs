use crate::commit::{write_commit, Identity};
use crate::error::Result;
use crate::store::ObjectStore;

/// `commit-tree <tree> [-p <parent>]... -m <message>`: write a commit object.
pub fn invoke(store: &ObjectStore, tree_hex: &str, parents: &[String], message: &str) -> Result<String> {
    let identity = Identity::placeholder();
    write_commit(store, tree_hex, parents, message, &identity)
}
