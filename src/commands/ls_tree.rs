use crate::error::Result;
use crate::ls_tree::{render, LsTreeMode};
use crate::store::ObjectStore;

/// `ls-tree <flag> <hash>`: print a filtered, expanded tree listing.
pub fn invoke(store: &ObjectStore, hash: &str, mode: LsTreeMode) -> Result<()> {
    for line in render(store, hash, mode)? {
        println!("{line}");
    }
    Ok(())
}
