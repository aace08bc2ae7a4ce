use std::path::Path;

use crate::error::Result;
use crate::refs::RefStore;

/// `init`: create the `.git` skeleton in `dir`.
pub fn invoke(dir: &Path) -> Result<()> {
    let git_dir = dir.join(".git");
    RefStore::new(&git_dir).init_skeleton()?;
    println!("Initialized empty Git repository in {}", git_dir.display());
    Ok(())
}
