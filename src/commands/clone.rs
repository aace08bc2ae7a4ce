use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{GitError, Result};
use crate::http::{discover_refs, fetch_pack};
use crate::pack::decode_pack;
use crate::refs::RefStore;
use crate::store::ObjectStore;

/// `clone <url> [<dir>]`: initialize `dir`, fetch refs and a pack from
/// `url` over smart HTTP v2, and materialize `HEAD`'s tree.
pub fn invoke(url: &str, dir: Option<PathBuf>) -> Result<()> {
    let url = url.trim_end_matches('/');
    let dir = dir.unwrap_or_else(|| default_dir_for(url));

    let git_dir = dir.join(".git");
    let ref_store = RefStore::new(&git_dir);
    ref_store.init_skeleton()?;
    let store = ObjectStore::new(&git_dir);

    println!("Cloning into '{}'...", dir.display());

    let refs = discover_refs(url)?;
    let head_hex = refs
        .get("HEAD")
        .ok_or_else(|| GitError::ProtocolError("remote did not advertise HEAD".into()))?
        .clone();

    let mut wants: Vec<String> = refs.values().cloned().collect();
    wants.sort();
    wants.dedup();

    let pack = fetch_pack(url, &wants)?;
    let stats = decode_pack(&store, &pack)?;
    info!(
        objects = stats.object_count,
        resolved_deltas = stats.resolved_deltas,
        "received pack"
    );

    for (name, hex) in &refs {
        if name == "HEAD" {
            continue;
        }
        ref_store.write_ref(name, hex)?;
    }
    ref_store.set_head_to_commit(&head_hex)?;

    crate::checkout::checkout_commit(&store, &head_hex, &dir)?;

    println!("Received {} objects, resolved {} deltas", stats.object_count, stats.resolved_deltas);
    Ok(())
}

fn default_dir_for(url: &str) -> PathBuf {
    let mut name = url.rsplit('/').next().unwrap_or("repo").to_string();
    if let Some(stripped) = name.strip_suffix(".git") {
        name = stripped.to_string();
    }
    Path::new(&name).to_path_buf()
}
