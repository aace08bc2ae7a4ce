use std::io::Write;

use crate::error::Result;
use crate::store::ObjectStore;

/// `cat-file -p|-t|-s <hash>`: print an object's payload, type, or size.
pub fn invoke(store: &ObjectStore, hash: &str, type_only: bool, size_only: bool) -> Result<()> {
    let (kind, payload) = store.read(hash)?;

    if type_only {
        println!("{kind}");
        return Ok(());
    }

    if size_only {
        println!("{}", payload.len());
        return Ok(());
    }

    std::io::stdout().write_all(&payload)?;
    Ok(())
}
