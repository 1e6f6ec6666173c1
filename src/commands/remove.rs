use std::io::Write;

use anyhow::{Context as _, Result};

use super::Context;

/// Delete the stored password. Removing nothing is not an error.
pub fn run(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    let backend = ctx.store.backend_name();
    let key = ctx.key()?;
    let removed = ctx
        .store
        .delete(&key)
        .with_context(|| format!("Failed to remove password from {}", backend))?;

    if removed {
        writeln!(out, "Removed stored password from {}.", backend)?;
    } else {
        writeln!(out, "No password stored in {}. Nothing to remove.", backend)?;
    }
    Ok(())
}
