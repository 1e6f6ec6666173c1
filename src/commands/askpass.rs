use std::io::Write;

use anyhow::Result;
use secrecy::ExposeSecret;
use tracing::debug;

use super::Context;
use crate::error::AskpassError;
use crate::resolver::Resolver;

/// The ASKPASS entry point: print the resolved password and nothing else.
///
/// `prompt` is whatever text sudo passed as its sole argument. It plays no
/// part in resolution; the same environment and store always give the same
/// answer with or without it.
pub fn run(ctx: &Context, prompt: Option<&str>, out: &mut dyn Write) -> Result<()> {
    if let Some(prompt) = prompt {
        debug!(prompt, "invoked by sudo");
    }

    let Some(resolution) = Resolver::new(ctx.config, ctx.store, ctx.prompter).resolve() else {
        return Err(AskpassError::NoPassword.into());
    };

    out.write_all(resolution.secret.expose_secret().as_bytes())?;
    out.flush()?;
    Ok(())
}
