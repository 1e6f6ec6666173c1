use std::io::{BufRead, IsTerminal, Write};

use anyhow::{bail, Context as _, Result};
use secrecy::SecretString;

use super::{config as show_config, store, Context};
use crate::config::{self, ASKPASS_PATH_VAR, CI_PASSWORD_VAR};

pub fn run(ctx: &Context) -> Result<()> {
    if !std::io::stdin().is_terminal() {
        bail!("setup is interactive. Run it from a terminal.");
    }
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    wizard(
        ctx,
        &mut stdin.lock(),
        &mut stdout.lock(),
        &mut store::prompt_new_password,
    )
}

/// The setup flow with its inputs injected: `input` answers questions and
/// `read_password` supplies the password to store.
pub fn wizard(
    ctx: &Context,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
    read_password: &mut dyn FnMut() -> Result<SecretString>,
) -> Result<()> {
    writeln!(out, "sudo-askpass setup")?;
    writeln!(out)?;
    show_config::run(ctx, out)?;
    writeln!(out)?;

    let backend = ctx.store.backend_name();
    let question = match ctx.key().and_then(|key| ctx.store.contains(&key)) {
        Ok(true) => format!("Replace the password stored in the {}?", backend),
        _ => format!("Store your sudo password in the {}?", backend),
    };
    if confirm(input, out, &question)? {
        let secret = read_password()?;
        store::save(ctx, &secret, out)?;
    }

    if let Some(path) = &ctx.config.settings_path {
        let mut settings = config::read_settings(path)?;
        let mut changed = false;

        let terminal_only = confirm(
            input,
            out,
            "Always use the terminal prompt instead of a password dialog?",
        )?;
        if settings.non_interactive.unwrap_or(false) != terminal_only {
            settings.non_interactive = Some(terminal_only);
            changed = true;
        }

        if let Some(secs) = ask_timeout(input, out)? {
            settings.timeout_secs = (secs > 0).then_some(secs);
            changed = true;
        }

        if changed {
            config::write_settings(path, &settings)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            writeln!(out, "Settings written to {}.", path.display())?;
        }
    }

    print_next_steps(ctx, out)?;
    Ok(())
}

fn confirm(input: &mut dyn BufRead, out: &mut dyn Write, question: &str) -> Result<bool> {
    write!(out, "{} [y/N]: ", question)?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y") || answer.trim().eq_ignore_ascii_case("yes"))
}

/// `None` keeps the current setting; `Some(0)` clears the timeout.
fn ask_timeout(input: &mut dyn BufRead, out: &mut dyn Write) -> Result<Option<u64>> {
    write!(out, "Prompt timeout in seconds (0 for none, blank to keep): ")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(None);
    }
    let timeout = config::parse_timeout(answer)?;
    Ok(Some(timeout.map(|t| t.as_secs()).unwrap_or(0)))
}

fn print_next_steps(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "Done. Next steps:")?;
    writeln!(out)?;
    writeln!(
        out,
        "  1. Point sudo at the helper:  export {}={}",
        ASKPASS_PATH_VAR,
        ctx.helper.display()
    )?;
    writeln!(out, "  2. Ask sudo to use it:        sudo -A true")?;
    writeln!(out, "  3. Check resolution:          sudo-askpass test")?;
    writeln!(out)?;
    writeln!(
        out,
        "In CI, inject {} per run and unset it afterwards.",
        CI_PASSWORD_VAR
    )?;
    Ok(())
}
