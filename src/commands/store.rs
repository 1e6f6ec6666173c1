use std::io::{BufRead, IsTerminal, Write};

use anyhow::{bail, Context as _, Result};
use secrecy::SecretString;
use tracing::debug;
use zeroize::Zeroize;

use super::Context;

pub fn run(ctx: &Context, from_stdin: bool, out: &mut dyn Write) -> Result<()> {
    let secret = if from_stdin {
        read_secret_line(&mut std::io::stdin().lock())?
    } else {
        if !std::io::stdin().is_terminal() {
            bail!("No terminal to prompt on. Use `sudo-askpass store --stdin` to pipe the password in.");
        }
        prompt_new_password()?
    };
    save(ctx, &secret, out)
}

/// Write `secret` to the secure store, replacing any previous entry.
pub fn save(ctx: &Context, secret: &SecretString, out: &mut dyn Write) -> Result<()> {
    let key = ctx.key()?;
    let allowed = ctx.allowed_programs();
    debug!(backend = ctx.store.backend_name(), account = %key.account, "storing password");

    ctx.store
        .put(&key, secret, &allowed)
        .with_context(|| format!("Failed to save password to {}", ctx.store.backend_name()))?;

    writeln!(
        out,
        "Password saved to {} for account '{}'.",
        ctx.store.backend_name(),
        key.account
    )?;
    Ok(())
}

/// Prompt twice with echo disabled and require both entries to match.
pub fn prompt_new_password() -> Result<SecretString> {
    let mut password = rpassword::prompt_password("sudo password to store: ")
        .context("Failed to read password")?;
    let mut confirm = rpassword::prompt_password("Confirm sudo password: ")
        .context("Failed to read password confirmation")?;

    let matches = password == confirm;
    confirm.zeroize();
    if !matches {
        password.zeroize();
        bail!("Passwords do not match.");
    }
    if password.is_empty() {
        bail!("Password must not be empty.");
    }

    Ok(SecretString::new(password))
}

/// Read a single line for scripted provisioning. The line terminator is dropped.
pub fn read_secret_line(input: &mut dyn BufRead) -> Result<SecretString> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read password from standard input")?;

    let trimmed = line.trim_end_matches(['\r', '\n']).to_string();
    line.zeroize();
    if trimmed.is_empty() {
        bail!("Password must not be empty.");
    }
    Ok(SecretString::new(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::{config, HELPER};
    use crate::config::DEFAULT_SUDO_PATH;
    use crate::prompt::fake::FakePrompter;
    use crate::store::memory::MemoryStore;
    use crate::store::SecretStore;
    use secrecy::ExposeSecret;
    use std::io::Cursor;
    use std::path::PathBuf;

    #[test]
    fn test_save_sets_access_list_and_overwrites() {
        let config = config(&[]);
        let backend = MemoryStore::new();
        let prompter = FakePrompter::default();
        let ctx = Context {
            config: &config,
            store: &backend,
            prompter: &prompter,
            helper: HELPER.into(),
        };

        let mut out = Vec::new();
        save(&ctx, &SecretString::new("first".into()), &mut out).unwrap();
        save(&ctx, &SecretString::new("second".into()), &mut out).unwrap();

        assert_eq!(backend.len(), 1);
        let key = ctx.key().unwrap();
        assert_eq!(backend.get(&key).unwrap().unwrap().expose_secret(), "second");
        assert_eq!(
            backend.allowed_programs(&key).unwrap(),
            vec![PathBuf::from(HELPER), PathBuf::from(DEFAULT_SUDO_PATH)]
        );

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("account 'alice'"));
        assert!(!printed.contains("second"));
    }

    #[test]
    fn test_save_reports_backend_failure() {
        let config = config(&[]);
        let backend = MemoryStore::failing("user interaction is not allowed");
        let prompter = FakePrompter::default();
        let ctx = Context {
            config: &config,
            store: &backend,
            prompter: &prompter,
            helper: HELPER.into(),
        };

        let err = save(&ctx, &SecretString::new("pw".into()), &mut Vec::new()).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Failed to save password to memory"));
        assert!(message.contains("user interaction is not allowed"));
    }

    #[test]
    fn test_save_without_account_is_refused() {
        let mut config = config(&[]);
        config.account = None;
        let backend = MemoryStore::new();
        let prompter = FakePrompter::default();
        let ctx = Context {
            config: &config,
            store: &backend,
            prompter: &prompter,
            helper: HELPER.into(),
        };

        let err = save(&ctx, &SecretString::new("pw".into()), &mut Vec::new()).unwrap_err();
        assert!(format!("{:#}", err).contains("Cannot determine the current user account"));
        assert_eq!(backend.len(), 0);
    }

    #[test]
    fn test_read_secret_line_strips_terminator() {
        let secret = read_secret_line(&mut Cursor::new("kc_pw\r\nignored\n")).unwrap();
        assert_eq!(secret.expose_secret(), "kc_pw");
    }

    #[test]
    fn test_read_secret_line_keeps_inner_whitespace() {
        let secret = read_secret_line(&mut Cursor::new(" pw with spaces \n")).unwrap();
        assert_eq!(secret.expose_secret(), " pw with spaces ");
    }

    #[test]
    fn test_read_secret_line_rejects_empty() {
        assert!(read_secret_line(&mut Cursor::new("\n")).is_err());
        assert!(read_secret_line(&mut Cursor::new("")).is_err());
    }
}
