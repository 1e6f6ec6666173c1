use std::io::Write;
use std::path::Path;

use anyhow::Result;

use super::Context;
use crate::config::{
    ASKPASS_PATH_VAR, CI_PASSWORD_VAR, DEBUG_VAR, NON_INTERACTIVE_VAR, SESSION_PASSWORD_VAR,
    TIMEOUT_VAR,
};
use crate::prompt::{self, Channel};

/// Print the password sources in priority order. Never prints secret values.
pub fn run(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    let config = ctx.config;
    let store_status = match ctx.key().and_then(|key| ctx.store.contains(&key)) {
        Ok(true) => "password stored".to_string(),
        Ok(false) => "no password stored".to_string(),
        Err(e) => format!("unavailable ({})", e),
    };
    let interactive = match prompt::select_channel(config, ctx.prompter) {
        Some(Channel::Dialog) => "password dialog",
        Some(Channel::Terminal) => "terminal prompt",
        None => "unavailable",
    };

    writeln!(out, "Password sources (highest priority first):")?;
    writeln!(out, "  1. {:<28} {}", CI_PASSWORD_VAR, set_or_unset(config.ci_password.is_some()))?;
    writeln!(
        out,
        "  2. {:<28} {}",
        SESSION_PASSWORD_VAR,
        set_or_unset(config.session_password.is_some())
    )?;
    writeln!(out, "  3. {:<28} {}", ctx.store.backend_name(), store_status)?;
    writeln!(out, "  4. {:<28} {}", "interactive", interactive)?;
    writeln!(out)?;

    writeln!(out, "Settings:")?;
    let account = config.account.as_deref().unwrap_or("(unknown)");
    writeln!(out, "  {:<31} {}", "account", account)?;
    writeln!(out, "  {:<31} {}", "service", config.service)?;
    writeln!(out, "  {:<31} {}", NON_INTERACTIVE_VAR, on_or_off(config.non_interactive))?;
    writeln!(out, "  {:<31} {}", DEBUG_VAR, on_or_off(config.debug))?;
    let timeout = config
        .timeout
        .map(|t| format!("{}s", t.as_secs()))
        .unwrap_or_else(|| "none".into());
    writeln!(out, "  {:<31} {}", TIMEOUT_VAR, timeout)?;
    let settings_file = match &config.settings_path {
        Some(path) if path.exists() => path.display().to_string(),
        Some(path) => format!("{} (not created)", path.display()),
        None => "(no config directory)".into(),
    };
    writeln!(out, "  {:<31} {}", "settings file", settings_file)?;
    let allowed: Vec<String> = ctx
        .allowed_programs()
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    writeln!(out, "  {:<31} {}", "keychain access", allowed.join(", "))?;
    writeln!(out)?;

    match &config.askpass_path {
        Some(path) if is_helper(path, &ctx.helper) => {
            writeln!(out, "{} points at this helper.", ASKPASS_PATH_VAR)?;
        }
        Some(path) => {
            writeln!(
                out,
                "{} points at {}, not this helper ({}).",
                ASKPASS_PATH_VAR,
                path.display(),
                ctx.helper.display()
            )?;
        }
        None => {
            writeln!(
                out,
                "{} is unset. Run: export {}={}",
                ASKPASS_PATH_VAR,
                ASKPASS_PATH_VAR,
                ctx.helper.display()
            )?;
        }
    }
    Ok(())
}

/// `helper` is already canonical; `path` may be a symlink to it.
fn is_helper(path: &Path, helper: &Path) -> bool {
    path == helper || path.canonicalize().map_or(false, |p| p == helper)
}

fn set_or_unset(set: bool) -> &'static str {
    if set {
        "set"
    } else {
        "unset"
    }
}

fn on_or_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::{config, HELPER};
    use crate::prompt::fake::FakePrompter;
    use crate::store::memory::MemoryStore;
    use crate::store::SecretStore;
    use secrecy::SecretString;
    use tempfile::TempDir;

    fn render(config: &crate::config::Config, backend: &MemoryStore) -> String {
        render_for(config, backend, HELPER)
    }

    fn render_for(config: &crate::config::Config, backend: &MemoryStore, helper: &str) -> String {
        let prompter = FakePrompter {
            terminal_attached: true,
            ..Default::default()
        };
        let ctx = Context {
            config,
            store: backend,
            prompter: &prompter,
            helper: helper.into(),
        };
        let mut out = Vec::new();
        run(&ctx, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_lists_sources_without_values() {
        let config = config(&[
            (CI_PASSWORD_VAR, "ci_password"),
            (ASKPASS_PATH_VAR, HELPER),
        ]);
        let backend = MemoryStore::new();
        backend
            .put(
                &crate::store::StoreKey::new("alice", "sudo-askpass"),
                &SecretString::new("kc_pw".into()),
                &[],
            )
            .unwrap();

        let printed = render(&config, &backend);
        assert!(printed.contains("password stored"));
        assert!(printed.contains("terminal prompt"));
        assert!(printed.contains("points at this helper"));
        assert!(!printed.contains("ci_password"));
        assert!(!printed.contains("kc_pw"));

        let ci = printed.find(&format!("1. {}", CI_PASSWORD_VAR)).unwrap();
        let session = printed.find(&format!("2. {}", SESSION_PASSWORD_VAR)).unwrap();
        let store = printed.find("3. memory").unwrap();
        assert!(ci < session && session < store);
    }

    #[test]
    fn test_store_errors_are_reported_inline() {
        let config = config(&[]);
        let printed = render(&config, &MemoryStore::failing("keychain locked"));
        assert!(printed.contains("unavailable"));
        assert!(printed.contains("keychain locked"));
        assert!(printed.contains("is unset"));
    }

    #[test]
    fn test_unknown_account_is_reported() {
        let mut config = config(&[]);
        config.account = None;
        let printed = render(&config, &MemoryStore::new());
        assert!(printed.contains("(unknown)"));
        assert!(printed.contains("Cannot determine the current user account"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_askpass_path_is_this_helper() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("sudo-askpass");
        std::fs::write(&real, "").unwrap();
        let link = dir.path().join("linked-askpass");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        let helper = real.canonicalize().unwrap();

        let config = config(&[(ASKPASS_PATH_VAR, link.to_str().unwrap())]);
        let printed = render_for(&config, &MemoryStore::new(), helper.to_str().unwrap());
        assert!(printed.contains("points at this helper"), "{printed}");

        let config = self::config(&[(ASKPASS_PATH_VAR, "/opt/other/askpass")]);
        let printed = render_for(&config, &MemoryStore::new(), helper.to_str().unwrap());
        assert!(printed.contains("not this helper"), "{printed}");
    }
}
