use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AskpassError;

/// Highest-priority source, injected per pipeline run.
pub const CI_PASSWORD_VAR: &str = "CI_SUDO_PASSWORD";
/// Second-priority source, exported in an interactive shell session.
pub const SESSION_PASSWORD_VAR: &str = "SUDO_PASSWORD";
/// Read by sudo to locate this helper. Only reported on, never required.
pub const ASKPASS_PATH_VAR: &str = "SUDO_ASKPASS";
pub const NON_INTERACTIVE_VAR: &str = "SUDO_ASKPASS_NONINTERACTIVE";
pub const DEBUG_VAR: &str = "SUDO_ASKPASS_DEBUG";
pub const TIMEOUT_VAR: &str = "SUDO_ASKPASS_TIMEOUT";

/// Service label of the single keychain entry this helper owns.
pub const SERVICE_LABEL: &str = "sudo-askpass";
pub const DEFAULT_SUDO_PATH: &str = "/usr/bin/sudo";

const CONFIG_DIR: &str = "sudo-askpass";
const CONFIG_FILE: &str = "config.toml";

/// Snapshot of the process environment, taken once at startup.
pub type EnvVars = HashMap<String, String>;

/// Optional on-disk settings. Environment variables take precedence.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_interactive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sudo_path: Option<PathBuf>,
}

/// Everything an invocation needs to know, resolved once before any source is consulted.
///
/// Building it never fails: a bad timeout, an unreadable settings file or an
/// unknown account only disable the feature that depends on them, so the
/// password variables always get a chance to answer.
#[derive(Debug)]
pub struct Config {
    pub ci_password: Option<SecretString>,
    pub session_password: Option<SecretString>,
    pub askpass_path: Option<PathBuf>,
    pub non_interactive: bool,
    pub debug: bool,
    /// Upper bound on interactive prompts. `None` waits forever.
    pub timeout: Option<Duration>,
    pub gui_session: bool,
    /// Owner of the stored password. `None` disables the secure store.
    pub account: Option<String>,
    pub service: String,
    /// The privilege-elevation program granted keychain access alongside this helper.
    pub sudo_path: PathBuf,
    pub settings_path: Option<PathBuf>,
}

impl Config {
    /// Build the configuration from an environment snapshot and the settings file,
    /// falling back to the password database for the account name.
    pub fn load(vars: &EnvVars) -> Self {
        let settings_path = settings_path(vars);
        let settings = match &settings_path {
            Some(path) => read_settings(path).unwrap_or_else(|e| {
                warn!(error = %e, "ignoring settings file");
                Settings::default()
            }),
            None => Settings::default(),
        };
        let mut config = Self::from_parts(vars, settings, cfg!(target_os = "macos"));
        if config.account.is_none() {
            config.account = os_account();
        }
        config.settings_path = settings_path;
        config
    }

    /// Build the configuration from an explicit variable snapshot.
    /// `macos` selects the GUI-session heuristic.
    pub fn from_parts(vars: &EnvVars, settings: Settings, macos: bool) -> Self {
        let from_settings = settings
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let timeout = match non_empty(vars, TIMEOUT_VAR).map(parse_timeout) {
            Some(Ok(timeout)) => timeout,
            Some(Err(e)) => {
                warn!(error = %e, "ignoring prompt timeout");
                from_settings
            }
            None => from_settings,
        };

        let non_interactive = match vars.get(NON_INTERACTIVE_VAR) {
            Some(_) => is_truthy(vars, NON_INTERACTIVE_VAR),
            None => settings.non_interactive.unwrap_or(false),
        };

        Self {
            ci_password: lookup(vars, &[CI_PASSWORD_VAR]),
            session_password: lookup(vars, &[SESSION_PASSWORD_VAR]),
            askpass_path: non_empty(vars, ASKPASS_PATH_VAR).map(PathBuf::from),
            non_interactive,
            debug: is_truthy(vars, DEBUG_VAR),
            timeout,
            gui_session: gui_session(vars, macos),
            account: non_empty(vars, "USER")
                .or_else(|| non_empty(vars, "LOGNAME"))
                .map(str::to_string),
            service: SERVICE_LABEL.to_string(),
            sudo_path: settings
                .sudo_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SUDO_PATH)),
            settings_path: None,
        }
    }
}

/// Collect the process environment, skipping entries that are not valid UTF-8.
pub fn snapshot_env() -> EnvVars {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Return the value of the first variable in `names` that is set and non-empty.
/// Set-but-empty is treated the same as unset.
pub fn lookup(vars: &EnvVars, names: &[&str]) -> Option<SecretString> {
    names
        .iter()
        .find_map(|name| non_empty(vars, name))
        .map(|value| SecretString::new(value.to_string()))
}

/// A flag is on when set to anything other than empty, `0`, `false`, `no` or `off`.
pub fn is_truthy(vars: &EnvVars, name: &str) -> bool {
    match non_empty(vars, name) {
        Some(value) => !matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => false,
    }
}

fn non_empty<'a>(vars: &'a EnvVars, name: &str) -> Option<&'a str> {
    vars.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

/// Parse a timeout in whole seconds. `0` disables the timeout.
pub fn parse_timeout(raw: &str) -> Result<Option<Duration>, AskpassError> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        AskpassError::Config(format!(
            "{} must be a whole number of seconds, got {:?}",
            TIMEOUT_VAR, raw
        ))
    })?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

/// On macOS a dialog can be shown unless we are inside an SSH session.
/// Elsewhere an X11 or Wayland display must be advertised.
pub fn gui_session(vars: &EnvVars, macos: bool) -> bool {
    if macos {
        non_empty(vars, "SSH_CONNECTION").is_none() && non_empty(vars, "SSH_TTY").is_none()
    } else {
        non_empty(vars, "DISPLAY").is_some() || non_empty(vars, "WAYLAND_DISPLAY").is_some()
    }
}

/// Returns the settings file path, or `None` if no config home can be determined.
pub fn settings_path(vars: &EnvVars) -> Option<PathBuf> {
    let base = match non_empty(vars, "XDG_CONFIG_HOME") {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(non_empty(vars, "HOME")?).join(".config"),
    };
    Some(base.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Read settings from `path`. A missing file yields the defaults.
pub fn read_settings(path: &Path) -> Result<Settings, AskpassError> {
    if !path.exists() {
        debug!(path = %path.display(), "no settings file");
        return Ok(Settings::default());
    }
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw)
        .map_err(|e| AskpassError::Config(format!("{}: {}", path.display(), e)))
}

/// Write settings to `path`, creating the parent directory if needed.
pub fn write_settings(path: &Path, settings: &Settings) -> Result<(), AskpassError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let raw = toml::to_string(settings).map_err(|e| AskpassError::Config(e.to_string()))?;
    std::fs::write(path, raw)?;
    Ok(())
}

#[cfg(unix)]
fn os_account() -> Option<String> {
    nix::unistd::User::from_uid(nix::unistd::getuid())
        .ok()
        .flatten()
        .map(|user| user.name)
}

#[cfg(not(unix))]
fn os_account() -> Option<String> {
    None
}
