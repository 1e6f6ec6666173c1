use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::config::{Config, CI_PASSWORD_VAR, SESSION_PASSWORD_VAR};
use crate::prompt::{self, Channel, InteractivePrompter, DIALOG_MESSAGE, TERMINAL_MESSAGE};
use crate::commands::store_key;
use crate::store::SecretStore;

/// Where a resolved password came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    CiVariable,
    SessionVariable,
    SecureStore,
    Dialog,
    Terminal,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::CiVariable => write!(f, "{}", CI_PASSWORD_VAR),
            Source::SessionVariable => write!(f, "{}", SESSION_PASSWORD_VAR),
            Source::SecureStore => write!(f, "secure store"),
            Source::Dialog => write!(f, "password dialog"),
            Source::Terminal => write!(f, "terminal prompt"),
        }
    }
}

#[derive(Debug)]
pub struct Resolution {
    pub source: Source,
    pub secret: SecretString,
}

/// Walks the password sources in priority order and stops at the first hit.
pub struct Resolver<'a> {
    config: &'a Config,
    store: &'a dyn SecretStore,
    prompter: &'a dyn InteractivePrompter,
}

impl<'a> Resolver<'a> {
    pub fn new(
        config: &'a Config,
        store: &'a dyn SecretStore,
        prompter: &'a dyn InteractivePrompter,
    ) -> Self {
        Self {
            config,
            store,
            prompter,
        }
    }

    /// Returns `None` when every source is exhausted. That is an expected
    /// outcome, not an error.
    pub fn resolve(&self) -> Option<Resolution> {
        let found = self
            .from_environment()
            .or_else(|| self.from_store())
            .or_else(|| self.from_prompt());
        match &found {
            Some(resolution) => debug!(source = %resolution.source, "password resolved"),
            None => debug!("no source yielded a password"),
        }
        found
    }

    fn from_environment(&self) -> Option<Resolution> {
        if let Some(secret) = &self.config.ci_password {
            return Some(resolution(Source::CiVariable, copy(secret)));
        }
        if let Some(secret) = &self.config.session_password {
            return Some(resolution(Source::SessionVariable, copy(secret)));
        }
        debug!("password variables unset");
        None
    }

    fn from_store(&self) -> Option<Resolution> {
        let Some(key) = store_key(self.config) else {
            warn!("cannot determine the current user account; skipping the secure store");
            return None;
        };
        match self.store.get(&key) {
            Ok(Some(secret)) => Some(resolution(Source::SecureStore, secret)),
            Ok(None) => {
                debug!(backend = self.store.backend_name(), account = %key.account, "no stored password");
                None
            }
            Err(e) => {
                warn!(backend = self.store.backend_name(), error = %e, "secure store lookup failed");
                None
            }
        }
    }

    fn from_prompt(&self) -> Option<Resolution> {
        match prompt::select_channel(self.config, self.prompter) {
            Some(Channel::Dialog) => match self.prompter.dialog(DIALOG_MESSAGE) {
                Ok(answer) => answer.map(|secret| resolution(Source::Dialog, secret)),
                Err(e) => {
                    // A broken dialog tool is not a cancel; the terminal may still work.
                    warn!(error = %e, "password dialog unavailable");
                    self.from_terminal()
                }
            },
            Some(Channel::Terminal) => self.from_terminal(),
            None => {
                debug!("no interactive channel available");
                None
            }
        }
    }

    fn from_terminal(&self) -> Option<Resolution> {
        if !self.prompter.has_terminal() {
            return None;
        }
        match self.prompter.terminal(TERMINAL_MESSAGE) {
            Ok(answer) => answer.map(|secret| resolution(Source::Terminal, secret)),
            Err(e) => {
                warn!(error = %e, "terminal prompt failed");
                None
            }
        }
    }
}

fn resolution(source: Source, secret: SecretString) -> Resolution {
    Resolution { source, secret }
}

fn copy(secret: &SecretString) -> SecretString {
    SecretString::new(secret.expose_secret().clone())
}
