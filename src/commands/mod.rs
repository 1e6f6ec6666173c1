pub mod askpass;
pub mod config;
pub mod remove;
pub mod setup;
pub mod store;

use std::path::PathBuf;

use crate::config::Config;
use crate::error::AskpassError;
use crate::prompt::InteractivePrompter;
use crate::store::{SecretStore, StoreKey};

/// What every subcommand needs: the resolved configuration, the wired-in
/// collaborators, and the path of this executable.
pub struct Context<'a> {
    pub config: &'a Config,
    pub store: &'a dyn SecretStore,
    pub prompter: &'a dyn InteractivePrompter,
    pub helper: PathBuf,
}

impl Context<'_> {
    /// Key of the stored password. Fails when no account name could be found.
    pub fn key(&self) -> Result<StoreKey, AskpassError> {
        store_key(self.config).ok_or_else(|| {
            AskpassError::Config(
                "Cannot determine the current user account. Set USER and retry.".into(),
            )
        })
    }

    /// Programs allowed to read the stored password: this helper and sudo.
    pub fn allowed_programs(&self) -> Vec<PathBuf> {
        vec![self.helper.clone(), self.config.sudo_path.clone()]
    }
}

pub fn store_key(config: &Config) -> Option<StoreKey> {
    let account = config.account.as_deref()?;
    Some(StoreKey::new(account, &config.service))
}

/// Path of the running executable, canonicalized where possible.
pub fn helper_path() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe.canonicalize().unwrap_or(exe))
}
