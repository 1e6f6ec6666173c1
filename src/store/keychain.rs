//! Keychain writes through the `security` tool, the one interface that attaches
//! a trusted-application list (`-T`) to a generic password item.

use std::path::PathBuf;
use std::process::Command;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::{command_failed, spawn_error, Result, StoreKey};

const TOOL: &str = "security";
const BACKEND: &str = "macOS Keychain";

pub struct KeychainWriter {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl KeychainWriter {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(TOOL),
            leading_args: Vec::new(),
        }
    }

    /// Create the item, or update it in place with `-U`. A failed write leaves
    /// any existing item untouched.
    pub fn add(
        &self,
        key: &StoreKey,
        secret: &SecretString,
        allowed_programs: &[PathBuf],
    ) -> Result<()> {
        let label = format!("{} ({})", key.service, key.account);
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .arg("add-generic-password")
            .arg("-U")
            .args(["-a", key.account.as_str()])
            .args(["-s", key.service.as_str()])
            .args(["-l", label.as_str()]);
        for program in allowed_programs {
            command.arg("-T").arg(program);
        }
        command.arg("-w").arg(secret.expose_secret());

        debug!(
            account = %key.account,
            service = %key.service,
            allowed = ?allowed_programs,
            "writing keychain entry"
        );
        let output = command.output().map_err(|e| spawn_error(TOOL, BACKEND, e))?;
        if !output.status.success() {
            return Err(command_failed(BACKEND, "add-generic-password", &output));
        }
        Ok(())
    }
}

impl Default for KeychainWriter {
    fn default() -> Self {
        Self::new()
    }
}
