pub mod keychain;
#[cfg(test)]
pub mod memory;
pub mod native;

use std::path::PathBuf;
use std::process::Output;

use secrecy::SecretString;

use crate::error::AskpassError;

pub type Result<T> = std::result::Result<T, AskpassError>;

/// Identifies the single stored credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub account: String,
    pub service: String,
}

impl StoreKey {
    pub fn new(account: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            service: service.into(),
        }
    }
}

/// Core abstraction over the OS secure store. Commands interact only with this trait.
pub trait SecretStore {
    /// Read the secret. A missing entry is `Ok(None)`, not an error.
    fn get(&self, key: &StoreKey) -> Result<Option<SecretString>>;

    /// Whether an entry exists, without reading the secret where the backend allows it.
    fn contains(&self, key: &StoreKey) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Create or overwrite the entry, restricting access to `allowed_programs`.
    fn put(&self, key: &StoreKey, secret: &SecretString, allowed_programs: &[PathBuf])
        -> Result<()>;

    /// Delete the entry. Returns whether one existed; deleting nothing is not an error.
    fn delete(&self, key: &StoreKey) -> Result<bool>;

    fn backend_name(&self) -> &'static str;
}

/// The secure store native to this platform.
pub fn system() -> Box<dyn SecretStore> {
    Box::new(native::NativeStore::new())
}

/// Map a spawn failure of a store tool to `ToolMissing` when the binary is absent.
fn spawn_error(tool: &'static str, backend: &'static str, err: std::io::Error) -> AskpassError {
    if err.kind() == std::io::ErrorKind::NotFound {
        AskpassError::ToolMissing(tool.to_string())
    } else {
        AskpassError::store(backend, format!("could not run {}: {}", tool, err))
    }
}

/// Build a store error from a failed tool invocation, keeping the tool's own diagnostic.
fn command_failed(backend: &'static str, action: &str, output: &Output) -> AskpassError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr.trim();
    let status = output
        .status
        .code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".into());
    if detail.is_empty() {
        AskpassError::store(backend, format!("{} failed (exit {})", action, status))
    } else {
        AskpassError::store(backend, format!("{} failed (exit {}): {}", action, status, detail))
    }
}
