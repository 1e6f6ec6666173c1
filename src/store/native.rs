//! The platform credential store through `keyring`: the macOS login keychain,
//! the freedesktop Secret Service, or the Windows Credential Manager.

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::keychain::KeychainWriter;
use super::{Result, SecretStore, StoreKey};
use crate::error::AskpassError;

pub struct NativeStore {
    backend: &'static str,
    /// Present where new entries can carry a per-program access list.
    access_list_writer: Option<KeychainWriter>,
}

impl NativeStore {
    pub fn new() -> Self {
        if cfg!(target_os = "macos") {
            Self {
                backend: "macOS Keychain",
                access_list_writer: Some(KeychainWriter::new()),
            }
        } else if cfg!(windows) {
            Self {
                backend: "Windows Credential Manager",
                access_list_writer: None,
            }
        } else {
            Self {
                backend: "Secret Service",
                access_list_writer: None,
            }
        }
    }

    fn entry(&self, key: &StoreKey) -> Result<keyring::Entry> {
        keyring::Entry::new(&key.service, &key.account).map_err(|e| self.error(e))
    }

    fn error(&self, err: keyring::Error) -> AskpassError {
        match err {
            keyring::Error::NoStorageAccess(inner) => {
                AskpassError::store(self.backend, format!("cannot access storage: {}", inner))
            }
            other => AskpassError::store(self.backend, other.to_string()),
        }
    }
}

impl Default for NativeStore {
    fn default() -> Self {
        Self::new()
    }
}

/// `NoEntry` becomes `None`; every other failure stays an error.
fn optional<T>(result: keyring::Result<T>) -> keyring::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e),
    }
}

impl SecretStore for NativeStore {
    fn get(&self, key: &StoreKey) -> Result<Option<SecretString>> {
        let entry = self.entry(key)?;
        let password = optional(entry.get_password()).map_err(|e| self.error(e))?;
        Ok(match password {
            Some(password) if !password.is_empty() => Some(SecretString::new(password)),
            _ => None,
        })
    }

    fn put(
        &self,
        key: &StoreKey,
        secret: &SecretString,
        allowed_programs: &[PathBuf],
    ) -> Result<()> {
        if let Some(writer) = &self.access_list_writer {
            return writer.add(key, secret, allowed_programs);
        }

        debug!(
            backend = self.backend,
            account = %key.account,
            allowed = ?allowed_programs,
            "backend has no access lists; storing without one"
        );
        self.entry(key)?
            .set_password(secret.expose_secret())
            .map_err(|e| self.error(e))
    }

    fn delete(&self, key: &StoreKey) -> Result<bool> {
        let entry = self.entry(key)?;
        let deleted = optional(entry.delete_credential()).map_err(|e| self.error(e))?;
        Ok(deleted.is_some())
    }

    fn backend_name(&self) -> &'static str {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entry_is_not_an_error() {
        assert!(matches!(optional::<String>(Err(keyring::Error::NoEntry)), Ok(None)));
        assert!(matches!(optional(Ok(())), Ok(Some(()))));
    }

    #[test]
    fn test_other_failures_are_errors() {
        let failed = optional::<String>(Err(keyring::Error::Invalid(
            "service".into(),
            "empty".into(),
        )));
        let store = NativeStore::new();
        let err = store.error(failed.unwrap_err());
        assert!(matches!(err, AskpassError::Store { .. }));
        assert!(err.to_string().starts_with(store.backend_name()));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_linux_backend_has_no_access_lists() {
        let store = NativeStore::new();
        assert_eq!(store.backend_name(), "Secret Service");
        assert!(store.access_list_writer.is_none());
    }

    #[test]
    #[ignore] // Requires an unlocked keychain or a running Secret Service
    fn test_native_roundtrip() {
        let store = NativeStore::new();
        let key = StoreKey::new("sudo-askpass-test", "sudo-askpass-test");
        let secret = SecretString::new("kc_pw".to_string());

        store.put(&key, &secret, &[]).unwrap();
        assert!(store.contains(&key).unwrap());
        assert_eq!(store.get(&key).unwrap().unwrap().expose_secret(), "kc_pw");

        store
            .put(&key, &SecretString::new("kc_pw2".to_string()), &[])
            .unwrap();
        assert_eq!(store.get(&key).unwrap().unwrap().expose_secret(), "kc_pw2");

        assert!(store.delete(&key).unwrap());
        assert!(!store.delete(&key).unwrap());
        assert!(store.get(&key).unwrap().is_none());
    }
}
