use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};

use super::{Result, SecretStore, StoreKey};
use crate::error::AskpassError;

/// In-memory stand-in for the OS secure store.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<StoreKey, (String, Vec<PathBuf>)>>,
    /// When set, every operation fails with this detail.
    pub failure: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            failure: Some(detail.to_string()),
            ..Self::default()
        }
    }

    pub fn allowed_programs(&self, key: &StoreKey) -> Option<Vec<PathBuf>> {
        self.entries.borrow().get(key).map(|(_, acl)| acl.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(detail) => Err(AskpassError::store("memory", detail.clone())),
            None => Ok(()),
        }
    }
}

impl SecretStore for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<Option<SecretString>> {
        self.check()?;
        Ok(self
            .entries
            .borrow()
            .get(key)
            .map(|(secret, _)| SecretString::new(secret.clone())))
    }

    fn put(
        &self,
        key: &StoreKey,
        secret: &SecretString,
        allowed_programs: &[PathBuf],
    ) -> Result<()> {
        self.check()?;
        self.entries.borrow_mut().insert(
            key.clone(),
            (secret.expose_secret().clone(), allowed_programs.to_vec()),
        );
        Ok(())
    }

    fn delete(&self, key: &StoreKey) -> Result<bool> {
        self.check()?;
        Ok(self.entries.borrow_mut().remove(key).is_some())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
