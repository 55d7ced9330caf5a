use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use timerelease_types::TimeLockPackage;

use crate::{BlobStore, StorageError};

pub struct PackageRepository<S: BlobStore> {
    store: Arc<S>,
}

impl<S: BlobStore> PackageRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        PackageRepository { store }
    }

    /// Loads and validates the package stored under `key`.
    pub fn package(&self, key: &str) -> Result<TimeLockPackage> {
        let bytes = self
            .store
            .get(key)?
            .ok_or_else(|| StorageError::NotFound(PathBuf::from(key)))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| StorageError::Config(format!("Package {} is not UTF-8: {}", key, e)))?;
        Ok(TimeLockPackage::from_json(&text).map_err(StorageError::Types)?)
    }

    /// Stores `package` under `key` unless something is already there.
    pub fn put_package(&self, key: &str, package: &TimeLockPackage) -> Result<()> {
        package.validate().map_err(StorageError::Types)?;
        let text = package.to_json().map_err(StorageError::Types)?;
        self.store.put_new(key, text.as_bytes())
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.store.get(key)?.is_some())
    }
}
