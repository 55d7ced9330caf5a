//! File-backed store for time-lock packages.
//!
//! Packages are written once: a write never replaces an existing package,
//! and a reader never observes a partially written one.
use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use timerelease_types::TimeLockPackage;

use crate::Config;
use crate::config::is_plain_file_name;
use crate::PackageRepository;
use crate::StorageError;

/// Trait abstracting the byte-level store under the package repository.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Stores `value` under `key`, failing with [`StorageError::AlreadyExists`]
    /// if the key is taken.
    fn put_new(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// One file per key inside a root directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        FileStore { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if !is_plain_file_name(key) {
            return Err(StorageError::Config(format!("Invalid package key: {:?}", key)).into());
        }
        Ok(self.root.join(key))
    }
}

impl BlobStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e).into()),
        }
    }

    fn put_new(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            return Err(StorageError::AlreadyExists(path).into());
        }

        // Same directory as the target so the final move is a rename
        let mut temp = tempfile::NamedTempFile::new_in(&self.root).map_err(StorageError::Io)?;
        temp.write_all(value).map_err(StorageError::Io)?;
        temp.as_file().sync_all().map_err(StorageError::Io)?;

        temp.persist_noclobber(&path).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                StorageError::AlreadyExists(path.clone())
            } else {
                StorageError::Io(e.error)
            }
        })?;
        tracing::debug!(path = %path.display(), bytes = value.len(), "stored blob");
        Ok(())
    }
}

pub struct Storage {
    config: Config,
    packages: PackageRepository<FileStore>,
}

impl Storage {
    pub fn new(config: Config) -> Result<Self> {
        if config.create_if_missing {
            std::fs::create_dir_all(&config.base_path).map_err(StorageError::Io)?;
        } else if !config.base_path.is_dir() {
            return Err(StorageError::NotFound(config.base_path.clone()).into());
        }

        let store = Arc::new(FileStore::new(config.base_path.clone()));
        let packages = PackageRepository::new(store);

        Ok(Storage { config, packages })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn packages(&self) -> &PackageRepository<FileStore> {
        &self.packages
    }

    /// Persists `package` at the configured path. Never overwrites.
    pub fn write_package(&self, package: &TimeLockPackage) -> Result<()> {
        self.packages
            .put_package(self.config.package_key(), package)?;
        tracing::info!(path = %self.config.package_path.display(), "package written");
        Ok(())
    }

    /// Reads and validates the package at the configured path.
    pub fn read_package(&self) -> Result<TimeLockPackage> {
        match self.packages.package(self.config.package_key()) {
            Ok(package) => Ok(package),
            Err(e) => match e.downcast::<StorageError>() {
                Ok(StorageError::NotFound(_)) => {
                    Err(StorageError::NotFound(self.config.package_path.clone()).into())
                }
                Ok(other) => Err(other.into()),
                Err(other) => Err(other),
            },
        }
    }

    pub fn has_package(&self) -> bool {
        self.config.package_path.is_file()
    }
}
