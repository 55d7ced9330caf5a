use std::path::PathBuf;

use crate::StorageError;

/// Default file name of the stored package.
pub const PACKAGE_FILE_NAME: &str = "timerelease.json";

/// Configuration for the package store.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_path: PathBuf,
    pub package_path: PathBuf,

    pub create_if_missing: bool,
}

impl Config {
    /// Creates a new storage configuration rooted at `base_path`.
    pub fn new(base_path: PathBuf) -> Self {
        Config {
            package_path: base_path.join(PACKAGE_FILE_NAME),
            base_path,
            create_if_missing: true,
        }
    }

    /// Same as [`Config::new`] with a custom package file name.
    ///
    /// The name must be a plain file name directly under `base_path`.
    pub fn with_file_name(base_path: PathBuf, file_name: &str) -> Result<Self, StorageError> {
        if !is_plain_file_name(file_name) {
            return Err(StorageError::Config(format!(
                "Invalid package file name: {:?}",
                file_name
            )));
        }
        Ok(Config {
            package_path: base_path.join(file_name),
            ..Config::new(base_path)
        })
    }

    /// Key under which the package is stored, relative to `base_path`.
    pub fn package_key(&self) -> &str {
        self.package_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(PACKAGE_FILE_NAME)
    }
}

/// True for a single path component that names a file.
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = Config::new(PathBuf::from("/tmp/test_store"));

        assert_eq!(config.base_path, PathBuf::from("/tmp/test_store"));
        assert_eq!(
            config.package_path,
            PathBuf::from("/tmp/test_store/timerelease.json")
        );
        assert!(config.create_if_missing);
        assert_eq!(config.package_key(), "timerelease.json");
    }

    #[test]
    fn test_custom_file_name() {
        let config =
            Config::with_file_name(PathBuf::from("/tmp/test_store"), "letter.json").unwrap();

        assert_eq!(
            config.package_path,
            PathBuf::from("/tmp/test_store/letter.json")
        );
        assert_eq!(config.package_key(), "letter.json");
        assert!(config.create_if_missing);
    }

    #[test]
    fn test_file_name_must_be_single_component() {
        let base = PathBuf::from("/tmp/test_store");
        for name in ["", ".", "..", "sub/x.json", "sub\\x.json", "/abs.json"] {
            assert!(
                matches!(
                    Config::with_file_name(base.clone(), name),
                    Err(StorageError::Config(_))
                ),
                "name {:?} should be rejected",
                name
            );
        }
    }
}
