use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("Package already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Package not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Types error: {0}")]
    Types(#[from] timerelease_types::TypesError),
}
