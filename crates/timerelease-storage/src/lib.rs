mod config;
mod db;
mod error;
mod package;

pub use config::{Config, PACKAGE_FILE_NAME};
pub use db::{BlobStore, FileStore, Storage};
pub use error::StorageError;
pub use package::PackageRepository;
