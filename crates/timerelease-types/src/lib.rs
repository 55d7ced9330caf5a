pub mod error;
pub mod package;

pub use error::TypesError;
pub use package::{BLOCK_LEN, TimeLockPackage};
