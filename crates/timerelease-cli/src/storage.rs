use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use timerelease_puzzle::PuzzleConfig;
use timerelease_storage::{Config, Storage};

/// Opens the package store rooted at `dir`.
pub fn open_storage(dir: &Path, create: bool) -> Result<Storage> {
    let mut config = Config::new(PathBuf::from(dir));
    config.create_if_missing = create;
    Storage::new(config).with_context(|| format!("opening package store at {}", dir.display()))
}

/// Loads puzzle tunables from a JSON file, or the defaults when no file is given.
pub fn load_puzzle_config(path: Option<&Path>) -> Result<PuzzleConfig> {
    let Some(path) = path else {
        return Ok(PuzzleConfig::get_default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading puzzle config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing puzzle config {}", path.display()))
}

/// Replaces `path` with `bytes` through a temporary file in the same directory.
///
/// On failure the previous contents of `path` are left as they were.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;
    temp.write_all(bytes)
        .and_then(|()| temp.as_file().sync_all())
        .with_context(|| format!("writing {}", path.display()))?;
    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
