use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write a blob into `dir` under its capture name.
///
/// The bytes go through a named temp file in the same directory which is then
/// persisted to the final name, so a crash mid-write never leaves a truncated
/// file behind and the temp handle is always released.
pub fn save_blob(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create download directory: {:?}", dir))?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {:?}", dir))?;
    temp.write_all(bytes)
        .with_context(|| format!("Failed to write {}", name))?;

    let dest = dir.join(name);
    temp.persist(&dest)
        .with_context(|| format!("Failed to persist {:?}", dest))?;

    tracing::info!("Saved {} bytes to {:?}", bytes.len(), dest);
    Ok(dest)
}
