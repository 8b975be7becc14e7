//! File-based storage for the state document

use anyhow::Context;
use std::path::Path;
use tokio::fs as async_fs;
use tracing::debug;

/// Write content to a file atomically
///
/// # Error Recovery
///
/// Uses atomic write pattern:
/// 1. Write to temporary file
/// 2. Rename temp file to target
/// 3. Original file is preserved if write fails
pub async fn write_atomic(path: &Path, content: &str) -> anyhow::Result<()> {
    debug!(path = ?path, "Writing store file atomically");

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        async_fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create store directory: {:?}", parent))?;
    }

    let temp_path = path.with_extension("tmp");

    async_fs::write(&temp_path, content)
        .await
        .with_context(|| format!("Failed to write temp file: {:?}", temp_path))?;

    async_fs::rename(&temp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp file to target: {:?}", path))?;

    debug!(path = ?path, "Store file written");
    Ok(())
}

/// Read file content as string
pub async fn read_to_string(path: &Path) -> anyhow::Result<String> {
    debug!(path = ?path, "Reading store file");

    let content = async_fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file: {:?}", path))?;

    Ok(content)
}
