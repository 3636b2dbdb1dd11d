//! Async operations for locating submission files

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::Result;
use crate::loader::validate_directory;

/// Find all submission files (`*.json`) in a directory asynchronously,
/// sorted by path
pub async fn find_instance_files_async(dir: &Path) -> Result<Vec<PathBuf>> {
    validate_directory(dir)?;

    let mut files = Vec::<PathBuf>::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let metadata = fs::metadata(&path).await?;
        if metadata.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }

    if files.is_empty() {
        log::warn!("No submission files found in directory: {}", dir.display());
    }

    files.sort();
    Ok(files)
}
