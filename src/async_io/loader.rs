//! Concurrent submission loader

use std::path::Path;

use futures::stream::{self, StreamExt, TryStreamExt};

use super::file_ops::find_instance_files_async;
use crate::error::{ExportError, Result};
use crate::instance::Instance;

/// Load every submission in a directory, reading up to `concurrency` files
/// at once. Results keep file name order.
pub async fn load_instances_async(dir: &Path, concurrency: usize) -> Result<Vec<Instance>> {
    let files = find_instance_files_async(dir).await?;
    log::info!(
        "Loading {} submissions asynchronously from {}",
        files.len(),
        dir.display()
    );

    stream::iter(files)
        .map(|path| async move {
            let json = tokio::fs::read_to_string(&path).await?;
            // Decoding is CPU work; keep it off the reactor
            tokio::task::spawn_blocking(move || {
                Instance::from_json_str(&json).map_err(|e| match e {
                    ExportError::InvalidInstance(msg) => {
                        ExportError::InvalidInstance(format!("{}: {msg}", path.display()))
                    }
                    other => other,
                })
            })
            .await
            .map_err(|e| ExportError::Join(e.to_string()))?
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}
