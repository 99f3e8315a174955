//! Manifest batch files
//!
//! Batches are append-only: the file is created if missing, each body is
//! appended in order, and the file is synced before returning.

use std::path::Path;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{Error, Result};

/// Append manifest bodies to `path` in order and sync them to disk
pub async fn append_manifests<S: AsRef<str>>(path: &Path, bodies: &[S]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| Error::persist(path, e))?;

    for body in bodies {
        file.write_all(body.as_ref().as_bytes())
            .await
            .map_err(|e| Error::persist(path, e))?;
    }

    file.flush().await.map_err(|e| Error::persist(path, e))?;
    file.sync_all().await.map_err(|e| Error::persist(path, e))?;

    debug!(path = %path.display(), documents = bodies.len(), "Persisted manifests");
    Ok(())
}
