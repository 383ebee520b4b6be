//! Line-delimited JSON transcript of raw stream fragments.
//!
//! A best-effort side channel: write failures are logged and swallowed so a
//! full disk never takes the conversation down with it.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::Result;
use crate::types::StreamFragment;

/// Appends one JSON object per fragment to a file.
#[derive(Debug)]
pub struct TranscriptWriter {
    path: PathBuf,
    file: Mutex<File>,
}

impl TranscriptWriter {
    /// Create (or truncate) a transcript file.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Open a transcript file for appending.
    pub async fn append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one fragment. Failures are logged, never propagated.
    pub async fn record(&self, fragment: &StreamFragment) {
        let line = match serde_json::to_string(fragment) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to serialize fragment for transcript");
                return;
            }
        };
        let mut file = self.file.lock().await;
        if let Err(e) = file.write_all(line.as_bytes()).await {
            warn!(path = %self.path.display(), error = %e, "failed to write transcript line");
            return;
        }
        if let Err(e) = file.write_all(b"\n").await {
            warn!(path = %self.path.display(), error = %e, "failed to write transcript line");
            return;
        }
        if let Err(e) = file.flush().await {
            warn!(path = %self.path.display(), error = %e, "failed to flush transcript");
        }
    }
}
