//! JSON-lines file repository.
//!
//! One [`StoredViolation`] per line, appended in insertion order. Writes are
//! serialized through a mutex so concurrent jobs never interleave lines.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use hvs_models::{NewViolation, StoredViolation};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{RecordsError, RecordsResult};
use crate::repository::{newest_first, ViolationRepository};

/// File-backed violation repository.
pub struct JsonlViolationRepository {
    path: PathBuf,
    /// Next id to assign; `None` until the file has been scanned.
    next_id: Mutex<Option<u64>>,
}

impl JsonlViolationRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            next_id: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_rows(&self) -> RecordsResult<Vec<StoredViolation>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut rows = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredViolation>(line) {
                Ok(row) => rows.push(row),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = line_no + 1,
                    error = %e,
                    "Skipping malformed violation row"
                ),
            }
        }
        Ok(rows)
    }

    async fn scan_next_id(&self) -> RecordsResult<u64> {
        let rows = self.read_rows().await?;
        Ok(rows.iter().map(|r| r.id).max().unwrap_or(0) + 1)
    }
}

/// True for an empty file or one whose last byte is a newline.
async fn ends_with_newline(file: &mut tokio::fs::File) -> RecordsResult<bool> {
    if file.metadata().await?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] == b'\n')
}

#[async_trait]
impl ViolationRepository for JsonlViolationRepository {
    async fn init(&self) -> RecordsResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        // Touch the file without truncating it.
        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let next = self.scan_next_id().await?;
        *self.next_id.lock().await = Some(next);

        info!(path = %self.path.display(), next_id = next, "Violations store ready");
        Ok(())
    }

    async fn insert(&self, row: NewViolation) -> RecordsResult<StoredViolation> {
        let mut next_id = self.next_id.lock().await;
        let id = match *next_id {
            Some(id) => id,
            None => self.scan_next_id().await?,
        };

        let stored = StoredViolation::from_new(id, row, Utc::now());
        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| RecordsError::write_failed(format!("{}: {}", self.path.display(), e)))?;
        // A torn earlier append must not swallow this row.
        if !ends_with_newline(&mut file).await? {
            warn!(path = %self.path.display(), "Terminating partial violation row");
            line.insert(0, '\n');
        }
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        *next_id = Some(id + 1);
        debug!(id, video = %stored.video_name, track_id = stored.track_id, "Violation persisted");
        Ok(stored)
    }

    async fn list_recent(&self, limit: usize) -> RecordsResult<Vec<StoredViolation>> {
        let mut rows = self.read_rows().await?;
        newest_first(&mut rows);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn clear(&self) -> RecordsResult<()> {
        let mut next_id = self.next_id.lock().await;
        tokio::fs::write(&self.path, b"").await?;
        *next_id = Some(1);
        info!(path = %self.path.display(), "Violations store cleared");
        Ok(())
    }
}
