//! Violation repository interface.

use async_trait::async_trait;
use hvs_models::{NewViolation, StoredViolation};

use crate::error::RecordsResult;

/// Durable record of confirmed violations.
#[async_trait]
pub trait ViolationRepository: Send + Sync {
    /// Create the backing store if needed.
    async fn init(&self) -> RecordsResult<()>;

    /// Persist a violation; id and `created_at` are assigned here.
    async fn insert(&self, row: NewViolation) -> RecordsResult<StoredViolation>;

    /// Newest first by `created_at`, at most `limit` rows.
    async fn list_recent(&self, limit: usize) -> RecordsResult<Vec<StoredViolation>>;

    /// Remove every row; ids restart at 1.
    async fn clear(&self) -> RecordsResult<()>;
}

/// Newest first, ties broken by descending id.
pub(crate) fn newest_first(rows: &mut [StoredViolation]) {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
