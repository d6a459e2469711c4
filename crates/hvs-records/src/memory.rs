//! In-memory repository for tests and dry runs.

use async_trait::async_trait;
use chrono::Utc;
use hvs_models::{NewViolation, StoredViolation};
use tokio::sync::Mutex;

use crate::error::RecordsResult;
use crate::repository::{newest_first, ViolationRepository};

#[derive(Default)]
struct Table {
    rows: Vec<StoredViolation>,
    next_id: u64,
}

/// Volatile violation repository.
#[derive(Default)]
pub struct InMemoryViolationRepository {
    table: Mutex<Table>,
}

impl InMemoryViolationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows in insertion order.
    pub async fn rows(&self) -> Vec<StoredViolation> {
        self.table.lock().await.rows.clone()
    }
}

#[async_trait]
impl ViolationRepository for InMemoryViolationRepository {
    async fn init(&self) -> RecordsResult<()> {
        Ok(())
    }

    async fn insert(&self, row: NewViolation) -> RecordsResult<StoredViolation> {
        let mut table = self.table.lock().await;
        table.next_id += 1;
        let stored = StoredViolation::from_new(table.next_id, row, Utc::now());
        table.rows.push(stored.clone());
        Ok(stored)
    }

    async fn list_recent(&self, limit: usize) -> RecordsResult<Vec<StoredViolation>> {
        let mut rows = self.table.lock().await.rows.clone();
        newest_first(&mut rows);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn clear(&self) -> RecordsResult<()> {
        let mut table = self.table.lock().await;
        table.rows.clear();
        table.next_id = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_list_clear() {
        let repo = InMemoryViolationRepository::new();
        let row = NewViolation {
            video_name: "a.mp4".into(),
            track_id: 4,
            frame_idx: 31,
            bbox: "1,2,3,4".into(),
            ratio_no_helmet: 0.85,
            image_path: None,
        };
        assert_eq!(repo.insert(row.clone()).await.unwrap().id, 1);
        assert_eq!(repo.insert(row.clone()).await.unwrap().id, 2);
        assert_eq!(repo.list_recent(1).await.unwrap()[0].id, 2);

        repo.clear().await.unwrap();
        assert!(repo.rows().await.is_empty());
        assert_eq!(repo.insert(row).await.unwrap().id, 1);
    }
}
