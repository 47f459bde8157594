//! Process-local record store.
//!
//! Backs `store.backend = "memory"` for local runs without a spreadsheet,
//! and serves as the store in tool, loop and coordinator tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use applymate_types::error::StoreError;
use applymate_types::job::{CellUpdate, JobRecord, RecordField, RowRef, StoredRow};

use super::store::RecordStore;

/// Records held in a `Vec`, one entry per row.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    rows: Mutex<Vec<JobRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given rows already present.
    pub fn with_records(records: Vec<JobRecord>) -> Self {
        Self {
            rows: Mutex::new(records),
        }
    }

    /// Copy of the current rows (test and CLI inspection).
    pub fn snapshot(&self) -> Vec<JobRecord> {
        self.rows().clone()
    }

    fn rows(&self) -> MutexGuard<'_, Vec<JobRecord>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordStore for InMemoryRecordStore {
    async fn append(&self, record: &JobRecord) -> Result<(), StoreError> {
        self.rows().push(record.clone());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<StoredRow>, StoreError> {
        Ok(self
            .rows()
            .iter()
            .enumerate()
            .map(|(index, record)| StoredRow {
                row: RowRef(index),
                record: record.clone(),
            })
            .collect())
    }

    async fn update_cell(&self, row: RowRef, field: RecordField, value: &str) -> Result<(), StoreError> {
        let mut rows = self.rows();
        let record = rows.get_mut(row.0).ok_or(StoreError::RowNotFound(row.0))?;
        record.set(field, value);
        Ok(())
    }

    async fn batch_update_cells(&self, updates: &[CellUpdate]) -> Result<(), StoreError> {
        let mut rows = self.rows();
        // Validate first so a bad reference leaves every row untouched.
        if let Some(bad) = updates.iter().find(|u| u.row.0 >= rows.len()) {
            return Err(StoreError::RowNotFound(bad.row.0));
        }
        for update in updates {
            rows[update.row.0].set(update.field, update.value.clone());
        }
        Ok(())
    }

    async fn delete_row(&self, row: RowRef) -> Result<(), StoreError> {
        let mut rows = self.rows();
        if row.0 >= rows.len() {
            return Err(StoreError::RowNotFound(row.0));
        }
        rows.remove(row.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(company: &str, position: &str) -> JobRecord {
        JobRecord {
            company: company.into(),
            position: position.into(),
            ..JobRecord::default()
        }
    }

    #[tokio::test]
    async fn rows_keep_insertion_order() {
        let store = InMemoryRecordStore::new();
        store.append(&job("Acme", "SWE")).await.unwrap();
        store.append(&job("Globex", "SRE")).await.unwrap();

        let rows = store.read_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, RowRef(0));
        assert_eq!(rows[1].record.company, "Globex");
    }

    #[tokio::test]
    async fn delete_shifts_later_rows() {
        let store = InMemoryRecordStore::with_records(vec![
            job("A", "1"),
            job("B", "2"),
            job("C", "3"),
        ]);
        store.delete_row(RowRef(0)).await.unwrap();

        let rows = store.read_all().await.unwrap();
        assert_eq!(rows[0].record.company, "B");
        assert_eq!(rows[0].row, RowRef(0));
    }

    #[tokio::test]
    async fn batch_update_rejects_out_of_range_without_writing() {
        let store = InMemoryRecordStore::with_records(vec![job("A", "1")]);
        let err = store
            .batch_update_cells(&[
                CellUpdate {
                    row: RowRef(0),
                    field: RecordField::ResponseStatus,
                    value: "Yes - Offer".into(),
                },
                CellUpdate {
                    row: RowRef(4),
                    field: RecordField::ResponseStatus,
                    value: "Yes - Offer".into(),
                },
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::RowNotFound(4)));
        assert_eq!(store.snapshot()[0].response_status, "");
    }

    #[tokio::test]
    async fn update_cell_out_of_range() {
        let store = InMemoryRecordStore::new();
        let err = store
            .update_cell(RowRef(0), RecordField::ResponseStatus, "No")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::RowNotFound(0)));
    }
}
