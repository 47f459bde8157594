//! Record store trait definition.

use applymate_types::error::StoreError;
use applymate_types::job::{CellUpdate, JobRecord, RecordField, RowRef, StoredRow};

/// Tabular store holding one job record per row, in insertion order.
///
/// Row references are positional: a [`RowRef`] obtained from `read_all` is
/// only valid until the next `delete_row`. Each call is expected to be atomic
/// on its own; callers get no cross-call isolation.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
/// Implementations live in applymate-infra (Google Sheets) and
/// [`super::memory`] (process-local).
pub trait RecordStore: Send + Sync {
    /// Append a record after the last row.
    fn append(
        &self,
        record: &JobRecord,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Read every record in store order.
    fn read_all(&self) -> impl std::future::Future<Output = Result<Vec<StoredRow>, StoreError>> + Send;

    /// Overwrite one cell.
    fn update_cell(
        &self,
        row: RowRef,
        field: RecordField,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Overwrite several cells in a single request.
    fn batch_update_cells(
        &self,
        updates: &[CellUpdate],
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Remove a row; later rows shift up by one.
    fn delete_row(&self, row: RowRef) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
