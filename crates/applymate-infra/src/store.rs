//! Record store selected by configuration.

use applymate_core::records::memory::InMemoryRecordStore;
use applymate_core::records::store::RecordStore;
use applymate_types::config::{StoreBackend, StoreConfig};
use applymate_types::error::{ConfigError, StoreError};
use applymate_types::job::{CellUpdate, JobRecord, RecordField, RowRef, StoredRow};

use crate::secret::EnvSecrets;
use crate::sheets::auth::ServiceAccountAuth;
use crate::sheets::client::{SheetLocation, SheetsRecordStore};

/// The configured backend.
///
/// An enum rather than a trait object: [`RecordStore`] uses RPITIT and is
/// not object safe.
pub enum ConfiguredRecordStore {
    Sheets(SheetsRecordStore),
    Memory(InMemoryRecordStore),
}

impl ConfiguredRecordStore {
    pub fn backend(&self) -> StoreBackend {
        match self {
            ConfiguredRecordStore::Sheets(_) => StoreBackend::Sheets,
            ConfiguredRecordStore::Memory(_) => StoreBackend::Memory,
        }
    }
}

/// Build the store named by `config.backend`.
///
/// # Errors
///
/// The Sheets backend needs a spreadsheet id and the service-account
/// secrets; either missing is [`ConfigError::MissingCredentials`].
pub fn open_record_store(
    config: &StoreConfig,
    secrets: &EnvSecrets,
) -> Result<ConfiguredRecordStore, ConfigError> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory record store");
            Ok(ConfiguredRecordStore::Memory(InMemoryRecordStore::new()))
        }
        StoreBackend::Sheets => {
            let spreadsheet_id = config
                .spreadsheet_id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| {
                    ConfigError::MissingCredentials(
                        "store.spreadsheet_id (or GOOGLE_SPREADSHEET_ID) is required for the sheets backend"
                            .into(),
                    )
                })?;
            let account = secrets.require_service_account()?;

            let client = reqwest::Client::builder()
                .build()
                .map_err(|e| ConfigError::Invalid(format!("failed to create HTTP client: {e}")))?;
            let auth = ServiceAccountAuth::new(client.clone(), account.email.clone(), &account.private_key)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            let location = SheetLocation {
                spreadsheet_id,
                sheet_name: config.sheet_name.clone(),
                sheet_id: config.sheet_id,
            };
            let store = SheetsRecordStore::new(client, auth, location)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;

            tracing::info!(
                sheet = %config.sheet_name,
                account = %account.email,
                "Using Google Sheets record store"
            );
            Ok(ConfiguredRecordStore::Sheets(store))
        }
    }
}

impl RecordStore for ConfiguredRecordStore {
    async fn append(&self, record: &JobRecord) -> Result<(), StoreError> {
        match self {
            ConfiguredRecordStore::Sheets(store) => store.append(record).await,
            ConfiguredRecordStore::Memory(store) => store.append(record).await,
        }
    }

    async fn read_all(&self) -> Result<Vec<StoredRow>, StoreError> {
        match self {
            ConfiguredRecordStore::Sheets(store) => store.read_all().await,
            ConfiguredRecordStore::Memory(store) => store.read_all().await,
        }
    }

    async fn update_cell(&self, row: RowRef, field: RecordField, value: &str) -> Result<(), StoreError> {
        match self {
            ConfiguredRecordStore::Sheets(store) => store.update_cell(row, field, value).await,
            ConfiguredRecordStore::Memory(store) => store.update_cell(row, field, value).await,
        }
    }

    async fn batch_update_cells(&self, updates: &[CellUpdate]) -> Result<(), StoreError> {
        match self {
            ConfiguredRecordStore::Sheets(store) => store.batch_update_cells(updates).await,
            ConfiguredRecordStore::Memory(store) => store.batch_update_cells(updates).await,
        }
    }

    async fn delete_row(&self, row: RowRef) -> Result<(), StoreError> {
        match self {
            ConfiguredRecordStore::Sheets(store) => store.delete_row(row).await,
            ConfiguredRecordStore::Memory(store) => store.delete_row(row).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_secrets() -> EnvSecrets {
        EnvSecrets::from_lookup(|_| None)
    }

    #[tokio::test]
    async fn memory_backend_round_trips() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            ..StoreConfig::default()
        };
        let store = open_record_store(&config, &no_secrets()).unwrap();
        assert_eq!(store.backend(), StoreBackend::Memory);

        let record = JobRecord {
            company: "Acme".into(),
            position: "SWE".into(),
            ..JobRecord::default()
        };
        store.append(&record).await.unwrap();
        let rows = store.read_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.company, "Acme");
    }

    #[test]
    fn sheets_backend_needs_spreadsheet_id() {
        let err = open_record_store(&StoreConfig::default(), &no_secrets()).err().unwrap();
        match err {
            ConfigError::MissingCredentials(message) => assert!(message.contains("spreadsheet_id")),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn sheets_backend_needs_service_account() {
        let config = StoreConfig {
            spreadsheet_id: Some("abc".into()),
            ..StoreConfig::default()
        };
        let err = open_record_store(&config, &no_secrets()).err().unwrap();
        match err {
            ConfigError::MissingCredentials(message) => {
                assert!(message.contains("GOOGLE_SERVICE_ACCOUNT_EMAIL"))
            }
            other => panic!("unexpected {other}"),
        }
    }
}
