//! [`RecordStore`] backed by a Google Sheets spreadsheet (Sheets API v4).

use reqwest::{Method, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use applymate_core::records::store::RecordStore;
use applymate_types::error::StoreError;
use applymate_types::job::{CellUpdate, JobRecord, RecordField, RowRef, StoredRow};

use super::auth::ServiceAccountAuth;
use super::rows::{
    ValueRange, append_body, batch_update_body, cell_range, delete_row_body, parse_rows,
    records_range,
};

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/";

/// Where the records live.
#[derive(Debug, Clone)]
pub struct SheetLocation {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Numeric tab id, needed by `deleteDimension`.
    pub sheet_id: i64,
}

pub struct SheetsRecordStore {
    client: reqwest::Client,
    auth: ServiceAccountAuth,
    location: SheetLocation,
    base_url: Url,
}

impl SheetsRecordStore {
    pub fn new(
        client: reqwest::Client,
        auth: ServiceAccountAuth,
        location: SheetLocation,
    ) -> Result<Self, StoreError> {
        let base_url = Url::parse(SHEETS_API_BASE)
            .map_err(|e| StoreError::Connection(format!("invalid Sheets API URL: {e}")))?;
        Ok(Self {
            client,
            auth,
            location,
            base_url,
        })
    }

    pub fn location(&self) -> &SheetLocation {
        &self.location
    }

    /// `spreadsheets/{id}/values/{range}{suffix}`
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, StoreError> {
        self.url(&["spreadsheets", &self.location.spreadsheet_id, "values", &format!("{range}{suffix}")])
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        api_url(&self.base_url, segments)
    }

    /// Send one authorized request and return the response body.
    ///
    /// A 401 drops the cached token so the next call re-authenticates.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<String, StoreError> {
        let token: SecretString = self.auth.access_token().await?;

        let mut request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(token.expose_secret())
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Connection(format!("Sheets request failed: {e}")))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if status.is_success() {
            return Ok(text);
        }

        tracing::warn!(%method, %status, "Sheets request rejected");
        match status {
            StatusCode::UNAUTHORIZED => {
                self.auth.invalidate().await;
                Err(StoreError::Authentication(text))
            }
            StatusCode::FORBIDDEN => Err(StoreError::Authentication(text)),
            _ => Err(StoreError::Request(format!("HTTP {status}: {text}"))),
        }
    }
}

/// Append path segments to the API base, percent-encoding each one.
fn api_url(base: &Url, segments: &[&str]) -> Result<Url, StoreError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| StoreError::Connection("Sheets API URL cannot be a base".into()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

const VALUE_INPUT: (&str, &str) = ("valueInputOption", "USER_ENTERED");

impl RecordStore for SheetsRecordStore {
    async fn append(&self, record: &JobRecord) -> Result<(), StoreError> {
        let range = records_range(&self.location.sheet_name);
        let url = self.values_url(&range, ":append")?;
        self.send(
            Method::POST,
            url,
            &[VALUE_INPUT, ("insertDataOption", "INSERT_ROWS")],
            Some(&append_body(record)),
        )
        .await?;
        tracing::info!(company = %record.company, position = %record.position, "Appended job row");
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<StoredRow>, StoreError> {
        let range = records_range(&self.location.sheet_name);
        let url = self.values_url(&range, "")?;
        let body = self.send::<()>(Method::GET, url, &[], None).await?;

        let values: ValueRange = serde_json::from_str(&body)
            .map_err(|e| StoreError::Malformed(format!("values response: {e}")))?;
        let rows = parse_rows(&values.values);
        tracing::debug!(rows = rows.len(), "Read job rows");
        Ok(rows)
    }

    async fn update_cell(&self, row: RowRef, field: RecordField, value: &str) -> Result<(), StoreError> {
        let range = cell_range(&self.location.sheet_name, row, field);
        let url = self.values_url(&range, "")?;
        let body = ValueRange {
            range: Some(range),
            values: vec![vec![value.to_string()]],
        };
        self.send(Method::PUT, url, &[VALUE_INPUT], Some(&body)).await?;
        Ok(())
    }

    async fn batch_update_cells(&self, updates: &[CellUpdate]) -> Result<(), StoreError> {
        if updates.is_empty() {
            return Ok(());
        }
        let url = self.url(&[
            "spreadsheets",
            &self.location.spreadsheet_id,
            "values:batchUpdate",
        ])?;
        let body = batch_update_body(&self.location.sheet_name, updates);
        self.send(Method::POST, url, &[], Some(&body)).await?;
        Ok(())
    }

    async fn delete_row(&self, row: RowRef) -> Result<(), StoreError> {
        let url = self.url(&[
            "spreadsheets",
            &format!("{}:batchUpdate", self.location.spreadsheet_id),
        ])?;
        let body = delete_row_body(self.location.sheet_id, row);
        self.send(Method::POST, url, &[], Some(&body)).await?;
        tracing::info!(%row, "Deleted job row");
        Ok(())
    }
}
