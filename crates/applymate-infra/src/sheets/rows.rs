//! Pure mapping between job records and Sheets API payloads.
//!
//! Row 1 of the sheet is the header; data row `RowRef(n)` is sheet row `n + 2`.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use applymate_types::job::{CellUpdate, JobRecord, RecordField, RowRef, StoredRow};

/// Body of `values.get`, `values.update` and `values.append`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

/// Sheet name as used in A1 notation. Names with anything but letters,
/// digits and underscores are single-quoted.
pub fn sheet_ref(sheet_name: &str) -> String {
    if sheet_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        sheet_name.to_string()
    } else {
        format!("'{}'", sheet_name.replace('\'', "''"))
    }
}

/// The full record range, `Sheet1!A:G`.
pub fn records_range(sheet_name: &str) -> String {
    let last = RecordField::ALL[RecordField::ALL.len() - 1].column_letter();
    format!("{}!A:{last}", sheet_ref(sheet_name))
}

/// A1 reference of one cell, e.g. `Sheet1!F3` for the status of `RowRef(1)`.
pub fn cell_range(sheet_name: &str, row: RowRef, field: RecordField) -> String {
    format!("{}!{}{}", sheet_ref(sheet_name), field.column_letter(), row.0 + 2)
}

/// Map the raw `values` of the record range to rows.
///
/// Cells are looked up through the header row so reordered columns still
/// map correctly; a field whose header is missing falls back to its fixed
/// column. Short rows are padded with empty cells.
pub fn parse_rows(values: &[Vec<String>]) -> Vec<StoredRow> {
    let Some((header, data)) = values.split_first() else {
        return Vec::new();
    };

    let columns: Vec<(RecordField, usize)> = RecordField::ALL
        .iter()
        .map(|field| {
            let index = header
                .iter()
                .position(|h| RecordField::from_header(h) == Some(*field))
                .unwrap_or_else(|| field.column_index());
            (*field, index)
        })
        .collect();

    data.iter()
        .enumerate()
        .map(|(index, cells)| {
            let mut record = JobRecord::default();
            for (field, column) in &columns {
                let value = cells.get(*column).map(|c| c.trim()).unwrap_or("");
                record.set(*field, value);
            }
            StoredRow {
                row: RowRef(index),
                record,
            }
        })
        .collect()
}

/// Body for appending one record.
pub fn append_body(record: &JobRecord) -> ValueRange {
    ValueRange {
        range: None,
        values: vec![record.to_row()],
    }
}

/// Body for `values:batchUpdate`.
pub fn batch_update_body(sheet_name: &str, updates: &[CellUpdate]) -> Value {
    let data: Vec<Value> = updates
        .iter()
        .map(|update| {
            json!({
                "range": cell_range(sheet_name, update.row, update.field),
                "values": [[update.value]],
            })
        })
        .collect();

    json!({
        "valueInputOption": "USER_ENTERED",
        "data": data,
    })
}

/// Body for `spreadsheets:batchUpdate` removing one data row.
///
/// Dimension indexes are zero-based and include the header row.
pub fn delete_row_body(sheet_id: i64, row: RowRef) -> Value {
    json!({
        "requests": [{
            "deleteDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": row.0 + 1,
                    "endIndex": row.0 + 2,
                }
            }
        }]
    })
}
