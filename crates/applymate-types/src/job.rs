//! Job application records and their tabular layout.
//!
//! A record's identity is positional: [`RowRef`] is the index of a data row
//! in the backing store and stays valid only until the next row deletion.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Response statuses the assistant suggests. The field itself is free text.
pub const RESPONSE_STATUSES: [&str; 5] = [
    "No",
    "Yes - Rejected",
    "Yes - Interview",
    "Yes - Online Assessment",
    "Yes - Offer",
];

/// Shown when a record has no response status yet.
pub const DEFAULT_RESPONSE_STATUS: &str = "No";

/// Employment type of a tracked application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum EmploymentType {
    #[default]
    #[serde(rename = "Full-time", alias = "full-time", alias = "Full-Time", alias = "Full time")]
    FullTime,
    #[serde(rename = "Intern", alias = "intern", alias = "Internship")]
    Intern,
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmploymentType::FullTime => write!(f, "Full-time"),
            EmploymentType::Intern => write!(f, "Intern"),
        }
    }
}

impl FromStr for EmploymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full-time" | "full time" | "fulltime" => Ok(EmploymentType::FullTime),
            "intern" | "internship" => Ok(EmploymentType::Intern),
            other => Err(format!("invalid employment type: '{other}'")),
        }
    }
}

/// One tracked job application.
///
/// `employment_type` and `response_status` are kept as the text stored in the
/// sheet; rows edited by hand may hold values outside the enumerations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub company: String,
    pub date: String,
    pub position: String,
    pub employment_type: String,
    pub location: String,
    pub response_status: String,
    pub url: String,
}

impl JobRecord {
    /// Text searched by free-form queries: company, position, location, type.
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.company, self.position, self.location, self.employment_type
        )
        .to_lowercase()
    }

    /// Text used to identify a record for update and delete: company, position.
    pub fn identity_text(&self) -> String {
        format!("{} {}", self.company, self.position).to_lowercase()
    }

    /// Position then company, the order list output shows them in.
    pub fn title_text(&self) -> String {
        format!("{} {}", self.position, self.company).to_lowercase()
    }

    /// Read a field by its column.
    pub fn get(&self, field: RecordField) -> &str {
        match field {
            RecordField::Company => &self.company,
            RecordField::Date => &self.date,
            RecordField::Position => &self.position,
            RecordField::EmploymentType => &self.employment_type,
            RecordField::Location => &self.location,
            RecordField::ResponseStatus => &self.response_status,
            RecordField::Url => &self.url,
        }
    }

    /// Overwrite a field by its column.
    pub fn set(&mut self, field: RecordField, value: impl Into<String>) {
        let value = value.into();
        match field {
            RecordField::Company => self.company = value,
            RecordField::Date => self.date = value,
            RecordField::Position => self.position = value,
            RecordField::EmploymentType => self.employment_type = value,
            RecordField::Location => self.location = value,
            RecordField::ResponseStatus => self.response_status = value,
            RecordField::Url => self.url = value,
        }
    }

    /// Cells in column order.
    pub fn to_row(&self) -> Vec<String> {
        RecordField::ALL
            .iter()
            .map(|field| self.get(*field).to_string())
            .collect()
    }
}

/// Columns of the record sheet, in sheet order (A..G).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Company,
    Date,
    Position,
    EmploymentType,
    Location,
    ResponseStatus,
    Url,
}

impl RecordField {
    pub const ALL: [RecordField; 7] = [
        RecordField::Company,
        RecordField::Date,
        RecordField::Position,
        RecordField::EmploymentType,
        RecordField::Location,
        RecordField::ResponseStatus,
        RecordField::Url,
    ];

    /// Header text in row 1 of the sheet.
    pub fn header(&self) -> &'static str {
        match self {
            RecordField::Company => "Company Name",
            RecordField::Date => "Date",
            RecordField::Position => "Position",
            RecordField::EmploymentType => "Type",
            RecordField::Location => "Place",
            RecordField::ResponseStatus => "Responded?",
            RecordField::Url => "URL",
        }
    }

    /// Zero-based column index.
    pub fn column_index(&self) -> usize {
        match self {
            RecordField::Company => 0,
            RecordField::Date => 1,
            RecordField::Position => 2,
            RecordField::EmploymentType => 3,
            RecordField::Location => 4,
            RecordField::ResponseStatus => 5,
            RecordField::Url => 6,
        }
    }

    /// Spreadsheet column letter (A..G).
    pub fn column_letter(&self) -> char {
        (b'A' + self.column_index() as u8) as char
    }

    pub fn from_header(header: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.header() == header.trim())
    }
}

/// Position of a data row (0 = first row after the header).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowRef(pub usize);

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}", self.0)
    }
}

/// A record together with where it currently lives in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub row: RowRef,
    pub record: JobRecord,
}

/// One cell write in a batch update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub row: RowRef,
    pub field: RecordField,
    pub value: String,
}

/// Format a date the way applications are recorded (`DD/MM/YYYY`).
pub fn format_application_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> JobRecord {
        JobRecord {
            company: "Acme".into(),
            date: "01/02/2025".into(),
            position: "SWE".into(),
            employment_type: "Full-time".into(),
            location: "Remote".into(),
            response_status: String::new(),
            url: String::new(),
        }
    }

    #[test]
    fn employment_type_serde_uses_sheet_labels() {
        assert_eq!(
            serde_json::to_string(&EmploymentType::FullTime).unwrap(),
            "\"Full-time\""
        );
        let parsed: EmploymentType = serde_json::from_str("\"full-time\"").unwrap();
        assert_eq!(parsed, EmploymentType::FullTime);
        let parsed: EmploymentType = serde_json::from_str("\"Intern\"").unwrap();
        assert_eq!(parsed, EmploymentType::Intern);
        assert!(serde_json::from_str::<EmploymentType>("\"Contract\"").is_err());
    }

    #[test]
    fn employment_type_from_str() {
        assert_eq!("Full time".parse::<EmploymentType>().unwrap(), EmploymentType::FullTime);
        assert_eq!("internship".parse::<EmploymentType>().unwrap(), EmploymentType::Intern);
        assert!("part-time".parse::<EmploymentType>().is_err());
    }

    #[test]
    fn searchable_text_covers_four_fields() {
        let text = record().searchable_text();
        assert_eq!(text, "acme swe remote full-time");
    }

    #[test]
    fn identity_text_is_company_and_position() {
        assert_eq!(record().identity_text(), "acme swe");
        assert_eq!(record().title_text(), "swe acme");
    }

    #[test]
    fn row_follows_column_order() {
        let row = record().to_row();
        assert_eq!(row.len(), 7);
        assert_eq!(row[0], "Acme");
        assert_eq!(row[2], "SWE");
        assert_eq!(row[4], "Remote");
    }

    #[test]
    fn response_status_is_column_f() {
        assert_eq!(RecordField::ResponseStatus.column_letter(), 'F');
        assert_eq!(RecordField::Company.column_letter(), 'A');
        assert_eq!(RecordField::Url.column_letter(), 'G');
    }

    #[test]
    fn headers_round_trip() {
        for field in RecordField::ALL {
            assert_eq!(RecordField::from_header(field.header()), Some(field));
        }
        assert_eq!(RecordField::from_header("Notes"), None);
    }

    #[test]
    fn set_and_get_field() {
        let mut r = record();
        r.set(RecordField::ResponseStatus, "Yes - Offer");
        assert_eq!(r.get(RecordField::ResponseStatus), "Yes - Offer");
    }

    #[test]
    fn application_date_is_day_month_year() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(format_application_date(date), "07/03/2025");
    }
}
