//! Chat-friendly renderings of records and tool outcomes.

use applymate_types::job::{DEFAULT_RESPONSE_STATUS, JobRecord, StoredRow};

fn or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

/// `*Position* at *Company*`
pub fn title(record: &JobRecord) -> String {
    format!("*{}* at *{}*", record.position, record.company)
}

/// Full numbered entry used by list and search results.
pub fn entry(number: usize, record: &JobRecord) -> String {
    let (marker, status) = if record.response_status.is_empty() {
        ("⏳", DEFAULT_RESPONSE_STATUS)
    } else {
        ("✅", record.response_status.as_str())
    };
    format!(
        "{number}. *{}* at *{}*\n   📍 Location: {}\n   💼 Type: {}\n   📅 Date Applied: {}\n   {marker} Response: {status}",
        or_na(&record.position),
        or_na(&record.company),
        or_na(&record.location),
        or_na(&record.employment_type),
        or_na(&record.date),
    )
}

/// Shorter entry used when asking the user to pick between candidates.
pub fn candidate(number: usize, record: &JobRecord) -> String {
    format!(
        "{number}. {}\n   Location: {}\n   Type: {}\n   Date Applied: {}",
        title(record),
        or_na(&record.location),
        or_na(&record.employment_type),
        or_na(&record.date),
    )
}

pub fn numbered_entries(rows: &[StoredRow]) -> String {
    rows.iter()
        .enumerate()
        .map(|(i, row)| entry(i + 1, &row.record))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn disambiguation(identifier: &str, matches: &[StoredRow]) -> String {
    let list = matches
        .iter()
        .enumerate()
        .map(|(i, row)| candidate(i + 1, &row.record))
        .collect::<Vec<_>>()
        .join("\n\n");
    let n = matches.len();
    format!(
        "I found {n} jobs matching \"{identifier}\". Which one do you mean?\n\n{list}\n\n\
         Please specify the position or provide more details (e.g., \"the Software Engineer III position\" or \"the one in US-Remote\").\n\n\
         *OR* if you want to update ALL of them, say \"all of them\" or \"all {n}\"."
    )
}
