//! Job-tracking operations over a [`RecordStore`].
//!
//! Every operation returns a `String`. Store failures and validation
//! failures are rendered as text too, so the model always gets an outcome
//! it can react to and nothing propagates past this boundary.

use applymate_types::error::StoreError;
use applymate_types::job::{CellUpdate, JobRecord, RecordField, StoredRow, format_application_date};
use applymate_types::llm::{ToolCall, ToolDefinition};
use applymate_types::tool::{DeleteJobArgs, SaveJobArgs, SearchJobsArgs, UpdateJobResponseArgs};

use crate::records::store::RecordStore;

use super::format;
use super::registry::{ToolInvocation, tool_definitions};

const EMPTY_STORE: &str = "No jobs found in the spreadsheet.";

/// The six tools, bound to one record store.
pub struct ToolSet<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> ToolSet<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Definitions to bind to every model request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        tool_definitions()
    }

    /// Validate and run a model tool call, returning its textual result.
    pub async fn execute(&self, call: &ToolCall) -> String {
        match ToolInvocation::from_call(call) {
            Ok(invocation) => self.run(invocation).await,
            Err(err) => {
                tracing::debug!(tool = %call.name, error = %err, "Rejected tool call");
                err.to_string()
            }
        }
    }

    pub async fn run(&self, invocation: ToolInvocation) -> String {
        match invocation {
            ToolInvocation::SaveJob(args) => self.create_record(args).await,
            ToolInvocation::GetJobs => self.list_records().await,
            ToolInvocation::SearchJobs(args) => self.search_records(args).await,
            ToolInvocation::UpdateJobResponse(args) => self.update_one(args).await,
            ToolInvocation::BulkUpdateJobResponse(args) => self.bulk_update(args).await,
            ToolInvocation::DeleteJob(args) => self.delete_record(args).await,
        }
    }

    pub async fn create_record(&self, args: SaveJobArgs) -> String {
        let date = args
            .date
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format_application_date(chrono::Local::now().date_naive()));

        let record = JobRecord {
            company: args.company_name.trim().to_string(),
            date,
            position: args.position.trim().to_string(),
            employment_type: args.employment_type.to_string(),
            location: args.place.trim().to_string(),
            response_status: String::new(),
            url: args.url.unwrap_or_default(),
        };

        match self.store.append(&record).await {
            Ok(()) => {
                tracing::info!(company = %record.company, position = %record.position, "Job saved");
                format!("✅ Job saved successfully: {}", format::title(&record))
            }
            Err(err) => failure("Failed to save job", &err),
        }
    }

    pub async fn list_records(&self) -> String {
        let rows = match self.store.read_all().await {
            Ok(rows) => rows,
            Err(err) => return failure("Failed to retrieve jobs", &err),
        };

        if rows.is_empty() {
            return "The spreadsheet is empty - no jobs have been saved yet.".to_string();
        }

        format!(
            "Here are your saved jobs ({} total):\n\n{}",
            rows.len(),
            format::numbered_entries(&rows)
        )
    }

    pub async fn search_records(&self, args: SearchJobsArgs) -> String {
        let rows = match self.store.read_all().await {
            Ok(rows) => rows,
            Err(err) => return failure("Failed to search jobs", &err),
        };
        if rows.is_empty() {
            return EMPTY_STORE.to_string();
        }

        let needle = args.query.trim().to_lowercase();
        let matches: Vec<StoredRow> = rows
            .into_iter()
            .filter(|row| row.record.searchable_text().contains(&needle))
            .collect();

        if matches.is_empty() {
            return format!(
                "No jobs found matching \"{}\". Try searching for a company name, position, location, or job type.",
                args.query
            );
        }

        format!(
            "Found {} job(s) matching \"{}\":\n\n{}",
            matches.len(),
            args.query,
            format::numbered_entries(&matches)
        )
    }

    /// Update a single record; multiple matches are returned for
    /// disambiguation without touching any row.
    pub async fn update_one(&self, args: UpdateJobResponseArgs) -> String {
        let matches = match self.matching_rows(&args.job_identifier).await {
            Ok(Some(matches)) => matches,
            Ok(None) => return EMPTY_STORE.to_string(),
            Err(err) => return failure("Failed to update job response", &err),
        };

        match matches.as_slice() {
            [] => format!("No job found matching \"{}\".", args.job_identifier),
            [only] => {
                let result = self
                    .store
                    .update_cell(only.row, RecordField::ResponseStatus, &args.response_status)
                    .await;
                match result {
                    Ok(()) => format!(
                        "Updated response status for {} to: {}",
                        format::title(&only.record),
                        args.response_status
                    ),
                    Err(err) => failure("Failed to update job response", &err),
                }
            }
            many => format::disambiguation(&args.job_identifier, many),
        }
    }

    /// Update every matching record in one batch request.
    pub async fn bulk_update(&self, args: UpdateJobResponseArgs) -> String {
        let matches = match self.matching_rows(&args.job_identifier).await {
            Ok(Some(matches)) => matches,
            Ok(None) => return EMPTY_STORE.to_string(),
            Err(err) => return failure("Failed to bulk update jobs", &err),
        };

        if matches.is_empty() {
            return format!("No job found matching \"{}\".", args.job_identifier);
        }

        let updates: Vec<CellUpdate> = matches
            .iter()
            .map(|m| CellUpdate {
                row: m.row,
                field: RecordField::ResponseStatus,
                value: args.response_status.clone(),
            })
            .collect();

        if let Err(err) = self.store.batch_update_cells(&updates).await {
            return failure("Failed to bulk update jobs", &err);
        }

        let list = matches
            .iter()
            .enumerate()
            .map(|(i, m)| format!("{}. {}", i + 1, format::title(&m.record)))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Updated {} job(s) to: *{}*\n\n{}",
            matches.len(),
            args.response_status,
            list
        )
    }

    /// Delete the first record matching the cleaned identifier.
    pub async fn delete_record(&self, args: DeleteJobArgs) -> String {
        let rows = match self.store.read_all().await {
            Ok(rows) => rows,
            Err(err) => return failure("Failed to delete job", &err),
        };
        if rows.is_empty() {
            return EMPTY_STORE.to_string();
        }

        let needle = clean_identifier(&args.job_identifier);
        let target = rows
            .iter()
            .position(|row| row.record.identity_text().contains(&needle))
            .or_else(|| {
                rows.iter()
                    .position(|row| row.record.title_text().contains(&needle))
            })
            .and_then(|index| rows.into_iter().nth(index));
        let Some(target) = target else {
            return format!(
                "No job found matching \"{}\". Try using just the company name (e.g., \"Okta\") or position.",
                args.job_identifier
            );
        };

        match self.store.delete_row(target.row).await {
            Ok(()) => {
                tracing::info!(row = %target.row, company = %target.record.company, "Job deleted");
                format!("✅ Deleted job: {}", format::title(&target.record))
            }
            Err(err) => failure("Failed to delete job", &err),
        }
    }

    /// Rows whose company + position contain the identifier.
    /// `None` when the store holds no rows at all.
    async fn matching_rows(&self, identifier: &str) -> Result<Option<Vec<StoredRow>>, StoreError> {
        let rows = self.store.read_all().await?;
        if rows.is_empty() {
            return Ok(None);
        }
        let needle = identifier.to_lowercase();
        Ok(Some(
            rows.into_iter()
                .filter(|row| row.record.identity_text().contains(&needle))
                .collect(),
        ))
    }
}

/// Strip formatting copied from list output: `*` markers and a
/// standalone "at" between position and company.
fn clean_identifier(identifier: &str) -> String {
    let without_stars = identifier.replace('*', "");
    let words: Vec<&str> = without_stars.split_whitespace().collect();

    let mut cleaned = Vec::with_capacity(words.len());
    let mut removed_at = false;
    for (i, word) in words.iter().enumerate() {
        let interior = i > 0 && i + 1 < words.len();
        if !removed_at && interior && word.eq_ignore_ascii_case("at") {
            removed_at = true;
            continue;
        }
        cleaned.push(*word);
    }
    cleaned.join(" ").to_lowercase()
}

fn failure(context: &str, err: &StoreError) -> String {
    tracing::warn!(error = %err, "{context}");
    format!("{context}: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::memory::InMemoryRecordStore;
    use applymate_types::job::{EmploymentType, RowRef};

    fn job(company: &str, position: &str) -> JobRecord {
        JobRecord {
            company: company.into(),
            date: "01/01/2025".into(),
            position: position.into(),
            employment_type: "Full-time".into(),
            location: "Remote".into(),
            response_status: String::new(),
            url: String::new(),
        }
    }

    fn tools_with(records: Vec<JobRecord>) -> ToolSet<InMemoryRecordStore> {
        ToolSet::new(InMemoryRecordStore::with_records(records))
    }

    fn save_args(company: &str, position: &str) -> SaveJobArgs {
        SaveJobArgs {
            company_name: company.into(),
            position: position.into(),
            place: "Remote".into(),
            employment_type: EmploymentType::FullTime,
            url: None,
            date: None,
        }
    }

    fn update(identifier: &str, status: &str) -> UpdateJobResponseArgs {
        UpdateJobResponseArgs {
            job_identifier: identifier.into(),
            response_status: status.into(),
        }
    }

    #[tokio::test]
    async fn create_then_list_round_trip() {
        let tools = tools_with(Vec::new());
        let saved = tools.create_record(save_args("Acme", "SWE")).await;
        assert!(saved.contains("Acme"));
        assert!(saved.contains("SWE"));
        assert_eq!(saved, "✅ Job saved successfully: *SWE* at *Acme*");

        let listing = tools.list_records().await;
        assert!(listing.starts_with("Here are your saved jobs (1 total):"));
        assert!(listing.contains("1. *SWE* at *Acme*"));
        assert!(listing.contains("📍 Location: Remote"));
        assert!(listing.contains("💼 Type: Full-time"));

        let stored = tools.store().snapshot();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].company, "Acme");
        assert_eq!(stored[0].position, "SWE");
        assert_eq!(stored[0].location, "Remote");
        assert_eq!(stored[0].date.len(), 10);
    }

    #[tokio::test]
    async fn create_keeps_explicit_date_and_url() {
        let tools = tools_with(Vec::new());
        let mut args = save_args("Acme", "SWE");
        args.date = Some("05/06/2025".into());
        args.url = Some("https://acme.example/jobs/1".into());
        args.employment_type = EmploymentType::Intern;
        tools.create_record(args).await;

        let stored = &tools.store().snapshot()[0];
        assert_eq!(stored.date, "05/06/2025");
        assert_eq!(stored.url, "https://acme.example/jobs/1");
        assert_eq!(stored.employment_type, "Intern");
    }

    #[tokio::test]
    async fn list_empty_store() {
        let tools = tools_with(Vec::new());
        assert_eq!(
            tools.list_records().await,
            "The spreadsheet is empty - no jobs have been saved yet."
        );
    }

    #[tokio::test]
    async fn list_numbers_in_store_order() {
        let tools = tools_with(vec![job("Acme", "SWE"), job("Globex", "SRE"), job("Initech", "PM")]);
        let listing = tools.list_records().await;
        let acme = listing.find("1. *SWE* at *Acme*").unwrap();
        let initech = listing.find("3. *PM* at *Initech*").unwrap();
        assert!(acme < initech);
    }

    #[tokio::test]
    async fn search_matches_location_and_renumbers() {
        let mut berlin = job("Globex", "SRE");
        berlin.location = "Berlin".into();
        let tools = tools_with(vec![job("Acme", "SWE"), berlin]);

        let result = tools
            .search_records(SearchJobsArgs { query: "BERLIN".into() })
            .await;
        assert!(result.starts_with("Found 1 job(s) matching \"BERLIN\":"));
        assert!(result.contains("1. *SRE* at *Globex*"));
    }

    #[tokio::test]
    async fn search_without_matches() {
        let tools = tools_with(vec![job("Acme", "SWE")]);
        let result = tools
            .search_records(SearchJobsArgs { query: "Okta".into() })
            .await;
        assert!(result.starts_with("No jobs found matching \"Okta\"."));
    }

    #[tokio::test]
    async fn search_ignores_surrounding_whitespace() {
        let tools = tools_with(vec![job("Acme", "SWE")]);
        let result = tools
            .search_records(SearchJobsArgs { query: " acme ".into() })
            .await;
        assert!(result.starts_with("Found 1 job(s) matching \" acme \":"));
        assert!(result.contains("1. *SWE* at *Acme*"));
    }

    #[tokio::test]
    async fn ambiguous_update_mutates_nothing_then_bulk_updates_all() {
        let tools = tools_with(vec![job("Acme", "SWE"), job("Acme", "SRE")]);

        let reply = tools.update_one(update("Acme", "Yes - Offer")).await;
        assert!(reply.starts_with("I found 2 jobs matching \"Acme\""));
        assert!(reply.contains("*SWE* at *Acme*"));
        assert!(reply.contains("*SRE* at *Acme*"));
        assert!(tools.store().snapshot().iter().all(|r| r.response_status.is_empty()));

        let reply = tools.bulk_update(update("Acme", "Yes - Offer")).await;
        assert_eq!(
            reply,
            "Updated 2 job(s) to: *Yes - Offer*\n\n1. *SWE* at *Acme*\n2. *SRE* at *Acme*"
        );
        assert!(
            tools
                .store()
                .snapshot()
                .iter()
                .all(|r| r.response_status == "Yes - Offer")
        );
    }

    #[tokio::test]
    async fn single_match_update() {
        let tools = tools_with(vec![job("Acme", "SWE"), job("Globex", "SRE")]);
        let reply = tools.update_one(update("globex", "Yes - Interview")).await;
        assert_eq!(
            reply,
            "Updated response status for *SRE* at *Globex* to: Yes - Interview"
        );
        let stored = tools.store().snapshot();
        assert_eq!(stored[0].response_status, "");
        assert_eq!(stored[1].response_status, "Yes - Interview");
    }

    #[tokio::test]
    async fn zero_matches_mutate_nothing() {
        let tools = tools_with(vec![job("Acme", "SWE")]);
        let before = tools.store().snapshot();

        assert_eq!(
            tools.update_one(update("Okta", "No")).await,
            "No job found matching \"Okta\"."
        );
        assert_eq!(
            tools.bulk_update(update("Okta", "No")).await,
            "No job found matching \"Okta\"."
        );
        let reply = tools
            .delete_record(DeleteJobArgs { job_identifier: "Okta".into() })
            .await;
        assert!(reply.starts_with("No job found matching \"Okta\". Try using just the company name"));

        assert_eq!(tools.store().snapshot(), before);
    }

    #[tokio::test]
    async fn empty_store_messages() {
        let tools = tools_with(Vec::new());
        assert_eq!(tools.update_one(update("Acme", "No")).await, EMPTY_STORE);
        assert_eq!(tools.bulk_update(update("Acme", "No")).await, EMPTY_STORE);
        assert_eq!(
            tools
                .delete_record(DeleteJobArgs { job_identifier: "Acme".into() })
                .await,
            EMPTY_STORE
        );
    }

    #[tokio::test]
    async fn delete_accepts_formatted_identifier_and_removes_first_match() {
        let tools = tools_with(vec![job("Acme", "SWE"), job("Acme", "SWE II")]);
        let reply = tools
            .delete_record(DeleteJobArgs { job_identifier: "*SWE* at *Acme*".into() })
            .await;
        assert_eq!(reply, "✅ Deleted job: *SWE* at *Acme*");

        let stored = tools.store().snapshot();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].position, "SWE II");
    }

    #[tokio::test]
    async fn delete_prefers_company_first_match() {
        let tools = tools_with(vec![job("Acme", "SWE"), job("SWE", "Acme")]);
        let reply = tools
            .delete_record(DeleteJobArgs { job_identifier: "*SWE* at *Acme*".into() })
            .await;
        assert_eq!(reply, "✅ Deleted job: *Acme* at *SWE*");

        let stored = tools.store().snapshot();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].company, "Acme");
    }

    #[tokio::test]
    async fn delete_of_formatted_identifier_for_missing_job_is_not_found() {
        let tools = tools_with(vec![job("Acme", "SWE")]);
        let reply = tools
            .delete_record(DeleteJobArgs { job_identifier: "*PM* at *Okta*".into() })
            .await;
        assert!(reply.starts_with("No job found matching \"*PM* at *Okta*\""));
        assert_eq!(tools.store().snapshot().len(), 1);
    }

    #[tokio::test]
    async fn execute_renders_validation_errors_as_text() {
        let tools = tools_with(Vec::new());
        let reply = tools
            .execute(&ToolCall {
                id: "call_0".into(),
                name: "saveJob".into(),
                arguments: r#"{"companyName":"","position":"SWE"}"#.into(),
            })
            .await;
        assert_eq!(reply, "Invalid input for saveJob: companyName must not be empty");
        assert!(tools.store().snapshot().is_empty());
    }

    #[tokio::test]
    async fn execute_dispatches_by_name() {
        let tools = tools_with(vec![job("Acme", "SWE")]);
        let reply = tools
            .execute(&ToolCall {
                id: "call_0".into(),
                name: "getJobs".into(),
                arguments: "{}".into(),
            })
            .await;
        assert!(reply.starts_with("Here are your saved jobs (1 total)"));
    }

    #[test]
    fn clean_identifier_strips_markup_and_at() {
        assert_eq!(clean_identifier("*SWE* at *Acme*"), "swe acme");
        assert_eq!(clean_identifier("  Okta  "), "okta");
        assert_eq!(clean_identifier("Data AT Scale at Acme"), "data scale at acme");
        assert_eq!(clean_identifier("at"), "at");
    }

    #[test]
    fn row_refs_are_positional() {
        assert_eq!(RowRef(2).to_string(), "row 2");
    }
}
