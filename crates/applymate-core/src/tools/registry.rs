//! The fixed tool table: names, descriptions, schemas and argument parsers.
//!
//! Model tool calls arrive as `(name, raw JSON arguments)`. They are resolved
//! through [`TOOL_TABLE`] into a typed [`ToolInvocation`]; nothing is
//! dispatched by string after that point.

use serde::de::DeserializeOwned;

use applymate_types::error::ToolError;
use applymate_types::llm::{ToolCall, ToolDefinition};
use applymate_types::tool::{
    DeleteJobArgs, GetJobsArgs, SaveJobArgs, SearchJobsArgs, UpdateJobResponseArgs,
};

/// The six operations the model can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    SaveJob,
    GetJobs,
    SearchJobs,
    UpdateJobResponse,
    BulkUpdateJobResponse,
    DeleteJob,
}

/// A validated tool call, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    SaveJob(SaveJobArgs),
    GetJobs,
    SearchJobs(SearchJobsArgs),
    UpdateJobResponse(UpdateJobResponseArgs),
    BulkUpdateJobResponse(UpdateJobResponseArgs),
    DeleteJob(DeleteJobArgs),
}

impl ToolInvocation {
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolInvocation::SaveJob(_) => ToolKind::SaveJob,
            ToolInvocation::GetJobs => ToolKind::GetJobs,
            ToolInvocation::SearchJobs(_) => ToolKind::SearchJobs,
            ToolInvocation::UpdateJobResponse(_) => ToolKind::UpdateJobResponse,
            ToolInvocation::BulkUpdateJobResponse(_) => ToolKind::BulkUpdateJobResponse,
            ToolInvocation::DeleteJob(_) => ToolKind::DeleteJob,
        }
    }

    /// Resolve and validate a model tool call.
    pub fn from_call(call: &ToolCall) -> Result<Self, ToolError> {
        let entry = ToolEntry::lookup(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;
        (entry.parse)(&call.arguments).map_err(|message| ToolError::InvalidArguments {
            tool: entry.name.to_string(),
            message,
        })
    }
}

/// One row of the tool table.
pub struct ToolEntry {
    pub kind: ToolKind,
    pub name: &'static str,
    pub description: &'static str,
    schema: fn() -> schemars::Schema,
    parse: fn(&str) -> Result<ToolInvocation, String>,
}

impl ToolEntry {
    pub fn lookup(name: &str) -> Option<&'static ToolEntry> {
        TOOL_TABLE.iter().find(|entry| entry.name == name)
    }

    pub fn for_kind(kind: ToolKind) -> &'static ToolEntry {
        // The table has exactly one entry per kind.
        match kind {
            ToolKind::SaveJob => &TOOL_TABLE[0],
            ToolKind::GetJobs => &TOOL_TABLE[1],
            ToolKind::SearchJobs => &TOOL_TABLE[2],
            ToolKind::UpdateJobResponse => &TOOL_TABLE[3],
            ToolKind::BulkUpdateJobResponse => &TOOL_TABLE[4],
            ToolKind::DeleteJob => &TOOL_TABLE[5],
        }
    }

    /// JSON schema of the arguments, trimmed of meta keys the chat API ignores.
    pub fn parameters(&self) -> serde_json::Value {
        let mut value = serde_json::to_value((self.schema)()).unwrap_or_else(|_| {
            serde_json::json!({"type": "object", "properties": {}})
        });
        if let Some(object) = value.as_object_mut() {
            object.remove("$schema");
            object.remove("title");
        }
        value
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: self.parameters(),
        }
    }
}

pub static TOOL_TABLE: [ToolEntry; 6] = [
    ToolEntry {
        kind: ToolKind::SaveJob,
        name: "saveJob",
        description: "Save new job to spreadsheet. Requires: company, position, location, type (Full-time/Intern). Optional: url, date.",
        schema: || schemars::schema_for!(SaveJobArgs),
        parse: parse_save_job,
    },
    ToolEntry {
        kind: ToolKind::GetJobs,
        name: "getJobs",
        description: "Get ALL jobs from spreadsheet. Call this ONCE then answer the user from the results. DO NOT call again. Use for: \"what jobs\", \"show jobs\", \"last job\", \"first job\".",
        schema: || schemars::schema_for!(GetJobsArgs),
        parse: |raw| parse_args::<GetJobsArgs>(raw).map(|_| ToolInvocation::GetJobs),
    },
    ToolEntry {
        kind: ToolKind::SearchJobs,
        name: "searchJobs",
        description: "Search jobs by company, position, location, or type.",
        schema: || schemars::schema_for!(SearchJobsArgs),
        parse: parse_search_jobs,
    },
    ToolEntry {
        kind: ToolKind::UpdateJobResponse,
        name: "updateJobResponse",
        description: "Update response status for ONE job. Auto-use when user mentions outcome (rejected/interview/assessment/offer). If multiple matches, ask for clarification.",
        schema: || schemars::schema_for!(UpdateJobResponseArgs),
        parse: |raw| parse_update(raw).map(ToolInvocation::UpdateJobResponse),
    },
    ToolEntry {
        kind: ToolKind::BulkUpdateJobResponse,
        name: "bulkUpdateJobResponse",
        description: "Update ALL jobs at a company. Use ONLY when user says \"all\" or \"both\" for multiple jobs.",
        schema: || schemars::schema_for!(UpdateJobResponseArgs),
        parse: |raw| parse_update(raw).map(ToolInvocation::BulkUpdateJobResponse),
    },
    ToolEntry {
        kind: ToolKind::DeleteJob,
        name: "deleteJob",
        description: "Delete a job from tracking. Cannot be undone.",
        schema: || schemars::schema_for!(DeleteJobArgs),
        parse: parse_delete_job,
    },
];

/// Definitions of every tool, in table order, for binding to a request.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    TOOL_TABLE.iter().map(ToolEntry::definition).collect()
}

/// Deserialize raw arguments. Models sometimes send `""` or `null` for
/// tools that take no arguments; both read as `{}`.
fn parse_args<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let raw = raw.trim();
    let raw = if raw.is_empty() || raw == "null" { "{}" } else { raw };
    serde_json::from_str(raw).map_err(|e| e.to_string())
}

fn require(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} must not be empty"))
    } else {
        Ok(())
    }
}

fn parse_save_job(raw: &str) -> Result<ToolInvocation, String> {
    let args: SaveJobArgs = parse_args(raw)?;
    require(&args.company_name, "companyName")?;
    require(&args.position, "position")?;
    Ok(ToolInvocation::SaveJob(args))
}

fn parse_search_jobs(raw: &str) -> Result<ToolInvocation, String> {
    let args: SearchJobsArgs = parse_args(raw)?;
    require(&args.query, "query")?;
    Ok(ToolInvocation::SearchJobs(args))
}

fn parse_update(raw: &str) -> Result<UpdateJobResponseArgs, String> {
    let args: UpdateJobResponseArgs = parse_args(raw)?;
    require(&args.job_identifier, "jobIdentifier")?;
    require(&args.response_status, "responseStatus")?;
    Ok(args)
}

fn parse_delete_job(raw: &str) -> Result<ToolInvocation, String> {
    let args: DeleteJobArgs = parse_args(raw)?;
    require(&args.job_identifier, "jobIdentifier")?;
    Ok(ToolInvocation::DeleteJob(args))
}
