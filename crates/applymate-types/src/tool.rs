//! Argument shapes for the job-tracking tools.
//!
//! The JSON schemas advertised to the model are derived from these structs,
//! so doc comments on fields double as parameter descriptions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::EmploymentType;

/// Arguments for saving a new job application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveJobArgs {
    /// Name of the company.
    pub company_name: String,
    /// Job position or title.
    pub position: String,
    /// Job location (city, state, country, or Remote).
    #[serde(default)]
    pub place: String,
    /// Employment type: Full-time or Intern.
    #[serde(default, rename = "type")]
    pub employment_type: EmploymentType,
    /// Link to the job posting.
    #[serde(default)]
    pub url: Option<String>,
    /// Application date in DD/MM/YYYY format. Defaults to today.
    #[serde(default)]
    pub date: Option<String>,
}

/// Arguments for listing every saved job (none are required).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GetJobsArgs {}

/// Arguments for searching saved jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchJobsArgs {
    /// Search term: company name, position, location, or job type.
    pub query: String,
}

/// Arguments for changing the response status of matching jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobResponseArgs {
    /// Company name and/or position identifying the job.
    pub job_identifier: String,
    /// New response status, e.g. "Yes - Interview", "Yes - Rejected", "No".
    pub response_status: String,
}

/// Arguments for deleting a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteJobArgs {
    /// Company name and/or position identifying the job to delete.
    pub job_identifier: String,
}
