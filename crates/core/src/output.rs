use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AuthSummary;

/// Reporting priority. The numeric encoding keeps the ordering used by the
/// wider reporting surface: smaller values are more severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Numeric encoding used for cross-platform ordering.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 10,
            Priority::High => 20,
            Priority::Medium => 50,
            Priority::Low => 80,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

/// Completion status of one analyzer invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Failed,
}

impl ResultStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ResultStatus::Success => "success",
            ResultStatus::Failed => "failed",
        }
    }
}

/// Validation errors raised before an output is released to the finding sink.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OutputError {
    #[error("analyzer identifier is empty")]
    EmptyIdentifier,

    #[error("analyzer name is empty")]
    EmptyName,

    #[error("result summary is empty")]
    EmptySummary,
}

/// The report one analyzer invocation ships to the finding sink.
///
/// JSON-serializable; the key names are a stable interface to downstream
/// consumers and must not change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzerOutput {
    pub analyzer_identifier: String,
    pub analyzer_name: String,
    pub result_status: ResultStatus,
    pub result_priority: Priority,
    pub result_summary: String,
    pub result_markdown: String,
    pub attributes: Vec<AuthSummary>,
}

impl AnalyzerOutput {
    pub fn new(analyzer_identifier: &str, analyzer_name: &str) -> Self {
        Self {
            analyzer_identifier: analyzer_identifier.to_string(),
            analyzer_name: analyzer_name.to_string(),
            result_status: ResultStatus::Success,
            result_priority: Priority::Low,
            result_summary: String::new(),
            result_markdown: String::new(),
            attributes: Vec::new(),
        }
    }

    /// Enforce the emission contract: identifier, name, and summary must be
    /// non-empty. The priority and status fields are enums and therefore
    /// always hold one of the named values.
    pub fn validate(&self) -> Result<(), OutputError> {
        if self.analyzer_identifier.is_empty() {
            return Err(OutputError::EmptyIdentifier);
        }
        if self.analyzer_name.is_empty() {
            return Err(OutputError::EmptyName);
        }
        if self.result_summary.is_empty() {
            return Err(OutputError::EmptySummary);
        }
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
