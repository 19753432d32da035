use thiserror::Error;

use crate::OutputError;

/// Fatal errors for one analyzer invocation.
///
/// Per-record and per-IP problems are handled locally and never surface
/// here; only errors that invalidate the whole invocation do. The outermost
/// pipeline converts these into a `status=failed` output.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// The assembled record set violates the required schema.
    #[error("record set does not meet the required schema: {0}")]
    SchemaMismatch(String),

    /// Cooperative cancellation was requested.
    #[error("analysis cancelled")]
    Cancelled,

    /// The output failed its pre-emission validation.
    #[error("invalid analyzer output: {0}")]
    InvalidOutput(#[from] OutputError),

    /// The event source failed while streaming.
    #[error("event source error: {0}")]
    Source(String),
}
