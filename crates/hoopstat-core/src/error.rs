// Error taxonomy shared by the pipeline stages and table providers.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required input table could not be opened.
    #[error("{table} table not found at {path}")]
    InputNotFound { table: String, path: PathBuf },

    /// A required input table exists but could not be read.
    #[error("failed to read {table} table at {path}: {source}")]
    Io {
        table: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cell that must be numeric, currency-formatted, or otherwise typed
    /// could not be parsed. `row` is the 1-based data row (header excluded);
    /// row 0 refers to the header itself.
    #[error("parse error in {table} row {row}, column `{column}` (value {value:?}): {reason}")]
    Parse {
        table: String,
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    /// An aggregation is undefined for the given data.
    #[error("invalid input for {context}: {message}")]
    InvalidInput { context: String, message: String },

    /// The report sink rejected a table or chart.
    #[error("report output failed: {message}")]
    Report { message: String },
}

impl PipelineError {
    pub fn parse(
        table: &str,
        row: usize,
        column: &str,
        value: &str,
        reason: impl Into<String>,
    ) -> Self {
        PipelineError::Parse {
            table: table.to_string(),
            row,
            column: column.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid(context: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::InvalidInput {
            context: context.into(),
            message: message.into(),
        }
    }
}
