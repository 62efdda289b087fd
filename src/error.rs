//! Error handling for bodsight.
//!
//! Library functions return [`Result`], whose error is the [`BodsError`] enum.
//! Every dependency error the crate can hit converts into it through `From`,
//! so `?` works across polars, reqwest, csv and the filesystem:
//!
//! ```no_run
//! use bodsight::error::Result;
//!
//! fn header(path: &str) -> Result<String> {
//!     // std::io::Error converts into BodsError via From
//!     let content = std::fs::read_to_string(path)?;
//!     Ok(content.lines().next().unwrap_or_default().to_owned())
//! }
//! ```
//!
//! The [`ResultExt`] trait adds `.context()` for attaching a description of
//! what was being attempted.

use std::fmt;

/// Main error type for bodsight operations.
#[derive(Debug)]
pub enum BodsError {
    /// I/O errors (reading tables, writing reports, cache files)
    Io(std::io::Error),

    /// Data processing errors (Polars joins, casts, parsing)
    DataProcessing(String),

    /// Codelist retrieval or parsing failed
    Codelist(String),

    /// Configuration errors
    Config(String),

    /// File not found or invalid path
    InvalidPath(String),

    /// A query needs a statement table that was not loaded
    MissingTable(String),

    /// A table lacks a column a query reads
    MissingColumn { table: String, column: String },

    /// Generic error with context
    Other(String),
}

impl fmt::Display for BodsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Codelist(msg) => write!(f, "Codelist error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::InvalidPath(msg) => write!(f, "Invalid path: {msg}"),
            Self::MissingTable(table) => write!(f, "Table not loaded: {table}"),
            Self::MissingColumn { table, column } => {
                write!(f, "Table '{table}' has no column '{column}'")
            }
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for BodsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BodsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for BodsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(format!("{err:#}"))
    }
}

impl From<serde_json::Error> for BodsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for BodsError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<reqwest::Error> for BodsError {
    fn from(err: reqwest::Error) -> Self {
        Self::Codelist(format!("HTTP request failed: {err}"))
    }
}

impl From<csv::Error> for BodsError {
    fn from(err: csv::Error) -> Self {
        Self::Codelist(format!("CSV error: {err}"))
    }
}

/// Result type alias for bodsight operations.
pub type Result<T> = std::result::Result<T, BodsError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<BodsError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: BodsError = e.into();
            BodsError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: BodsError = e.into();
            BodsError::Other(format!("{}: {}", f(), err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BodsError::MissingColumn {
            table: "ooc".to_owned(),
            column: "_link".to_owned(),
        };
        assert_eq!(err.to_string(), "Table 'ooc' has no column '_link'");
    }

    #[test]
    fn test_polars_error_is_data_processing() {
        let err: BodsError =
            polars::error::PolarsError::ColumnNotFound("share_exact".into()).into();
        assert!(matches!(err, BodsError::DataProcessing(_)));
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "entityStatement.csv",
        ));

        let result: Result<()> = result.context("Failed to load entity statements");
        let message = result.expect_err("context keeps the error").to_string();
        assert!(message.contains("Failed to load entity statements"));
        assert!(message.contains("entityStatement.csv"));
    }
}
