//! Error types for Tablewright

use thiserror::Error;

/// Result type alias using Tablewright's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Tablewright error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Store errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("No database is open. Open or create one first.")]
    DatabaseNotOpen,

    #[error("Row {pk_id} not found in table '{table}'")]
    RowNotFound { table: String, pk_id: i64 },

    #[error("Expected exactly 1 affected row, got {affected}")]
    UnexpectedRowCount { affected: u64 },

    // Schema errors (E500-E599)
    #[error("Schema artifact error: {0}")]
    SchemaArtifact(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "E400",
            Self::DatabaseNotOpen => "E401",
            Self::RowNotFound { .. } => "E402",
            Self::UnexpectedRowCount { .. } => "E403",
            Self::SchemaArtifact(_) => "E500",
            Self::Serialization(_) => "E501",
            Self::InvalidInput(_) => "E800",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::DatabaseNotOpen => Some("tablewright create <name>".to_string()),
            Self::SchemaArtifact(_) => Some("tablewright drop <name> && tablewright create <name>".to_string()),
            _ => None,
        }
    }

    /// Affected-row count carried by a delete that did not touch exactly one row
    pub fn affected_rows(&self) -> Option<u64> {
        match self {
            Self::UnexpectedRowCount { affected } => Some(*affected),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_error() {
        let error = Error::UnexpectedRowCount { affected: 0 };
        assert_eq!(error.code(), "E403");
        assert_eq!(error.affected_rows(), Some(0));
        assert!(error.to_string().contains("got 0"));
    }

    #[test]
    fn test_row_not_found_error() {
        let error = Error::RowNotFound {
            table: "Bod".to_string(),
            pk_id: 7,
        };
        assert_eq!(error.code(), "E402");
        assert_eq!(error.suggestion(), None);
        assert!(error.to_string().contains("Bod"));
        assert!(error.to_string().contains('7'));
    }

    #[test]
    fn test_not_open_suggestion() {
        let error = Error::DatabaseNotOpen;
        assert_eq!(error.code(), "E401");
        assert_eq!(
            error.suggestion(),
            Some("tablewright create <name>".to_string())
        );
    }

    #[test]
    fn test_anyhow_conversion_keeps_context() {
        let err = anyhow::anyhow!("inner").context("outer");
        let converted: Error = err.into();
        assert!(matches!(converted, Error::Other(_)));
        assert_eq!(converted.to_string(), "outer: inner");
    }
}
