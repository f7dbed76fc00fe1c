//! Error types surfaced by the library.
//!
//! Startup failures ([`OpenError`]) are fatal. Query and export failures are
//! shown to the user and the session carries on.

use std::path::PathBuf;

/// Failure to open the database file at startup.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("Database file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error(transparent)]
    Engine(#[from] rusqlite::Error),
}

/// Failure while running a statement against the open connection.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("No SQL to execute")]
    Empty,
    #[error("You can only execute one statement at a time.")]
    MultipleStatements,
    #[error(transparent)]
    Engine(#[from] rusqlite::Error),
}

/// Failure while writing a result set to disk.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No data to export")]
    NoData,
    #[error("Unsupported export format: {0}. Use csv or json.")]
    UnsupportedFormat(String),
    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = OpenError::FileNotFound(PathBuf::from("/tmp/missing.db"));
        assert_eq!(err.to_string(), "Database file not found: /tmp/missing.db");

        assert_eq!(
            ExportError::UnsupportedFormat("xml".to_string()).to_string(),
            "Unsupported export format: xml. Use csv or json."
        );

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(ExportError::from(io).to_string(), "Failed to write file: denied");
    }
}
