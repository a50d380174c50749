//! Error types for escheat
//!
//! One taxonomy covers both halves of the system: ingestion-run faults
//! (`FetchFailed`, `ArchiveEmpty`, `LoadFailed`) abort the current run and
//! carry enough context for a manual re-run, while read-path faults
//! (`QueryTooShort`, `NotFound`) are local to a single request.

use thiserror::Error;

/// Result type alias for escheat operations
pub type Result<T> = std::result::Result<T, EscheatError>;

/// Main error type for escheat
#[derive(Error, Debug)]
pub enum EscheatError {
    /// Transport failure or unreadable archive while fetching a source
    /// location. Fatal to the run; never retried at this layer.
    #[error("failed to fetch '{location}': {source}")]
    FetchFailed {
        location: String,
        #[source]
        source: anyhow::Error,
    },

    /// The archive held no table to ingest. Malformed source, fatal.
    #[error("archive '{location}' contains no data table")]
    ArchiveEmpty { location: String },

    /// Storage fault mid-chunk. The store and index are left consistent at
    /// the end of the previous chunk; the counts say how much was committed
    /// before the fault.
    #[error(
        "load of '{location}' failed at chunk {chunk} \
         ({inserted} inserted, {skipped} skipped before failure): {source}"
    )]
    LoadFailed {
        location: String,
        chunk: u64,
        inserted: u64,
        skipped: u64,
        #[source]
        source: sqlx::Error,
    },

    /// Search query shorter than the minimum length.
    #[error("query too short: at least {min} characters required")]
    QueryTooShort { min: usize },

    /// No record with the given property id.
    #[error("property not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EscheatError {
    /// True for errors a caller fixes by changing the request rather than
    /// by retrying the run.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            EscheatError::QueryTooShort { .. } | EscheatError::NotFound(_)
        )
    }
}
