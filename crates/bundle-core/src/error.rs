//! Error types for bundling and flushing.

use thiserror::Error;

/// Boxed error from an external collaborator (schema source or executor).
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while setting up or feeding a bundle.
#[derive(Error, Debug)]
pub enum BundleError {
    /// The schema source could not describe the table.
    #[error("Schema lookup for table '{table}' failed: {source}")]
    SchemaLookup {
        table: String,
        #[source]
        source: CollaboratorError,
    },

    /// A chunk size of zero was requested.
    #[error("Maximum chunk size must be at least 1")]
    InvalidChunkSize,

    /// The worker task owning the bundle is gone.
    #[error("Bundle worker for table '{0}' is closed")]
    WorkerClosed(String),

    /// A flush failed.
    #[error(transparent)]
    Flush(#[from] FlushError),
}

/// Errors raised by a flush.
#[derive(Error, Debug)]
pub enum FlushError {
    /// The executor rejected a chunk. Chunks before it were written and
    /// removed from the bundle; this chunk and the rest are still pending.
    #[error(
        "Chunk {chunk} of {chunks} for table '{table}' failed after {flushed_rows} rows were written: {source}"
    )]
    Execution {
        table: String,
        /// Zero-based index of the failing chunk
        chunk: usize,
        /// Number of chunks the flush planned
        chunks: usize,
        /// Rows written by earlier chunks
        flushed_rows: usize,
        #[source]
        source: CollaboratorError,
    },
}
