//! Error types for the MySQL collaborators.

use thiserror::Error;

/// Errors that can occur while talking to MySQL.
#[derive(Error, Debug)]
pub enum MySqlBundleError {
    /// MySQL connection or query error.
    #[error("MySQL error: {0}")]
    MySQL(#[from] mysql_async::Error),

    /// Connection string could not be parsed.
    #[error("Invalid MySQL URL: {0}")]
    Url(#[from] mysql_async::UrlError),

    /// Introspected columns do not form a valid table schema.
    #[error("Schema error: {0}")]
    Schema(#[from] bundle_core::SchemaError),

    /// Table not found in the current database.
    #[error("Table '{0}' not found in the current database")]
    TableNotFound(String),

    /// An INFORMATION_SCHEMA row lacked an expected value.
    #[error("Malformed INFORMATION_SCHEMA row for table '{table}': missing {field}")]
    MalformedSchemaRow { table: String, field: &'static str },

    /// Parameterized statement exceeds the server's placeholder limit.
    #[error("Statement needs {count} placeholders, MySQL allows at most {max}")]
    TooManyPlaceholders { count: usize, max: usize },
}
