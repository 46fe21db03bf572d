//! MySQL collaborators for bundle-core.
//!
//! - [`MySqlSchemaSource`] describes tables from `INFORMATION_SCHEMA.COLUMNS`.
//! - [`MySqlExecutor`] runs flushed statements through a `mysql_async` pool,
//!   either as embedded-literal text or as prepared statements.

pub mod args;
pub mod error;
pub mod executor;
pub mod schema;

pub use args::MySqlArgs;
pub use error::MySqlBundleError;
pub use executor::{MySqlExecutor, MAX_PLACEHOLDERS};
pub use schema::{collect_mysql_table_schema, mysql_data_type_to_column_type, MySqlSchemaSource};
