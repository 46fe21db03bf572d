//! Row bundling for relational bulk writes.
//!
//! Callers add records to a [`Bundle`] one at a time; each record is
//! normalized against the table's [`TableSchema`] on the way in. A flush
//! later writes the bundle as bounded-size bulk `INSERT` statements,
//! optionally upserting on duplicate keys.
//!
//! ```text
//! RawRecord ──accumulate──▶ normalize ──▶ Bundle
//!                                           │ flush(BatchConfig)
//!                                           ▼
//!                           chunks ──▶ Statement ──▶ StatementExecutor
//! ```
//!
//! # Example
//!
//! ```rust
//! use bundle_core::{BatchConfig, Bundle, ColumnSchema, ColumnType, RawRecord, TableSchema};
//!
//! let table = TableSchema::new(
//!     "users",
//!     vec![
//!         ColumnSchema::primary("id", ColumnType::Numeric),
//!         ColumnSchema::new("name", ColumnType::String),
//!     ],
//! )
//! .unwrap();
//!
//! let mut bundle = Bundle::new(table);
//! let record: RawRecord = [("name".to_string(), "Alice".into())].into_iter().collect();
//! bundle.accumulate(record);
//!
//! let statements = bundle.plan(&BatchConfig::new(100, false).unwrap());
//! assert_eq!(statements[0].to_sql(), r#"INSERT INTO `users` (name) VALUES ("Alice");"#);
//! ```

pub mod bundle;
pub mod defaults;
pub mod error;
pub mod normalize;
pub mod schema;
pub mod statement;
/// Test doubles for [`StatementExecutor`]; not for production use.
pub mod testing;
pub mod values;
pub mod worker;
pub mod writer;

// Re-exports for convenience
pub use bundle::Bundle;
pub use defaults::{default_value, Clock, FixedClock, SystemClock};
pub use error::{BundleError, FlushError};
pub use normalize::{normalize, NormalizedRecord};
pub use schema::{
    ColumnSchema, ColumnType, DatabaseSchema, KeyRole, SchemaError, SchemaSource, TableSchema,
};
pub use statement::{OnConflict, ParameterizedStatement, RenderMode, Statement};
pub use values::{Literal, RawRecord, RawValue};
pub use worker::{BundleHandle, BundleWorker};
pub use writer::{BatchConfig, FlushReport, StatementExecutor, DEFAULT_MAX_CHUNK_SIZE};
