//! The bundle: normalized records waiting for a bulk write.
//!
//! A [`Bundle`] belongs to exactly one batching context. It is a plain value
//! with `&mut self` mutators, so sharing one across tasks needs external
//! mutual exclusion; [`crate::worker::BundleWorker`] provides a
//! single-writer alternative.

use crate::defaults::{Clock, SystemClock};
use crate::error::BundleError;
use crate::normalize::{normalize, NormalizedRecord};
use crate::schema::{SchemaSource, TableSchema};
use crate::values::{RawRecord, RawValue};
use std::sync::Arc;

/// Pending records for one table.
pub struct Bundle {
    pub(crate) table: TableSchema,
    model_name: String,
    clock: Arc<dyn Clock>,
    pub(crate) records: Vec<NormalizedRecord>,
}

impl std::fmt::Debug for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundle")
            .field("table", &self.table.name)
            .field("model_name", &self.model_name)
            .field("pending", &self.records.len())
            .finish()
    }
}

impl Bundle {
    /// Create an empty bundle for `table`.
    ///
    /// The model name used to unwrap records defaults to the table name.
    pub fn new(table: TableSchema) -> Self {
        Self {
            model_name: table.name.clone(),
            table,
            clock: Arc::new(SystemClock),
            records: Vec::new(),
        }
    }

    /// Look up `table` through `source` and create an empty bundle for it.
    pub async fn for_table(
        source: &(impl SchemaSource + ?Sized),
        table: &str,
    ) -> Result<Self, BundleError> {
        let schema = source
            .table_schema(table)
            .await
            .map_err(|e| BundleError::SchemaLookup {
                table: table.to_string(),
                source: e.into(),
            })?;
        tracing::debug!(
            "Loaded schema for table '{}' with {} columns",
            table,
            schema.columns.len()
        );
        Ok(Self::new(schema))
    }

    /// Set the key under which callers may wrap records.
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Use `clock` for date and date-time defaults.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn table(&self) -> &TableSchema {
        &self.table
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Normalize `record` and append it.
    ///
    /// A record of the form `{<model name>: {...}}` is unwrapped first.
    pub fn accumulate(&mut self, mut record: RawRecord) {
        let wrapped = matches!(record.get(&self.model_name), Some(RawValue::Record(_)));
        if wrapped {
            if let Some(RawValue::Record(inner)) = record.remove(&self.model_name) {
                record = inner;
            }
        }

        let normalized = normalize(&record, &self.table, self.clock.as_ref());
        self.records.push(normalized);
    }

    /// Number of pending records.
    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pending records, in insertion order.
    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    /// Drop every pending record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::FixedClock;
    use crate::schema::{ColumnSchema, ColumnType, DatabaseSchema};
    use crate::values::Literal;
    use chrono::NaiveDate;

    fn table() -> TableSchema {
        TableSchema::new(
            "posts",
            vec![
                ColumnSchema::primary("id", ColumnType::Numeric),
                ColumnSchema::new("title", ColumnType::String),
                ColumnSchema::new("published", ColumnType::Date),
            ],
        )
        .unwrap()
    }

    fn bundle() -> Bundle {
        let clock = FixedClock(
            NaiveDate::from_ymd_opt(2024, 2, 29)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        );
        Bundle::new(table())
            .with_model_name("Post")
            .with_clock(Arc::new(clock))
    }

    fn raw(pairs: &[(&str, RawValue)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_accumulate_and_clear() {
        let mut bundle = bundle();
        assert!(bundle.is_empty());

        bundle.accumulate(raw(&[("title", "first".into())]));
        bundle.accumulate(raw(&[("title", "second".into())]));
        assert_eq!(bundle.size(), 2);

        let first = &bundle.records()[0];
        assert_eq!(first.get(bundle.table(), "title"), Some(&Literal::quoted("first")));
        assert_eq!(
            first.get(bundle.table(), "published"),
            Some(&Literal::quoted("2024-02-29"))
        );

        bundle.clear();
        assert_eq!(bundle.size(), 0);
    }

    #[test]
    fn test_model_wrapper_is_stripped() {
        let mut bundle = bundle();
        let inner = raw(&[("title", "wrapped".into())]);
        bundle.accumulate(raw(&[("Post", RawValue::Record(inner))]));

        let record = &bundle.records()[0];
        assert_eq!(record.get(bundle.table(), "title"), Some(&Literal::quoted("wrapped")));
    }

    #[test]
    fn test_scalar_under_model_name_is_not_a_wrapper() {
        let mut bundle = bundle();
        bundle.accumulate(raw(&[("Post", "oops".into()), ("title", "plain".into())]));

        let record = &bundle.records()[0];
        assert_eq!(record.get(bundle.table(), "title"), Some(&Literal::quoted("plain")));
    }

    #[tokio::test]
    async fn test_for_table_propagates_lookup_failure() {
        let schema = DatabaseSchema::new(vec![table()]);

        let bundle = Bundle::for_table(&schema, "posts").await.unwrap();
        assert_eq!(bundle.model_name(), "posts");

        let err = Bundle::for_table(&schema, "comments").await.unwrap_err();
        assert!(matches!(err, BundleError::SchemaLookup { ref table, .. } if table == "comments"));
    }
}
