//! Record normalization.
//!
//! Turns a partial [`RawRecord`] into a [`NormalizedRecord`] that carries a
//! rendered [`Literal`] for every schema column, except an omitted primary
//! key which is left for the storage engine to assign.

use crate::defaults::{default_value, Clock};
use crate::schema::TableSchema;
use crate::values::{Literal, RawRecord};

/// A record ready for statement generation.
///
/// Values are stored positionally, aligned with the columns of the
/// [`TableSchema`] the record was normalized against. `None` marks an
/// omitted primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    values: Vec<Option<Literal>>,
}

impl NormalizedRecord {
    /// Literal at schema position `idx`.
    pub fn value_at(&self, idx: usize) -> Option<&Literal> {
        self.values.get(idx).and_then(Option::as_ref)
    }

    /// Literal of the named column.
    pub fn get<'a>(&'a self, table: &TableSchema, column: &str) -> Option<&'a Literal> {
        table.position(column).and_then(|idx| self.value_at(idx))
    }

    /// Whether the record carries a value at schema position `idx`.
    pub fn has(&self, idx: usize) -> bool {
        self.value_at(idx).is_some()
    }

    /// Present columns and their literals, in schema order.
    pub fn iter<'a>(
        &'a self,
        table: &'a TableSchema,
    ) -> impl Iterator<Item = (&'a str, &'a Literal)> + 'a {
        table
            .columns
            .iter()
            .zip(&self.values)
            .filter_map(|(column, value)| value.as_ref().map(|v| (column.name.as_str(), v)))
    }

    /// Number of columns the record carries.
    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Normalize `raw` against `table`.
///
/// For every column in schema order: a supplied value is rendered as is
/// (including a supplied primary key); an omitted primary key stays
/// omitted; any other omitted column gets its default. Keys the schema does
/// not know are dropped.
pub fn normalize(raw: &RawRecord, table: &TableSchema, clock: &dyn Clock) -> NormalizedRecord {
    let values = table
        .columns
        .iter()
        .map(|column| match raw.get(&column.name) {
            Some(value) => Some(Literal::from_raw(value)),
            None if column.is_primary() => None,
            None => Some(Literal::from_raw(&default_value(column, clock))),
        })
        .collect();

    for key in raw.keys() {
        if table.column(key).is_none() {
            tracing::warn!("Dropping unknown column '{}' for table '{}'", key, table.name);
        }
    }

    NormalizedRecord { values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::FixedClock;
    use crate::schema::{ColumnSchema, ColumnType};
    use crate::values::RawValue;
    use chrono::NaiveDate;

    fn clock() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2025, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap(),
        )
    }

    fn users() -> TableSchema {
        TableSchema::new(
            "users",
            vec![
                ColumnSchema::primary("id", ColumnType::Numeric),
                ColumnSchema::new("name", ColumnType::String),
                ColumnSchema::new("created", ColumnType::DateTime),
                ColumnSchema::new("nick", ColumnType::String).nullable(),
            ],
        )
        .unwrap()
    }

    fn record(pairs: &[(&str, RawValue)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_omitted_primary_key_stays_absent() {
        let table = users();
        let normalized = normalize(&record(&[("name", "Alice".into())]), &table, &clock());

        let columns: Vec<_> = normalized.iter(&table).collect();
        assert_eq!(
            columns,
            vec![
                ("name", &Literal::quoted("Alice")),
                ("created", &Literal::quoted("2025-01-02 03:04:05")),
                ("nick", &Literal::Null),
            ]
        );
        assert!(!normalized.has(0));
        assert_eq!(normalized.len(), 3);
    }

    #[test]
    fn test_supplied_primary_key_is_quoted() {
        let table = users();
        let normalized = normalize(
            &record(&[("id", RawValue::Integer(7)), ("name", "Bob".into())]),
            &table,
            &clock(),
        );
        assert_eq!(normalized.get(&table, "id"), Some(&Literal::quoted("7")));
        assert_eq!(normalized.len(), 4);
    }

    #[test]
    fn test_explicit_null_is_kept() {
        let table = users();
        let normalized = normalize(
            &record(&[("name", "Carol".into()), ("nick", RawValue::Null)]),
            &table,
            &clock(),
        );
        assert_eq!(normalized.get(&table, "nick"), Some(&Literal::Null));
    }

    #[test]
    fn test_unknown_columns_are_dropped() {
        let table = users();
        let normalized = normalize(
            &record(&[("name", "Dan".into()), ("favourite_colour", "red".into())]),
            &table,
            &clock(),
        );
        assert_eq!(normalized.len(), 3);
        assert!(normalized.get(&table, "favourite_colour").is_none());
    }

    #[test]
    fn test_empty_record_gets_all_defaults() {
        let table = users();
        let normalized = normalize(&RawRecord::new(), &table, &clock());
        assert_eq!(normalized.get(&table, "name"), Some(&Literal::quoted("")));
        assert!(!normalized.is_empty());
    }
}
