//! Values substituted for columns a record omits.

use crate::schema::{ColumnSchema, ColumnType};
use crate::values::RawValue;
use chrono::{Local, NaiveDateTime};

/// Format of synthesized `date` values.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format of synthesized `datetime` values.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of "now" for date and date-time zero values.
pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Value to use when a record omits `column`.
///
/// Nullable columns get NULL. Non-nullable columns get their declared
/// default, or a zero value for their type when none is declared: empty
/// string, today's date, the current date-time, or `0`.
pub fn default_value(column: &ColumnSchema, clock: &dyn Clock) -> RawValue {
    if column.nullable {
        return RawValue::Null;
    }

    match column.default.as_deref() {
        Some(default) if !default.is_empty() => RawValue::Text(default.to_string()),
        _ => zero_value(column.column_type, clock),
    }
}

fn zero_value(column_type: ColumnType, clock: &dyn Clock) -> RawValue {
    match column_type {
        ColumnType::String => RawValue::Text(String::new()),
        ColumnType::Date => RawValue::Text(clock.now().format(DATE_FORMAT).to_string()),
        ColumnType::DateTime => RawValue::Text(clock.now().format(DATETIME_FORMAT).to_string()),
        ColumnType::Numeric | ColumnType::Other => RawValue::Integer(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn clock() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(7, 5, 1)
                .unwrap(),
        )
    }

    #[test]
    fn test_nullable_column_defaults_to_null() {
        let column = ColumnSchema::new("nick", ColumnType::String)
            .nullable()
            .with_default("anon");
        assert_eq!(default_value(&column, &clock()), RawValue::Null);
    }

    #[test]
    fn test_zero_values_by_type() {
        let cases = [
            (ColumnType::String, RawValue::Text(String::new())),
            (ColumnType::Date, RawValue::Text("2024-03-09".into())),
            (ColumnType::DateTime, RawValue::Text("2024-03-09 07:05:01".into())),
            (ColumnType::Numeric, RawValue::Integer(0)),
            (ColumnType::Other, RawValue::Integer(0)),
        ];
        for (column_type, expected) in cases {
            let column = ColumnSchema::new("c", column_type);
            assert_eq!(default_value(&column, &clock()), expected, "{column_type:?}");
        }
    }

    #[test]
    fn test_declared_default_wins() {
        let column = ColumnSchema::new("status", ColumnType::String).with_default("active");
        assert_eq!(default_value(&column, &clock()), RawValue::Text("active".into()));
    }

    #[test]
    fn test_empty_declared_default_falls_back_to_zero() {
        let column = ColumnSchema::new("n", ColumnType::Numeric).with_default("");
        assert_eq!(default_value(&column, &clock()), RawValue::Integer(0));
    }
}
