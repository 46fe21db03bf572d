//! Table schema introspection from MySQL's INFORMATION_SCHEMA.
//!
//! Column metadata is read for the current database (`DATABASE()`) and
//! mapped onto bundle-core's [`ColumnSchema`]: `DATA_TYPE` picks the
//! [`ColumnType`], `IS_NULLABLE` the nullability, `COLUMN_DEFAULT` the
//! declared default and `COLUMN_KEY` the key role. Expression defaults such
//! as `CURRENT_TIMESTAMP` are not literals and are dropped.

use crate::error::MySqlBundleError;
use bundle_core::{ColumnSchema, ColumnType, KeyRole, SchemaSource, TableSchema};
use mysql_async::prelude::*;
use mysql_async::Pool;

const COLUMNS_QUERY: &str = "
    SELECT COLUMN_NAME, DATA_TYPE, IS_NULLABLE, COLUMN_DEFAULT, COLUMN_KEY, EXTRA
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION";

/// Convert a MySQL `DATA_TYPE` to the column type used for default synthesis.
pub fn mysql_data_type_to_column_type(data_type: &str) -> ColumnType {
    match data_type.to_uppercase().as_str() {
        "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
            ColumnType::String
        }
        "DATE" => ColumnType::Date,
        "DATETIME" | "TIMESTAMP" => ColumnType::DateTime,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" | "DECIMAL"
        | "NUMERIC" | "FLOAT" | "DOUBLE" | "REAL" | "BIT" | "YEAR" => ColumnType::Numeric,
        _ => ColumnType::Other,
    }
}

/// Convert a MySQL `COLUMN_KEY` to a key role.
pub fn mysql_column_key_to_key_role(column_key: &str) -> Option<KeyRole> {
    match column_key {
        "PRI" => Some(KeyRole::Primary),
        "UNI" => Some(KeyRole::Unique),
        "MUL" => Some(KeyRole::Index),
        _ => None,
    }
}

/// Whether a `COLUMN_DEFAULT` is evaluated by the server rather than
/// stored as a constant.
///
/// MySQL 8 flags expression defaults with `DEFAULT_GENERATED` in `EXTRA`.
/// Older servers and MariaDB only show the function name.
pub fn is_expression_default(column_default: &str, extra: &str) -> bool {
    if extra.to_uppercase().contains("DEFAULT_GENERATED") {
        return true;
    }
    let name = column_default.trim().to_uppercase();
    let name = name.strip_suffix("()").unwrap_or(&name);
    let name = name.split('(').next().unwrap_or(name);
    matches!(
        name,
        "CURRENT_TIMESTAMP"
            | "CURRENT_DATE"
            | "CURRENT_TIME"
            | "NOW"
            | "LOCALTIME"
            | "LOCALTIMESTAMP"
            | "CURDATE"
            | "CURTIME"
            | "UTC_TIMESTAMP"
            | "UUID"
    )
}

/// Build a column from the textual INFORMATION_SCHEMA fields.
pub fn column_from_information_schema(
    name: String,
    data_type: &str,
    is_nullable: &str,
    column_default: Option<String>,
    column_key: &str,
    extra: &str,
) -> ColumnSchema {
    let default = column_default.filter(|d| !is_expression_default(d, extra));
    ColumnSchema {
        name,
        column_type: mysql_data_type_to_column_type(data_type),
        nullable: is_nullable.eq_ignore_ascii_case("YES"),
        default,
        key: mysql_column_key_to_key_role(column_key),
    }
}

/// Read the schema of `table` from the connection's current database.
pub async fn collect_mysql_table_schema(
    conn: &mut mysql_async::Conn,
    table: &str,
) -> Result<TableSchema, MySqlBundleError> {
    let rows: Vec<mysql_async::Row> = conn.exec(COLUMNS_QUERY, (table,)).await?;

    let missing = |field: &'static str| MySqlBundleError::MalformedSchemaRow {
        table: table.to_string(),
        field,
    };

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.get(0).ok_or_else(|| missing("COLUMN_NAME"))?;
        let data_type: String = row.get(1).ok_or_else(|| missing("DATA_TYPE"))?;
        let is_nullable: String = row.get(2).ok_or_else(|| missing("IS_NULLABLE"))?;
        let column_default: Option<String> = row.get::<Option<String>, _>(3).flatten();
        let column_key: String = row.get::<Option<String>, _>(4).flatten().unwrap_or_default();
        let extra: String = row.get::<Option<String>, _>(5).flatten().unwrap_or_default();

        columns.push(column_from_information_schema(
            name,
            &data_type,
            &is_nullable,
            column_default,
            &column_key,
            &extra,
        ));
    }

    if columns.is_empty() {
        return Err(MySqlBundleError::TableNotFound(table.to_string()));
    }

    tracing::debug!(
        "Introspected {} columns for MySQL table '{}'",
        columns.len(),
        table
    );

    Ok(TableSchema::new(table, columns)?)
}

/// Schema source backed by a MySQL connection pool.
#[derive(Clone, Debug)]
pub struct MySqlSchemaSource {
    pool: Pool,
}

impl MySqlSchemaSource {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SchemaSource for MySqlSchemaSource {
    async fn table_schema(&self, table: &str) -> anyhow::Result<TableSchema> {
        let mut conn = self.pool.get_conn().await.map_err(MySqlBundleError::from)?;
        Ok(collect_mysql_table_schema(&mut conn, table).await?)
    }
}
