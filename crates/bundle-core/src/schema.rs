//! Schema descriptors for bundled tables.
//!
//! A [`TableSchema`] is the read-only view of a target table that the
//! normalizer and the batch writer work from: an ordered list of columns,
//! each with a type, nullability, an optional declared default and an
//! optional key role.
//!
//! Schemas come from a [`SchemaSource`]. [`DatabaseSchema`] is the static
//! source loaded from a YAML file; database-backed sources live in the
//! driver crates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading schema file
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Table not found in schema
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Table has no columns
    #[error("Table '{0}' has no columns")]
    EmptyTable(String),

    /// Same column declared twice
    #[error("Column '{column}' declared more than once in table '{table}'")]
    DuplicateColumn { table: String, column: String },
}

// ============================================================================
// Column Types
// ============================================================================

/// Column type, as far as default synthesis cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Character data (CHAR, VARCHAR, TEXT, ...)
    String,
    /// Calendar date
    Date,
    /// Date and time of day
    #[serde(rename = "datetime", alias = "timestamp")]
    DateTime,
    /// Integer, decimal and floating point numbers
    Numeric,
    /// Anything else (binary, JSON, geometry, ...)
    Other,
}

/// Role a column plays in the table's keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    /// Primary key; assigned by the storage engine when omitted.
    Primary,
    /// Unique key
    Unique,
    /// Non-unique index
    Index,
}

/// Metadata for a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name
    pub name: String,

    /// Column type
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Whether this column accepts NULL
    #[serde(default)]
    pub nullable: bool,

    /// Declared default, in textual form
    #[serde(default)]
    pub default: Option<String>,

    /// Key role, if any
    #[serde(default)]
    pub key: Option<KeyRole>,
}

impl ColumnSchema {
    /// Create a non-nullable column with no default and no key role.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            default: None,
            key: None,
        }
    }

    /// Create a primary key column.
    pub fn primary(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            key: Some(KeyRole::Primary),
            ..Self::new(name, column_type)
        }
    }

    /// Mark the column as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Attach a declared default.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn is_primary(&self) -> bool {
        self.key == Some(KeyRole::Primary)
    }
}

// ============================================================================
// Tables
// ============================================================================

/// Ordered column set of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name
    pub name: String,

    /// Columns, in table order
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Create a table schema, rejecting empty and duplicated column sets.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSchema>) -> Result<Self, SchemaError> {
        let table = Self {
            name: name.into(),
            columns,
        };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.columns.is_empty() {
            return Err(SchemaError::EmptyTable(self.name.clone()));
        }
        let mut seen = std::collections::HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column in table order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// First column with the primary key role.
    pub fn primary_key(&self) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.is_primary())
    }

    /// All column names, in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Collection of table schemas, usually loaded from a YAML file.
///
/// ```yaml
/// tables:
///   - name: users
///     columns:
///       - { name: id, type: numeric, key: primary }
///       - { name: name, type: string }
///       - { name: created, type: datetime }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSchema {
    /// Table definitions
    pub tables: Vec<TableSchema>,

    /// Cached table lookup (not serialized)
    #[serde(skip)]
    table_map: HashMap<String, usize>,
}

impl DatabaseSchema {
    /// Create a new database schema from a list of table schemas.
    pub fn new(tables: Vec<TableSchema>) -> Self {
        let mut schema = Self {
            tables,
            table_map: HashMap::new(),
        };
        schema.build_table_map();
        schema
    }

    /// Parse a schema from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        let mut schema: DatabaseSchema = serde_yaml::from_str(yaml)?;
        for table in &schema.tables {
            table.validate()?;
        }
        schema.build_table_map();
        Ok(schema)
    }

    /// Load a schema from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    fn build_table_map(&mut self) {
        self.table_map = self
            .tables
            .iter()
            .enumerate()
            .map(|(idx, table)| (table.name.clone(), idx))
            .collect();
    }

    /// Get a table schema by name.
    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.table_map
            .get(name)
            .and_then(|&idx| self.tables.get(idx))
    }

    /// Get all table names in the schema.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Add a table to the schema.
    pub fn add_table(&mut self, table: TableSchema) {
        let idx = self.tables.len();
        self.table_map.insert(table.name.clone(), idx);
        self.tables.push(table);
    }
}

// ============================================================================
// Schema Source
// ============================================================================

/// Anything that can describe a table's columns.
///
/// Bundles query their source once, before the first record is accepted.
#[async_trait::async_trait]
pub trait SchemaSource: Send + Sync {
    /// Look up the schema of `table`.
    async fn table_schema(&self, table: &str) -> anyhow::Result<TableSchema>;
}

#[async_trait::async_trait]
impl SchemaSource for DatabaseSchema {
    async fn table_schema(&self, table: &str) -> anyhow::Result<TableSchema> {
        self.get_table(table)
            .cloned()
            .ok_or_else(|| SchemaError::TableNotFound(table.to_string()).into())
    }
}
