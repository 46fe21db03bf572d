//! Bulk INSERT statements built from one chunk of a bundle.
//!
//! A [`Statement`] is rendered in one of two ways:
//!
//! - [`Statement::to_sql`] embeds every literal in the statement text. This
//!   is the legacy wire format and does not escape quote characters inside
//!   values, so untrusted input can break out of a literal.
//! - [`Statement::to_parameterized`] emits `?` placeholders and returns the
//!   values separately for the driver to bind.

use crate::normalize::NormalizedRecord;
use crate::schema::TableSchema;
use crate::values::{Literal, DEFAULT_LITERAL, NULL_LITERAL};
use serde::{Deserialize, Serialize};

/// What to do when an inserted row collides with an existing unique key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnConflict {
    /// Plain INSERT; the server reports the conflict as an error.
    InsertOnly,
    /// Overwrite every non-primary column of the existing row.
    #[default]
    UpsertOverwrite,
}

/// How executors turn a [`Statement`] into something the server runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Literals embedded in the text, unescaped.
    #[default]
    Legacy,
    /// Placeholders with bound values.
    Parameterized,
}

/// One bulk write over one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Target table
    pub table: String,

    /// Statement columns, in schema order
    pub columns: Vec<String>,

    /// One literal tuple per record, aligned with `columns`
    pub rows: Vec<Vec<Literal>>,

    /// Columns overwritten on a duplicate key, if upserting
    pub conflict: Option<Vec<String>>,
}

/// Placeholder form of a [`Statement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterizedStatement {
    /// Statement text with `?` placeholders
    pub sql: String,

    /// Values to bind, in placeholder order; `None` binds NULL
    pub params: Vec<Option<String>>,
}

impl Statement {
    /// Build the statement for `records`.
    ///
    /// The column list is the schema-ordered union of the columns present in
    /// any record. A record missing one of those columns gets `DEFAULT` in
    /// that position, so every tuple lines up with the column list. Returns
    /// `None` for an empty chunk.
    pub fn build(
        table: &TableSchema,
        records: &[NormalizedRecord],
        on_conflict: OnConflict,
    ) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let positions: Vec<usize> = (0..table.columns.len())
            .filter(|&idx| records.iter().any(|r| r.has(idx)))
            .collect();

        let columns: Vec<String> = positions
            .iter()
            .map(|&idx| table.columns[idx].name.clone())
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                positions
                    .iter()
                    .map(|&idx| record.value_at(idx).cloned().unwrap_or(Literal::Default))
                    .collect()
            })
            .collect();

        let conflict = match on_conflict {
            OnConflict::InsertOnly => None,
            OnConflict::UpsertOverwrite => {
                let updated: Vec<String> = positions
                    .iter()
                    .filter(|&&idx| !table.columns[idx].is_primary())
                    .map(|&idx| table.columns[idx].name.clone())
                    .collect();
                (!updated.is_empty()).then_some(updated)
            }
        };

        Some(Self {
            table: table.name.clone(),
            columns,
            rows,
            conflict,
        })
    }

    /// Number of rows the statement writes.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Legacy text with every literal embedded.
    pub fn to_sql(&self) -> String {
        let values = self
            .rows
            .iter()
            .map(|row| {
                let literals: Vec<String> = row.iter().map(Literal::to_string).collect();
                format!("({})", literals.join(","))
            })
            .collect::<Vec<_>>()
            .join(",");

        self.render(&values)
    }

    /// Placeholder text plus the values to bind.
    pub fn to_parameterized(&self) -> ParameterizedStatement {
        let mut params = Vec::with_capacity(self.rows.len() * self.columns.len());

        let values = self
            .rows
            .iter()
            .map(|row| {
                let slots: Vec<&str> = row
                    .iter()
                    .map(|literal| match literal {
                        Literal::Default => DEFAULT_LITERAL,
                        Literal::Null => {
                            params.push(None);
                            "?"
                        }
                        Literal::Quoted(text) => {
                            params.push(Some(text.clone()));
                            "?"
                        }
                    })
                    .collect();
                format!("({})", slots.join(","))
            })
            .collect::<Vec<_>>()
            .join(",");

        ParameterizedStatement {
            sql: self.render(&values),
            params,
        }
    }

    /// Text for the given render mode, ignoring bound values.
    pub fn sql_for(&self, mode: RenderMode) -> String {
        match mode {
            RenderMode::Legacy => self.to_sql(),
            RenderMode::Parameterized => self.to_parameterized().sql,
        }
    }

    fn render(&self, values: &str) -> String {
        let mut sql = format!(
            "INSERT INTO `{}` ({}) VALUES {}",
            self.table,
            self.columns.join(","),
            values
        );

        if let Some(conflict) = &self.conflict {
            let updates: Vec<String> = conflict
                .iter()
                .map(|c| format!("{c}=VALUES({c})"))
                .collect();
            sql.push_str(" ON DUPLICATE KEY UPDATE ");
            sql.push_str(&updates.join(","));
        }

        sql.push(';');
        sql
    }
}

/// Display form of a bound parameter, for logging.
pub fn describe_param(param: &Option<String>) -> &str {
    param.as_deref().unwrap_or(NULL_LITERAL)
}
