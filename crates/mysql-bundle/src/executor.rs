//! Statement execution against a MySQL connection pool.

use crate::error::MySqlBundleError;
use bundle_core::{RenderMode, Statement, StatementExecutor};
use mysql_async::{prelude::*, Params, Pool, Value};

/// Largest number of placeholders a MySQL prepared statement accepts.
pub const MAX_PLACEHOLDERS: usize = 65_535;

/// Runs bundle statements on MySQL.
///
/// In [`RenderMode::Legacy`] the statement text is sent as a plain query with
/// every literal embedded. In [`RenderMode::Parameterized`] it is prepared
/// with `?` placeholders and the values are bound.
#[derive(Clone, Debug)]
pub struct MySqlExecutor {
    pool: Pool,
    mode: RenderMode,
}

impl MySqlExecutor {
    pub fn new(pool: Pool, mode: RenderMode) -> Self {
        Self { pool, mode }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Disconnect the underlying pool.
    pub async fn disconnect(self) -> Result<(), MySqlBundleError> {
        self.pool.disconnect().await?;
        Ok(())
    }

    async fn execute_statement(&self, statement: &Statement) -> Result<u64, MySqlBundleError> {
        let mut conn = self.pool.get_conn().await?;

        match self.mode {
            RenderMode::Legacy => {
                conn.query_drop(statement.to_sql()).await?;
            }
            RenderMode::Parameterized => {
                let parameterized = statement.to_parameterized();
                if parameterized.params.len() > MAX_PLACEHOLDERS {
                    return Err(MySqlBundleError::TooManyPlaceholders {
                        count: parameterized.params.len(),
                        max: MAX_PLACEHOLDERS,
                    });
                }

                let params = if parameterized.params.is_empty() {
                    Params::Empty
                } else {
                    Params::Positional(
                        parameterized
                            .params
                            .into_iter()
                            .map(|p| match p {
                                Some(text) => Value::Bytes(text.into_bytes()),
                                None => Value::NULL,
                            })
                            .collect(),
                    )
                };
                conn.exec_drop(&parameterized.sql, params).await?;
            }
        }

        Ok(conn.affected_rows())
    }
}

#[async_trait::async_trait]
impl StatementExecutor for MySqlExecutor {
    async fn execute(&self, statement: &Statement) -> anyhow::Result<u64> {
        Ok(self.execute_statement(statement).await?)
    }
}
