//! Executor that prints statements instead of running them.

use bundle_core::{RenderMode, Statement, StatementExecutor};
use std::io::Write;
use std::sync::Mutex;

/// Writes each statement, one per line, to `out`.
pub struct DryRunExecutor<W> {
    out: Mutex<W>,
    mode: RenderMode,
}

impl DryRunExecutor<std::io::Stdout> {
    /// Dry run to standard output.
    pub fn stdout(mode: RenderMode) -> Self {
        Self::new(std::io::stdout(), mode)
    }
}

impl<W: Write + Send> DryRunExecutor<W> {
    pub fn new(out: W, mode: RenderMode) -> Self {
        Self {
            out: Mutex::new(out),
            mode,
        }
    }

    /// Take back the writer.
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl<W: Write + Send> StatementExecutor for DryRunExecutor<W> {
    async fn execute(&self, statement: &Statement) -> anyhow::Result<u64> {
        tracing::debug!(
            "Dry run: {} rows for table '{}'",
            statement.row_count(),
            statement.table
        );

        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow::anyhow!("Dry-run output lock poisoned"))?;
        match self.mode {
            RenderMode::Legacy => writeln!(out, "{}", statement.to_sql())?,
            RenderMode::Parameterized => {
                let parameterized = statement.to_parameterized();
                let params: Vec<&str> = parameterized
                    .params
                    .iter()
                    .map(bundle_core::statement::describe_param)
                    .collect();
                writeln!(out, "{}", parameterized.sql)?;
                writeln!(out, "-- params: {}", params.join(", "))?;
            }
        }
        Ok(0)
    }
}
