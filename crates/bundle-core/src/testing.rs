//! Test helpers.
//!
//! [`RecordingExecutor`] stands in for a database in unit and integration
//! tests, here and in downstream crates. It is not meant for production
//! loads: it keeps every statement in memory and never writes anything.

use crate::statement::Statement;
use crate::writer::StatementExecutor;
use std::sync::Mutex;

/// Records every statement it is given instead of running it.
///
/// Optionally fails on the n-th call (zero-based) to exercise partial
/// flushes.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    statements: Mutex<Vec<Statement>>,
    fail_at: Option<usize>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor whose `call`-th execution fails. Later calls succeed again.
    pub fn failing_at(call: usize) -> Self {
        Self {
            statements: Mutex::new(Vec::new()),
            fail_at: Some(call),
        }
    }

    /// Statements executed so far, including the failed one.
    pub fn statements(&self) -> Vec<Statement> {
        self.lock().clone()
    }

    /// Legacy SQL of every statement executed so far.
    pub fn sql(&self) -> Vec<String> {
        self.lock().iter().map(Statement::to_sql).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Statement>> {
        self.statements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl StatementExecutor for RecordingExecutor {
    async fn execute(&self, statement: &Statement) -> anyhow::Result<u64> {
        let mut statements = self.lock();
        let call = statements.len();
        statements.push(statement.clone());

        if self.fail_at == Some(call) {
            anyhow::bail!("Injected failure on statement {call}");
        }
        Ok(statement.row_count() as u64)
    }
}
