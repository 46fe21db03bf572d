//! Chunked flushing of a bundle.
//!
//! A flush splits the pending records into consecutive chunks of at most
//! `max_chunk_size` records, builds one [`Statement`] per chunk and hands
//! them to a [`StatementExecutor`] one at a time, in insertion order. The
//! next chunk is not started until the previous one has completed.
//!
//! Chunks are not wrapped in a common transaction. When a chunk fails, the
//! chunks before it stay written and are removed from the bundle; the
//! failing chunk and everything after it stay pending, so flushing again
//! retries only the remainder.

use crate::bundle::Bundle;
use crate::error::{BundleError, FlushError};
use crate::statement::{OnConflict, Statement};
use std::num::NonZeroUsize;

/// Default number of records per statement.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 10_000;

/// Per-flush settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Upper bound on records per statement
    pub max_chunk_size: NonZeroUsize,

    /// Conflict policy for every statement of the flush
    pub on_conflict: OnConflict,
}

impl BatchConfig {
    /// Build a config from a chunk size and a "replace existing rows" flag.
    pub fn new(max_chunk_size: usize, replace: bool) -> Result<Self, BundleError> {
        let max_chunk_size =
            NonZeroUsize::new(max_chunk_size).ok_or(BundleError::InvalidChunkSize)?;
        let on_conflict = if replace {
            OnConflict::UpsertOverwrite
        } else {
            OnConflict::InsertOnly
        };
        Ok(Self {
            max_chunk_size,
            on_conflict,
        })
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: NonZeroUsize::new(DEFAULT_MAX_CHUNK_SIZE)
                .unwrap_or(NonZeroUsize::MIN),
            on_conflict: OnConflict::UpsertOverwrite,
        }
    }
}

/// Runs statements against the target database.
///
/// This is the only place a built statement becomes a side effect.
#[async_trait::async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Execute `statement`, returning the number of affected rows.
    async fn execute(&self, statement: &Statement) -> anyhow::Result<u64>;
}

#[async_trait::async_trait]
impl<E: StatementExecutor + ?Sized> StatementExecutor for std::sync::Arc<E> {
    async fn execute(&self, statement: &Statement) -> anyhow::Result<u64> {
        (**self).execute(statement).await
    }
}

/// Outcome of a successful flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Statements executed
    pub chunks: usize,
    /// Records written
    pub rows: usize,
    /// Affected rows as reported by the executor
    pub affected_rows: u64,
}

impl Bundle {
    /// Build the statements a flush with `config` would execute, without
    /// executing them or touching the bundle.
    pub fn plan(&self, config: &BatchConfig) -> Vec<Statement> {
        self.records
            .chunks(config.max_chunk_size.get())
            .filter_map(|chunk| Statement::build(&self.table, chunk, config.on_conflict))
            .collect()
    }

    /// Write every pending record and empty the bundle.
    ///
    /// Flushing an empty bundle executes nothing.
    pub async fn flush<E>(
        &mut self,
        config: &BatchConfig,
        executor: &E,
    ) -> Result<FlushReport, FlushError>
    where
        E: StatementExecutor + ?Sized,
    {
        let mut report = FlushReport::default();
        if self.records.is_empty() {
            return Ok(report);
        }

        let total = self.records.len();
        let size = config.max_chunk_size.get();
        let chunks = total.div_ceil(size);

        for (chunk, start) in (0..total).step_by(size).enumerate() {
            let end = (start + size).min(total);
            let Some(statement) =
                Statement::build(&self.table, &self.records[start..end], config.on_conflict)
            else {
                continue;
            };

            tracing::debug!(
                "Executing chunk {}/{} for table '{}' ({} rows)",
                chunk + 1,
                chunks,
                self.table.name,
                statement.row_count()
            );

            match executor.execute(&statement).await {
                Ok(affected) => {
                    report.chunks += 1;
                    report.rows += statement.row_count();
                    report.affected_rows += affected;
                }
                Err(e) => {
                    tracing::warn!(
                        "Chunk {}/{} for table '{}' failed, {} rows left pending: {e:#}",
                        chunk + 1,
                        chunks,
                        self.table.name,
                        total - start
                    );
                    self.records.drain(..start);
                    return Err(FlushError::Execution {
                        table: self.table.name.clone(),
                        chunk,
                        chunks,
                        flushed_rows: start,
                        source: e.into(),
                    });
                }
            }
        }

        self.clear();
        tracing::info!(
            "Flushed {} rows to table '{}' in {} statements",
            report.rows,
            self.table.name,
            report.chunks
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_from_save_arguments() {
        let config = BatchConfig::new(500, false).unwrap();
        assert_eq!(config.max_chunk_size.get(), 500);
        assert_eq!(config.on_conflict, OnConflict::InsertOnly);

        assert!(matches!(
            BatchConfig::new(0, true),
            Err(BundleError::InvalidChunkSize)
        ));
    }

    #[test]
    fn test_default_batch_config() {
        let config = BatchConfig::default();
        assert_eq!(config.max_chunk_size.get(), 10_000);
        assert_eq!(config.on_conflict, OnConflict::UpsertOverwrite);
    }
}
