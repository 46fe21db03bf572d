//! Single-writer task that owns a bundle.
//!
//! [`BundleWorker::spawn`] moves a [`Bundle`] into its own tokio task fed by
//! a bounded channel. Any number of [`BundleHandle`] clones can feed it;
//! commands are applied one at a time in arrival order, so the bundle never
//! sees concurrent mutation.

use crate::bundle::Bundle;
use crate::error::BundleError;
use crate::values::RawRecord;
use crate::writer::{BatchConfig, FlushReport, StatementExecutor};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Default capacity for the worker command channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

enum BundleCommand {
    Add {
        record: RawRecord,
    },
    Flush {
        config: BatchConfig,
        ack: oneshot::Sender<Result<FlushReport, BundleError>>,
    },
    Size {
        ack: oneshot::Sender<usize>,
    },
    Close {
        ack: oneshot::Sender<Bundle>,
    },
}

/// Spawns bundle-owning tasks.
pub struct BundleWorker;

impl BundleWorker {
    /// Move `bundle` into a new task that flushes through `executor`.
    pub fn spawn<E>(bundle: Bundle, executor: E, capacity: usize) -> BundleHandle
    where
        E: StatementExecutor + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let table: Arc<str> = Arc::from(bundle.table().name.as_str());
        let task = tokio::spawn(run_bundle_task(bundle, executor, rx));

        BundleHandle {
            table,
            tx,
            task: Arc::new(tokio::sync::Mutex::new(Some(task))),
        }
    }
}

/// Cloneable handle to a bundle worker.
#[derive(Clone)]
pub struct BundleHandle {
    table: Arc<str>,
    tx: mpsc::Sender<BundleCommand>,
    task: Arc<tokio::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl BundleHandle {
    /// Queue a record. Waits only when the channel is full.
    pub async fn add(&self, record: RawRecord) -> Result<(), BundleError> {
        self.send(BundleCommand::Add { record }).await
    }

    /// Flush everything queued before this call and wait for the result.
    pub async fn flush(&self, config: BatchConfig) -> Result<FlushReport, BundleError> {
        let (ack, rx) = oneshot::channel();
        self.send(BundleCommand::Flush { config, ack }).await?;
        rx.await.map_err(|_| self.closed())?
    }

    /// Pending records in the worker's bundle.
    pub async fn size(&self) -> Result<usize, BundleError> {
        let (ack, rx) = oneshot::channel();
        self.send(BundleCommand::Size { ack }).await?;
        rx.await.map_err(|_| self.closed())
    }

    /// Stop the worker and take back its bundle, with whatever is still
    /// pending in it.
    pub async fn close(&self) -> Result<Bundle, BundleError> {
        let (ack, rx) = oneshot::channel();
        self.send(BundleCommand::Close { ack }).await?;
        let bundle = rx.await.map_err(|_| self.closed())?;

        if let Some(task) = self.task.lock().await.take() {
            if let Err(e) = task.await {
                tracing::warn!("Bundle worker for table '{}' ended abnormally: {e}", self.table);
            }
        }
        Ok(bundle)
    }

    async fn send(&self, command: BundleCommand) -> Result<(), BundleError> {
        self.tx.send(command).await.map_err(|_| self.closed())
    }

    fn closed(&self) -> BundleError {
        BundleError::WorkerClosed(self.table.to_string())
    }
}

async fn run_bundle_task<E>(
    mut bundle: Bundle,
    executor: E,
    mut rx: mpsc::Receiver<BundleCommand>,
) where
    E: StatementExecutor,
{
    tracing::debug!("Bundle worker for table '{}' started", bundle.table().name);

    while let Some(command) = rx.recv().await {
        match command {
            BundleCommand::Add { record } => bundle.accumulate(record),
            BundleCommand::Flush { config, ack } => {
                let result = bundle
                    .flush(&config, &executor)
                    .await
                    .map_err(BundleError::from);
                let _ = ack.send(result);
            }
            BundleCommand::Size { ack } => {
                let _ = ack.send(bundle.size());
            }
            BundleCommand::Close { ack } => {
                tracing::debug!(
                    "Bundle worker for table '{}' closing with {} pending",
                    bundle.table().name,
                    bundle.size()
                );
                let _ = ack.send(bundle);
                return;
            }
        }
    }

    if !bundle.is_empty() {
        tracing::warn!(
            "Bundle worker for table '{}' dropped with {} unflushed records",
            bundle.table().name,
            bundle.size()
        );
    }
}
