//! `load` and `describe` command handlers.

use crate::dry_run::DryRunExecutor;
use crate::input::{csv_records, jsonl_records};
use crate::{DescribeArgs, LoadArgs};
use anyhow::{bail, Context, Result};
use bundle_core::{
    BatchConfig, Bundle, DatabaseSchema, RawRecord, RenderMode, SchemaSource, StatementExecutor,
};
use mysql_bundle::{MySqlExecutor, MySqlSchemaSource};
use std::fs::File;
use std::io::BufReader;

/// Totals over a whole load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Records read from input
    pub records: usize,
    /// Non-empty flushes performed
    pub flushes: usize,
    /// Statements executed
    pub chunks: usize,
    /// Rows written
    pub rows: usize,
}

/// Accumulate `records` into `bundle`, flushing every `flush_every` records
/// and once more at the end.
pub async fn load_records<I, E>(
    bundle: &mut Bundle,
    records: I,
    config: &BatchConfig,
    flush_every: Option<usize>,
    executor: &E,
) -> Result<LoadSummary>
where
    I: IntoIterator<Item = Result<RawRecord>>,
    E: StatementExecutor + ?Sized,
{
    let mut summary = LoadSummary::default();

    for record in records {
        bundle.accumulate(record?);
        summary.records += 1;

        if flush_every.is_some_and(|n| bundle.size() >= n) {
            flush_into(bundle, config, executor, &mut summary).await?;
        }
    }

    flush_into(bundle, config, executor, &mut summary).await?;
    Ok(summary)
}

async fn flush_into<E>(
    bundle: &mut Bundle,
    config: &BatchConfig,
    executor: &E,
    summary: &mut LoadSummary,
) -> Result<()>
where
    E: StatementExecutor + ?Sized,
{
    if bundle.is_empty() {
        return Ok(());
    }
    let report = bundle
        .flush(config, executor)
        .await
        .with_context(|| format!("Failed to flush bundle for table '{}'", bundle.table().name))?;
    summary.flushes += 1;
    summary.chunks += report.chunks;
    summary.rows += report.rows;
    Ok(())
}

/// Run the `load` command.
pub async fn run_load(args: LoadArgs) -> Result<LoadSummary> {
    if args.jsonl.is_empty() && args.csv.is_empty() {
        bail!("Nothing to load: pass at least one --jsonl or --csv file");
    }
    if args.flush_every == Some(0) {
        bail!("--flush-every must be at least 1");
    }
    let delimiter = u8::try_from(args.delimiter)
        .context("CSV delimiter must be a single-byte character")?;

    let config = BatchConfig::new(args.max_chunk_size, !args.insert_only)?;
    let mode = if args.parameterized {
        RenderMode::Parameterized
    } else {
        RenderMode::Legacy
    };

    let pool = match &args.mysql_connection_string {
        Some(url) => Some(
            mysql_async::Pool::from_url(url).context("Invalid MySQL connection string")?,
        ),
        None => None,
    };

    // Handle kept to close the pool once the load is over.
    let pool_handle = pool.clone();

    let schema_source: Box<dyn SchemaSource> = match (&args.schema_file, &pool) {
        (Some(path), _) => Box::new(
            DatabaseSchema::from_file(path)
                .with_context(|| format!("Failed to load schema from {path:?}"))?,
        ),
        (None, Some(pool)) => Box::new(MySqlSchemaSource::new(pool.clone())),
        (None, None) => bail!("Either --schema-file or --mysql-connection-string is required"),
    };

    let mut bundle = Bundle::for_table(schema_source.as_ref(), &args.table).await?;
    if let Some(model_name) = &args.model_name {
        bundle = bundle.with_model_name(model_name.clone());
    }

    let executor: Box<dyn StatementExecutor> = if args.dry_run {
        tracing::info!("Running in dry-run mode - no data will be written");
        Box::new(DryRunExecutor::stdout(mode))
    } else {
        match pool {
            Some(pool) => Box::new(MySqlExecutor::new(pool, mode)),
            None => bail!("--mysql-connection-string is required unless --dry-run is set"),
        }
    };

    tracing::info!(
        "Loading into table '{}' (max {} rows per statement, {:?})",
        args.table,
        config.max_chunk_size,
        config.on_conflict
    );

    let mut sources: Vec<Box<dyn Iterator<Item = Result<RawRecord>>>> = Vec::new();

    for path in &args.jsonl {
        tracing::info!("Processing JSONL from: {}", path.display());
        let name = path.display().to_string();
        let file = File::open(path).with_context(|| format!("Failed to open {name}"))?;
        let records = jsonl_records(BufReader::new(file))
            .map(move |r| r.with_context(|| format!("In {name}")));
        sources.push(Box::new(records));
    }

    for path in &args.csv {
        tracing::info!("Processing CSV from: {}", path.display());
        let name = path.display().to_string();
        let file = File::open(path).with_context(|| format!("Failed to open {name}"))?;
        let records = csv_records(file, delimiter)
            .with_context(|| format!("In {name}"))?
            .map(move |r| r.with_context(|| format!("In {name}")));
        sources.push(Box::new(records));
    }

    let result = load_records(
        &mut bundle,
        sources.into_iter().flatten(),
        &config,
        args.flush_every,
        executor.as_ref(),
    )
    .await;

    drop(executor);
    drop(schema_source);
    let disconnected = match pool_handle {
        Some(pool) => pool.disconnect().await,
        None => Ok(()),
    };
    let summary = result?;
    disconnected.context("Failed to disconnect from MySQL")?;

    tracing::info!(
        "Loaded {} records into '{}': {} rows in {} statements over {} flushes",
        summary.records,
        args.table,
        summary.rows,
        summary.chunks,
        summary.flushes
    );
    Ok(summary)
}

/// Run the `describe` command: print the tables' schemas as YAML.
pub async fn run_describe(args: DescribeArgs) -> Result<String> {
    let pool = args.mysql.pool()?;
    let source = MySqlSchemaSource::new(pool.clone());

    let mut schema = DatabaseSchema::default();
    for table in &args.table {
        let table_schema = source
            .table_schema(table)
            .await
            .with_context(|| format!("Failed to describe table '{table}'"))?;
        schema.add_table(table_schema);
    }
    pool.disconnect().await?;

    Ok(serde_yaml::to_string(&schema)?)
}
