use crate::client::{ApiClient, Authenticator, Envoy, Session};
use crate::csv_processor::{
    Batch, Batcher, CsvRecordIterator, CsvStreamReader, EntryBuilder, MetadataRecord, OutcomeLog,
};
use crate::utils::{BulkMetaError, Result, RunConfig};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Destination for batches of metadata records.
///
/// Returns the number of outcomes recorded for the batch. Errors for which
/// [`BulkMetaError::is_batch_failure`] holds are logged and skipped by
/// [`process`]; anything else aborts the run.
#[allow(async_fn_in_trait)]
pub trait BatchSink {
    async fn send_batch(&mut self, batch: &Batch) -> Result<usize>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub batches_sent: usize,
    pub batches_failed: usize,
    pub outcomes_written: usize,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stats: ProcessStats,
    pub processed_file: PathBuf,
    pub elapsed: Duration,
}

/// Yields one record per well-formed row. Malformed rows are skipped with a
/// warning; an I/O failure stops the stream and is kept in `fatal`.
struct EntrySource<'a> {
    records: CsvRecordIterator,
    builder: &'a EntryBuilder,
    rows_read: usize,
    rows_skipped: usize,
    fatal: Option<BulkMetaError>,
}

impl Iterator for EntrySource<'_> {
    type Item = MetadataRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fatal.is_some() {
            return None;
        }

        loop {
            let (line, record) = match self.records.next()? {
                Ok(row) => row,
                Err(e) if e.is_io_error() => {
                    self.fatal = Some(e.into());
                    return None;
                }
                Err(e) => {
                    self.rows_read += 1;
                    self.rows_skipped += 1;
                    warn!(error = %e, "Skipping unreadable row");
                    continue;
                }
            };

            self.rows_read += 1;
            match self.builder.build(&record, line) {
                Ok(entry) => return Some(entry),
                Err(e) => {
                    self.rows_skipped += 1;
                    warn!("Skipping row: {}", e);
                }
            }
        }
    }
}

/// Streams the CSV through the batcher into `sink`, one batch at a time.
pub async fn process<S: BatchSink>(
    reader: CsvStreamReader,
    builder: &EntryBuilder,
    batcher: Batcher,
    sink: &mut S,
) -> Result<ProcessStats> {
    let mut source = EntrySource {
        records: reader.into_records(),
        builder,
        rows_read: 0,
        rows_skipped: 0,
        fatal: None,
    };
    let mut stats = ProcessStats::default();

    for batch in batcher.batches(&mut source) {
        match sink.send_batch(&batch).await {
            Ok(written) => {
                stats.batches_sent += 1;
                stats.outcomes_written += written;
            }
            Err(e) if e.is_batch_failure() => {
                error!(batch = batch.index, error = %e, "Batch dispatch failed, continuing");
                stats.batches_failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if let Some(e) = source.fatal.take() {
        return Err(e);
    }

    stats.rows_read = source.rows_read;
    stats.rows_skipped = source.rows_skipped;
    Ok(stats)
}

/// Runs a complete upload: the input is opened before any network call, and
/// the outcome log is only created once the session is established.
pub async fn run(config: &RunConfig) -> Result<RunSummary> {
    let start = Instant::now();

    info!("Loading entries from {}", config.input_file.display());
    let reader = CsvStreamReader::open(&config.input_file).map_err(|e| {
        error!("Could not open {}: {}", config.input_file.display(), e);
        e
    })?;
    let builder = EntryBuilder::new(reader.headers(), config.key_column.as_deref())?;
    info!(
        "Processing csv with headers: {}",
        builder.metadata_columns().collect::<Vec<_>>().join(", ")
    );

    let api = ApiClient::new(&config.host, config.timeout, config.max_retries)?;
    let authenticator = Authenticator::new(api.clone(), config.profile);

    info!("Logging into datahub...");
    let credential = authenticator
        .login(&config.username, &config.password)
        .await?;

    let tenant_id = match &config.tenant {
        Some(alias) if config.profile.requires_tenant() => {
            Some(authenticator.resolve_tenant(&credential, alias).await?)
        }
        Some(alias) => {
            warn!(
                profile = %config.profile,
                "Ignoring tenant alias {}, the profile does not use one", alias
            );
            None
        }
        None => None,
    };
    let session = Session {
        credential,
        tenant_id,
    };

    info!("Generating processed log at {}", config.processed_file.display());
    let outcomes = OutcomeLog::create(&config.processed_file)?;
    let mut envoy = Envoy::new(api, &session, config.profile, outcomes)?;

    info!(
        profile = %config.profile,
        batch_size = config.batch_size.get(),
        "Starting to process..."
    );
    let processed = process(reader, &builder, Batcher::new(config.batch_size), &mut envoy).await;
    let finished = envoy.finish();
    let stats = processed?;
    finished?;

    let elapsed = start.elapsed();
    info!(
        rows_read = stats.rows_read,
        rows_skipped = stats.rows_skipped,
        batches_sent = stats.batches_sent,
        batches_failed = stats.batches_failed,
        outcomes_written = stats.outcomes_written,
        "Finished processing {} in {:.3} seconds",
        config.input_file.display(),
        elapsed.as_secs_f64()
    );

    Ok(RunSummary {
        stats,
        processed_file: config.processed_file.clone(),
        elapsed,
    })
}
