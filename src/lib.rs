pub mod cli;
pub mod client;
pub mod csv_processor;
pub mod pipeline;
pub mod utils;

pub use client::{ApiClient, Authenticator, Credential, EndpointProfile, Envoy, Session, TenantId};
pub use csv_processor::{
    Batch, Batcher, CsvStreamReader, EntryBuilder, MetadataRecord, OutcomeLog, OutcomeRecord,
};
pub use pipeline::{process, run, BatchSink, ProcessStats, RunSummary};
pub use utils::{AppConfig, BulkMetaError, ExitStatus, Result, RunConfig};
