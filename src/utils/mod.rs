pub mod config;
pub mod errors;
pub mod logging;

pub use config::{AppConfig, LogFormat, LoggingConfig, RunConfig, DEFAULT_PROCESSED_FILE};
pub use errors::{BulkMetaError, ExitStatus, Result};
pub use logging::init_tracing;
