use crate::utils::config::{LogFormat, LoggingConfig};
use crate::utils::errors::{BulkMetaError, Result};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber: `RUST_LOG` directives plus the configured
/// level for this crate, written to stderr.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let directive = format!("bulk_meta={}", config.level)
        .parse::<Directive>()
        .map_err(|e| BulkMetaError::ConfigError(format!("invalid log level: {}", e)))?;

    let text = (config.format == LogFormat::Text)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    let json = (config.format == LogFormat::Json)
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(directive))
        .with(text)
        .with(json)
        .try_init()
        .map_err(|e| BulkMetaError::ConfigError(e.to_string()))
}
