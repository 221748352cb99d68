use crate::client::EndpointProfile;
use crate::utils::{AppConfig, LogFormat, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "bulk-meta",
    version,
    about = "Bulk insert meta information against monitored objects in datahub"
)]
pub struct Cli {
    /// Total size of a batch of metadata entries that should be sent to datahub
    #[arg(short, long)]
    pub batchsize: Option<usize>,

    /// Path to the csv file containing meta information
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Host to send the metadata information to
    #[arg(short = 's', long)]
    pub host: Option<String>,

    /// Username to be used for logging into datahub
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password to be used for logging into datahub
    #[arg(short, long, env = "BULK_META_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Tenant alias to resolve before uploading
    #[arg(short, long)]
    pub tenant: Option<String>,

    /// Bulk endpoint to target
    #[arg(long, value_enum)]
    pub profile: Option<EndpointProfile>,

    /// Column whose value is sent as the entry key
    #[arg(short, long)]
    pub key_column: Option<String>,

    /// Where to write the processed log
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Retries for requests that fail to connect or time out
    #[arg(long)]
    pub retries: Option<usize>,

    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub log_level: Option<String>,

    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Loads the configuration file, if any, and layers the flags on top.
    pub fn into_app_config(self) -> Result<AppConfig> {
        let mut config = AppConfig::load_or_default(self.config.as_deref())?;
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(self, config: &mut AppConfig) {
        if let Some(batch_size) = self.batchsize {
            config.input.batch_size = batch_size;
        }
        if self.file.is_some() {
            config.input.file = self.file;
        }
        if self.key_column.is_some() {
            config.input.key_column = self.key_column;
        }
        if self.host.is_some() {
            config.api.host = self.host;
        }
        if let Some(profile) = self.profile {
            config.api.profile = profile;
        }
        if let Some(timeout) = self.timeout {
            config.api.timeout_seconds = timeout;
        }
        if let Some(retries) = self.retries {
            config.api.max_retries = retries;
        }
        if self.username.is_some() {
            config.auth.username = self.username;
        }
        if self.password.is_some() {
            config.auth.password = self.password;
        }
        if self.tenant.is_some() {
            config.auth.tenant = self.tenant;
        }
        if let Some(output) = self.output {
            config.output.processed_file = output;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}
