use crate::client::EndpointProfile;
use crate::utils::errors::{BulkMetaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PROCESSED_FILE: &str = "/tmp/processed.csv";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: Option<String>,
    pub profile: EndpointProfile,
    pub timeout_seconds: u64,
    pub max_retries: usize,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub tenant: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub file: Option<PathBuf>,
    pub batch_size: usize,
    pub key_column: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub processed_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: None,
            profile: EndpointProfile::default(),
            timeout_seconds: 30,
            max_retries: 0,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            file: None,
            batch_size: 100,
            key_column: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            processed_file: PathBuf::from(DEFAULT_PROCESSED_FILE),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("tenant", &self.tenant)
            .finish()
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BulkMetaError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| BulkMetaError::ConfigError(e.to_string()))
    }

    /// An explicitly named file must exist; without one the defaults apply.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn into_run_config(self) -> Result<RunConfig> {
        let batch_size = NonZeroUsize::new(self.input.batch_size).ok_or_else(|| {
            BulkMetaError::ConfigError("batch size must be greater than zero".to_string())
        })?;

        let input_file = required(self.input.file, "input file")?;
        let host = required(self.api.host, "host")?;
        let username = required(self.auth.username, "username")?;
        let password = required(self.auth.password, "password")?;

        let tenant = self.auth.tenant.filter(|t| !t.trim().is_empty());
        if self.api.profile.requires_tenant() && tenant.is_none() {
            return Err(BulkMetaError::ConfigError(format!(
                "profile {} requires a tenant alias",
                self.api.profile
            )));
        }

        Ok(RunConfig {
            input_file,
            batch_size,
            key_column: self.input.key_column.filter(|k| !k.is_empty()),
            host,
            profile: self.api.profile,
            username,
            password,
            tenant,
            processed_file: self.output.processed_file,
            timeout: Duration::from_secs(self.api.timeout_seconds),
            max_retries: self.api.max_retries,
        })
    }
}

fn required<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| BulkMetaError::ConfigError(format!("missing required setting: {}", name)))
}

/// Fully resolved settings for a single upload run.
#[derive(Clone)]
pub struct RunConfig {
    pub input_file: PathBuf,
    pub batch_size: NonZeroUsize,
    pub key_column: Option<String>,
    pub host: String,
    pub profile: EndpointProfile,
    pub username: String,
    pub password: String,
    pub tenant: Option<String>,
    pub processed_file: PathBuf,
    pub timeout: Duration,
    pub max_retries: usize,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("input_file", &self.input_file)
            .field("batch_size", &self.batch_size)
            .field("key_column", &self.key_column)
            .field("host", &self.host)
            .field("profile", &self.profile)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("tenant", &self.tenant)
            .field("processed_file", &self.processed_file)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
