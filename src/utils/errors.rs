use thiserror::Error;

#[derive(Error, Debug)]
pub enum BulkMetaError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Could not login to host {host}: status {status}")]
    AuthenticationFailed { host: String, status: u16 },

    #[error("Login to host {host} succeeded but no Authorization header was returned")]
    MissingCredential { host: String },

    #[error("Could not resolve tenant alias {alias}: {reason}")]
    TenantLookupFailed { alias: String, reason: String },

    #[error("Batch {index} was rejected with status {status}")]
    BatchDispatchFailed { index: usize, status: u16 },

    #[error("Malformed row at line {line}: expected {expected} fields, got {got}")]
    MalformedRow {
        line: u64,
        expected: usize,
        got: usize,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, BulkMetaError>;

/// Process exit codes reported by the `bulk-meta` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Success = 0,
    AuthFailure = 1,
    IoFailure = 2,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl BulkMetaError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            BulkMetaError::AuthenticationFailed { .. }
            | BulkMetaError::MissingCredential { .. }
            | BulkMetaError::TenantLookupFailed { .. } => ExitStatus::AuthFailure,
            _ => ExitStatus::IoFailure,
        }
    }

    /// Errors that cost a single batch and leave the run going.
    pub fn is_batch_failure(&self) -> bool {
        matches!(
            self,
            BulkMetaError::BatchDispatchFailed { .. } | BulkMetaError::HttpError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_auth_exit_status() {
        let err = BulkMetaError::AuthenticationFailed {
            host: "datahub".to_string(),
            status: 401,
        };
        assert_eq!(err.exit_status(), ExitStatus::AuthFailure);
        assert_eq!(err.exit_status().code(), 1);

        let err = BulkMetaError::TenantLookupFailed {
            alias: "acme".to_string(),
            reason: "status 404".to_string(),
        };
        assert_eq!(err.exit_status(), ExitStatus::AuthFailure);
    }

    #[test]
    fn other_fatal_errors_map_to_io_exit_status() {
        let err = BulkMetaError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing.csv",
        ));
        assert_eq!(err.exit_status(), ExitStatus::IoFailure);
        assert_eq!(err.exit_status().code(), 2);
        assert!(!err.is_batch_failure());

        let err = BulkMetaError::ConfigError("batch size".to_string());
        assert_eq!(err.exit_status(), ExitStatus::IoFailure);
    }

    #[test]
    fn rejected_batch_is_not_fatal() {
        let err = BulkMetaError::BatchDispatchFailed {
            index: 2,
            status: 500,
        };
        assert!(err.is_batch_failure());
    }
}
