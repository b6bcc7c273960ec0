// Error handling module
// Defines the error taxonomy surfaced to the operator and its exit codes

use std::path::PathBuf;
use thiserror::Error;

/// Errors that terminate a run
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or missing local configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The application-secret file needed for a new authorization is absent
    #[error("Configuration error: client secrets file not found: {}", path.display())]
    MissingClientSecrets { path: PathBuf },

    /// Refresh or interactive authorization failed
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Error response from the Drive API
    #[error("Drive API error: {status} - {message}")]
    DriveApiError { status: u16, message: String },

    /// Request never produced a usable response
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Credential cache could not be written
    #[error("Credential cache error: {0}")]
    CacheError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::ConfigError(_) | AppError::MissingClientSecrets { .. } => 2,
            AppError::AuthError(_) => 3,
            AppError::DriveApiError { .. } | AppError::TransportError(_) => 4,
            AppError::CacheError(_) => 5,
            AppError::Internal(_) => 1,
        }
    }

    /// Operator-facing setup steps, when the error has any
    pub fn remediation(&self) -> Option<String> {
        match self {
            AppError::MissingClientSecrets { path } => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "credentials.json".to_string());
                Some(format!(
                    "To use this tool, you need to:\n\
                     1. Go to https://console.cloud.google.com/\n\
                     2. Create a new project or select an existing one\n\
                     3. Enable the Google Drive API\n\
                     4. Create credentials (OAuth 2.0 Client ID, Desktop app)\n\
                     5. Download the credentials as '{}'\n\
                     6. Place it at {} (or pass --credentials-file)",
                    file_name,
                    path.display()
                ))
            }
            _ => None,
        }
    }
}

/// Result type alias for fallible operations
pub type Result<T> = std::result::Result<T, AppError>;
