// Application-secret file loading

use std::fs;
use std::path::Path;

use super::types::{ClientSecrets, ClientSecretsFile};
use crate::error::{AppError, Result};

/// Load the OAuth client identity downloaded from the Google Cloud console
///
/// Absence is reported as [`AppError::MissingClientSecrets`] so the caller
/// can print setup instructions instead of attempting network access.
pub fn load_client_secrets(path: &Path) -> Result<ClientSecrets> {
    if !path.exists() {
        return Err(AppError::MissingClientSecrets {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| {
        AppError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
    })?;

    parse_client_secrets(&content)
        .map_err(|msg| AppError::ConfigError(format!("{}: {}", path.display(), msg)))
}

fn parse_client_secrets(content: &str) -> std::result::Result<ClientSecrets, String> {
    let file: ClientSecretsFile =
        serde_json::from_str(content).map_err(|e| format!("invalid client secrets JSON ({})", e))?;

    let secrets = file
        .installed
        .or(file.web)
        .ok_or_else(|| "expected an \"installed\" or \"web\" client section".to_string())?;

    if secrets.client_id.trim().is_empty() {
        return Err("client_id is empty".to_string());
    }

    tracing::debug!(
        "Loaded client secrets for client_id={}...",
        secrets.client_id.chars().take(12).collect::<String>()
    );

    Ok(secrets)
}
