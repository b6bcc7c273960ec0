// Credential cache file

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::types::Credential;

/// JSON file holding one cached credential
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached credential
    ///
    /// A missing file is `None`. A file that cannot be read or parsed is
    /// logged and also treated as `None`, forcing a new authorization.
    pub fn load(&self) -> Option<Credential> {
        if !self.path.exists() {
            tracing::debug!("No credential cache at {}", self.path.display());
            return None;
        }

        match read_credential(&self.path) {
            Ok(creds) => {
                tracing::debug!("Loaded cached credential from {}", self.path.display());
                Some(creds)
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable credential cache: {:#}", e);
                None
            }
        }
    }

    /// Write the credential, replacing any previous cache
    pub fn save(&self, creds: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create cache directory: {}", parent.display())
                })?;
            }
        }

        let json = serde_json::to_string_pretty(creds).context("Failed to serialize credential")?;

        // Write next to the target and rename so a crash never leaves half a file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write credential cache: {}", tmp.display()))?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &self.path).with_context(|| {
            format!("Failed to replace credential cache: {}", self.path.display())
        })?;

        tracing::info!("Saved credential cache to {}", self.path.display());
        Ok(())
    }
}

fn read_credential(path: &Path) -> Result<Credential> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read credential cache: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse credential cache: {}", path.display()))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
