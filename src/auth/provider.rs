use reqwest::Client;
use std::path::PathBuf;

use super::loopback::CredentialAcquirer;
use super::refresh;
use super::secrets;
use super::store::CredentialStore;
use super::types::Credential;
use crate::error::{AppError, Result};

/// Credential provider
/// Decides between the cached credential, a refresh, and a new authorization
pub struct CredentialProvider {
    /// Credential cache
    store: CredentialStore,

    /// Application-secret file, read only for a new authorization
    client_secrets_file: PathBuf,

    /// Interactive authorization handshake
    acquirer: Box<dyn CredentialAcquirer>,

    /// HTTP client for refresh requests
    client: Client,

    /// Scopes requested on a new authorization
    scopes: Vec<String>,

    /// Seconds before expiry at which a token is treated as expired
    refresh_threshold: i64,
}

impl CredentialProvider {
    pub fn new(
        store: CredentialStore,
        client_secrets_file: PathBuf,
        acquirer: Box<dyn CredentialAcquirer>,
        client: Client,
        scopes: Vec<String>,
        refresh_threshold: u64,
    ) -> Self {
        Self {
            store,
            client_secrets_file,
            acquirer,
            client,
            scopes,
            refresh_threshold: i64::try_from(refresh_threshold).unwrap_or(i64::MAX),
        }
    }

    /// Get a usable credential
    ///
    /// A valid cached credential is returned as-is, without network access
    /// or a cache write. Every other path persists what it obtains.
    pub async fn acquire(&self) -> Result<Credential> {
        let cached = self.store.load();

        if let Some(creds) = cached {
            if creds.is_valid(self.refresh_threshold) {
                tracing::info!("Using cached credential");
                return Ok(creds);
            }

            if creds.has_refresh_token() {
                match refresh::refresh_credential(&self.client, &creds).await {
                    Ok(fresh) => {
                        self.persist(&fresh)?;
                        return Ok(fresh);
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Token refresh failed, falling back to full authorization: {:#}",
                            e
                        );
                    }
                }
            } else {
                tracing::info!("Cached credential expired and cannot be refreshed");
            }
        }

        let secrets = secrets::load_client_secrets(&self.client_secrets_file)?;

        tracing::info!("Starting interactive authorization...");
        let creds = self.acquirer.acquire(&secrets, &self.scopes).await?;
        self.persist(&creds)?;
        Ok(creds)
    }

    fn persist(&self, creds: &Credential) -> Result<()> {
        self.store
            .save(creds)
            .map_err(|e| AppError::CacheError(format!("{:#}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::{ClientSecrets, DRIVE_READONLY_SCOPE};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct FixedAcquirer {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CredentialAcquirer for FixedAcquirer {
        async fn acquire(&self, secrets: &ClientSecrets, scopes: &[String]) -> Result<Credential> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Credential {
                access_token: "ya29.interactive".to_string(),
                refresh_token: Some("1//interactive".to_string()),
                expires_at: Some(Utc::now() + Duration::hours(1)),
                client_id: secrets.client_id.clone(),
                client_secret: secrets.client_secret.clone(),
                token_uri: secrets.token_uri.clone(),
                scopes: scopes.to_vec(),
            })
        }
    }

    fn provider(dir: &TempDir, acquirer_calls: Arc<AtomicUsize>) -> CredentialProvider {
        CredentialProvider::new(
            CredentialStore::new(dir.path().join("token.json")),
            dir.path().join("credentials.json"),
            Box::new(FixedAcquirer {
                calls: acquirer_calls,
            }),
            Client::new(),
            vec![DRIVE_READONLY_SCOPE.to_string()],
            60,
        )
    }

    fn cached(expires_at: chrono::DateTime<Utc>, refresh_token: Option<&str>) -> Credential {
        Credential {
            access_token: "ya29.cached".to_string(),
            refresh_token: refresh_token.map(str::to_string),
            expires_at: Some(expires_at),
            client_id: "client-id".to_string(),
            client_secret: None,
            // Unroutable: a refresh attempt fails fast
            token_uri: "http://127.0.0.1:9/token".to_string(),
            scopes: vec![DRIVE_READONLY_SCOPE.to_string()],
        }
    }

    #[tokio::test]
    async fn test_expired_without_refresh_token_needs_secrets() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = provider(&dir, calls.clone());
        provider
            .store
            .save(&cached(Utc::now() - Duration::hours(1), None))
            .unwrap();

        let err = provider.acquire().await.unwrap_err();
        assert!(matches!(err, AppError::MissingClientSecrets { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_falls_through_to_authorization() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("credentials.json"),
            r#"{"installed":{"client_id":"client-id","client_secret":"s"}}"#,
        )
        .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = provider(&dir, calls.clone());
        provider
            .store
            .save(&cached(Utc::now() - Duration::hours(1), Some("1//stale")))
            .unwrap();

        let creds = provider.acquire().await.unwrap();
        assert_eq!(creds.access_token, "ya29.interactive");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.store.load().unwrap().access_token, "ya29.interactive");
    }

    #[tokio::test]
    async fn test_threshold_beyond_i64_treats_cache_as_expired() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("credentials.json"),
            r#"{"installed":{"client_id":"client-id"}}"#,
        )
        .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CredentialProvider::new(
            CredentialStore::new(dir.path().join("token.json")),
            dir.path().join("credentials.json"),
            Box::new(FixedAcquirer {
                calls: calls.clone(),
            }),
            Client::new(),
            vec![DRIVE_READONLY_SCOPE.to_string()],
            u64::MAX,
        );
        assert_eq!(provider.refresh_threshold, i64::MAX);
        provider
            .store
            .save(&cached(Utc::now() + Duration::hours(1), None))
            .unwrap();

        let creds = provider.acquire().await.unwrap();
        assert_eq!(creds.access_token, "ya29.interactive");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_write_failure_is_cache_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("credentials.json"),
            r#"{"installed":{"client_id":"client-id"}}"#,
        )
        .unwrap();
        // A directory where the cache file should be makes the rename fail
        std::fs::create_dir(dir.path().join("token.json")).unwrap();

        let provider = provider(&dir, Arc::new(AtomicUsize::new(0)));
        let err = provider.acquire().await.unwrap_err();
        assert!(matches!(err, AppError::CacheError(_)));
    }
}
