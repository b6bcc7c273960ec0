// Interactive authorization: authorization code flow with PKCE over a
// one-shot localhost callback listener

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use reqwest::{Client, Url};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tower_http::trace::TraceLayer;

use super::refresh;
use super::types::{ClientSecrets, Credential};
use crate::error::{AppError, Result};

const SUCCESS_HTML: &str =
    "<html><body><h1>Authentication successful</h1><p>You may close this window.</p></body></html>";
const ERROR_HTML: &str =
    "<html><body><h1>Authentication failed</h1><p>You may close this window and retry.</p></body></html>";

/// Obtains a brand-new credential from the operator
///
/// The production implementation is [`LoopbackAcquirer`]; tests substitute
/// a fake that returns a fixed token without opening ports.
#[async_trait]
pub trait CredentialAcquirer: Send + Sync {
    async fn acquire(&self, secrets: &ClientSecrets, scopes: &[String]) -> Result<Credential>;
}

/// Browser-based authorization with a localhost redirect
pub struct LoopbackAcquirer {
    client: Client,
    callback_timeout: Duration,
    open_browser: bool,
}

impl LoopbackAcquirer {
    pub fn new(client: Client, callback_timeout: Duration, open_browser: bool) -> Self {
        Self {
            client,
            callback_timeout,
            open_browser,
        }
    }
}

#[async_trait]
impl CredentialAcquirer for LoopbackAcquirer {
    async fn acquire(&self, secrets: &ClientSecrets, scopes: &[String]) -> Result<Credential> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| AppError::AuthError(format!("Failed to bind callback listener: {}", e)))?;
        let port = listener
            .local_addr()
            .map_err(|e| AppError::AuthError(format!("Failed to read callback address: {}", e)))?
            .port();
        let redirect_uri = format!("http://127.0.0.1:{}/", port);

        let pkce = PkcePair::generate();
        let state = uuid::Uuid::new_v4().to_string();
        let url = authorization_url(secrets, &redirect_uri, scopes, &state, &pkce.code_challenge)?;

        tracing::info!("Waiting for OAuth callback on {}", redirect_uri);
        println!("Please visit this URL to authorize this application:");
        println!("{}", url);
        if self.open_browser {
            if let Err(e) = open::that(url.as_str()) {
                tracing::debug!("Could not open browser: {}", e);
            }
        }

        let payload = wait_for_callback(listener, self.callback_timeout).await?;
        let code = payload.into_code(&state)?;

        refresh::exchange_authorization_code(
            &self.client,
            secrets,
            &code,
            &pkce.code_verifier,
            &redirect_uri,
            scopes,
        )
        .await
        .map_err(|e| AppError::AuthError(format!("{:#}", e)))
    }
}

/// PKCE verifier and its S256 challenge
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub code_verifier: String,
    pub code_challenge: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let mut random = [0u8; 64];
        rand::thread_rng().fill_bytes(&mut random);

        let code_verifier = URL_SAFE_NO_PAD.encode(random);
        let code_challenge = code_challenge_s256(&code_verifier);

        Self {
            code_verifier,
            code_challenge,
        }
    }
}

pub fn code_challenge_s256(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Build the consent URL the operator opens in a browser
pub fn authorization_url(
    secrets: &ClientSecrets,
    redirect_uri: &str,
    scopes: &[String],
    state: &str,
    code_challenge: &str,
) -> Result<Url> {
    let scope = scopes.join(" ");
    Url::parse_with_params(
        &secrets.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", secrets.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("state", state),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|e| AppError::ConfigError(format!("Invalid auth_uri '{}': {}", secrets.auth_uri, e)))
}

/// Query parameters of the redirect back from the authorization server
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackPayload {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackPayload {
    /// The authorization code, once the callback is checked against `expected_state`
    pub fn into_code(self, expected_state: &str) -> Result<String> {
        if self.state.as_deref() != Some(expected_state) {
            return Err(AppError::AuthError(
                "OAuth callback state mismatch".to_string(),
            ));
        }

        if let Some(error) = self.error {
            return Err(AppError::AuthError(match self.error_description {
                Some(desc) => format!("Authorization denied: {} ({})", error, desc),
                None => format!("Authorization denied: {}", error),
            }));
        }

        self.code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::AuthError("OAuth callback missing code".to_string()))
    }
}

/// Router answering the redirect; the first complete callback is forwarded on `tx`
pub fn callback_router(tx: mpsc::Sender<CallbackPayload>) -> Router {
    Router::new()
        .route("/", get(handle_callback))
        .layer(TraceLayer::new_for_http())
        .with_state(tx)
}

async fn handle_callback(
    State(tx): State<mpsc::Sender<CallbackPayload>>,
    Query(payload): Query<CallbackPayload>,
) -> impl IntoResponse {
    if payload.code.is_none() && payload.error.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            [(header::CONNECTION, "close")],
            Html(ERROR_HTML),
        );
    }

    let status = if payload.error.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    let body = if status.is_success() {
        SUCCESS_HTML
    } else {
        ERROR_HTML
    };

    // Only the first callback counts
    if tx.try_send(payload).is_err() {
        tracing::debug!("Ignoring repeated OAuth callback");
    }

    (status, [(header::CONNECTION, "close")], Html(body))
}

/// Serve the callback router until one callback arrives or `timeout` elapses
pub async fn wait_for_callback(listener: TcpListener, timeout: Duration) -> Result<CallbackPayload> {
    let (tx, mut rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        axum::serve(listener, callback_router(tx))
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let received = tokio::time::timeout(timeout, rx.recv()).await;

    let _ = shutdown_tx.send(());
    if tokio::time::timeout(Duration::from_secs(5), server).await.is_err() {
        tracing::warn!("Callback listener did not shut down cleanly");
    }

    match received {
        Ok(Some(payload)) => Ok(payload),
        Ok(None) => Err(AppError::AuthError(
            "OAuth callback listener stopped unexpectedly".to_string(),
        )),
        Err(_) => Err(AppError::AuthError(format!(
            "Timed out after {}s waiting for the OAuth callback",
            timeout.as_secs()
        ))),
    }
}
