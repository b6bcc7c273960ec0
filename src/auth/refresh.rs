// Token endpoint calls: refresh_token and authorization_code grants

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;

use super::types::{ClientSecrets, Credential, OAuthErrorBody, TokenResponse};

/// Refresh an expired credential using its refresh token
///
/// The returned credential keeps the previous refresh token when the
/// endpoint does not rotate it.
pub async fn refresh_credential(client: &Client, creds: &Credential) -> Result<Credential> {
    tracing::info!("Refreshing access token...");

    let refresh_token = creds
        .refresh_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .context("Credential has no refresh token")?;

    let mut form = vec![
        ("grant_type", "refresh_token"),
        ("client_id", creds.client_id.as_str()),
        ("refresh_token", refresh_token),
    ];
    if let Some(secret) = creds.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }

    tracing::debug!(
        "Refresh request: url={}, client_id={}...",
        creds.token_uri,
        creds.client_id.chars().take(8).collect::<String>()
    );

    let response = client
        .post(&creds.token_uri)
        .form(&form)
        .send()
        .await
        .context("Failed to send token refresh request")?;

    let data = parse_token_response(response, "Token refresh").await?;
    let expires_at = data.expires_at(Utc::now())?;

    tracing::info!("Token refreshed, expires: {}", expires_at.to_rfc3339());

    Ok(Credential {
        access_token: data.access_token.clone(),
        refresh_token: data
            .refresh_token
            .clone()
            .or_else(|| creds.refresh_token.clone()),
        expires_at: Some(expires_at),
        client_id: creds.client_id.clone(),
        client_secret: creds.client_secret.clone(),
        token_uri: creds.token_uri.clone(),
        scopes: data.scopes_or(&creds.scopes),
    })
}

/// Exchange an authorization code (with its PKCE verifier) for a credential
pub async fn exchange_authorization_code(
    client: &Client,
    secrets: &ClientSecrets,
    code: &str,
    code_verifier: &str,
    redirect_uri: &str,
    scopes: &[String],
) -> Result<Credential> {
    tracing::info!("Exchanging authorization code...");

    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("code", code.trim()),
        ("redirect_uri", redirect_uri),
        ("client_id", secrets.client_id.as_str()),
        ("code_verifier", code_verifier),
    ];
    if let Some(secret) = secrets.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }

    let response = client
        .post(&secrets.token_uri)
        .form(&form)
        .send()
        .await
        .context("Failed to send authorization code exchange request")?;

    let data = parse_token_response(response, "Authorization code exchange").await?;
    let expires_at = data.expires_at(Utc::now())?;

    tracing::info!("Authorization complete, expires: {}", expires_at.to_rfc3339());

    Ok(Credential {
        access_token: data.access_token.clone(),
        refresh_token: data.refresh_token.clone(),
        expires_at: Some(expires_at),
        client_id: secrets.client_id.clone(),
        client_secret: secrets.client_secret.clone(),
        token_uri: secrets.token_uri.clone(),
        scopes: data.scopes_or(scopes),
    })
}

async fn parse_token_response(response: reqwest::Response, what: &str) -> Result<TokenResponse> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!("{} failed: status={}, body={}", what, status, error_text);

        if let Ok(body) = serde_json::from_str::<OAuthErrorBody>(&error_text) {
            anyhow::bail!(
                "{} failed: {} - {}{}",
                what,
                status,
                body.error,
                body.error_description
                    .map(|d| format!(" ({})", d))
                    .unwrap_or_default()
            );
        }

        anyhow::bail!("{} failed: {} - {}", what, status, error_text);
    }

    let data: TokenResponse = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", what.to_lowercase()))?;

    if data.access_token.is_empty() {
        anyhow::bail!("{} response does not contain access_token", what);
    }

    Ok(data)
}
