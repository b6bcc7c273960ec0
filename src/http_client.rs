use anyhow::{Context, Result};
use reqwest::{Client, Request, Response};
use std::time::Duration;

use crate::error::AppError;

/// HTTP client for the Drive API
///
/// Single attempt per request: errors are categorised and returned, never retried.
#[derive(Clone)]
pub struct DriveHttpClient {
    /// Shared HTTP client with connection pooling
    client: Client,
}

impl DriveHttpClient {
    /// Create a new HTTP client
    pub fn new(connect_timeout: u64, request_timeout: u64) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Execute a request once
    ///
    /// - non-2xx: [`AppError::DriveApiError`] with the API's error message
    /// - no response: [`AppError::TransportError`] naming the failure kind
    pub async fn execute(&self, request: Request) -> Result<Response, AppError> {
        let method = request.method().clone();
        let url = request.url().clone();
        tracing::debug!(
            method = %method,
            url = %url,
            "Sending HTTP request"
        );

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                tracing::debug!(
                    status = %status,
                    "Received HTTP response"
                );

                if status.is_success() {
                    return Ok(response);
                }

                let error_text = response.text().await.unwrap_or_default();
                tracing::error!(
                    status = status.as_u16(),
                    url = %url,
                    response_body = %error_text,
                    "HTTP request failed with error response"
                );

                Err(AppError::DriveApiError {
                    status: status.as_u16(),
                    message: extract_error_message(&error_text),
                })
            }

            Err(e) => {
                let error_kind = error_kind(&e);
                tracing::error!(
                    error_kind = error_kind,
                    error = %e,
                    url = %url,
                    "HTTP request error"
                );

                Err(AppError::TransportError(format!(
                    "HTTP request failed: {} (kind: {})",
                    e, error_kind
                )))
            }
        }
    }

    /// Get the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Categorize a reqwest error for logs and operator messages
fn error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection_failed"
    } else if e.is_request() {
        "request_error"
    } else if e.is_body() {
        "body_error"
    } else if e.is_decode() {
        "decode_error"
    } else {
        "unknown"
    }
}

/// Pull `error.message` out of a Google API error body, or fall back to the raw body
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_google_error_message() {
        let body = r#"{"error":{"code":403,"message":"Request had insufficient authentication scopes.","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(
            extract_error_message(body),
            "Request had insufficient authentication scopes."
        );
    }

    #[test]
    fn test_extract_error_message_falls_back_to_body() {
        assert_eq!(extract_error_message(" upstream timeout \n"), "upstream timeout");
        assert_eq!(extract_error_message(r#"{"error":"flat"}"#), r#"{"error":"flat"}"#);
    }

    #[tokio::test]
    async fn test_error_status_becomes_drive_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/files")
            .with_status(401)
            .with_body(r#"{"error":{"code":401,"message":"Invalid Credentials"}}"#)
            .create_async()
            .await;

        let client = DriveHttpClient::new(5, 5).unwrap();
        let request = client
            .client()
            .get(format!("{}/files", server.url()))
            .build()
            .unwrap();

        match client.execute(request).await {
            Err(AppError::DriveApiError { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid Credentials");
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.status())),
        }
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let client = DriveHttpClient::new(2, 2).unwrap();
        let request = client.client().get("http://127.0.0.1:9/files").build().unwrap();

        let err = client.execute(request).await.unwrap_err();
        assert!(matches!(err, AppError::TransportError(_)));
    }
}
