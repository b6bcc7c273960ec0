// Authentication types

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Read-only access to Drive metadata and content
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Google's default token endpoint, used when the secrets file omits one
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Google's default authorization endpoint
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Cached OAuth credential
///
/// Carries everything a refresh needs, so the secrets file is only read for
/// a full re-authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub token_uri: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    /// Expired at `now` once within `threshold_secs` of the expiry.
    /// A credential without expiry never expires; a threshold reaching past
    /// the representable range expires everything.
    pub fn is_expired_at(&self, now: DateTime<Utc>, threshold_secs: i64) -> bool {
        let Some(exp) = self.expires_at else {
            return false;
        };

        match Duration::try_seconds(threshold_secs).and_then(|t| now.checked_add_signed(t)) {
            Some(limit) => exp <= limit,
            None => true,
        }
    }

    /// Usable as-is: has an access token and is not expired
    pub fn is_valid_at(&self, now: DateTime<Utc>, threshold_secs: i64) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(now, threshold_secs)
    }

    pub fn is_valid(&self, threshold_secs: i64) -> bool {
        self.is_valid_at(Utc::now(), threshold_secs)
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }
}

/// OAuth client identity from the application-secret file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Google client secrets download format: `{"installed": {...}}` or `{"web": {...}}`
#[derive(Deserialize)]
pub(crate) struct ClientSecretsFile {
    pub installed: Option<ClientSecrets>,
    pub web: Option<ClientSecrets>,
}

/// Token endpoint response (authorization_code and refresh_token grants)
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Absolute expiry computed from `expires_in` (default one hour)
    pub fn expires_at(&self, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
        let expires_in = self.expires_in.unwrap_or(3600);
        i64::try_from(expires_in)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|d| now.checked_add_signed(d))
            .with_context(|| format!("Token endpoint returned out-of-range expires_in: {}", expires_in))
    }

    /// Granted scopes, falling back to what was requested
    pub fn scopes_or(&self, requested: &[String]) -> Vec<String> {
        match self.scope.as_deref() {
            Some(s) if !s.trim().is_empty() => s.split_whitespace().map(str::to_string).collect(),
            _ => requested.to_vec(),
        }
    }
}

/// OAuth error body (`{"error": "...", "error_description": "..."}`)
#[derive(Debug, Deserialize)]
pub struct OAuthErrorBody {
    pub error: String,
    pub error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn credential(expires_at: Option<DateTime<Utc>>) -> Credential {
        Credential {
            access_token: "ya29.token".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            expires_at,
            client_id: "client".to_string(),
            client_secret: None,
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            scopes: vec![DRIVE_READONLY_SCOPE.to_string()],
        }
    }

    #[test]
    fn test_credential_without_expiry_is_valid() {
        let creds = credential(None);
        assert!(!creds.is_expired_at(Utc::now(), 60));
        assert!(creds.is_valid(60));
    }

    #[test]
    fn test_empty_access_token_is_invalid() {
        let mut creds = credential(Some(Utc::now() + Duration::hours(1)));
        creds.access_token.clear();
        assert!(!creds.is_valid(60));
    }

    #[test]
    fn test_expiry_inside_threshold_counts_as_expired() {
        let now = Utc::now();
        let creds = credential(Some(now + Duration::seconds(30)));
        assert!(creds.is_expired_at(now, 60));
        assert!(!creds.is_expired_at(now, 0));
    }

    #[test]
    fn test_has_refresh_token() {
        let mut creds = credential(None);
        assert!(creds.has_refresh_token());
        creds.refresh_token = Some(String::new());
        assert!(!creds.has_refresh_token());
        creds.refresh_token = None;
        assert!(!creds.has_refresh_token());
    }

    #[test]
    fn test_client_secrets_file_installed() {
        let json = r#"{"installed":{"client_id":"abc.apps.googleusercontent.com","client_secret":"s3cret","redirect_uris":["http://localhost"]}}"#;
        let file: ClientSecretsFile = serde_json::from_str(json).unwrap();
        let secrets = file.installed.unwrap();
        assert_eq!(secrets.client_id, "abc.apps.googleusercontent.com");
        assert_eq!(secrets.client_secret.as_deref(), Some("s3cret"));
        assert_eq!(secrets.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(secrets.auth_uri, DEFAULT_AUTH_URI);
    }

    #[test]
    fn test_token_response_scopes() {
        let resp: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","scope":"s1 s2","expires_in":10}"#)
                .unwrap();
        assert_eq!(resp.scopes_or(&[]), vec!["s1".to_string(), "s2".to_string()]);

        let resp: TokenResponse = serde_json::from_str(r#"{"access_token":"a"}"#).unwrap();
        assert_eq!(resp.scopes_or(&["x".to_string()]), vec!["x".to_string()]);
        let now = Utc::now();
        assert_eq!(resp.expires_at(now).unwrap(), now + Duration::seconds(3600));
    }

    #[test]
    fn test_out_of_range_expires_in_is_rejected() {
        let now = Utc::now();
        for expires_in in [100_000_000_000_000u64, u64::MAX] {
            let resp = TokenResponse {
                access_token: "a".to_string(),
                refresh_token: None,
                expires_in: Some(expires_in),
                scope: None,
            };
            let err = resp.expires_at(now).unwrap_err();
            assert!(err.to_string().contains("out-of-range expires_in"));
        }
    }

    #[test]
    fn test_huge_threshold_counts_as_expired() {
        let now = Utc::now();
        let creds = credential(Some(now));
        assert!(creds.is_expired_at(now, 100_000_000_000_000));
        assert!(creds.is_expired_at(now, i64::MAX));
        assert!(!creds.is_valid(100_000_000_000_000));
        assert!(!credential(None).is_expired_at(now, i64::MAX));
    }

    #[test]
    fn test_credential_json_roundtrip_keeps_timestamp() {
        let creds = credential(Some(
            DateTime::parse_from_rfc3339("2025-01-12T10:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
        ));
        let json = serde_json::to_string(&creds).unwrap();
        assert!(json.contains("2025-01-12T10:30:00Z"));
        let back: Credential = serde_json::from_str(&json).unwrap();
        assert_eq!(back, creds);
    }

    proptest! {
        #[test]
        fn prop_valid_iff_expiry_beyond_threshold(offset in -100_000i64..100_000, threshold in 0i64..3_600) {
            let now = Utc::now();
            let creds = credential(Some(now + Duration::seconds(offset)));
            prop_assert_eq!(creds.is_valid_at(now, threshold), offset > threshold);
        }
    }
}
