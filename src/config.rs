use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::drive::{DEFAULT_API_BASE_URL, DEFAULT_FOLDER_QUERY, MAX_PAGE_SIZE};
use crate::mcp_config::SecretUpdate;

/// Largest accepted TOKEN_REFRESH_THRESHOLD, in seconds (one day)
pub const MAX_REFRESH_THRESHOLD: u64 = 86_400;

/// Google Drive folder lister and MCP secret editor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every folder in Google Drive
    Folders(FolderArgs),

    /// Replace a secret in an MCP client config file
    McpSecret(McpSecretArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FolderArgs {
    /// Credential cache file
    #[arg(short = 't', long, env = "DRIVE_TOKEN_FILE")]
    pub token_file: Option<String>,

    /// OAuth client secrets file downloaded from the Google Cloud console
    #[arg(
        short = 'c',
        long,
        env = "DRIVE_CREDENTIALS_FILE",
        default_value = "credentials.json"
    )]
    pub credentials_file: String,

    /// Drive search expression
    #[arg(short, long, env = "DRIVE_QUERY", default_value = DEFAULT_FOLDER_QUERY)]
    pub query: String,

    /// Results per page (1-1000)
    #[arg(short = 's', long, env = "DRIVE_PAGE_SIZE", default_value = "100")]
    pub page_size: u32,

    /// Resume listing from this continuation token
    #[arg(long)]
    pub page_token: Option<String>,

    /// Drive API base URL
    #[arg(long, env = "DRIVE_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "60")]
    pub http_timeout: u64,

    /// Seconds to wait for the browser authorization callback
    #[arg(long, env = "OAUTH_CALLBACK_TIMEOUT", default_value = "300")]
    pub callback_timeout: u64,

    /// Print the authorization URL without opening a browser
    #[arg(long)]
    pub no_browser: bool,
}

#[derive(Args, Debug, Clone)]
pub struct McpSecretArgs {
    /// MCP config file (searched in the usual locations when omitted)
    #[arg(long, env = "MCP_CONFIG_FILE")]
    pub config: Option<String>,

    /// Server entry under `mcpServers`
    #[arg(long, default_value = "paypal-mcp-server")]
    pub server: String,

    /// Environment variable that receives the secret
    #[arg(long, default_value = "PAYPAL_CLIENT_SECRET")]
    pub key: String,

    /// Environment variable holding SANDBOX/LIVE
    #[arg(long, default_value = "PAYPAL_ENVIRONMENT")]
    pub environment_key: String,

    /// Switch the environment to LIVE without asking
    #[arg(long)]
    pub live: bool,
}

impl CliArgs {
    /// Parse arguments after loading `.env`, so env-backed flags see its values
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        CliArgs::parse()
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    // Files
    pub token_file: PathBuf,
    pub credentials_file: PathBuf,

    // Listing
    pub query: String,
    pub page_size: u32,
    pub start_page_token: Option<String>,
    pub api_base_url: String,

    // Authentication
    pub token_refresh_threshold: u64,
    pub callback_timeout: u64,
    pub open_browser: bool,

    // HTTP client
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,
}

impl Config {
    /// Build configuration with priority: CLI > ENV > defaults
    pub fn from_args(args: &FolderArgs) -> Result<Self> {
        let token_file = match args.token_file.as_deref() {
            Some(path) => expand_tilde(path),
            None => default_token_file()?,
        };

        Ok(Config {
            token_file,
            credentials_file: expand_tilde(&args.credentials_file),

            query: args.query.clone(),
            page_size: args.page_size,
            start_page_token: args.page_token.clone(),
            api_base_url: args.api_base_url.clone(),

            token_refresh_threshold: std::env::var("TOKEN_REFRESH_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            callback_timeout: args.callback_timeout,
            open_browser: !args.no_browser,

            http_connect_timeout: std::env::var("HTTP_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            http_request_timeout: args.http_timeout,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            anyhow::bail!(
                "Page size must be between 1 and {} (got {})",
                MAX_PAGE_SIZE,
                self.page_size
            );
        }

        if self.query.trim().is_empty() {
            anyhow::bail!("Query must not be empty");
        }

        reqwest::Url::parse(&self.api_base_url)
            .with_context(|| format!("Invalid Drive API base URL: {}", self.api_base_url))?;

        if self.token_refresh_threshold > MAX_REFRESH_THRESHOLD {
            anyhow::bail!(
                "TOKEN_REFRESH_THRESHOLD must be at most {} seconds (got {})",
                MAX_REFRESH_THRESHOLD,
                self.token_refresh_threshold
            );
        }

        if self.callback_timeout == 0 {
            anyhow::bail!("OAuth callback timeout must be at least 1 second");
        }

        Ok(())
    }
}

impl From<&McpSecretArgs> for SecretUpdate {
    fn from(args: &McpSecretArgs) -> Self {
        SecretUpdate {
            config_file: args.config.as_deref().map(expand_tilde),
            server: args.server.clone(),
            key: args.key.clone(),
            environment_key: args.environment_key.clone(),
            live: args.live,
        }
    }
}

/// Default credential cache: `<config dir>/gdrive-tools/token.json`
fn default_token_file() -> Result<PathBuf> {
    let dir = dirs::config_dir().context(
        "Could not determine the user config directory (use --token-file or set DRIVE_TOKEN_FILE)",
    )?;
    Ok(dir.join(env!("CARGO_PKG_NAME")).join("token.json"))
}

/// Expand tilde (~) in file paths to user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
