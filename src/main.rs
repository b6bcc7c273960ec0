use anyhow::Context;
use futures::TryStreamExt;
use std::process::ExitCode;
use std::time::Duration;

use gdrive_tools::auth::{
    CredentialProvider, CredentialStore, LoopbackAcquirer, DRIVE_READONLY_SCOPE,
};
use gdrive_tools::config::{CliArgs, Command, Config, FolderArgs};
use gdrive_tools::drive::{DriveClient, FolderPrinter, ListQuery};
use gdrive_tools::error::AppError;
use gdrive_tools::http_client::DriveHttpClient;
use gdrive_tools::mcp_config::{self, SecretUpdate};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::load();

    // Initialize logging; stdout carries the listing, logs go to stderr
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_level.to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    let result = match &args.command {
        Command::Folders(folder_args) => list_folders(folder_args).await,
        Command::McpSecret(mcp_args) => mcp_config::run_secret_update(&SecretUpdate::from(mcp_args)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            if let Some(steps) = e.remediation() {
                eprintln!();
                eprintln!("{}", steps);
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// Authenticate, then stream every matching folder to stdout
async fn list_folders(args: &FolderArgs) -> Result<(), AppError> {
    let config = Config::from_args(args).map_err(|e| AppError::ConfigError(format!("{:#}", e)))?;
    config
        .validate()
        .map_err(|e| AppError::ConfigError(format!("{:#}", e)))?;

    tracing::info!("Credential cache: {}", config.token_file.display());
    tracing::debug!("Client secrets: {}", config.credentials_file.display());

    let http = DriveHttpClient::new(config.http_connect_timeout, config.http_request_timeout)?;

    let provider = CredentialProvider::new(
        CredentialStore::new(config.token_file.clone()),
        config.credentials_file.clone(),
        Box::new(LoopbackAcquirer::new(
            http.client().clone(),
            Duration::from_secs(config.callback_timeout),
            config.open_browser,
        )),
        http.client().clone(),
        vec![DRIVE_READONLY_SCOPE.to_string()],
        config.token_refresh_threshold,
    );
    let credential = provider.acquire().await?;

    let drive = DriveClient::new(http, config.api_base_url.clone(), credential.access_token);
    let query = ListQuery::new(config.query.clone(), config.page_size)
        .with_start_page_token(config.start_page_token.clone());

    let mut printer = FolderPrinter::new(std::io::stdout());
    let folders = drive.list_all(&query);
    futures::pin_mut!(folders);

    while let Some(folder) = folders.try_next().await? {
        printer.print(&folder).context("Failed to write to stdout")?;
    }

    let total = printer.finish().context("Failed to write to stdout")?;
    tracing::info!(total, "Listing complete");

    Ok(())
}
