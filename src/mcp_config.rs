// MCP client configuration editor
// Rotates one secret inside `mcpServers.<server>.env` of a desktop AI client config

use anyhow::Context;
use dialoguer::{Confirm, Input, Password};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Environment value that marks production credentials
pub const LIVE_ENVIRONMENT: &str = "LIVE";

/// Environment assumed when the entry has none
pub const DEFAULT_ENVIRONMENT: &str = "SANDBOX";

/// What to rewrite, and where
#[derive(Debug, Clone)]
pub struct SecretUpdate {
    /// Explicit config file; discovery is used when absent
    pub config_file: Option<PathBuf>,
    pub server: String,
    pub key: String,
    pub environment_key: String,
    /// Switch to LIVE without asking
    pub live: bool,
}

/// Well-known config locations, in lookup order
pub fn candidate_config_paths() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };

    vec![
        home.join("Library/Application Support/Claude/claude_desktop_config.json"),
        home.join(".config/Claude/claude_desktop_config.json"),
    ]
}

/// First candidate that exists
pub fn find_config(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.exists()).cloned()
}

/// A parsed MCP config file
#[derive(Debug, Clone)]
pub struct McpConfig {
    path: PathBuf,
    root: Map<String, Value>,
}

impl McpConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let root = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(AppError::ConfigError(format!(
                    "{} does not contain a JSON object",
                    path.display()
                )))
            }
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "Error parsing JSON in {} (the file might be corrupted or empty): {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names under `mcpServers`, in file order
    pub fn server_names(&self) -> Vec<String> {
        self.root
            .get("mcpServers")
            .and_then(Value::as_object)
            .map(|servers| servers.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Read `mcpServers.<server>.env.<key>` as a string
    pub fn env_value(&self, server: &str, key: &str) -> Option<&str> {
        self.root
            .get("mcpServers")?
            .get(server)?
            .get("env")?
            .get(key)?
            .as_str()
    }

    /// Set `mcpServers.<server>.env.<key>`, creating `env` when missing
    pub fn set_env_value(&mut self, server: &str, key: &str, value: &str) -> Result<()> {
        let env = self.env_mut(server)?;
        env.insert(key.to_string(), Value::String(value.to_string()));
        Ok(())
    }

    /// Fails with the list of known servers when `server` is absent
    pub fn require_server(&self, server: &str) -> Result<()> {
        if self.server_names().iter().any(|name| name == server) {
            return Ok(());
        }

        let known = self.server_names();
        Err(AppError::ConfigError(format!(
            "'{}' not found in config (servers found: {})",
            server,
            if known.is_empty() {
                "none".to_string()
            } else {
                known.join(", ")
            }
        )))
    }

    fn env_mut(&mut self, server: &str) -> Result<&mut Map<String, Value>> {
        self.require_server(server)?;

        let entry = self
            .root
            .get_mut("mcpServers")
            .and_then(Value::as_object_mut)
            .and_then(|servers| servers.get_mut(server))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                AppError::ConfigError(format!("'{}' entry is not a JSON object", server))
            })?;

        entry
            .entry("env")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| AppError::ConfigError(format!("'{}.env' is not a JSON object", server)))
    }

    /// Serialized file content: two-space indentation
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.root)
            .context("Failed to serialize MCP config")
            .map_err(AppError::from)
    }

    pub fn save(&self) -> Result<()> {
        let json = self.to_json()?;
        fs::write(&self.path, json + "\n")
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::info!("Wrote MCP config {}", self.path.display());
        Ok(())
    }
}

/// Interactive secret rotation
pub fn run_secret_update(update: &SecretUpdate) -> Result<()> {
    println!("==============================================");
    println!("  UPDATE MCP SERVER SECRET");
    println!("==============================================");

    let path = match update
        .config_file
        .clone()
        .or_else(|| find_config(&candidate_config_paths()))
    {
        Some(path) => path,
        None => {
            println!("Could not automatically find 'claude_desktop_config.json'.");
            let entered: String = Input::new()
                .with_prompt("Full path to your MCP config file")
                .interact_text()
                .context("Failed to read config path")?;
            crate::config::expand_tilde(entered.trim())
        }
    };

    if !path.exists() {
        return Err(AppError::ConfigError(format!(
            "File not found: {}",
            path.display()
        )));
    }
    println!("Found config file: {}", path.display());

    let mut config = McpConfig::load(&path)?;
    config.require_server(&update.server)?;

    println!();
    let secret: String = Password::new()
        .with_prompt(format!("New {} (hidden input)", update.key))
        .allow_empty_password(true)
        .interact()
        .context("Failed to read secret")?;
    let secret = secret.trim();
    if secret.is_empty() {
        return Err(AppError::ConfigError("No secret entered".to_string()));
    }

    config.set_env_value(&update.server, &update.key, secret)?;

    let current = config
        .env_value(&update.server, &update.environment_key)
        .unwrap_or(DEFAULT_ENVIRONMENT)
        .to_string();
    if current != LIVE_ENVIRONMENT {
        println!("Current environment is set to: {}", current);
        let switch = update.live
            || Confirm::new()
                .with_prompt(format!("Switch to {}?", LIVE_ENVIRONMENT))
                .default(false)
                .interact()
                .context("Failed to read confirmation")?;
        if switch {
            config.set_env_value(&update.server, &update.environment_key, LIVE_ENVIRONMENT)?;
            println!("Switched to {} mode.", LIVE_ENVIRONMENT);
        }
    }

    config.save()?;

    println!();
    println!("MCP config updated successfully!");
    println!("Please restart your AI client for changes to take effect.");
    Ok(())
}
