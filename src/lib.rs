// gdrive-tools - Library root for testing

pub mod auth;
pub mod config;
pub mod drive;
pub mod error;
pub mod http_client;
pub mod mcp_config;
