//! Startup orchestration.
//!
//! # Responsibilities
//! - Load configuration and apply command-line overrides
//! - Validate it and warn about shadowed targets
//! - Build the encryption engine and the server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Overrides are applied before validation so they are checked too

use std::path::Path;

use crate::config::loader::{check_config, load_or_default};
use crate::config::{ConfigError, ProxyConfig};
use crate::encryption::engine_from_config;
use crate::error::StartupError;
use crate::http::HttpServer;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub debug: bool,
    pub route_prefix: Option<String>,
}

impl Overrides {
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if self.debug {
            config.debug = true;
        }
        if let Some(prefix) = &self.route_prefix {
            config.route_prefix = prefix.clone();
        }
    }
}

/// Load, override and validate the configuration.
pub fn prepare_config(
    path: Option<&Path>,
    overrides: &Overrides,
) -> Result<ProxyConfig, ConfigError> {
    let mut config = load_or_default(path)?;
    overrides.apply(&mut config);
    check_config(&config)?;
    Ok(config)
}

/// Build a ready-to-run server from a validated configuration.
pub fn build_server(config: ProxyConfig) -> Result<HttpServer, StartupError> {
    let engine = engine_from_config(&config)?;

    tracing::info!(
        targets = config.targets.len(),
        route_prefix = %config.route_prefix,
        encryption = config.needs_encryption(),
        "Configuration loaded"
    );

    HttpServer::new(config, engine)
}
