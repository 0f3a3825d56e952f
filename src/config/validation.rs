//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every destination parses to a supported URL
//! - Flag targets that can never be reached
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Shadowed targets are warnings, not errors: ordering is the author's call
//! - Pure function over `ProxyConfig`; does not read the environment

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::routing::rewrite::Destination;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No targets at all: every request would be a routing miss.
    #[error("No targets configured")]
    NoTargets,

    /// Destination is not a usable http(s) URL.
    #[error("Target '{target}': {reason}")]
    InvalidDestination { target: String, reason: String },

    /// An empty string prefix silently turns a target into a catch-all.
    #[error("Target '{target}': empty path prefix")]
    EmptyPrefix { target: String },

    /// Route prefix must be an absolute path.
    #[error("Route prefix '{0}' must start with '/'")]
    InvalidRoutePrefix(String),

    /// Body limit of zero rejects every encrypted body.
    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    /// Metrics address does not parse as a socket address.
    #[error("Invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),

    /// A target encrypts JSON but no key is available.
    #[error("JSON encryption is enabled but no key is configured (set encryption.key or ${0})")]
    MissingEncryptionKey(String),

    /// The key is not 32 bytes of base64.
    #[error("Invalid encryption key: {0}")]
    InvalidEncryptionKey(String),
}

/// A target that can never be selected because an earlier one always wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shadowed {
    pub target: String,
    pub shadowed_by: String,
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.targets.is_empty() {
        errors.push(ValidationError::NoTargets);
    }

    for target in &config.targets {
        if let Err(e) = Destination::parse(&target.destination) {
            errors.push(ValidationError::InvalidDestination {
                target: target.display_name(),
                reason: e.to_string(),
            });
        }
        if target.all_prefixes().iter().any(|p| p.is_empty()) {
            errors.push(ValidationError::EmptyPrefix {
                target: target.display_name(),
            });
        }
    }

    if !config.route_prefix.is_empty() && !config.route_prefix.starts_with('/') {
        errors.push(ValidationError::InvalidRoutePrefix(config.route_prefix.clone()));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Find targets made unreachable by an earlier catch-all or by an earlier
/// prefix that covers all of their own prefixes.
pub fn find_shadowed(config: &ProxyConfig) -> Vec<Shadowed> {
    let mut shadowed = Vec::new();

    for (i, later) in config.targets.iter().enumerate() {
        let later_prefixes = later.all_prefixes();
        let winner = config.targets[..i].iter().find(|earlier| {
            if earlier.is_catch_all() {
                return true;
            }
            let earlier_prefixes = earlier.all_prefixes();
            !later_prefixes.is_empty()
                && later_prefixes
                    .iter()
                    .all(|lp| earlier_prefixes.iter().any(|ep| lp.starts_with(ep.as_str())))
        });

        if let Some(earlier) = winner {
            shadowed.push(Shadowed {
                target: later.display_name(),
                shadowed_by: earlier.display_name(),
            });
        }
    }

    shadowed
}
