//! Target registry and resolution.
//!
//! # Responsibilities
//! - Store routing targets in declaration order
//! - Resolve a request path to the first matching target
//! - Return explicit no-match rather than a silent default
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan (acceptable for typical target counts)
//! - Ordering is the caller's contract: a catch-all declared early makes every
//!   later target unreachable

use crate::config::TargetConfig;
use crate::config::validation::ValidationError;
use crate::routing::matcher::PrefixMatcher;
use crate::routing::rewrite::Destination;

/// A routing rule: where matching requests go and how they are treated.
#[derive(Debug, Clone)]
pub struct Target {
    name: String,
    matcher: PrefixMatcher,
    destination: Destination,
    encrypt_json: bool,
    drop_content_encoding: bool,
}

impl Target {
    /// Create a catch-all target forwarding to `destination`.
    pub fn new(destination: Destination) -> Self {
        Self {
            name: destination.authority().to_string(),
            matcher: PrefixMatcher::catch_all(),
            destination,
            encrypt_json: false,
            drop_content_encoding: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.matcher = PrefixMatcher::new(prefixes);
        self
    }

    pub fn with_encrypt_json(mut self, enabled: bool) -> Self {
        self.encrypt_json = enabled;
        self
    }

    pub fn with_drop_content_encoding(mut self, enabled: bool) -> Self {
        self.drop_content_encoding = enabled;
        self
    }

    /// Build a target from its configuration entry.
    pub fn from_config(config: &TargetConfig) -> Result<Self, ValidationError> {
        let destination = Destination::parse(&config.destination).map_err(|e| {
            ValidationError::InvalidDestination {
                target: config.display_name(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self::new(destination)
            .with_name(config.display_name())
            .with_prefixes(config.all_prefixes())
            .with_encrypt_json(config.encrypt_json)
            .with_drop_content_encoding(config.drop_content_encoding))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matcher(&self) -> &PrefixMatcher {
        &self.matcher
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn encrypt_json(&self) -> bool {
        self.encrypt_json
    }

    pub fn drop_content_encoding(&self) -> bool {
        self.drop_content_encoding
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }
}

/// Ordered, immutable set of targets.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }

    /// Compile configuration entries into a registry, preserving order.
    pub fn from_config(configs: &[TargetConfig]) -> Result<Self, ValidationError> {
        let targets = configs
            .iter()
            .map(Target::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(targets))
    }

    /// Return the first target, in declaration order, that matches `path`.
    pub fn resolve(&self, path: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.matches(path))
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
