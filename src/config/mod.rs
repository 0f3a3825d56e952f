//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, or built-in defaults)
//!     → command-line overrides (port, debug, route prefix)
//!     → validation.rs (semantic checks, shadowed-target warnings)
//!     → ProxyConfig (validated, immutable)
//!     → TargetRegistry built once, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at startup; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::EncryptionConfig;
pub use schema::ListenerConfig;
pub use schema::ProxyConfig;
pub use schema::TargetConfig;
