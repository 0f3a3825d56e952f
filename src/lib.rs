//! Routing reverse proxy with JSON `properties` encryption.

pub mod config;
pub mod encryption;
pub mod error;
pub mod event;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, StartupError};
pub use event::{EventAdapter, EventResponse, ProxyEvent};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
