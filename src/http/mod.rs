//! HTTP proxying subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → server.rs (Axum setup, resolve target)
//!     → request.rs (strip prefix, rewrite URI/Host, encrypt body)
//!     → transport.rs (pooled HTTPS-or-HTTP client)
//!     → response.rs (strip headers, drop content-encoding)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;
pub mod transport;

pub use server::{AppState, HttpServer};
pub use transport::{HyperTransport, Transport, TransportError, TransportFuture};
