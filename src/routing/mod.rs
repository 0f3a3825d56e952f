//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming path (route prefix already stripped)
//!     → router.rs (ordered target scan)
//!     → matcher.rs (prefix set evaluation)
//!     → Return: matched Target or None
//!
//! Target found:
//!     → rewrite.rs (join destination path, merge query, build upstream URI)
//! ```
//!
//! # Design Decisions
//! - Registry built once at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - First match wins, in declaration order. A catch-all placed before a
//!   scoped target shadows it; the registry does not reorder or reject this.
//! - No match is explicit (`None`); callers fail closed

pub mod matcher;
pub mod rewrite;
pub mod router;

pub use matcher::PrefixMatcher;
pub use rewrite::{join_path, merge_query, Destination, DestinationError};
pub use router::{Target, TargetRegistry};
