//! Path prefix matching.
//!
//! # Design Decisions
//! - Path matching is case-sensitive, plain `starts_with`
//! - Prefixes of one target are OR-ed
//! - Empty prefix set = always matches (catch-all)

/// An ordered set of path prefixes belonging to one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixMatcher {
    prefixes: Vec<String>,
}

impl PrefixMatcher {
    /// Create a matcher from an ordered list of prefixes.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// A matcher with no prefixes, matching every path.
    pub fn catch_all() -> Self {
        Self::default()
    }

    /// Returns true if this matcher has no prefixes.
    pub fn is_catch_all(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Returns true if the path starts with any prefix, or if there are none.
    pub fn matches(&self, path: &str) -> bool {
        self.is_catch_all() || self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}
