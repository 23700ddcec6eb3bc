//! Route matching logic.
//!
//! # Responsibilities
//! - Match path prefix (case-sensitive)
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A prefix ending in '/' also matches the bare collection path
//!   ("/customers/" matches "/customers" but never "/customersX")
//! - No regex to guarantee O(n) matching

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if `path` falls under this prefix.
    pub fn matches(&self, path: &str) -> bool {
        if path.starts_with(&self.prefix) {
            return true;
        }
        match self.prefix.strip_suffix('/') {
            Some(collection) if !collection.is_empty() => path == collection,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/customers/");

        assert!(matcher.matches("/customers/42"));
        assert!(matcher.matches("/customers/"));
        assert!(matcher.matches("/customers"));
        assert!(!matcher.matches("/customersX"));
        assert!(!matcher.matches("/Customers/42"));
        assert!(!matcher.matches("/products/1"));
    }

    #[test]
    fn test_root_prefix_matches_everything() {
        let matcher = PathPrefixMatcher::new("/");
        assert!(matcher.matches("/"));
        assert!(matcher.matches("/anything/at/all"));
    }

    #[test]
    fn test_prefix_without_slash() {
        let matcher = PathPrefixMatcher::new("/api");
        assert!(matcher.matches("/api/v1"));
        assert!(matcher.matches("/apix"));
        assert!(!matcher.matches("/images"));
    }
}
