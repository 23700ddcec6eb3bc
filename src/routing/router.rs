//! Route lookup.
//!
//! # Responsibilities
//! - Store the ordered route table
//! - Look up the first route matching a path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (acceptable for typical route counts)
//! - Explicit NoRoute rather than silent default

use crate::config::RouteConfig;
use crate::routing::matcher::PathPrefixMatcher;

/// A compiled route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub matcher: PathPrefixMatcher,
    /// Logical service the route forwards to.
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    /// The inbound path matched no route.
    #[error("no route for path '{0}'")]
    NoRoute(String),
}

/// Ordered, first-match-wins route table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Compile routes, keeping configuration order.
    pub fn from_config(configs: &[RouteConfig]) -> Self {
        let routes = configs
            .iter()
            .map(|config| Route {
                name: config.name.clone(),
                matcher: PathPrefixMatcher::new(config.path_prefix.clone()),
                service: config.service.clone(),
            })
            .collect();
        Self { routes }
    }

    /// Find the first route whose prefix matches `path`.
    pub fn match_path(&self, path: &str) -> Result<&Route, RoutingError> {
        match_route(&self.routes, path).ok_or_else(|| RoutingError::NoRoute(path.to_string()))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

/// The single generic matcher over an ordered table.
pub fn match_route<'a>(routes: &'a [Route], path: &str) -> Option<&'a Route> {
    routes.iter().find(|route| route.matcher.matches(path))
}
