//! Route templates and path matching.
//!
//! Templates are split on `/`. A segment written `{name}` or `:name`
//! captures one path segment; anything else must match literally. Routes
//! are checked in registration order and the first match wins.
//!
//! # Example
//!
//! ```rust
//! use pylon_server::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/artists/{id}", "get_artist");
//! router.add_route(Method::DELETE, "/artists/:id", "delete_artist");
//!
//! let m = router.match_route(&Method::GET, "/artists/42").unwrap();
//! assert_eq!(*m.target(), "get_artist");
//! assert_eq!(m.params().get("id"), Some("42"));
//!
//! assert!(router.match_route(&Method::POST, "/artists/42").is_none());
//! ```

use http::Method;
use pylon_core::Params;

/// A matched route with its captured path parameters.
#[derive(Debug)]
pub struct RouteMatch<'r, T> {
    target: &'r T,
    params: Params,
}

impl<'r, T> RouteMatch<'r, T> {
    /// Returns what the route was registered with.
    #[must_use]
    pub fn target(&self) -> &'r T {
        self.target
    }

    /// Returns the captured parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Splits the match into its target and parameters.
    #[must_use]
    pub fn into_parts(self) -> (&'r T, Params) {
        (self.target, self.params)
    }
}

/// A segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    /// A literal segment (e.g., "artists")
    Literal(String),

    /// A captured segment (e.g., "{id}")
    Param(String),
}

#[derive(Debug, Clone)]
struct Route<T> {
    method: Method,
    segments: Vec<PathSegment>,
    pattern: String,
    target: T,
}

impl<T> Route<T> {
    fn new(method: Method, pattern: &str, target: T) -> Self {
        Self {
            method,
            segments: parse_segments(pattern),
            pattern: pattern.to_string(),
            target,
        }
    }

    fn match_path(&self, path: &str) -> Option<Params> {
        let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if actual.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, value) in self.segments.iter().zip(actual) {
            match segment {
                PathSegment::Literal(expected) if expected != value => return None,
                PathSegment::Literal(_) => {}
                PathSegment::Param(name) => params.push(name.as_str(), value),
            }
        }
        Some(params)
    }
}

fn parse_segments(pattern: &str) -> Vec<PathSegment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                PathSegment::Param(name.to_string())
            } else if let Some(name) = s.strip_prefix(':') {
                PathSegment::Param(name.to_string())
            } else {
                PathSegment::Literal(s.to_string())
            }
        })
        .collect()
}

/// Method and path router over targets of type `T`.
#[derive(Debug, Clone)]
pub struct Router<T> {
    routes: Vec<Route<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `target` for `method` and the path template `pattern`.
    pub fn add_route(&mut self, method: Method, pattern: impl AsRef<str>, target: T) {
        let pattern = pattern.as_ref();
        tracing::debug!(http.method = %method, pattern, "route registered");
        self.routes.push(Route::new(method, pattern, target));
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Finds the first route matching `method` and `path`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route.match_path(path).map(|params| RouteMatch {
                    target: &route.target,
                    params,
                })
            })
    }

    /// Returns `(method, pattern)` for every route, in registration order.
    #[must_use]
    pub fn routes(&self) -> Vec<(&Method, &str)> {
        self.routes
            .iter()
            .map(|route| (&route.method, route.pattern.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router<&'static str> {
        let mut router = Router::new();
        router.add_route(Method::POST, "/artists", "create");
        router.add_route(Method::GET, "/artists/{id}", "get");
        router.add_route(Method::DELETE, "/artists/:id", "delete");
        router.add_route(Method::POST, "/auth/register", "register");
        router
    }

    #[test]
    fn test_literal_match() {
        let router = router();
        let m = router.match_route(&Method::POST, "/artists").unwrap();
        assert_eq!(*m.target(), "create");
        assert!(m.params().is_empty());
    }

    #[test]
    fn test_brace_and_colon_params() {
        let router = router();
        let m = router.match_route(&Method::GET, "/artists/7").unwrap();
        assert_eq!(m.params().get("id"), Some("7"));

        let m = router.match_route(&Method::DELETE, "/artists/abc").unwrap();
        assert_eq!(*m.target(), "delete");
        assert_eq!(m.params().get("id"), Some("abc"));
    }

    #[test]
    fn test_trailing_slash_ignored() {
        let router = router();
        assert!(router.match_route(&Method::POST, "/artists/").is_some());
    }

    #[test]
    fn test_no_match() {
        let router = router();
        assert!(router.match_route(&Method::PUT, "/artists/7").is_none());
        assert!(router.match_route(&Method::GET, "/artists/7/albums").is_none());
        assert!(router.match_route(&Method::GET, "/users/7").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/artists/{id}", 1);
        router.add_route(Method::GET, "/artists/top", 2);
        let m = router.match_route(&Method::GET, "/artists/top").unwrap();
        assert_eq!(*m.target(), 1);
    }

    #[test]
    fn test_routes_listing() {
        let router = router();
        assert_eq!(router.route_count(), 4);
        assert_eq!(router.routes()[1], (&Method::GET, "/artists/{id}"));
    }
}
