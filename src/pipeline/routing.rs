//! Route resolution
//!
//! Pure interpretation of a classifier reply. Kept free of any I/O so the
//! same reply always resolves to the same route.

use crate::pipeline::types::Route;

/// Resolve a classifier reply to one of the declared routes
///
/// The reply is lowercased and searched for each route's keyword in
/// declaration order; the first route whose keyword appears wins. When no
/// keyword appears, `default` is returned.
///
/// # Arguments
/// * `reply` - Free-text reply from the classifier
/// * `routes` - Declared routes, in declaration order
/// * `default` - Fallback route
///
/// # Returns
/// * `&Route` - Always one of `routes` or `default`
pub fn resolve_route<'a>(reply: &str, routes: &'a [Route], default: &'a Route) -> &'a Route {
    let reply = reply.to_lowercase();
    routes
        .iter()
        .find(|route| reply.contains(route.keyword()))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> Vec<Route> {
        vec![
            Route::new("search", "search"),
            Route::new("lookup", "lookup"),
            Route::new("direct", "direct"),
        ]
    }

    #[test]
    fn test_exact_label() {
        let routes = routes();
        let resolved = resolve_route("lookup", &routes, &routes[2]);
        assert_eq!(resolved.name(), "lookup");
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let routes = routes();
        let resolved = resolve_route("I think this is a SEARCH query", &routes, &routes[2]);
        assert_eq!(resolved.name(), "search");
    }

    #[test]
    fn test_unrecognized_reply_uses_default() {
        let routes = routes();
        for _ in 0..3 {
            let resolved = resolve_route("unknown", &routes, &routes[2]);
            assert_eq!(resolved.name(), "direct");
        }
    }

    #[test]
    fn test_empty_reply_uses_default() {
        let routes = routes();
        assert_eq!(resolve_route("", &routes, &routes[2]).name(), "direct");
    }

    #[test]
    fn test_first_declared_route_wins() {
        let routes = routes();
        // Mentions both "lookup" and "search"; "search" is declared first
        let resolved = resolve_route("lookup or search?", &routes, &routes[2]);
        assert_eq!(resolved.name(), "search");
    }

    #[test]
    fn test_custom_keyword() {
        let routes = vec![Route::new("rag", "document"), Route::new("llm", "llm")];
        let resolved = resolve_route("Documents would help here", &routes, &routes[1]);
        assert_eq!(resolved.name(), "rag");
    }
}
