//! Static route policy for the console.

use std::collections::HashMap;

use verdin_core::RouteClass;

/// Mapping from routes to the access class they demand.
///
/// Immutable at runtime. Routes with a trailing parameter segment (detail
/// pages, per-peer chat) are registered as prefixes; anything the table does
/// not know defaults to [`RouteClass::Privileged`], so a forgotten
/// registration can only ever fail closed.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    exact: HashMap<String, RouteClass>,
    prefixes: Vec<(String, RouteClass)>,
}

impl RoutePolicy {
    /// An empty policy where every route is privileged.
    #[must_use]
    pub fn new() -> Self {
        Self {
            exact: HashMap::new(),
            prefixes: Vec::new(),
        }
    }

    /// Register an exact route.
    #[must_use]
    pub fn route(mut self, path: &str, class: RouteClass) -> Self {
        self.exact.insert(path.to_string(), class);
        self
    }

    /// Register a parameterized route by its static head, e.g. `/chat/`.
    #[must_use]
    pub fn prefix(mut self, head: &str, class: RouteClass) -> Self {
        self.prefixes.push((head.to_string(), class));
        self
    }

    /// The route table of the marketplace console.
    #[must_use]
    pub fn marketplace_console() -> Self {
        Self::new()
            .route("/", RouteClass::Public)
            .route("/home", RouteClass::Privileged)
            .route("/middleman", RouteClass::Privileged)
            .route("/user-accounts", RouteClass::Privileged)
            .route("/seller-accounts", RouteClass::Privileged)
            .route("/product-moderation", RouteClass::Privileged)
            .route("/post-moderation", RouteClass::Privileged)
            .route("/audit-logs", RouteClass::Privileged)
            .prefix("/post-detail/", RouteClass::Privileged)
            .prefix("/chat/", RouteClass::Privileged)
            .route("/admin-manage", RouteClass::SuperOnly)
            .route("/service-fees", RouteClass::SuperOnly)
    }

    /// Classify a route. Unknown routes are privileged.
    #[must_use]
    pub fn classify(&self, route: &str) -> RouteClass {
        if let Some(class) = self.exact.get(route) {
            return *class;
        }
        self.prefixes
            .iter()
            .find(|(head, _)| route.starts_with(head.as_str()))
            .map_or(RouteClass::Privileged, |(_, class)| *class)
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::marketplace_console()
    }
}
