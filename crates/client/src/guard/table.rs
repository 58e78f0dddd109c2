//! Path patterns and the access rule attached to each.

use marketplace_core::Role;

/// Who may open a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    /// Anyone, signed in or not.
    Public,
    /// Only visitors without a session (sign-in, registration).
    PublicOnly,
    /// Signed-in users whose role reaches the lowest role in the set.
    Protected(Vec<Role>),
}

static PUBLIC: RouteAccess = RouteAccess::Public;

/// Ordered list of `(pattern, access)` rules.
///
/// A pattern is either an exact path (`/checkout`) or a prefix ending in
/// `/*` (`/admin/*`), which matches the prefix itself and everything below
/// it. When several patterns match, the longest one wins. Paths with no
/// matching rule are public.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<(String, RouteAccess)>,
}

impl RouteTable {
    /// Empty table; every path is public.
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule. A protected rule with no roles is public.
    #[must_use]
    pub fn with(mut self, pattern: impl Into<String>, access: RouteAccess) -> Self {
        let access = match access {
            RouteAccess::Protected(roles) if roles.is_empty() => RouteAccess::Public,
            other => other,
        };
        self.rules.push((pattern.into(), access));
        self
    }

    /// The marketplace's route map.
    #[must_use]
    pub fn marketplace() -> Self {
        let buyer = || RouteAccess::Protected(vec![Role::Buyer]);

        Self::new()
            .with("/", RouteAccess::Public)
            .with("/products/*", RouteAccess::Public)
            .with("/vendors/*", RouteAccess::Public)
            .with("/login", RouteAccess::PublicOnly)
            .with("/register", RouteAccess::PublicOnly)
            .with("/profile/*", buyer())
            .with("/orders/*", buyer())
            .with("/checkout/*", buyer())
            .with("/wishlist/*", buyer())
            .with("/vendor/*", RouteAccess::Protected(vec![Role::Vendor, Role::Admin]))
            .with("/admin/*", RouteAccess::Protected(vec![Role::Admin]))
    }

    /// Access rule for `path`. Query strings and fragments are ignored.
    #[must_use]
    pub fn access_for(&self, path: &str) -> &RouteAccess {
        let path = strip_query(path);
        self.rules
            .iter()
            .filter(|(pattern, _)| matches(pattern, path))
            .max_by_key(|(pattern, _)| pattern.len())
            .map_or(&PUBLIC, |(_, access)| access)
    }
}

fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path.get(..end).unwrap_or(path);
    if trimmed.len() > 1 {
        trimmed.trim_end_matches('/')
    } else {
        trimmed
    }
}

fn matches(pattern: &str, path: &str) -> bool {
    pattern.strip_suffix("/*").map_or(pattern == path, |prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}
