//! Role resolver: pure functions over the canonical [`Role`].
//!
//! Normalization itself lives on [`Role::resolve`]; this module answers the
//! questions the guard and navigation chrome ask of a role.

use marketplace_core::Role;

use crate::guard::{RouteAccess, RouteTable};

/// Public home page.
pub const PUBLIC_HOME: &str = "/";

/// Sign-in entry point.
pub const SIGN_IN_PATH: &str = "/login";

/// Vendor dashboard.
pub const VENDOR_HOME: &str = "/vendor/dashboard";

/// Admin dashboard.
pub const ADMIN_HOME: &str = "/admin/dashboard";

/// Whether `actual` may reach a route requiring any of `required`.
///
/// An empty `required` set means the route is public. Otherwise the role
/// must sit at or above the lowest-ranked role in the set.
#[must_use]
pub fn can_access(required: &[Role], actual: Role) -> bool {
    required
        .iter()
        .copied()
        .min_by_key(|role| role.rank())
        .is_none_or(|minimum| actual.satisfies(minimum))
}

/// Where a role lands after signing in, or when it is turned away.
#[must_use]
pub const fn landing_path(role: Role) -> &'static str {
    match role {
        Role::Admin => ADMIN_HOME,
        Role::Vendor => VENDOR_HOME,
        Role::Buyer | Role::Guest => PUBLIC_HOME,
    }
}

/// Where to send a user who just signed in.
///
/// Returns the remembered `from` path when the role may actually open it,
/// and the role's landing path otherwise. Public-only pages (sign-in,
/// registration) are never a valid return target, and neither is anything
/// that is not a same-origin absolute path.
#[must_use]
pub fn post_login_destination(role: Role, from: Option<&str>, routes: &RouteTable) -> String {
    from.filter(|path| is_local_path(path))
        .filter(|path| match routes.access_for(path) {
            RouteAccess::Public => true,
            RouteAccess::PublicOnly => false,
            RouteAccess::Protected(required) => can_access(required, role),
        })
        .map_or_else(|| landing_path(role).to_string(), str::to_string)
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// Flags derived from a role, for views that show or hide controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    pub is_authenticated: bool,
    pub is_buyer: bool,
    pub is_vendor: bool,
    pub is_admin: bool,
    /// May use the cart, wishlist and checkout.
    pub can_shop: bool,
    /// May manage products and orders as a seller.
    pub can_sell: bool,
    /// May moderate users, vendors and reviews.
    pub can_moderate: bool,
}

impl Capabilities {
    /// Capabilities of `role`.
    #[must_use]
    pub const fn of(role: Role) -> Self {
        Self {
            is_authenticated: !matches!(role, Role::Guest),
            is_buyer: matches!(role, Role::Buyer),
            is_vendor: matches!(role, Role::Vendor),
            is_admin: matches!(role, Role::Admin),
            can_shop: role.satisfies(Role::Buyer),
            can_sell: role.satisfies(Role::Vendor),
            can_moderate: role.satisfies(Role::Admin),
        }
    }
}
