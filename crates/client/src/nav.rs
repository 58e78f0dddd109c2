//! Role-aware navigation chrome.

use marketplace_core::{Role, SessionStatus};

use crate::roles::{PUBLIC_HOME, SIGN_IN_PATH, landing_path};
use crate::session::SessionSnapshot;

/// What activating a menu entry does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Navigate to a path.
    Link(&'static str),
    /// End the session.
    SignOut,
}

/// A header menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub action: MenuAction,
}

const fn link(label: &'static str, path: &'static str) -> MenuItem {
    MenuItem {
        label,
        action: MenuAction::Link(path),
    }
}

/// Header links for `session`, in display order.
///
/// A signed-in user whose role was not recognized still gets "Sign out",
/// but none of the buyer pages they could not open.
#[must_use]
pub fn menu_for(session: &SessionSnapshot) -> Vec<MenuItem> {
    let mut items = vec![
        link("Home", PUBLIC_HOME),
        link("Products", "/products"),
        link("Cart", "/cart"),
    ];

    if session.status != SessionStatus::Authenticated {
        items.push(link("Sign in", SIGN_IN_PATH));
        items.push(link("Register", "/register"));
        return items;
    }

    let role = session.role();
    if role.satisfies(Role::Buyer) {
        items.push(link("Wishlist", "/wishlist"));
        items.push(link("Orders", "/orders"));
    }

    let dashboard = landing_path(role);
    if dashboard != PUBLIC_HOME {
        items.push(link("Dashboard", dashboard));
    }

    if role.satisfies(Role::Buyer) {
        items.push(link("Profile", "/profile"));
    }
    items.push(MenuItem {
        label: "Sign out",
        action: MenuAction::SignOut,
    });
    items
}
