//! Route guard: decides whether a navigation renders, waits, or redirects.
//!
//! The decision is a pure function of the session status, the session role
//! and the route's [`RouteAccess`]; see [`evaluate`]. [`RouteGuard`] pairs
//! that function with a [`RouteTable`] and applies redirects through a
//! [`Navigator`], always as a replace so the blocked page is not left in
//! history.

mod table;

pub use table::{RouteAccess, RouteTable};

use marketplace_core::{Role, SessionStatus};
use tracing::debug;

use crate::roles::{SIGN_IN_PATH, can_access, landing_path};
use crate::session::SessionSnapshot;

/// State carried by a redirect to the sign-in page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectState {
    /// Path the visitor originally asked for.
    pub from: String,
}

/// Outcome of guarding a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not known yet; show a neutral loading view.
    Loading,
    /// Show the requested view.
    Render,
    /// Replace the current location with `to`.
    Redirect {
        to: String,
        state: Option<RedirectState>,
    },
}

impl GuardDecision {
    fn redirect(to: impl Into<String>) -> Self {
        Self::Redirect {
            to: to.into(),
            state: None,
        }
    }
}

/// Decide what to do with a navigation to `path`.
///
/// Deterministic and side-effect free.
#[must_use]
pub fn evaluate(status: SessionStatus, role: Role, access: &RouteAccess, path: &str) -> GuardDecision {
    match (access, status) {
        (RouteAccess::Public, _) => GuardDecision::Render,
        (RouteAccess::Protected(required), _) if required.is_empty() => GuardDecision::Render,
        (_, SessionStatus::Resolving) => GuardDecision::Loading,

        (RouteAccess::PublicOnly, SessionStatus::Authenticated) => {
            GuardDecision::redirect(landing_path(role))
        }
        (RouteAccess::PublicOnly, SessionStatus::Anonymous) => GuardDecision::Render,

        (RouteAccess::Protected(_), SessionStatus::Anonymous) => GuardDecision::Redirect {
            to: SIGN_IN_PATH.to_string(),
            state: Some(RedirectState {
                from: path.to_string(),
            }),
        },
        (RouteAccess::Protected(required), SessionStatus::Authenticated) => {
            if can_access(required, role) {
                GuardDecision::Render
            } else {
                GuardDecision::redirect(landing_path(role))
            }
        }
    }
}

/// Replace-style navigation.
pub trait Navigator {
    /// Replace the current location with `to`.
    fn replace(&mut self, to: &str, state: Option<RedirectState>);
}

/// A navigation recorded by [`RecordingNavigator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub to: String,
    pub state: Option<RedirectState>,
}

/// Navigator that records every replace instead of performing it.
///
/// Used by the CLI, which has no location to replace, and by tests.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    pub history: Vec<Navigation>,
}

impl RecordingNavigator {
    /// Target of the most recent navigation.
    #[must_use]
    pub fn last_path(&self) -> Option<&str> {
        self.history.last().map(|nav| nav.to.as_str())
    }
}

impl Navigator for RecordingNavigator {
    fn replace(&mut self, to: &str, state: Option<RedirectState>) {
        self.history.push(Navigation {
            to: to.to_string(),
            state,
        });
    }
}

/// Guards navigations against a route table.
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    routes: RouteTable,
}

impl RouteGuard {
    #[must_use]
    pub const fn new(routes: RouteTable) -> Self {
        Self { routes }
    }

    /// Route table this guard checks against.
    #[must_use]
    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide what a navigation to `path` should do, without navigating.
    #[must_use]
    pub fn check(&self, session: &SessionSnapshot, path: &str) -> GuardDecision {
        evaluate(
            session.status,
            session.role(),
            self.routes.access_for(path),
            path,
        )
    }

    /// Decide, and perform the redirect if there is one.
    ///
    /// `Loading` never navigates; call again once the session resolves.
    pub fn enforce(
        &self,
        session: &SessionSnapshot,
        path: &str,
        navigator: &mut dyn Navigator,
    ) -> GuardDecision {
        let decision = self.check(session, path);
        if let GuardDecision::Redirect { to, state } = &decision {
            debug!(path, to = %to, role = %session.role(), "Guard redirect");
            navigator.replace(to, state.clone());
        }
        decision
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::User;

    fn signed_in(role: &str) -> SessionSnapshot {
        let user: User = serde_json::from_value(serde_json::json!({
            "_id": "u-1",
            "name": "Test",
            "email": "test@example.com",
            "role": role,
        }))
        .unwrap();
        SessionSnapshot::authenticated(user)
    }

    fn guard() -> RouteGuard {
        RouteGuard::new(RouteTable::marketplace())
    }

    #[test]
    fn test_resolving_shows_loading_without_navigation() {
        let mut navigator = RecordingNavigator::default();
        let decision = guard().enforce(&SessionSnapshot::resolving(), "/profile", &mut navigator);

        assert_eq!(decision, GuardDecision::Loading);
        assert!(navigator.history.is_empty());
    }

    #[test]
    fn test_resolving_still_renders_public_pages() {
        assert_eq!(
            guard().check(&SessionSnapshot::resolving(), "/products/p-1"),
            GuardDecision::Render
        );
        assert_eq!(
            guard().check(&SessionSnapshot::resolving(), "/login"),
            GuardDecision::Loading
        );
    }

    #[test]
    fn test_buyer_on_vendor_route_goes_to_own_landing() {
        let mut navigator = RecordingNavigator::default();
        let decision = guard().enforce(&signed_in("buyer"), "/vendor/products", &mut navigator);

        assert_eq!(
            decision,
            GuardDecision::Redirect {
                to: "/".to_string(),
                state: None
            }
        );
        assert_eq!(navigator.last_path(), Some("/"));
    }

    #[test]
    fn test_anonymous_on_profile_goes_to_login_with_from() {
        let mut navigator = RecordingNavigator::default();
        guard().enforce(&SessionSnapshot::anonymous(), "/profile", &mut navigator);

        let nav = navigator.history.last().unwrap();
        assert_eq!(nav.to, "/login");
        assert_eq!(nav.state.as_ref().unwrap().from, "/profile");
    }

    #[test]
    fn test_authenticated_on_public_only_goes_to_landing() {
        assert_eq!(
            guard().check(&signed_in("ADMIN"), "/login"),
            GuardDecision::Redirect {
                to: "/admin/dashboard".to_string(),
                state: None
            }
        );
        assert_eq!(
            guard().check(&signed_in("vendor"), "/register"),
            GuardDecision::Redirect {
                to: "/vendor/dashboard".to_string(),
                state: None
            }
        );
        assert_eq!(
            guard().check(&SessionSnapshot::anonymous(), "/login"),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_authorized_roles_render() {
        assert_eq!(guard().check(&signed_in("buyer"), "/checkout"), GuardDecision::Render);
        assert_eq!(
            guard().check(&signed_in("admin"), "/vendor/dashboard"),
            GuardDecision::Render
        );
        assert_eq!(
            guard().check(&signed_in("admin"), "/admin/users"),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_unrecognized_role_is_denied_not_crashed() {
        // Authenticated with a role nobody knows: treated as a guest.
        assert_eq!(
            guard().check(&signed_in("wizard"), "/profile"),
            GuardDecision::Redirect {
                to: "/".to_string(),
                state: None
            }
        );
    }

    #[test]
    fn test_anonymous_on_protected_sub_pages_goes_to_login() {
        for path in ["/profile/edit", "/checkout/confirm", "/wishlist/shared"] {
            assert_eq!(
                guard().check(&SessionSnapshot::anonymous(), path),
                GuardDecision::Redirect {
                    to: "/login".to_string(),
                    state: Some(RedirectState {
                        from: path.to_string()
                    }),
                },
                "{path}"
            );
        }
        assert_eq!(
            guard().check(&signed_in("buyer"), "/profile/edit"),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_empty_role_set_renders_for_everyone() {
        let open = RouteAccess::Protected(Vec::new());
        for status in [
            SessionStatus::Resolving,
            SessionStatus::Authenticated,
            SessionStatus::Anonymous,
        ] {
            assert_eq!(evaluate(status, Role::Guest, &open, "/x"), GuardDecision::Render);
        }
        assert!(can_access(&[], Role::Guest));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let access = RouteAccess::Protected(vec![Role::Vendor, Role::Admin]);
        for status in [
            SessionStatus::Resolving,
            SessionStatus::Authenticated,
            SessionStatus::Anonymous,
        ] {
            for role in Role::ALL {
                assert_eq!(
                    evaluate(status, role, &access, "/vendor/x"),
                    evaluate(status, role, &access, "/vendor/x"),
                );
            }
        }
    }
}
