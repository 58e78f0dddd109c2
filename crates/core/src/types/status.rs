//! Status enums for session and notification state.

use serde::{Deserialize, Serialize};

/// Authentication state of the running client.
///
/// `Resolving` is a first-class state: until bootstrap has finished nobody
/// may assume the session is anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Bootstrap has not finished yet.
    #[default]
    Resolving,
    /// A token is attached and the current user is known.
    Authenticated,
    /// No usable session.
    Anonymous,
}

impl SessionStatus {
    /// Whether the session is known (bootstrap has finished).
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Resolving)
    }
}

/// Category of an admin notification.
///
/// Unknown categories from newer backends deserialize as `Other` rather than
/// failing the whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewOrder,
    NewUser,
    VendorApplication,
    ProductReview,
    LowStock,
    Payout,
    System,
    #[default]
    #[serde(other)]
    Other,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NewOrder => "new_order",
            Self::NewUser => "new_user",
            Self::VendorApplication => "vendor_application",
            Self::ProductReview => "product_review",
            Self::LowStock => "low_stock",
            Self::Payout => "payout",
            Self::System => "system",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_defaults_to_resolving() {
        assert_eq!(SessionStatus::default(), SessionStatus::Resolving);
        assert!(!SessionStatus::Resolving.is_resolved());
        assert!(SessionStatus::Anonymous.is_resolved());
    }

    #[test]
    fn test_unknown_notification_kind_is_other() {
        let kind: NotificationKind = serde_json::from_str("\"flash_sale\"").unwrap();
        assert_eq!(kind, NotificationKind::Other);

        let kind: NotificationKind = serde_json::from_str("\"low_stock\"").unwrap();
        assert_eq!(kind, NotificationKind::LowStock);
    }
}
