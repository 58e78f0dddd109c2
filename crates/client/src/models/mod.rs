//! Domain models shared by the client stores.
//!
//! These mirror what the remote API sends, with two boundary rules:
//! - `_id` is accepted wherever `id` is expected
//! - roles are normalized to [`Role`] on deserialization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketplace_core::{Email, NotificationId, NotificationKind, Price, ProductId, Role, UserId, VendorId};

/// Snapshot of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User's remote ID.
    #[serde(alias = "_id")]
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: Email,
    /// Contact phone, if given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Canonical role. Missing or unknown roles become `Guest`.
    #[serde(default)]
    pub role: Role,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

/// Product fields copied into a cart or wishlist entry when it is added.
///
/// The snapshot is what the collection displays and totals; it is not
/// refreshed when the catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    /// Product ID, the unique key within a collection.
    #[serde(alias = "_id")]
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Unit price at the time the product was added.
    pub price: Price,
    /// Primary image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Vendor selling the product.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<VendorId>,
}

/// An admin-facing alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification ID.
    #[serde(alias = "_id")]
    pub id: NotificationId,
    /// Category.
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub message: String,
    /// Whether an admin has read it.
    #[serde(default, alias = "isRead")]
    pub read: bool,
    /// When the server created it.
    pub created_at: DateTime<Utc>,
}
