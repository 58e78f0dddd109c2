//! Marketplace roles and the access hierarchy between them.
//!
//! Roles arrive from the API in whatever case the backend happened to store
//! them (`"admin"`, `"Vendor"`, `"BUYER"`). They are normalized exactly once,
//! when deserialized or resolved, so everything past the boundary compares
//! canonical values.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A coarse capability tier.
///
/// The hierarchy is `Admin ⊇ Vendor ⊇ Buyer ⊇ Guest`: a role satisfies any
/// requirement at or below its own [`rank`](Role::rank).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// No session, or a role string we do not recognize.
    #[default]
    Guest,
    /// A shopper.
    Buyer,
    /// A seller with a storefront.
    Vendor,
    /// Marketplace operator.
    Admin,
}

impl Role {
    /// Every role, lowest rank first.
    pub const ALL: [Self; 4] = [Self::Guest, Self::Buyer, Self::Vendor, Self::Admin];

    /// Position in the access hierarchy. Higher ranks include lower ones.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Guest => 0,
            Self::Buyer => 1,
            Self::Vendor => 2,
            Self::Admin => 3,
        }
    }

    /// Resolve a raw role string.
    ///
    /// Case and surrounding whitespace are ignored. Unrecognized or missing
    /// values fall back to [`Role::Guest`]; this never fails.
    #[must_use]
    pub fn resolve(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Guest;
        };
        match raw.trim().to_ascii_uppercase().as_str() {
            "BUYER" => Self::Buyer,
            "VENDOR" => Self::Vendor,
            "ADMIN" => Self::Admin,
            _ => Self::Guest,
        }
    }

    /// Whether this role is at or above `required` in the hierarchy.
    #[must_use]
    pub const fn satisfies(self, required: Self) -> bool {
        self.rank() >= required.rank()
    }

    /// Canonical (uppercase) name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "GUEST",
            Self::Buyer => "BUYER",
            Self::Vendor => "VENDOR",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::resolve(Some(s)))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::resolve(raw.as_deref()))
    }
}
