//! Newtype IDs for type-safe entity references.
//!
//! The remote API hands out opaque string identifiers (document IDs), so every
//! ID wraps a `String`. Use the `define_id!` macro to create wrappers that
//! prevent accidentally passing a product ID where a notification ID belongs.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `new()`, `as_str()` and `into_inner()`
/// - `Display`, `AsRef<str>`, `From<String>` and `From<&str>`
///
/// # Example
///
/// ```rust
/// # use marketplace_core::define_id;
/// define_id!(OrderId);
/// define_id!(StoreId);
///
/// let order = OrderId::new("64b7f0c2");
/// let store = StoreId::new("64b7f0c2");
///
/// // These are different types, so this won't compile:
/// // let _: OrderId = store;
/// assert_eq!(order.as_str(), store.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::convert::AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(VendorId);
define_id!(NotificationId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_bare_string() {
        let id = ProductId::new("p-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p-1\"");

        let parsed: ProductId = serde_json::from_str("\"p-1\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_display_and_as_ref() {
        let id = UserId::from("u-42");
        assert_eq!(id.to_string(), "u-42");
        let s: &str = id.as_ref();
        assert_eq!(s, "u-42");
    }
}
