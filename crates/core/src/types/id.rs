//! Newtype IDs for type-safe entity references.
//!
//! The REST API identifies every document by an opaque string (`_id`).
//! Use the `define_id!` macro to create wrappers that prevent accidentally
//! passing an order ID where an item ID is expected.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use aromista_core::define_id;
/// define_id!(TicketId);
/// define_id!(ReceiptId);
///
/// let ticket = TicketId::new("65f1c2");
/// let receipt = ReceiptId::new("65f1c2");
///
/// // These are different types, so this won't compile:
/// // let _: TicketId = receipt;
/// assert_eq!(ticket.as_str(), receipt.as_str());
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

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
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

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(UserId);
define_id!(ItemId);
define_id!(CategoryId);
define_id!(OrderId);
define_id!(BookingId);

impl OrderId {
    /// Short reference shown to customers and staff (last six characters).
    #[must_use]
    pub fn short(&self) -> &str {
        let start = self
            .0
            .char_indices()
            .rev()
            .nth(5)
            .map_or(0, |(idx, _)| idx);
        self.0.get(start..).unwrap_or(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_strings() {
        let id = ItemId::new("65f1c2aa01");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"65f1c2aa01\""));
    }

    #[test]
    fn short_order_reference_keeps_tail() {
        assert_eq!(OrderId::new("65f1c2aa0123abcd").short(), "23abcd");
        assert_eq!(OrderId::new("abc").short(), "abc");
    }
}
