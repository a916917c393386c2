//! Status enums for orders, bookings, menu entries and accounts.
//!
//! All of them use the API's `SCREAMING_SNAKE_CASE` spelling on the wire.

use serde::{Deserialize, Serialize};

/// Implements `as_str`, `label`, `Display` and `FromStr` for a status enum.
macro_rules! status_strings {
    ($name:ident { $($variant:ident => ($wire:literal, $label:literal)),+ $(,)? }) => {
        impl $name {
            /// Every variant, in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire spelling.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }

            /// Human readable label.
            #[must_use]
            pub const fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(format!(concat!("invalid ", stringify!($name), ": {}"), other)),
                }
            }
        }
    };
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

status_strings!(OrderStatus {
    Pending => ("PENDING", "Pending"),
    Processing => ("PROCESSING", "Processing"),
    Completed => ("COMPLETED", "Completed"),
    Cancelled => ("CANCELLED", "Cancelled"),
});

impl OrderStatus {
    /// Orders a barista still has to work on.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

/// Table booking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

status_strings!(BookingStatus {
    Pending => ("PENDING", "Pending"),
    Confirmed => ("CONFIRMED", "Confirmed"),
    Cancelled => ("CANCELLED", "Cancelled"),
});

/// Availability of a menu item or a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    #[default]
    Available,
    Unavailable,
}

status_strings!(Availability {
    Available => ("AVAILABLE", "Available"),
    Unavailable => ("UNAVAILABLE", "Unavailable"),
});

/// Whether an account may sign in (the API's `approved` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

status_strings!(AccountStatus {
    Active => ("ACTIVE", "Active"),
    Inactive => ("INACTIVE", "Inactive"),
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_format() {
        let status: OrderStatus = serde_json::from_str("\"PROCESSING\"").unwrap();
        assert_eq!(status, OrderStatus::Processing);
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"CANCELLED\""
        );
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("confirmed".parse::<BookingStatus>(), Ok(BookingStatus::Confirmed));
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_active_orders() {
        assert!(OrderStatus::Pending.is_active());
        assert!(OrderStatus::Processing.is_active());
        assert!(!OrderStatus::Completed.is_active());
        assert!(!OrderStatus::Cancelled.is_active());
    }
}
