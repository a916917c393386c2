//! User roles as issued by the REST API.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A role attached to an account.
///
/// The wire spelling is upper case; the barista role is spelled `BARISTOR`
/// by the API and kept that way on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// Back-office administrator.
    Admin,
    /// Customer ordering from the menu.
    Customer,
    /// Barista working the order board.
    Barista,
    /// Till operator.
    Cashier,
    /// Shop manager.
    Manager,
    /// A role this front-end does not know. Never grants access.
    Other(String),
}

impl Role {
    /// Roles an administrator can assign from the user management screen.
    pub const ASSIGNABLE: [Self; 5] = [
        Self::Customer,
        Self::Barista,
        Self::Cashier,
        Self::Manager,
        Self::Admin,
    ];

    /// Wire spelling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "ADMIN",
            Self::Customer => "CUSTOMER",
            Self::Barista => "BARISTOR",
            Self::Cashier => "CASHIER",
            Self::Manager => "MANAGER",
            Self::Other(other) => other,
        }
    }

    /// Human readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Admin => "Admin",
            Self::Customer => "Customer",
            Self::Barista => "Barista",
            Self::Cashier => "Cashier",
            Self::Manager => "Manager",
            Self::Other(other) => other,
        }
    }

    /// Whether this is a staff role (anything but a customer).
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        !matches!(self, Self::Customer | Self::Other(_))
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Self::Admin,
            "CUSTOMER" => Self::Customer,
            "BARISTOR" | "BARISTA" => Self::Barista,
            "CASHIER" => Self::Cashier,
            "MANAGER" => Self::Manager,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_spelling() {
        let roles: Vec<Role> = serde_json::from_str(r#"["ADMIN","BARISTOR","customer"]"#).unwrap();
        assert_eq!(roles, vec![Role::Admin, Role::Barista, Role::Customer]);
        assert_eq!(serde_json::to_string(&Role::Barista).unwrap(), "\"BARISTOR\"");
    }

    #[test]
    fn test_unknown_role_is_preserved() {
        let role = Role::from("SUPERVISOR");
        assert_eq!(role, Role::Other("SUPERVISOR".to_string()));
        assert_eq!(role.as_str(), "SUPERVISOR");
        assert!(!role.is_staff());
    }
}
