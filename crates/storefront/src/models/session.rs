//! Session-related types.
//!
//! Types stored in the session for authentication state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tokens issued by the REST API at login.
///
/// Held server-side only; `Debug` never prints them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the API tokens of the signed-in user.
    pub const TOKENS: &str = "api_tokens";

    /// Key for the customer's shopping cart.
    pub const CART: &str = "cart";

    /// Key for the admin's manual order composer.
    pub const COMPOSER: &str = "order_composer";

    /// Key for the one-shot notice shown by the next page.
    pub const NOTICE: &str = "notice";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_redacted_in_debug() {
        let tokens = SessionTokens {
            access_token: "eyJhbGciOi.secret".to_string(),
            refresh_token: Some("refresh.secret".to_string()),
        };
        let debug = format!("{tokens:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
