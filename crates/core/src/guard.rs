//! Role-based route access.
//!
//! Every guarded page declares an [`Access`] requirement. Once the visitor's
//! session has been loaded, [`Access::decide`] turns the (optional) signed-in
//! user into a [`GuardDecision`]; the web layer maps the decision onto a
//! rendered page or a redirect.

use serde::{Deserialize, Serialize};

use crate::types::{Email, Role, UserId};

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/login";

/// Where signed-in visitors without the required role are sent.
pub const FALLBACK_PATH: &str = "/";

/// The signed-in account, as returned by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub fullname: String,
    pub email: Email,
    pub roles: Vec<Role>,
}

impl AuthenticatedUser {
    /// Whether the user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// First name for greetings.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.fullname.split_whitespace().next().unwrap_or(&self.fullname)
    }

    /// Upper-cased first letter for avatars.
    #[must_use]
    pub fn initial(&self) -> String {
        self.fullname
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }
}

/// What a page requires of its visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any signed-in user.
    Authenticated,
    /// A signed-in user holding at least one of the roles.
    AnyRole(&'static [Role]),
}

/// Outcome of checking a visitor against an [`Access`] requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the page.
    Allow,
    /// Nobody is signed in; send the visitor to the login page.
    RedirectToLogin,
    /// Signed in, but without a required role; send them to the fallback route.
    Deny {
        /// Where to send the visitor.
        fallback: &'static str,
    },
}

impl Access {
    /// Decide whether `user` may see a page guarded by this requirement.
    #[must_use]
    pub fn decide(self, user: Option<&AuthenticatedUser>) -> GuardDecision {
        let Some(user) = user else {
            return GuardDecision::RedirectToLogin;
        };

        match self {
            Self::Authenticated => GuardDecision::Allow,
            Self::AnyRole(roles) if roles.iter().any(|role| user.has_role(role)) => {
                GuardDecision::Allow
            }
            Self::AnyRole(_) => GuardDecision::Deny {
                fallback: FALLBACK_PATH,
            },
        }
    }
}

/// Where a user lands right after signing in.
///
/// Admins win over customers, who win over baristas; anyone else goes to the
/// generic home page.
#[must_use]
pub fn landing_path(roles: &[Role]) -> &'static str {
    if roles.contains(&Role::Admin) {
        "/admin/dashboard"
    } else if roles.contains(&Role::Customer) {
        "/customer/home"
    } else if roles.contains(&Role::Barista) {
        "/baristor/dashboard"
    } else {
        "/home"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ADMINS: &[Role] = &[Role::Admin];
    const CUSTOMERS: &[Role] = &[Role::Customer];
    const FLOOR_STAFF: &[Role] = &[Role::Barista, Role::Manager];
    const ADMIN_ONLY: Access = Access::AnyRole(ADMINS);
    const CUSTOMER_ONLY: Access = Access::AnyRole(CUSTOMERS);

    fn user(roles: Vec<Role>) -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::new("u1"),
            fullname: "Nimali Perera".to_string(),
            email: Email::parse("nimali@aromista.lk").unwrap(),
            roles,
        }
    }

    #[test]
    fn test_anonymous_visitors_go_to_login() {
        assert_eq!(Access::Authenticated.decide(None), GuardDecision::RedirectToLogin);
        assert_eq!(ADMIN_ONLY.decide(None), GuardDecision::RedirectToLogin);
    }

    #[test]
    fn test_missing_role_is_denied() {
        let customer = user(vec![Role::Customer]);
        assert_eq!(
            ADMIN_ONLY.decide(Some(&customer)),
            GuardDecision::Deny { fallback: "/" }
        );
        assert_eq!(CUSTOMER_ONLY.decide(Some(&customer)), GuardDecision::Allow);
    }

    #[test]
    fn test_any_matching_role_is_enough() {
        let staff = user(vec![Role::Barista, Role::Admin]);
        assert_eq!(ADMIN_ONLY.decide(Some(&staff)), GuardDecision::Allow);
        assert_eq!(
            Access::AnyRole(FLOOR_STAFF).decide(Some(&staff)),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_unknown_roles_grant_nothing() {
        let stranger = user(vec![Role::Other("ADMINISTRATOR".to_string())]);
        assert_eq!(
            ADMIN_ONLY.decide(Some(&stranger)),
            GuardDecision::Deny { fallback: "/" }
        );
        assert_eq!(Access::Authenticated.decide(Some(&stranger)), GuardDecision::Allow);
    }

    #[test]
    fn test_landing_path_priority() {
        assert_eq!(landing_path(&[Role::Customer, Role::Admin]), "/admin/dashboard");
        assert_eq!(landing_path(&[Role::Barista, Role::Customer]), "/customer/home");
        assert_eq!(landing_path(&[Role::Barista]), "/baristor/dashboard");
        assert_eq!(landing_path(&[Role::Cashier]), "/home");
        assert_eq!(landing_path(&[]), "/home");
    }

    #[test]
    fn test_user_display_helpers() {
        let nimali = user(vec![]);
        assert_eq!(nimali.first_name(), "Nimali");
        assert_eq!(nimali.initial(), "N");
    }
}
