//! Actor identity and roles
//!
//! Identity issuance and verification live in the external auth service.
//! The core only ever sees a verified id + role pair.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an authenticated actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    DeliveryPartner,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::DeliveryPartner => "delivery_partner",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verified actor identity, as handed over by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn customer(id: impl Into<String>) -> Self {
        Self::new(id, Role::Customer)
    }

    pub fn delivery_partner(id: impl Into<String>) -> Self {
        Self::new(id, Role::DeliveryPartner)
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id, Role::Admin)
    }
}

/// Public user profile (no credentials, those never reach the core)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::DeliveryPartner).unwrap(),
            "\"delivery_partner\""
        );
        let role: Role = serde_json::from_str("\"customer\"").unwrap();
        assert_eq!(role, Role::Customer);
    }

    #[test]
    fn test_actor_constructors() {
        assert_eq!(Actor::customer("c1").role, Role::Customer);
        assert_eq!(Actor::delivery_partner("p1").role, Role::DeliveryPartner);
        assert_eq!(Actor::admin("a1").role, Role::Admin);
    }
}
