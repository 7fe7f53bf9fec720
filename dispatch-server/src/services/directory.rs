//! Agent Directory - roster of known delivery partners
//!
//! User accounts live in the external identity service; the engine only
//! needs the delivery-partner roster for the admin system snapshot.

use dashmap::DashMap;
use shared::models::{Role, UserProfile};

/// Collaborator interface to the user directory
pub trait AgentDirectory: Send + Sync {
    /// All known delivery partners (no credentials)
    fn delivery_partners(&self) -> Vec<UserProfile>;
}

/// In-memory directory, used in tests and single-process deployments
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: DashMap<String, UserProfile>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: UserProfile) {
        self.users.insert(user.id.clone(), user);
    }
}

impl AgentDirectory for MemoryDirectory {
    fn delivery_partners(&self) -> Vec<UserProfile> {
        let mut partners: Vec<UserProfile> = self
            .users
            .iter()
            .filter(|entry| entry.role == Role::DeliveryPartner)
            .map(|entry| entry.clone())
            .collect();
        partners.sort_by(|a, b| a.username.cmp(&b.username));
        partners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_roster_filters_roles() {
        let directory = MemoryDirectory::new();
        directory.insert(UserProfile {
            id: "p1".to_string(),
            username: "rider-one".to_string(),
            email: None,
            role: Role::DeliveryPartner,
        });
        directory.insert(UserProfile {
            id: "c1".to_string(),
            username: "shopper".to_string(),
            email: None,
            role: Role::Customer,
        });
        directory.insert(UserProfile {
            id: "a1".to_string(),
            username: "boss".to_string(),
            email: None,
            role: Role::Admin,
        });

        let partners = directory.delivery_partners();
        assert_eq!(partners.len(), 1);
        assert_eq!(partners[0].id, "p1");
    }
}
