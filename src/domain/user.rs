//! Registered users

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::actor::{Actor, Role};
use super::id::UserId;

/// A registered catalog user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Roles beyond the implicit `user` role
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>, nickname: Option<String>) -> Self {
        let email = email.into().trim().to_lowercase();
        let now = Utc::now();
        Self {
            id: UserId::new(&email, now),
            email,
            nickname,
            roles: Vec::new(),
            created_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    /// Grants a role; returns false if already held
    pub fn grant(&mut self, role: Role) -> bool {
        if role == Role::User || self.roles.contains(&role) {
            return false;
        }
        self.roles.push(role);
        true
    }

    /// Revokes a role; returns false if not held
    pub fn revoke(&mut self, role: Role) -> bool {
        let len_before = self.roles.len();
        self.roles.retain(|r| *r != role);
        self.roles.len() != len_before
    }

    /// The actor this user acts as
    pub fn actor(&self) -> Actor {
        Actor::user(self.id.clone(), self.roles.iter().copied())
    }

    /// Name to show in listings
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.email)
    }
}
