//! Acting identity and roles
//!
//! An [`Actor`] is whoever issues a command: a registered user with a set of
//! roles, or an anonymous visitor. Nothing here authenticates anyone; the
//! identity is resolved by the caller and only checked for role membership.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::id::UserId;

/// Role held by a registered user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().trim_start_matches("role_") {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// The identity behind a command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Actor {
    user: Option<UserId>,
    roles: Vec<Role>,
}

impl Actor {
    /// An unregistered visitor
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A registered user holding the given roles
    pub fn user(id: UserId, roles: impl IntoIterator<Item = Role>) -> Self {
        let mut held = vec![Role::User];
        for role in roles {
            if !held.contains(&role) {
                held.push(role);
            }
        }
        Self {
            user: Some(id),
            roles: held,
        }
    }

    /// The registered user, if any
    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user {
            Some(id) if self.is_admin() => write!(f, "{} (admin)", id),
            Some(id) => write!(f, "{}", id),
            None => write!(f, "anonymous"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("{actor} may not {operation}: {role} role required")]
    Forbidden {
        actor: String,
        operation: String,
        role: Role,
    },
}

impl AuthorizationError {
    pub fn forbidden(actor: &Actor, operation: impl Into<String>, role: Role) -> Self {
        AuthorizationError::Forbidden {
            actor: actor.to_string(),
            operation: operation.into(),
            role,
        }
    }
}

impl Actor {
    /// Fails with [`AuthorizationError::Forbidden`] unless the actor holds `role`
    pub fn require(&self, role: Role, operation: &str) -> Result<(), AuthorizationError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(AuthorizationError::forbidden(self, operation, role))
        }
    }
}
