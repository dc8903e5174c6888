//! The acting user, as seen by the engine.
//!
//! Authentication lives outside the engine; operations only need to know who
//! is acting (for `created_by` columns) and whether they are an admin.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    #[must_use]
    pub fn admin(username: impl Into<String>) -> Self {
        Self::new(username, Role::Admin)
    }

    #[must_use]
    pub fn user(username: impl Into<String>) -> Self {
        Self::new(username, Role::User)
    }

    /// Admins may touch back-dated records and delete bills.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
