//! User entity

use super::{HasOwner, UserId};
use crate::access_control::types::{ObjectType, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user (administrators included)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            role,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

// A user owns their own record.
impl HasOwner for User {
    fn owner_id(&self) -> Option<UserId> {
        Some(self.id)
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Users
    }
}
