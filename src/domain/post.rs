//! Post entity

use super::{HasOwner, UserId};
use crate::access_control::types::ObjectType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(author_id: UserId, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

impl HasOwner for Post {
    fn owner_id(&self) -> Option<UserId> {
        Some(self.author_id)
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Posts
    }
}
