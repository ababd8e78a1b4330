//! Domain entities
//!
//! The decision core only needs one fact from an entity: who owns it.
//! Entities expose that through [`HasOwner`].

pub mod comment;
pub mod post;
pub mod user;

pub use comment::Comment;
pub use post::Post;
pub use user::User;

use crate::access_control::types::{ObjectType, Role, RoleRule};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a user
pub type UserId = Uuid;

/// Capability of reporting an owning user
pub trait HasOwner: Send + Sync {
    /// The owning user's id, or `None` for ownerless entities
    fn owner_id(&self) -> Option<UserId>;

    /// The object type this entity is governed by
    fn object_type(&self) -> ObjectType;
}

/// The authenticated identity making a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Whether this actor owns the given entity
    pub fn owns(&self, target: &(impl HasOwner + ?Sized)) -> bool {
        target.owner_id() == Some(self.id)
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}

impl HasOwner for RoleRule {
    fn owner_id(&self) -> Option<UserId> {
        None
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::RoleRules
    }
}
