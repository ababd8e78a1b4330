//! Response shaper
//!
//! Chooses between the restricted and the full projection of an entity. The
//! choice is read from the [`Decision`] that gated the access, so visibility
//! can never disagree with the permission check.

use crate::access_control::evaluator::Decision;
use crate::access_control::types::{Action, ObjectType, Role, RoleRule};
use crate::domain::{Comment, Post, User, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Visibility tier of a granted decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Restricted,
    Full,
}

impl Visibility {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Visibility::Restricted => "restricted",
            Visibility::Full => "full",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An entity with a public and a complete view
pub trait Projectable {
    type Full: Serialize;
    type Restricted: Serialize;

    fn full(&self) -> Self::Full;

    fn restricted(&self) -> Self::Restricted;
}

/// The projection handed to the serialization layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Representation<F, R> {
    Full(F),
    Restricted(R),
}

impl<F: Serialize, R: Serialize> Representation<F, R> {
    pub fn visibility(&self) -> Visibility {
        match self {
            Representation::Full(_) => Visibility::Full,
            Representation::Restricted(_) => Visibility::Restricted,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Shorthand for an entity's representation type
pub type RepresentationOf<E> =
    Representation<<E as Projectable>::Full, <E as Projectable>::Restricted>;

/// Project `entity` according to `decision`
pub fn project<E: Projectable>(entity: &E, decision: &Decision) -> RepresentationOf<E> {
    match decision.visibility() {
        Visibility::Full => Representation::Full(entity.full()),
        Visibility::Restricted => Representation::Restricted(entity.restricted()),
    }
}

/// Project every entity of a collection under one decision
pub fn project_all<E: Projectable>(
    entities: &[E],
    decision: &Decision,
) -> Vec<RepresentationOf<E>> {
    entities.iter().map(|e| project(e, decision)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserFullView {
    #[serde(flatten)]
    pub public: UserView,
    pub role: Role,
    pub is_active: bool,
}

impl Projectable for User {
    type Full = UserFullView;
    type Restricted = UserView;

    fn full(&self) -> UserFullView {
        UserFullView {
            public: self.restricted(),
            role: self.role,
            is_active: self.is_active,
        }
    }

    fn restricted(&self) -> UserView {
        UserView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostFullView {
    #[serde(flatten)]
    pub public: PostView,
    pub author_id: UserId,
}

impl Projectable for Post {
    type Full = PostFullView;
    type Restricted = PostView;

    fn full(&self) -> PostFullView {
        PostFullView {
            public: self.restricted(),
            author_id: self.author_id,
        }
    }

    fn restricted(&self) -> PostView {
        PostView {
            id: self.id,
            content: self.content.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentFullView {
    #[serde(flatten)]
    pub public: CommentView,
    pub author_id: UserId,
}

impl Projectable for Comment {
    type Full = CommentFullView;
    type Restricted = CommentView;

    fn full(&self) -> CommentFullView {
        CommentFullView {
            public: self.restricted(),
            author_id: self.author_id,
        }
    }

    fn restricted(&self) -> CommentView {
        CommentView {
            id: self.id,
            post_id: self.post_id,
            content: self.content.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleView {
    pub role: Role,
    pub object_type: ObjectType,
    pub action: Action,
    pub owned: bool,
    pub allowed: bool,
}

impl Projectable for RoleRule {
    type Full = RoleRule;
    type Restricted = RuleView;

    fn full(&self) -> RoleRule {
        *self
    }

    fn restricted(&self) -> RuleView {
        RuleView {
            role: self.key.role,
            object_type: self.key.object_type,
            action: self.key.action,
            owned: self.key.owned,
            allowed: self.allowed,
        }
    }
}
