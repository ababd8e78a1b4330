//! Social network RBAC decision engine
//!
//! Decides whether an authenticated actor may perform an action on a users,
//! posts, comments or role_rules object, and how much of the result they see.
//!
//! ## Features
//!
//! - **Flat permission table** keyed by `(role, object_type, action, owned)`
//! - **Ownership-aware resolution** - acting on one's own object uses the
//!   owned rule, anything else the alien rule
//! - **Visibility tiers** - a granted decision selects the full or the
//!   restricted projection of the entity
//! - **SQLite or in-memory rule stores**, with an optional read-through cache
//!
//! ## Decision Flow
//!
//! ```text
//! actor -> fetch rule pair -> resolve by ownership -> check -> project
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use social_rbac::access_control::{AccessEvaluator, Action, ObjectType, Role, Target, project};
//! use social_rbac::domain::{Actor, Post};
//! use social_rbac::store::{InMemoryRuleStore, RuleRepository, default_rules};
//!
//! # async fn run() -> Result<(), social_rbac::error::AccessError> {
//! let store = Arc::new(InMemoryRuleStore::from_rules(default_rules()));
//! let evaluator = AccessEvaluator::new(RuleRepository::new(store));
//!
//! let actor = Actor::new(uuid::Uuid::new_v4(), Role::User);
//! let post = Post::new(actor.id, "hello");
//!
//! let decision = evaluator
//!     .evaluate(ObjectType::Posts, Action::Read, Some(&actor), Target::object(&post), false)
//!     .await?;
//! let body = project(&post, &decision);
//! # let _ = body;
//! # Ok(())
//! # }
//! ```

pub mod access_control;
pub mod config;
pub mod domain;
pub mod error;
pub mod store;

// Re-export main types
pub use access_control::{AccessEvaluator, Decision, Policies};
pub use config::{AppConfig, load_config};
pub use error::{AccessError, AppError, Result, StoreError};
pub use store::{RuleRepository, RuleStore};
