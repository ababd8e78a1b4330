//! Access control module
//!
//! Role-based decisions over a flat permission table.
//!
//! ## Access Control Model
//!
//! Every rule is keyed by `(role, object_type, action, owned)` and carries two
//! flags, `allowed` and `full_access`. A decision runs in four steps:
//!
//! 1. **Authenticate** - an anonymous actor is rejected before any lookup
//! 2. **Fetch** - load the owned and alien rules for `(role, object_type, action)`
//! 3. **Resolve** - the owned rule applies when the actor owns the target,
//!    the alien rule otherwise
//! 4. **Check** - the rule must be `allowed`, and also `full_access` when the
//!    call site demands it
//!
//! A granted [`Decision`] then drives the [`Visibility`] of the response.
//!
//! ## Example Rule Set
//!
//! ```toml
//! [[rules]]
//! role = "user"
//! object_type = "comments"
//! action = "read"
//! owned = true
//! allowed = true
//! full_access = true
//!
//! [[rules]]
//! role = "user"
//! object_type = "comments"
//! action = "read"
//! owned = false
//! allowed = true
//! full_access = false
//! ```

pub mod evaluator;
pub mod policies;
pub mod resolver;
pub mod shaper;
pub mod types;

pub use evaluator::{AccessEvaluator, Decision, check, is_permitted};
pub use policies::{DeleteMode, Policies};
pub use resolver::{Target, resolve};
pub use shaper::{Projectable, Representation, Visibility, project, project_all};
pub use types::{Action, ObjectType, Role, RoleRule, RuleInfo, RuleKey, RuleUpdate};
