//! Rule resolver
//!
//! Picks the owned or the alien rule of a [`RuleInfo`] pair. Ownership is
//! decided up front from the target: it selects which rule applies and is
//! never used to override a denial afterwards.

use crate::access_control::types::{RoleRule, RuleInfo};
use crate::domain::{Actor, HasOwner};
use std::fmt;
use tracing::trace;

/// What an action is aimed at
#[derive(Clone, Copy)]
pub enum Target<'a> {
    /// A concrete, already loaded object
    Object(&'a dyn HasOwner),
    /// The actor's own record when no object exists yet (create, "me")
    Own,
    /// Others' records when there is no single object (listing)
    Others,
}

impl<'a> Target<'a> {
    pub fn object(entity: &'a dyn HasOwner) -> Self {
        Target::Object(entity)
    }

    /// Whether the owned rule governs this target for the given actor
    pub fn is_owned_by(&self, actor: &Actor) -> bool {
        match self {
            Target::Object(entity) => actor.owns(*entity),
            Target::Own => true,
            Target::Others => false,
        }
    }
}

impl fmt::Debug for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Object(entity) => f
                .debug_struct("Object")
                .field("object_type", &entity.object_type())
                .field("owner_id", &entity.owner_id())
                .finish(),
            Target::Own => write!(f, "Own"),
            Target::Others => write!(f, "Others"),
        }
    }
}

/// Select the rule that applies to `actor` acting on `target`.
///
/// Returns the owned rule when the actor owns the target, otherwise the alien
/// rule. Ownerless objects always resolve to the alien rule.
pub fn resolve(rule_info: &RuleInfo, actor: &Actor, target: Target<'_>) -> RoleRule {
    let owned = target.is_owned_by(actor);
    trace!(actor = %actor.id, owned, ?target, "Resolved rule ownership");

    if owned {
        rule_info.owned_rule
    } else {
        rule_info.alien_rule
    }
}
