//! Access evaluator
//!
//! Composes the decision pipeline for one request:
//!
//! ```text
//! Unresolved -> RuleFetched -> RuleResolved -> Decided -> Granted | Denied
//! ```
//!
//! Each step's failure short-circuits the rest. Nothing is retried: a
//! missing rule or a denial is the final answer for the request.

use crate::access_control::resolver::{Target, resolve};
use crate::access_control::shaper::Visibility;
use crate::access_control::types::{Action, ObjectType, RoleRule};
use crate::domain::Actor;
use crate::error::{AccessError, AccessResult};
use crate::store::RuleRepository;
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of a granted access check
///
/// Carries the rule that granted access so the response can be shaped from
/// the same decision that gated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// The rule that permitted the action
    pub rule: RoleRule,
}

impl Decision {
    /// Whether the actor receives the complete representation
    pub fn full_access(&self) -> bool {
        self.rule.full_access
    }

    pub fn visibility(&self) -> Visibility {
        if self.rule.full_access {
            Visibility::Full
        } else {
            Visibility::Restricted
        }
    }
}

/// Whether `rule` permits its action, optionally demanding full access
pub const fn is_permitted(rule: &RoleRule, require_full_access: bool) -> bool {
    rule.allowed && (!require_full_access || rule.full_access)
}

/// Check a single resolved rule.
///
/// Succeeds iff the rule is allowed and, when `require_full_access` is set,
/// also grants full access.
pub fn check(rule: RoleRule, require_full_access: bool) -> AccessResult<Decision> {
    if is_permitted(&rule, require_full_access) {
        Ok(Decision { rule })
    } else {
        info!(
            key = %rule.key,
            require_full_access,
            "Access denied by rule"
        );
        Err(AccessError::denied(rule.action(), rule.object_type()))
    }
}

/// Renders access decisions against the rule repository
#[derive(Clone)]
pub struct AccessEvaluator {
    repository: RuleRepository,
}

impl AccessEvaluator {
    pub fn new(repository: RuleRepository) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &RuleRepository {
        &self.repository
    }

    /// Decide whether `actor` may perform `action` on `target`.
    ///
    /// `require_full_access` is chosen per call site; hard deletes set it
    /// while soft deletes of the same object type do not.
    pub async fn evaluate(
        &self,
        object_type: ObjectType,
        action: Action,
        actor: Option<&Actor>,
        target: Target<'_>,
        require_full_access: bool,
    ) -> AccessResult<Decision> {
        let Some(actor) = actor else {
            debug!(%object_type, %action, "Rejecting unauthenticated evaluation");
            return Err(AccessError::Unauthenticated);
        };

        let rule = if object_type.has_owner() {
            let rule_info = self
                .repository
                .fetch_pair(actor.role, object_type, action)
                .await?;
            resolve(&rule_info, actor, target)
        } else {
            // Ownerless types only carry the un-owned row.
            self.repository
                .fetch(actor.role, object_type, action, false)
                .await?
        };

        debug!(
            role = %actor.role,
            %object_type,
            %action,
            owned = rule.owned(),
            allowed = rule.allowed,
            "Evaluating access"
        );

        check(rule, require_full_access)
    }
}
