//! Endpoint policies
//!
//! The access patterns shared by every resource endpoint, expressed once on
//! top of [`AccessEvaluator`]:
//!
//! | Endpoint            | Action | Rule used                     |
//! |---------------------|--------|-------------------------------|
//! | create              | create | owned                         |
//! | list                | read   | alien                         |
//! | read own ("me")     | read   | owned                         |
//! | read / update one   | r / u  | resolved from the object      |
//! | soft delete         | delete | resolved, `allowed` only      |
//! | hard delete         | delete | resolved, `full_access` too   |

use crate::access_control::evaluator::{AccessEvaluator, Decision};
use crate::access_control::resolver::Target;
use crate::access_control::types::{Action, ObjectType};
use crate::domain::{Actor, HasOwner};
use crate::error::AccessResult;

/// Two-tier delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Reversible removal (deactivation); needs `allowed`
    #[default]
    Soft,
    /// Irreversible removal with all data; needs `allowed` and `full_access`
    Hard,
}

impl DeleteMode {
    pub const fn requires_full_access(&self) -> bool {
        matches!(self, DeleteMode::Hard)
    }
}

#[derive(Clone)]
pub struct Policies {
    evaluator: AccessEvaluator,
}

impl Policies {
    pub fn new(evaluator: AccessEvaluator) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &AccessEvaluator {
        &self.evaluator
    }

    /// Creating a new object that will belong to the actor
    pub async fn create(
        &self,
        actor: Option<&Actor>,
        object_type: ObjectType,
    ) -> AccessResult<Decision> {
        self.evaluator
            .evaluate(object_type, Action::Create, actor, Target::Own, false)
            .await
    }

    /// Listing every object of a type
    pub async fn list(
        &self,
        actor: Option<&Actor>,
        object_type: ObjectType,
    ) -> AccessResult<Decision> {
        self.evaluator
            .evaluate(object_type, Action::Read, actor, Target::Others, false)
            .await
    }

    /// Reading the actor's own record
    pub async fn read_own(
        &self,
        actor: Option<&Actor>,
        object_type: ObjectType,
    ) -> AccessResult<Decision> {
        self.evaluator
            .evaluate(object_type, Action::Read, actor, Target::Own, false)
            .await
    }

    pub async fn read(
        &self,
        actor: Option<&Actor>,
        target: &dyn HasOwner,
    ) -> AccessResult<Decision> {
        self.on_object(Action::Read, actor, target, false).await
    }

    pub async fn update(
        &self,
        actor: Option<&Actor>,
        target: &dyn HasOwner,
    ) -> AccessResult<Decision> {
        self.on_object(Action::Update, actor, target, false).await
    }

    pub async fn delete(
        &self,
        actor: Option<&Actor>,
        target: &dyn HasOwner,
        mode: DeleteMode,
    ) -> AccessResult<Decision> {
        self.on_object(Action::Delete, actor, target, mode.requires_full_access())
            .await
    }

    /// The read decision used to shape the response after a create or update.
    ///
    /// Resolved against the entity as it is after the write, since a write
    /// may have changed its owner.
    pub async fn read_after_write(
        &self,
        actor: Option<&Actor>,
        entity: &dyn HasOwner,
    ) -> AccessResult<Decision> {
        self.read(actor, entity).await
    }

    async fn on_object(
        &self,
        action: Action,
        actor: Option<&Actor>,
        target: &dyn HasOwner,
        require_full_access: bool,
    ) -> AccessResult<Decision> {
        self.evaluator
            .evaluate(
                target.object_type(),
                action,
                actor,
                Target::Object(target),
                require_full_access,
            )
            .await
    }
}
