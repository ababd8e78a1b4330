//! Access decision integration tests
//!
//! Covers the decision pipeline end to end:
//! - Authentication gate (anonymous actors never reach the store)
//! - Rule pair lookup and missing-rule reporting
//! - Ownership resolution for users, posts and comments
//! - The `allowed` / `full_access` check and per-call `require_full_access`
//! - Response shaping from the granted decision

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use social_rbac::access_control::{
    AccessEvaluator, Action, ObjectType, Representation, Role, RoleRule, RuleKey, RuleUpdate,
    Target, Visibility, project,
};
use social_rbac::domain::{Actor, Comment, Post, User};
use social_rbac::error::{AccessError, StoreResult};
use social_rbac::store::{InMemoryRuleStore, RuleRepository, RuleStore, default_rules};
use uuid::Uuid;

// =============================================================================
// Test Helpers
// =============================================================================

fn rule(
    role: Role,
    object_type: ObjectType,
    action: Action,
    owned: bool,
    allowed: bool,
    full_access: bool,
) -> RoleRule {
    RoleRule::new(
        RuleKey::new(role, object_type, action, owned),
        allowed,
        full_access,
    )
}

fn evaluator_with(rules: impl IntoIterator<Item = RoleRule>) -> AccessEvaluator {
    let store = Arc::new(InMemoryRuleStore::from_rules(rules));
    AccessEvaluator::new(RuleRepository::new(store))
}

fn user_actor() -> Actor {
    Actor::new(Uuid::new_v4(), Role::User)
}

/// Store wrapper counting lookups, to prove short-circuiting
struct CountingStore {
    inner: InMemoryRuleStore,
    gets: AtomicUsize,
}

#[async_trait]
impl RuleStore for CountingStore {
    async fn get(&self, key: RuleKey) -> StoreResult<RoleRule> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn list(&self) -> StoreResult<Vec<RoleRule>> {
        self.inner.list().await
    }

    async fn insert(&self, rule: RoleRule) -> StoreResult<()> {
        self.inner.insert(rule).await
    }

    async fn insert_missing(&self, rules: &[RoleRule]) -> StoreResult<usize> {
        self.inner.insert_missing(rules).await
    }

    async fn update(&self, key: RuleKey, update: RuleUpdate) -> StoreResult<RoleRule> {
        self.inner.update(key, update).await
    }

    fn backend(&self) -> &'static str {
        "counting"
    }
}

// =============================================================================
// 1. Comment read scenario
// =============================================================================

mod comment_read_scenario {
    use super::*;

    fn evaluator() -> AccessEvaluator {
        evaluator_with([
            rule(
                Role::User,
                ObjectType::Comments,
                Action::Read,
                true,
                true,
                true,
            ),
            rule(
                Role::User,
                ObjectType::Comments,
                Action::Read,
                false,
                true,
                false,
            ),
        ])
    }

    #[tokio::test]
    async fn test_reading_own_comment_is_full() {
        let actor = user_actor();
        let post = Post::new(Uuid::new_v4(), "a post");
        let comment = Comment::new(post.id, actor.id, "my comment");

        let decision = evaluator()
            .evaluate(
                ObjectType::Comments,
                Action::Read,
                Some(&actor),
                Target::object(&comment),
                false,
            )
            .await
            .unwrap();

        assert!(decision.rule.allowed);
        assert!(decision.full_access());
        assert!(matches!(
            project(&comment, &decision),
            Representation::Full(_)
        ));
    }

    #[tokio::test]
    async fn test_reading_foreign_comment_is_restricted() {
        let actor = user_actor();
        let post = Post::new(actor.id, "my post");
        let comment = Comment::new(post.id, Uuid::new_v4(), "someone else's comment");

        let decision = evaluator()
            .evaluate(
                ObjectType::Comments,
                Action::Read,
                Some(&actor),
                Target::object(&comment),
                false,
            )
            .await
            .unwrap();

        assert!(decision.rule.allowed);
        assert!(!decision.full_access());

        let repr = project(&comment, &decision);
        assert_eq!(repr.visibility(), Visibility::Restricted);
        let json = repr.to_json().unwrap();
        assert!(json.get("author_id").is_none());
        assert_eq!(json["content"], "someone else's comment");
    }
}

// =============================================================================
// 2. Two-tier user delete scenario
// =============================================================================

mod user_delete_scenario {
    use super::*;

    fn evaluator() -> AccessEvaluator {
        evaluator_with([
            rule(
                Role::User,
                ObjectType::Users,
                Action::Delete,
                true,
                true,
                false,
            ),
            rule(
                Role::User,
                ObjectType::Users,
                Action::Delete,
                false,
                false,
                false,
            ),
        ])
    }

    #[tokio::test]
    async fn test_hard_self_delete_is_denied() {
        let me = User::new("Erin", "erin@example.com", Role::User);
        let actor = Actor::from(&me);

        let err = evaluator()
            .evaluate(
                ObjectType::Users,
                Action::Delete,
                Some(&actor),
                Target::object(&me),
                true,
            )
            .await
            .unwrap_err();

        match err {
            AccessError::AccessDenied {
                action,
                object_type,
            } => {
                assert_eq!(action, Action::Delete);
                assert_eq!(object_type, ObjectType::Users);
            }
            other => panic!("expected AccessDenied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_soft_self_delete_is_granted() {
        let me = User::new("Erin", "erin@example.com", Role::User);
        let actor = Actor::from(&me);

        let decision = evaluator()
            .evaluate(
                ObjectType::Users,
                Action::Delete,
                Some(&actor),
                Target::object(&me),
                false,
            )
            .await
            .unwrap();

        assert!(decision.rule.owned());
    }

    #[tokio::test]
    async fn test_deleting_someone_else_is_denied() {
        let actor = user_actor();
        let other = User::new("Frank", "frank@example.com", Role::User);

        let err = evaluator()
            .evaluate(
                ObjectType::Users,
                Action::Delete,
                Some(&actor),
                Target::object(&other),
                false,
            )
            .await
            .unwrap_err();

        assert!(err.is_denied());
    }
}

// =============================================================================
// 3. Missing rules and unauthenticated actors
// =============================================================================

mod failure_taxonomy {
    use super::*;

    #[tokio::test]
    async fn test_manager_role_rules_create_pair_is_rule_not_found() {
        let store = Arc::new(InMemoryRuleStore::from_rules(default_rules()));
        let repository = RuleRepository::new(store);

        let err = repository
            .fetch_pair(Role::Manager, ObjectType::RoleRules, Action::Create)
            .await
            .unwrap_err();

        assert!(err.is_configuration_defect());
        assert!(!err.is_denied());
        match err {
            AccessError::RuleNotFound { key } => {
                assert!(key.owned);
                assert_eq!(key.role, Role::Manager);
                assert_eq!(key.object_type, ObjectType::RoleRules);
            }
            other => panic!("expected RuleNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_row_is_not_a_denial() {
        let evaluator = evaluator_with([rule(
            Role::User,
            ObjectType::Posts,
            Action::Update,
            false,
            true,
            false,
        )]);
        let actor = user_actor();
        let post = Post::new(actor.id, "mine");

        let err = evaluator
            .evaluate(
                ObjectType::Posts,
                Action::Update,
                Some(&actor),
                Target::object(&post),
                false,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AccessError::RuleNotFound { .. }));
    }

    #[tokio::test]
    async fn test_anonymous_never_reaches_store() {
        let store = Arc::new(CountingStore {
            inner: InMemoryRuleStore::from_rules(default_rules()),
            gets: AtomicUsize::new(0),
        });
        let evaluator = AccessEvaluator::new(RuleRepository::new(store.clone()));

        for &object_type in ObjectType::all() {
            for &action in Action::all() {
                let err = evaluator
                    .evaluate(object_type, action, None, Target::Others, false)
                    .await
                    .unwrap_err();
                assert!(matches!(err, AccessError::Unauthenticated));
            }
        }

        assert_eq!(store.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_owned_row_stops_before_alien_fetch() {
        let store = Arc::new(CountingStore {
            inner: InMemoryRuleStore::new(),
            gets: AtomicUsize::new(0),
        });
        let evaluator = AccessEvaluator::new(RuleRepository::new(store.clone()));
        let actor = user_actor();

        let result = evaluator
            .evaluate(
                ObjectType::Posts,
                Action::Read,
                Some(&actor),
                Target::Own,
                false,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
    }
}

// =============================================================================
// 4. Ownerless role_rules
// =============================================================================

mod role_rules {
    use super::*;

    #[tokio::test]
    async fn test_role_rules_use_unowned_row() {
        let evaluator = evaluator_with(default_rules());
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let target = rule(
            Role::User,
            ObjectType::RoleRules,
            Action::Read,
            false,
            true,
            false,
        );

        let decision = evaluator
            .evaluate(
                ObjectType::RoleRules,
                Action::Update,
                Some(&admin),
                Target::object(&target),
                false,
            )
            .await
            .unwrap();

        assert!(!decision.rule.owned());
        assert!(decision.full_access());
    }

    #[tokio::test]
    async fn test_manager_cannot_update_role_rules() {
        let evaluator = evaluator_with(default_rules());
        let manager = Actor::new(Uuid::new_v4(), Role::Manager);

        let err = evaluator
            .evaluate(
                ObjectType::RoleRules,
                Action::Update,
                Some(&manager),
                Target::Others,
                false,
            )
            .await
            .unwrap_err();

        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn test_own_target_on_role_rules_still_uses_unowned_row() {
        let evaluator = evaluator_with(default_rules());
        let manager = Actor::new(Uuid::new_v4(), Role::Manager);

        let decision = evaluator
            .evaluate(
                ObjectType::RoleRules,
                Action::Read,
                Some(&manager),
                Target::Own,
                false,
            )
            .await
            .unwrap();

        assert!(!decision.rule.owned());
    }
}

// =============================================================================
// 5. Properties over the default rule set
// =============================================================================

mod default_rule_set {
    use super::*;

    #[tokio::test]
    async fn test_fetch_pair_succeeds_for_every_ownable_triple() {
        let repository =
            RuleRepository::new(Arc::new(InMemoryRuleStore::from_rules(default_rules())));

        for &role in Role::all() {
            for &object_type in ObjectType::all().iter().filter(|t| t.has_owner()) {
                for &action in Action::all() {
                    let info = repository
                        .fetch_pair(role, object_type, action)
                        .await
                        .unwrap();

                    for (rule, owned) in [(info.owned_rule, true), (info.alien_rule, false)] {
                        assert_eq!(rule.role(), role);
                        assert_eq!(rule.object_type(), object_type);
                        assert_eq!(rule.action(), action);
                        assert_eq!(rule.owned(), owned);
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn test_resolution_follows_ownership() {
        let evaluator = evaluator_with(default_rules());

        for &role in Role::all() {
            let actor = Actor::new(Uuid::new_v4(), role);
            let own = Post::new(actor.id, "mine");
            let foreign = Post::new(Uuid::new_v4(), "theirs");

            let decision = evaluator
                .evaluate(
                    ObjectType::Posts,
                    Action::Read,
                    Some(&actor),
                    Target::object(&own),
                    false,
                )
                .await
                .unwrap();
            assert!(decision.rule.owned());

            let decision = evaluator
                .evaluate(
                    ObjectType::Posts,
                    Action::Read,
                    Some(&actor),
                    Target::object(&foreign),
                    false,
                )
                .await
                .unwrap();
            assert!(!decision.rule.owned());
        }
    }

    #[tokio::test]
    async fn test_evaluation_is_idempotent() {
        let evaluator = evaluator_with(default_rules());
        let actor = Actor::new(Uuid::new_v4(), Role::Manager);
        let post = Post::new(Uuid::new_v4(), "theirs");

        let first = evaluator
            .evaluate(
                ObjectType::Posts,
                Action::Delete,
                Some(&actor),
                Target::object(&post),
                false,
            )
            .await
            .unwrap();
        let second = evaluator
            .evaluate(
                ObjectType::Posts,
                Action::Delete,
                Some(&actor),
                Target::object(&post),
                false,
            )
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_user_cannot_update_foreign_post() {
        let evaluator = evaluator_with(default_rules());
        let actor = user_actor();
        let post = Post::new(Uuid::new_v4(), "theirs");

        let err = evaluator
            .evaluate(
                ObjectType::Posts,
                Action::Update,
                Some(&actor),
                Target::object(&post),
                false,
            )
            .await
            .unwrap_err();

        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn test_concurrent_evaluations_agree() {
        let evaluator = evaluator_with(default_rules());
        let actor = Actor::new(Uuid::new_v4(), Role::Admin);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let evaluator = evaluator.clone();
                tokio::spawn(async move {
                    let user = User::new("Gina", "gina@example.com", Role::User);
                    evaluator
                        .evaluate(
                            ObjectType::Users,
                            Action::Read,
                            Some(&actor),
                            Target::object(&user),
                            true,
                        )
                        .await
                        .map(|d| d.visibility())
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), Visibility::Full);
        }
    }
}
