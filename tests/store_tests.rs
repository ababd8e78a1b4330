//! Rule store integration tests
//!
//! Exercises the SQLite backend on disk, seeding, configuration-driven
//! store construction and the read-through cache.

use std::sync::Arc;

use social_rbac::access_control::{Action, ObjectType, Role, RoleRule, RuleKey, RuleUpdate};
use social_rbac::config::{StoreBackend, StoreConfig};
use social_rbac::error::{AccessError, StoreError};
use social_rbac::store::{
    CachedRuleStore, InMemoryRuleStore, RuleRepository, RuleStore, SqliteRuleStore,
    default_rules, load_seed_file, open_store, parse_seed, seed_store,
};
use tempfile::tempdir;

const SEED_TOML: &str = r#"
[[rules]]
role = "user"
object_type = "comments"
action = "read"
owned = true
allowed = true
full_access = true

[[rules]]
role = "user"
object_type = "comments"
action = "read"
owned = false
allowed = true

[[rules]]
role = "admin"
object_type = "role_rules"
action = "update"
owned = false
allowed = true
full_access = true
"#;

// =============================================================================
// SQLite on disk
// =============================================================================

mod sqlite_file {
    use super::*;

    #[tokio::test]
    async fn test_rules_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.db");

        {
            let store = SqliteRuleStore::open(&path).await.unwrap();
            let inserted = seed_store(&store, &default_rules()).await.unwrap();
            assert_eq!(inserted, default_rules().len());
        }

        let store = SqliteRuleStore::open(&path).await.unwrap();
        let rules = store.list().await.unwrap();
        assert_eq!(rules.len(), default_rules().len());
    }

    #[tokio::test]
    async fn test_seeding_twice_inserts_nothing() {
        let dir = tempdir().unwrap();
        let store = SqliteRuleStore::open(dir.path().join("rules.db"))
            .await
            .unwrap();

        let rules = default_rules();
        assert_eq!(seed_store(&store, &rules).await.unwrap(), rules.len());
        assert_eq!(seed_store(&store, &rules).await.unwrap(), 0);
        assert_eq!(store.list().await.unwrap().len(), rules.len());
    }

    #[tokio::test]
    async fn test_reseed_keeps_admin_changes() {
        let dir = tempdir().unwrap();
        let store = SqliteRuleStore::open(dir.path().join("rules.db"))
            .await
            .unwrap();
        seed_store(&store, &default_rules()).await.unwrap();

        let key = RuleKey::new(Role::User, ObjectType::Posts, Action::Update, false);
        store
            .update(
                key,
                RuleUpdate {
                    allowed: Some(true),
                    full_access: None,
                },
            )
            .await
            .unwrap();

        seed_store(&store, &default_rules()).await.unwrap();
        assert!(store.get(key).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_list_is_sorted_by_key() {
        let store = SqliteRuleStore::in_memory().unwrap();
        seed_store(&store, &default_rules()).await.unwrap();

        let keys: Vec<_> = store.list().await.unwrap().iter().map(|r| r.key).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}

// =============================================================================
// Seed files
// =============================================================================

mod seed_files {
    use super::*;

    #[test]
    fn test_parse_seed_defaults_full_access() {
        let rules = parse_seed(SEED_TOML).unwrap();
        assert_eq!(rules.len(), 3);

        let alien = rules
            .iter()
            .find(|r| r.object_type() == ObjectType::Comments && !r.owned())
            .unwrap();
        assert!(alien.allowed);
        assert!(!alien.full_access);
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let doubled = format!("{SEED_TOML}\n{SEED_TOML}");
        assert!(matches!(parse_seed(&doubled), Err(StoreError::Seed(_))));
    }

    #[test]
    fn test_unknown_role_rejected() {
        let bad = r#"
[[rules]]
role = "guest"
object_type = "posts"
action = "read"
owned = false
allowed = true
"#;
        assert!(matches!(parse_seed(bad), Err(StoreError::Seed(_))));
    }

    #[test]
    fn test_load_seed_file_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(&path, SEED_TOML).unwrap();

        assert_eq!(load_seed_file(&path).unwrap().len(), 3);
    }

    #[test]
    fn test_load_missing_seed_file_is_io_error() {
        let result = load_seed_file("/nonexistent/rules.toml");
        assert!(matches!(result, Err(StoreError::Io(_))));
    }

    #[tokio::test]
    async fn test_seeded_rules_drive_decisions() {
        let store = Arc::new(InMemoryRuleStore::new());
        seed_store(&*store, &parse_seed(SEED_TOML).unwrap())
            .await
            .unwrap();
        let repository = RuleRepository::new(store);

        let info = repository
            .fetch_pair(Role::User, ObjectType::Comments, Action::Read)
            .await
            .unwrap();
        assert!(info.owned_rule.full_access);
        assert!(!info.alien_rule.full_access);

        let err = repository
            .fetch_pair(Role::User, ObjectType::Posts, Action::Read)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::RuleNotFound { .. }));
    }
}

// =============================================================================
// Store construction and caching
// =============================================================================

mod construction {
    use super::*;

    #[tokio::test]
    async fn test_open_memory_store() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            ..StoreConfig::default()
        };

        let store = open_store(&config).await.unwrap();
        assert_eq!(store.backend(), "memory");
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_cached_sqlite_store() {
        let dir = tempdir().unwrap();
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            path: dir.path().join("rules.db").to_string_lossy().into_owned(),
            cache: true,
            ..StoreConfig::default()
        };

        let store = open_store(&config).await.unwrap();
        assert_eq!(store.backend(), "cached");

        seed_store(store.as_ref(), &default_rules()).await.unwrap();
        let key = RuleKey::new(Role::Manager, ObjectType::Users, Action::Delete, false);
        assert!(store.get(key).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_cache_sees_updates() {
        let inner = SqliteRuleStore::in_memory().unwrap();
        seed_store(&inner, &default_rules()).await.unwrap();
        let cached = CachedRuleStore::new(inner);

        let key = RuleKey::new(Role::User, ObjectType::Comments, Action::Delete, false);
        assert!(!cached.get(key).await.unwrap().allowed);
        assert_eq!(cached.cached_len(), 1);

        let updated: RoleRule = cached
            .update(
                key,
                RuleUpdate {
                    allowed: Some(true),
                    full_access: Some(false),
                },
            )
            .await
            .unwrap();
        assert!(updated.allowed);
        assert!(cached.get(key).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_update_of_missing_rule_is_not_found() {
        let store = SqliteRuleStore::in_memory().unwrap();
        let key = RuleKey::new(Role::Admin, ObjectType::RoleRules, Action::Delete, true);

        let err = store
            .update(
                key,
                RuleUpdate {
                    allowed: Some(true),
                    full_access: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
