//! Rule store and rule repository
//!
//! [`RuleStore`] is the persisted `(role, object_type, action, owned)` table.
//! [`RuleRepository`] sits on top of it and loads the one or two rows a
//! single decision needs, turning store failures into [`AccessError`]s.

pub mod cached;
pub mod memory;
pub mod seed;
pub mod sqlite;

pub use cached::CachedRuleStore;
pub use memory::InMemoryRuleStore;
pub use seed::{default_rules, load_seed_file, parse_seed, seed_store};
pub use sqlite::SqliteRuleStore;

use crate::access_control::types::{
    Action, ObjectType, Role, RoleRule, RuleInfo, RuleKey, RuleUpdate,
};
use crate::config::{StoreBackend, StoreConfig};
use crate::error::{AccessError, AccessResult, StoreError, StoreResult};
// async_trait required for dyn-compatibility with Arc<dyn RuleStore>
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Persisted permission table
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Fetch the rule with exactly this key
    async fn get(&self, key: RuleKey) -> StoreResult<RoleRule>;

    /// All rules, ordered by key
    async fn list(&self) -> StoreResult<Vec<RoleRule>>;

    /// Insert a new rule. An existing key is an `IntegrityViolation`.
    async fn insert(&self, rule: RoleRule) -> StoreResult<()>;

    /// Insert every rule whose key is not present yet, returning how many
    /// rows were added
    async fn insert_missing(&self, rules: &[RoleRule]) -> StoreResult<usize>;

    /// Apply an administrative update to an existing rule
    async fn update(&self, key: RuleKey, update: RuleUpdate) -> StoreResult<RoleRule>;

    /// Short backend name (for logging)
    fn backend(&self) -> &'static str;
}

/// Shared handle to a rule store
pub type SharedRuleStore = Arc<dyn RuleStore>;

#[async_trait]
impl<S: RuleStore + ?Sized> RuleStore for Arc<S> {
    async fn get(&self, key: RuleKey) -> StoreResult<RoleRule> {
        (**self).get(key).await
    }

    async fn list(&self) -> StoreResult<Vec<RoleRule>> {
        (**self).list().await
    }

    async fn insert(&self, rule: RoleRule) -> StoreResult<()> {
        (**self).insert(rule).await
    }

    async fn insert_missing(&self, rules: &[RoleRule]) -> StoreResult<usize> {
        (**self).insert_missing(rules).await
    }

    async fn update(&self, key: RuleKey, update: RuleUpdate) -> StoreResult<RoleRule> {
        (**self).update(key, update).await
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }
}

/// Open the rule store described by configuration
pub async fn open_store(config: &StoreConfig) -> StoreResult<SharedRuleStore> {
    let store: SharedRuleStore = match config.backend {
        StoreBackend::Sqlite => Arc::new(SqliteRuleStore::open(&config.path).await?),
        StoreBackend::Memory => Arc::new(InMemoryRuleStore::new()),
    };

    info!(backend = store.backend(), cache = config.cache, "Opened rule store");

    if config.cache {
        Ok(Arc::new(CachedRuleStore::new(store)))
    } else {
        Ok(store)
    }
}

/// Default bound on a single rule fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Loads the rules a decision needs
///
/// Every fetch is bounded by a timeout; expiry surfaces as
/// [`AccessError::Unavailable`], never as a missing rule or a denial.
#[derive(Clone)]
pub struct RuleRepository {
    store: SharedRuleStore,
    timeout: Duration,
}

impl RuleRepository {
    pub fn new(store: SharedRuleStore) -> Self {
        Self {
            store,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &SharedRuleStore {
        &self.store
    }

    /// Fetch the rule for an exact key
    pub async fn fetch(
        &self,
        role: Role,
        object_type: ObjectType,
        action: Action,
        owned: bool,
    ) -> AccessResult<RoleRule> {
        let key = RuleKey::new(role, object_type, action, owned);

        let result = match tokio::time::timeout(self.timeout, self.store.get(key)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };

        result.map_err(|e| {
            let err = AccessError::from(e);
            match &err {
                AccessError::RuleNotFound { key } => {
                    error!(%key, "Rule table is missing a required row");
                }
                AccessError::Unavailable(source) => {
                    warn!(%key, error = %source, "Rule fetch failed");
                }
                _ => {}
            }
            err
        })
    }

    /// Fetch both ownership variants for `(role, object_type, action)`.
    ///
    /// A missing row on either side fails the whole lookup.
    pub async fn fetch_pair(
        &self,
        role: Role,
        object_type: ObjectType,
        action: Action,
    ) -> AccessResult<RuleInfo> {
        let owned_rule = self.fetch(role, object_type, action, true).await?;
        let alien_rule = self.fetch(role, object_type, action, false).await?;

        debug!(%role, %object_type, %action, "Fetched rule pair");

        RuleInfo::new(owned_rule, alien_rule).ok_or_else(|| {
            AccessError::Unavailable(StoreError::Corrupt(format!(
                "store returned mismatched rules for ({role}, {object_type}, {action})"
            )))
        })
    }
}
