//! Read-through rule cache
//!
//! Caches successful lookups keyed by the rule's 4-tuple. Administrative
//! updates invalidate the affected key; misses are never cached so a rule
//! seeded later becomes visible immediately.
//!
//! A fill only lands if no update completed while its read was in flight,
//! so a row read before an update can never be cached after it.

use super::RuleStore;
use crate::access_control::types::{RoleRule, RuleKey, RuleUpdate};
use crate::error::StoreResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

#[derive(Default)]
struct CacheState {
    rules: HashMap<RuleKey, RoleRule>,
    /// Bumped after every update
    generation: u64,
}

pub struct CachedRuleStore<S> {
    inner: S,
    state: RwLock<CacheState>,
}

impl<S: RuleStore> CachedRuleStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Number of cached rules
    pub fn cached_len(&self) -> usize {
        self.read().rules.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn invalidate(&self, key: &RuleKey) {
        let mut state = self.write();
        state.generation += 1;
        if state.rules.remove(key).is_some() {
            trace!(%key, "Invalidated cached rule");
        }
    }
}

#[async_trait]
impl<S: RuleStore> RuleStore for CachedRuleStore<S> {
    async fn get(&self, key: RuleKey) -> StoreResult<RoleRule> {
        let (cached, generation) = {
            let state = self.read();
            (state.rules.get(&key).copied(), state.generation)
        };
        if let Some(rule) = cached {
            trace!(%key, "Rule cache hit");
            return Ok(rule);
        }

        let rule = self.inner.get(key).await?;

        let mut state = self.write();
        if state.generation == generation {
            state.rules.insert(key, rule);
        } else {
            trace!(%key, "Skipped cache fill raced by an update");
        }
        Ok(rule)
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
        let result = self.inner.update(key, update).await;
        self.invalidate(&key);
        result
    }

    fn backend(&self) -> &'static str {
        "cached"
    }
}
