//! In-memory rule store

use super::RuleStore;
use crate::access_control::types::{RoleRule, RuleKey, RuleUpdate};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Rule table held in a `HashMap` behind a lock
#[derive(Default)]
pub struct InMemoryRuleStore {
    rules: RwLock<HashMap<RuleKey, RoleRule>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from rules; later duplicates replace earlier ones
    pub fn from_rules(rules: impl IntoIterator<Item = RoleRule>) -> Self {
        Self {
            rules: RwLock::new(rules.into_iter().map(|r| (r.key, r)).collect()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<RuleKey, RoleRule>> {
        self.rules.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<RuleKey, RoleRule>> {
        self.rules.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn get(&self, key: RuleKey) -> StoreResult<RoleRule> {
        self.read()
            .get(&key)
            .copied()
            .ok_or(StoreError::NotFound { key })
    }

    async fn list(&self) -> StoreResult<Vec<RoleRule>> {
        let mut rules: Vec<RoleRule> = self.read().values().copied().collect();
        rules.sort_by_key(|r| r.key);
        Ok(rules)
    }

    async fn insert(&self, rule: RoleRule) -> StoreResult<()> {
        let mut rules = self.write();
        if rules.contains_key(&rule.key) {
            return Err(StoreError::IntegrityViolation {
                message: format!("rule {} already exists", rule.key),
            });
        }
        rules.insert(rule.key, rule);
        Ok(())
    }

    async fn insert_missing(&self, new_rules: &[RoleRule]) -> StoreResult<usize> {
        let mut rules = self.write();
        let mut inserted = 0;
        for rule in new_rules {
            if !rules.contains_key(&rule.key) {
                rules.insert(rule.key, *rule);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn update(&self, key: RuleKey, update: RuleUpdate) -> StoreResult<RoleRule> {
        let mut rules = self.write();
        let rule = rules.get_mut(&key).ok_or(StoreError::NotFound { key })?;
        rule.apply(&update);
        Ok(*rule)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
