//! Rule seeding
//!
//! Rules are written once at deployment time, either from the built-in
//! default set or from a TOML seed file:
//!
//! ```toml
//! [[rules]]
//! role = "user"
//! object_type = "posts"
//! action = "read"
//! owned = false
//! allowed = true
//! full_access = false
//! ```

use super::RuleStore;
use crate::access_control::types::{Action, ObjectType, Role, RoleRule, RuleKey};
use crate::error::{StoreError, StoreResult};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// The default deployment rule set.
///
/// Owned rows exist for every role and every ownable object type; `role_rules`
/// has un-owned rows only.
pub fn default_rules() -> Vec<RoleRule> {
    let mut rules = Vec::new();

    for &role in Role::all() {
        for &object_type in ObjectType::all() {
            for &action in Action::all() {
                if object_type.has_owner() {
                    rules.push(RoleRule::new(
                        RuleKey::new(role, object_type, action, true),
                        true,
                        matches!(role, Role::Admin | Role::Manager),
                    ));
                }

                let (allowed, full_access) = match role {
                    Role::User => (action == Action::Read, false),
                    Role::Manager => (
                        action == Action::Read
                            || (action == Action::Delete && object_type != ObjectType::RoleRules),
                        true,
                    ),
                    Role::Admin => (true, true),
                };
                rules.push(RoleRule::new(
                    RuleKey::new(role, object_type, action, false),
                    allowed,
                    full_access,
                ));
            }
        }
    }

    rules
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    rules: Vec<SeedRule>,
}

#[derive(Debug, Deserialize)]
struct SeedRule {
    role: Role,
    object_type: ObjectType,
    action: Action,
    owned: bool,
    allowed: bool,
    #[serde(default)]
    full_access: bool,
}

/// Parse a TOML seed document. Duplicate keys are rejected.
pub fn parse_seed(toml_str: &str) -> StoreResult<Vec<RoleRule>> {
    let file: SeedFile = toml::from_str(toml_str).map_err(|e| StoreError::Seed(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(file.rules.len());
    for entry in file.rules {
        let key = RuleKey::new(entry.role, entry.object_type, entry.action, entry.owned);
        if !seen.insert(key) {
            return Err(StoreError::Seed(format!("duplicate rule {key}")));
        }
        rules.push(RoleRule::new(key, entry.allowed, entry.full_access));
    }
    Ok(rules)
}

/// Read and parse a TOML seed file
pub fn load_seed_file(path: impl AsRef<Path>) -> StoreResult<Vec<RoleRule>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_seed(&content)
}

/// Insert the given rules into the store, keeping rows that already exist.
///
/// Running it twice is harmless; the second run inserts nothing.
pub async fn seed_store(store: &dyn RuleStore, rules: &[RoleRule]) -> StoreResult<usize> {
    let inserted = store.insert_missing(rules).await?;
    info!(
        backend = store.backend(),
        inserted,
        total = rules.len(),
        "Seeded rule store"
    );
    Ok(inserted)
}
