//! SQLite rule store implementation.

use super::RuleStore;
use crate::access_control::types::{Action, ObjectType, Role, RoleRule, RuleKey, RuleUpdate};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS role_rules (
    role TEXT NOT NULL,
    object_type TEXT NOT NULL,
    action TEXT NOT NULL,
    owned INTEGER NOT NULL,
    allowed INTEGER NOT NULL,
    full_access INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (role, object_type, action, owned)
);
"#;

const SELECT_COLUMNS: &str =
    "SELECT role, object_type, action, owned, allowed, full_access FROM role_rules";

/// SQLite-backed rule store.
///
/// The connection is shared behind a mutex; every call runs on the blocking
/// thread pool so the async caller is never stalled by disk I/O.
#[derive(Clone)]
pub struct SqliteRuleStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRuleStore {
    /// Open or create a rule store at the given path.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = tokio::task::spawn_blocking(move || Connection::open(path))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))??;
        Self::from_connection(conn)
    }

    /// Create an in-memory rule store (useful for testing).
    pub fn in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(|e| e.into_inner());
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn select_rule(conn: &Connection, key: RuleKey) -> StoreResult<Option<RoleRule>> {
    let raw = conn
        .query_row(
            &format!(
                "{SELECT_COLUMNS} \
                 WHERE role = ?1 AND object_type = ?2 AND action = ?3 AND owned = ?4"
            ),
            params![
                key.role.as_str(),
                key.object_type.as_str(),
                key.action.as_str(),
                key.owned
            ],
            RawRule::from_row,
        )
        .optional()?;
    raw.map(RawRule::into_rule).transpose()
}

#[async_trait]
impl RuleStore for SqliteRuleStore {
    async fn get(&self, key: RuleKey) -> StoreResult<RoleRule> {
        self.with_conn(move |conn| {
            select_rule(conn, key)?.ok_or(StoreError::NotFound { key })
        })
            .await
    }

    async fn list(&self) -> StoreResult<Vec<RoleRule>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(SELECT_COLUMNS)?;
            let raw = stmt
                .query_map([], RawRule::from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            let mut rules = raw
                .into_iter()
                .map(RawRule::into_rule)
                .collect::<StoreResult<Vec<_>>>()?;
            rules.sort_by_key(|r| r.key);
            Ok(rules)
        })
        .await
    }

    async fn insert(&self, rule: RoleRule) -> StoreResult<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO role_rules (role, object_type, action, owned, allowed, full_access) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rule_params(&rule),
            )
            .map_err(StoreError::from_sqlite)?;
            Ok(())
        })
        .await
    }

    async fn insert_missing(&self, rules: &[RoleRule]) -> StoreResult<usize> {
        let rules = rules.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let mut inserted = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO role_rules \
                     (role, object_type, action, owned, allowed, full_access) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?;
                for rule in &rules {
                    inserted += stmt.execute(rule_params(rule)).map_err(StoreError::from_sqlite)?;
                }
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
    }

    async fn update(&self, key: RuleKey, update: RuleUpdate) -> StoreResult<RoleRule> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let mut rule = select_rule(&tx, key)?.ok_or(StoreError::NotFound { key })?;
            rule.apply(&update);
            tx.execute(
                "UPDATE role_rules SET allowed = ?5, full_access = ?6 \
                 WHERE role = ?1 AND object_type = ?2 AND action = ?3 AND owned = ?4",
                rule_params(&rule),
            )
            .map_err(StoreError::from_sqlite)?;
            tx.commit()?;
            Ok(rule)
        })
        .await
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

fn rule_params(rule: &RoleRule) -> (&'static str, &'static str, &'static str, bool, bool, bool) {
    (
        rule.key.role.as_str(),
        rule.key.object_type.as_str(),
        rule.key.action.as_str(),
        rule.key.owned,
        rule.allowed,
        rule.full_access,
    )
}

/// A row as stored, before enum parsing
struct RawRule {
    role: String,
    object_type: String,
    action: String,
    owned: bool,
    allowed: bool,
    full_access: bool,
}

impl RawRule {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            role: row.get(0)?,
            object_type: row.get(1)?,
            action: row.get(2)?,
            owned: row.get(3)?,
            allowed: row.get(4)?,
            full_access: row.get(5)?,
        })
    }

    fn into_rule(self) -> StoreResult<RoleRule> {
        let role = Role::try_parse(&self.role)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown role '{}'", self.role)))?;
        let object_type = ObjectType::try_parse(&self.object_type).ok_or_else(|| {
            StoreError::Corrupt(format!("unknown object type '{}'", self.object_type))
        })?;
        let action = Action::try_parse(&self.action)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown action '{}'", self.action)))?;

        Ok(RoleRule::new(
            RuleKey::new(role, object_type, action, self.owned),
            self.allowed,
            self.full_access,
        ))
    }
}
