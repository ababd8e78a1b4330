//! Access control types
//!
//! The flat permission table is keyed by `(role, object_type, action, owned)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity class assigned to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Manager,
    Admin,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "manager" => Some(Role::Manager),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn all() -> &'static [Role] {
        &[Role::User, Role::Manager, Role::Admin]
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s).ok_or_else(|| format!("unknown role '{s}'"))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resource kind governed by the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Users,
    Posts,
    Comments,
    RoleRules,
}

impl ObjectType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Users => "users",
            ObjectType::Posts => "posts",
            ObjectType::Comments => "comments",
            ObjectType::RoleRules => "role_rules",
        }
    }

    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "users" => Some(ObjectType::Users),
            "posts" => Some(ObjectType::Posts),
            "comments" => Some(ObjectType::Comments),
            "role_rules" => Some(ObjectType::RoleRules),
            _ => None,
        }
    }

    pub fn all() -> &'static [ObjectType] {
        &[
            ObjectType::Users,
            ObjectType::Posts,
            ObjectType::Comments,
            ObjectType::RoleRules,
        ]
    }

    /// Whether objects of this type can have an owner at all.
    ///
    /// Ownerless types are stored with un-owned rows only.
    pub const fn has_owner(&self) -> bool {
        !matches!(self, ObjectType::RoleRules)
    }
}

impl FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s).ok_or_else(|| format!("unknown object type '{s}'"))
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operation performed on an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Action::Create),
            "read" => Some(Action::Read),
            "update" => Some(Action::Update),
            "delete" => Some(Action::Delete),
            _ => None,
        }
    }

    pub fn all() -> &'static [Action] {
        &[Action::Create, Action::Read, Action::Update, Action::Delete]
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s).ok_or_else(|| format!("unknown action '{s}'"))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Primary key of a rule row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleKey {
    pub role: Role,
    pub object_type: ObjectType,
    pub action: Action,
    /// `true` when the rule governs the actor's own objects
    pub owned: bool,
}

impl RuleKey {
    pub const fn new(role: Role, object_type: ObjectType, action: Action, owned: bool) -> Self {
        Self {
            role,
            object_type,
            action,
            owned,
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.role,
            self.object_type,
            self.action,
            if self.owned { "owned" } else { "alien" }
        )
    }
}

/// A single permission record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRule {
    #[serde(flatten)]
    pub key: RuleKey,
    /// Whether the action is permitted under this ownership condition
    pub allowed: bool,
    /// Whether a permitted actor receives the complete representation
    #[serde(default)]
    pub full_access: bool,
}

impl RoleRule {
    pub const fn new(key: RuleKey, allowed: bool, full_access: bool) -> Self {
        Self {
            key,
            allowed,
            full_access,
        }
    }

    pub const fn role(&self) -> Role {
        self.key.role
    }

    pub const fn object_type(&self) -> ObjectType {
        self.key.object_type
    }

    pub const fn action(&self) -> Action {
        self.key.action
    }

    pub const fn owned(&self) -> bool {
        self.key.owned
    }

    /// Apply a partial administrative update
    pub fn apply(&mut self, update: &RuleUpdate) {
        if let Some(allowed) = update.allowed {
            self.allowed = allowed;
        }
        if let Some(full_access) = update.full_access {
            self.full_access = full_access;
        }
    }
}

/// Partial update of a rule's permission flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleUpdate {
    #[serde(default)]
    pub allowed: Option<bool>,
    #[serde(default)]
    pub full_access: Option<bool>,
}

impl RuleUpdate {
    pub fn is_empty(&self) -> bool {
        self.allowed.is_none() && self.full_access.is_none()
    }
}

/// Owned and alien rules fetched together for one `(role, object_type, action)`
///
/// Built per request and discarded once the decision is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleInfo {
    pub owned_rule: RoleRule,
    pub alien_rule: RoleRule,
}

impl RuleInfo {
    /// Pair two rules, returning `None` unless they share role, object type
    /// and action and differ in ownership as `(owned, alien)`.
    pub fn new(owned_rule: RoleRule, alien_rule: RoleRule) -> Option<Self> {
        let (o, a) = (owned_rule.key, alien_rule.key);
        let same_triple =
            o.role == a.role && o.object_type == a.object_type && o.action == a.action;
        (same_triple && o.owned && !a.owned).then_some(Self {
            owned_rule,
            alien_rule,
        })
    }
}
