//! User roles, explicit permission flags, and the acting identity.
//!
//! Roles form a total order. The order is held once in [`ROLE_RANKS`] so
//! every comparison in the crate goes through [`Role::rank`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ParseEnumError};
use crate::types::{DbId, Timestamp};

pub const ROLE_VIEWER: &str = "viewer";
pub const ROLE_EDITOR: &str = "editor";
pub const ROLE_MODERATOR: &str = "moderator";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_OWNER: &str = "owner";

/// A user's role. Ordered `Viewer < Editor < Moderator < Admin < Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Editor,
    Moderator,
    Admin,
    Owner,
}

/// Rank lookup, indexed in declaration order.
const ROLE_RANKS: [(Role, u8); 5] = [
    (Role::Viewer, 0),
    (Role::Editor, 1),
    (Role::Moderator, 2),
    (Role::Admin, 3),
    (Role::Owner, 4),
];

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Viewer,
        Role::Editor,
        Role::Moderator,
        Role::Admin,
        Role::Owner,
    ];

    pub fn rank(self) -> u8 {
        ROLE_RANKS[self as usize].1
    }

    /// `true` when this role is `other` or above it.
    pub fn at_least(self, other: Role) -> bool {
        self.rank() >= other.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => ROLE_VIEWER,
            Role::Editor => ROLE_EDITOR,
            Role::Moderator => ROLE_MODERATOR,
            Role::Admin => ROLE_ADMIN,
            Role::Owner => ROLE_OWNER,
        }
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_VIEWER => Ok(Role::Viewer),
            ROLE_EDITOR => Ok(Role::Editor),
            ROLE_MODERATOR => Ok(Role::Moderator),
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_OWNER => Ok(Role::Owner),
            other => Err(ParseEnumError::new("role", other)),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Explicit permission flags issued alongside the role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_delete: bool,
    #[serde(default)]
    pub can_protect: bool,
    #[serde(default)]
    pub can_ban: bool,
    #[serde(default)]
    pub can_manage_users: bool,
}

impl Permissions {
    /// The flags a role carries when the identity service sends none.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Viewer => Self::default(),
            Role::Editor => Self {
                can_edit: true,
                ..Self::default()
            },
            Role::Moderator => Self {
                can_edit: true,
                can_delete: true,
                can_protect: true,
                can_ban: true,
                can_manage_users: false,
            },
            Role::Admin | Role::Owner => Self {
                can_edit: true,
                can_delete: true,
                can_protect: true,
                can_ban: true,
                can_manage_users: true,
            },
        }
    }
}

/// The verified identity performing an operation.
///
/// Anonymous callers have no `user_id` and the `viewer` role; whether they
/// may edit unprotected pages is decided by their `permissions.can_edit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<DbId>,
    pub username: String,
    pub role: Role,
    pub permissions: Permissions,
    /// Lifetime edit count, used for the autoconfirmed check.
    pub edits: i64,
    pub created_at: Option<Timestamp>,
    pub is_banned: bool,
}

impl Actor {
    pub fn anonymous(can_edit: bool) -> Self {
        Self {
            user_id: None,
            username: "anonymous".to_string(),
            role: Role::Viewer,
            permissions: Permissions {
                can_edit,
                ..Permissions::default()
            },
            edits: 0,
            created_at: None,
            is_banned: false,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn at_least(&self, role: Role) -> bool {
        !self.is_anonymous() && self.role.at_least(role)
    }

    /// The caller's user id, or `Unauthorized` for anonymous callers.
    pub fn require_user(&self) -> Result<DbId, CoreError> {
        self.user_id
            .ok_or_else(|| CoreError::Unauthorized("You must be logged in".into()))
    }

    /// Key identifying this actor's edit-rate bucket.
    pub fn rate_key(&self) -> String {
        match self.user_id {
            Some(id) => format!("user:{id}"),
            None => format!("anon:{}", self.username),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
