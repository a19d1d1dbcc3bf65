//! Role scale for group membership.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Position on a group's linear privilege scale.
///
/// Each role has a stable numeric weight (what backends persist); a lower
/// weight means more privilege. `Ord` follows privilege, so a more privileged
/// role compares greater: `Owner > Moderator > Member > Pending`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Exactly one per group. Never changed, only removed with the group.
    Owner,
    Moderator,
    Member,
    /// Sentinel for an unapproved join request; not a member yet.
    Pending,
}

/// Error type for parsing Role from string or weight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(pub String);

impl std::fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid role: {}", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "moderator" => Ok(Role::Moderator),
            "member" => Ok(Role::Member),
            "pending" => Ok(Role::Pending),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

impl Role {
    /// All roles, most privileged first.
    pub const ALL: [Role; 4] = [Role::Owner, Role::Moderator, Role::Member, Role::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Moderator => "moderator",
            Role::Member => "member",
            Role::Pending => "pending",
        }
    }

    /// Stored access level.
    pub fn weight(&self) -> i64 {
        match self {
            Role::Owner => 0,
            Role::Moderator => 10,
            Role::Member => 50,
            Role::Pending => 100,
        }
    }

    pub fn from_weight(weight: i64) -> Result<Self, ParseRoleError> {
        Role::ALL
            .into_iter()
            .find(|r| r.weight() == weight)
            .ok_or_else(|| ParseRoleError(weight.to_string()))
    }

    /// Total order on privilege; `Greater` means `a` is more privileged.
    pub fn compare(a: Role, b: Role) -> Ordering {
        a.cmp(&b)
    }

    /// Check if this role carries at least the privilege of `required`
    pub fn is_at_least(&self, required: Role) -> bool {
        *self >= required
    }

    /// Strictly more privileged than `other`.
    pub fn outranks(&self, other: Role) -> bool {
        *self > other
    }

    /// Everything but a pending request counts as membership.
    pub fn is_member(&self) -> bool {
        *self != Role::Pending
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        other.weight().cmp(&self.weight())
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
