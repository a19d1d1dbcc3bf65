//! Membership types: one row per (group, user).

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{GroupName, Role, UserName};

/// Group membership record
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub group: GroupName,
    pub user: UserName,
    pub access: Role,
    pub added_on: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for inserting a membership
#[derive(Clone, Debug)]
pub struct NewMembership {
    pub group: GroupName,
    pub user: UserName,
    pub access: Role,
}

/// Which memberships of a group to list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MembershipFilter {
    /// Every role except Pending.
    Members,
    /// Pending requests only.
    Pending,
    All,
}

impl MembershipFilter {
    pub fn matches(&self, role: Role) -> bool {
        match self {
            MembershipFilter::Members => role.is_member(),
            MembershipFilter::Pending => role == Role::Pending,
            MembershipFilter::All => true,
        }
    }
}
