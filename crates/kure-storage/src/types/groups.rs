//! Group types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{GroupName, UserName};

/// Who may see a group in anonymous listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            _ => Err(format!("invalid visibility: {}", s)),
        }
    }
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

/// Group record
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: GroupName,
    pub display: String,
    pub owner: UserName,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    /// Bumped whenever a post is added to the group.
    pub updated_at: DateTime<Utc>,
    pub post_count: u64,
    /// Members of any role except Pending.
    pub user_count: u64,
}

/// Parameters for creating a group
#[derive(Clone, Debug)]
pub struct CreateGroupParams {
    pub name: GroupName,
    pub display: String,
    pub owner: UserName,
    pub visibility: Visibility,
    /// Groups `owner` may own at most, checked inside the insert transaction.
    pub max_owned: u32,
}

/// Records removed by a cascading group delete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeletedGroup {
    pub memberships: u64,
    pub posts: u64,
}

/// Selection for the recent-activity digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivityScope {
    /// Public groups only.
    Public,
    /// Groups in which the user holds any non-pending membership.
    MemberOf(UserName),
}
