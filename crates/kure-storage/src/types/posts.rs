//! Post types. Posts are added to groups by their members; kure lists, adds
//! and deletes them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{GroupName, PostId, UserName};

/// Post record
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: PostId,
    pub group: GroupName,
    pub author: UserName,
    pub permlink: String,
    pub title: String,
    /// User who added the post to the group (not necessarily the author).
    pub added_by: UserName,
    pub created_at: DateTime<Utc>,
}

/// Parameters for adding a post to a group
#[derive(Clone, Debug)]
pub struct NewPost {
    pub group: GroupName,
    pub author: UserName,
    pub permlink: String,
    pub title: String,
    pub added_by: UserName,
}
