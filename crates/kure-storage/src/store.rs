//! The Store trait that backends implement.

use crate::types::*;
use crate::StoreError;

/// The storage trait `kure-core` depends on.
///
/// Backends own the invariants that must hold under concurrency: unique group
/// names, one membership per (group, user), one owner per group. Composite
/// writes (`create_group`, `delete_group`, `insert_post`) are transactional,
/// and membership mutations are compare-and-swap on the observed role.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────────────── Groups ─────────────────────────────────────────

    /// Atomically create a group and its owner membership.
    ///
    /// Fails with `LimitExceeded` if the owner already owns `params.max_owned`
    /// groups and `AlreadyExists` if the name is taken.
    async fn create_group(&self, params: &CreateGroupParams) -> Result<Group, StoreError>;

    /// Get a group by name.
    async fn get_group(&self, name: &GroupName) -> Result<Group, StoreError>;

    /// Groups owned by a user, newest first.
    async fn list_groups_by_owner(&self, owner: &UserName) -> Result<Vec<Group>, StoreError>;

    /// Fetch several groups by name. Unknown names are skipped; order is unspecified.
    async fn list_groups_by_names(&self, names: &[GroupName]) -> Result<Vec<Group>, StoreError>;

    /// The `limit` most recently created public groups, newest first.
    async fn list_recent_groups(&self, limit: u32) -> Result<Vec<Group>, StoreError>;

    /// Up to `limit` groups in `scope` that have at least one post, ordered by
    /// their most recent post, newest first.
    async fn list_active_groups(
        &self,
        scope: &ActivityScope,
        limit: u32,
    ) -> Result<Vec<Group>, StoreError>;

    /// Delete a group with all of its memberships and posts in one transaction.
    async fn delete_group(&self, name: &GroupName) -> Result<DeletedGroup, StoreError>;

    // ─────────────────────────────────── Memberships ──────────────────────────────────────

    /// Get the membership of a user in a group.
    async fn get_membership(
        &self,
        group: &GroupName,
        user: &UserName,
    ) -> Result<Membership, StoreError>;

    /// List a group's memberships, sorted by user name ascending.
    async fn list_memberships(
        &self,
        group: &GroupName,
        filter: MembershipFilter,
    ) -> Result<Vec<Membership>, StoreError>;

    /// All memberships of a user across groups, sorted by group name.
    async fn list_user_memberships(&self, user: &UserName) -> Result<Vec<Membership>, StoreError>;

    /// Insert a membership.
    ///
    /// `AlreadyExists` if the (group, user) pair is taken, `NotFound` if the group
    /// does not exist.
    async fn insert_membership(&self, params: &NewMembership) -> Result<Membership, StoreError>;

    /// Change a membership's role from `expected` to `new`.
    ///
    /// `NotFound` if there is no membership, `Conflict` if its current role is not
    /// `expected`. Owner memberships are never changed.
    async fn update_membership_role(
        &self,
        group: &GroupName,
        user: &UserName,
        expected: Role,
        new: Role,
    ) -> Result<Membership, StoreError>;

    /// Delete a membership currently holding `expected`.
    ///
    /// Same error contract as `update_membership_role`. Owner memberships are
    /// only removed by `delete_group`.
    async fn delete_membership(
        &self,
        group: &GroupName,
        user: &UserName,
        expected: Role,
    ) -> Result<(), StoreError>;

    // ────────────────────────────────────── Posts ─────────────────────────────────────────

    /// Add a post to a group and bump the group's `updated_at`.
    async fn insert_post(&self, params: &NewPost) -> Result<Post, StoreError>;

    /// Get a post by its natural key.
    async fn get_post(
        &self,
        group: &GroupName,
        author: &UserName,
        permlink: &str,
    ) -> Result<Post, StoreError>;

    /// A group's posts, newest first, at most `limit` when given.
    async fn list_posts(
        &self,
        group: &GroupName,
        limit: Option<u32>,
    ) -> Result<Vec<Post>, StoreError>;

    /// Delete a post by its natural key.
    async fn delete_post(
        &self,
        group: &GroupName,
        author: &UserName,
        permlink: &str,
    ) -> Result<(), StoreError>;
}
