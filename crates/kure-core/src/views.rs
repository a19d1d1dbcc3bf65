//! Read views composed from independent store queries.
//!
//! Every view fans out into single-entity queries, runs them concurrently and
//! joins the results by key. The first failing sub-query fails the view; the
//! remaining futures are dropped.
//!
//! The sub-queries share no snapshot, so each view reads its groups once more
//! after the join. A group deleted while the view was composed is reported
//! missing (`group_detail`) or left out (digests) instead of showing up with
//! emptied lists.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;

use kure_storage::{
    ActivityScope, Group, GroupName, Membership, MembershipFilter, Post, Role, Store, StoreError,
    UserName,
};

use crate::catalog::NameRule;
use crate::config::ViewConfig;
use crate::error::{EngineError, Result};

/// Who is looking at a view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(UserName),
}

/// The viewer's standing in a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "role")]
pub enum ViewerAccess {
    Role(Role),
    NotAMember,
}

#[derive(Clone, Debug, Serialize)]
pub struct GroupDetail {
    pub group: Group,
    /// `None` for anonymous viewers.
    pub access: Option<ViewerAccess>,
    pub posts: Vec<Post>,
    pub members: Vec<Membership>,
    pub pending: Vec<Membership>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserGroupsKind {
    /// Groups the user owns.
    Owned,
    /// Groups the user moderates or is a member of, excluding owned ones.
    Joined,
    /// Every group with a non-pending membership.
    All,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserGroup {
    pub group: Group,
    pub role: Role,
}

#[derive(Clone, Debug, Serialize)]
pub struct GroupActivity {
    pub group: Group,
    pub posts: Vec<Post>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CommunityOverview {
    pub recent: Vec<GroupActivity>,
    pub created: Vec<GroupActivity>,
}

#[derive(Clone)]
pub struct AggregationEngine {
    store: Arc<dyn Store>,
    names: NameRule,
    config: ViewConfig,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn Store>, names: NameRule, config: ViewConfig) -> Self {
        Self {
            store,
            names,
            config,
        }
    }

    /// A group with its posts, members, pending requests and the viewer's
    /// access, fetched concurrently.
    pub async fn group_detail(&self, name: &GroupName, viewer: &Viewer) -> Result<GroupDetail> {
        let name = &self.names.canonical(name.as_str());
        tracing::debug!(group = %name, ?viewer, "composing group detail");

        let group = async {
            match self.store.get_group(name).await {
                Ok(g) => Ok(g),
                Err(StoreError::NotFound) => Err(EngineError::NotFound(format!("group {}", name))),
                Err(e) => Err(EngineError::internal("get_group")(e)),
            }
        };
        let access = async {
            let Viewer::User(user) = viewer else {
                return Ok(None);
            };
            match self.store.get_membership(name, user).await {
                Ok(m) => Ok(Some(ViewerAccess::Role(m.access))),
                Err(StoreError::NotFound) => Ok(Some(ViewerAccess::NotAMember)),
                Err(e) => Err(EngineError::internal("get_membership")(e)),
            }
        };
        let posts = async {
            self.store
                .list_posts(name, None)
                .await
                .map_err(EngineError::internal("list_posts"))
        };
        let members = async {
            self.store
                .list_memberships(name, MembershipFilter::Members)
                .await
                .map_err(EngineError::internal("list_memberships"))
        };
        let pending = async {
            self.store
                .list_memberships(name, MembershipFilter::Pending)
                .await
                .map_err(EngineError::internal("list_pending"))
        };

        let (group, access, posts, members, pending) =
            futures::try_join!(group, access, posts, members, pending)?;

        if !self.still_present(&group).await? {
            tracing::debug!(group = %name, "group deleted while composing detail");
            return Err(EngineError::NotFound(format!("group {}", name)));
        }

        Ok(GroupDetail {
            group,
            access,
            posts,
            members,
            pending,
        })
    }

    /// Groups a user belongs to, paired with their role.
    ///
    /// `Owned` is newest first and unpaged. `Joined` and `All` sort by display
    /// name, or by last update when `limit` is given, and return at most
    /// `limit` (or the configured page size) entries.
    pub async fn user_groups(
        &self,
        user: &UserName,
        kind: UserGroupsKind,
        limit: Option<u32>,
    ) -> Result<Vec<UserGroup>> {
        if kind == UserGroupsKind::Owned {
            let owned = self
                .store
                .list_groups_by_owner(user)
                .await
                .map_err(EngineError::internal("list_groups_by_owner"))?;
            return Ok(owned
                .into_iter()
                .map(|group| UserGroup {
                    group,
                    role: Role::Owner,
                })
                .collect());
        }

        let memberships = self
            .store
            .list_user_memberships(user)
            .await
            .map_err(EngineError::internal("list_user_memberships"))?;

        let roles: HashMap<GroupName, Role> = memberships
            .into_iter()
            .filter(|m| match kind {
                UserGroupsKind::Joined => m.access != Role::Owner && m.access.is_member(),
                _ => m.access.is_member(),
            })
            .map(|m| (m.group, m.access))
            .collect();
        if roles.is_empty() {
            return Ok(vec![]);
        }

        let names: Vec<GroupName> = roles.keys().cloned().collect();
        let groups = self
            .store
            .list_groups_by_names(&names)
            .await
            .map_err(EngineError::internal("list_groups_by_names"))?;
        tracing::debug!(user = %user, ?kind, memberships = names.len(), groups = groups.len(), "joined user groups");

        // Groups deleted between the two queries drop out here
        let mut joined: Vec<UserGroup> = groups
            .into_iter()
            .filter_map(|group| {
                let role = *roles.get(&group.name)?;
                Some(UserGroup { group, role })
            })
            .collect();

        if limit.is_some() {
            joined.sort_by(|a, b| {
                (Reverse(a.group.updated_at), &a.group.name)
                    .cmp(&(Reverse(b.group.updated_at), &b.group.name))
            });
        } else {
            joined.sort_by(|a, b| {
                (&a.group.display, &a.group.name).cmp(&(&b.group.display, &b.group.name))
            });
        }
        joined.truncate(limit.unwrap_or(self.config.default_page_size) as usize);
        Ok(joined)
    }

    /// Groups with the most recent posts, each with its newest posts.
    ///
    /// Anonymous viewers see public groups; signed-in viewers see the groups
    /// they are members of. Output keeps the selection order.
    pub async fn recent_activity(
        &self,
        viewer: &Viewer,
        group_limit: u32,
        post_limit: u32,
    ) -> Result<Vec<GroupActivity>> {
        let scope = match viewer {
            Viewer::Anonymous => ActivityScope::Public,
            Viewer::User(user) => ActivityScope::MemberOf(user.clone()),
        };
        let groups = self
            .store
            .list_active_groups(&scope, group_limit)
            .await
            .map_err(EngineError::internal("list_active_groups"))?;
        tracing::debug!(?scope, groups = groups.len(), "fetching recent activity");
        self.with_posts(groups, post_limit).await
    }

    /// The newest public groups, each with a preview of its posts.
    pub async fn groups_created(
        &self,
        limit: u32,
        post_preview_limit: u32,
    ) -> Result<Vec<GroupActivity>> {
        let groups = self
            .store
            .list_recent_groups(limit)
            .await
            .map_err(EngineError::internal("list_recent_groups"))?;
        tracing::debug!(groups = groups.len(), "fetching newest groups");
        self.with_posts(groups, post_preview_limit).await
    }

    /// Recent activity and newest groups, fetched concurrently.
    pub async fn community_overview(
        &self,
        viewer: &Viewer,
        group_limit: u32,
        post_limit: u32,
    ) -> Result<CommunityOverview> {
        let (recent, created) = futures::try_join!(
            self.recent_activity(viewer, group_limit, post_limit),
            self.groups_created(group_limit, post_limit),
        )?;
        Ok(CommunityOverview { recent, created })
    }

    async fn with_posts(&self, groups: Vec<Group>, post_limit: u32) -> Result<Vec<GroupActivity>> {
        let store = &self.store;
        let activity = try_join_all(groups.into_iter().map(|group| async move {
            let posts = store
                .list_posts(&group.name, Some(post_limit))
                .await
                .map_err(EngineError::internal("list_posts"))?;
            Ok::<_, EngineError>(GroupActivity { group, posts })
        }))
        .await?;
        if activity.is_empty() {
            return Ok(activity);
        }

        let names: Vec<GroupName> = activity.iter().map(|a| a.group.name.clone()).collect();
        let present: HashMap<GroupName, _> = self
            .store
            .list_groups_by_names(&names)
            .await
            .map_err(EngineError::internal("list_groups_by_names"))?
            .into_iter()
            .map(|g| (g.name, g.created_at))
            .collect();

        let selected = activity.len();
        let kept: Vec<GroupActivity> = activity
            .into_iter()
            .filter(|a| present.get(&a.group.name) == Some(&a.group.created_at))
            .collect();
        if kept.len() < selected {
            tracing::debug!(dropped = selected - kept.len(), "groups deleted while composing digest");
        }
        Ok(kept)
    }

    /// Whether `group` still exists as read, and was not deleted and
    /// recreated under the same name since.
    async fn still_present(&self, group: &Group) -> Result<bool> {
        match self.store.get_group(&group.name).await {
            Ok(current) => Ok(current.created_at == group.created_at),
            Err(StoreError::NotFound) => Ok(false),
            Err(e) => Err(EngineError::internal("get_group")(e)),
        }
    }
}
