//! Common test helpers for engine tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use kure_storage::*;
use kure_store_sqlite::SqliteStore;

use crate::{Kure, KureConfig};

/// Test helper: Kure over an in-memory SQLite store, default config
pub async fn create_test_kure() -> (Kure, Arc<SqliteStore>) {
    create_test_kure_with(KureConfig::default()).await
}

pub async fn create_test_kure_with(config: KureConfig) -> (Kure, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let kure = Kure::new(store.clone(), config).unwrap();
    (kure, store)
}

pub fn user(name: &str) -> UserName {
    UserName::new(name)
}

pub fn group(name: &str) -> GroupName {
    GroupName::new(name)
}

/// Test helper: Create a public group through the catalog
pub async fn seed_group(kure: &Kure, name: &str, owner: &str) -> Group {
    kure.catalog.create_group(name, &user(owner)).await.unwrap()
}

/// Test helper: Insert a membership directly, bypassing authorization
pub async fn add_member(store: &SqliteStore, group_name: &str, user_name: &str, access: Role) {
    store
        .insert_membership(&NewMembership {
            group: group(group_name),
            user: user(user_name),
            access,
        })
        .await
        .unwrap();
}

/// Test helper: Stand in for the posting collaborator
pub async fn add_post(store: &SqliteStore, group_name: &str, author: &str, permlink: &str) -> Post {
    store
        .insert_post(&NewPost {
            group: group(group_name),
            author: user(author),
            permlink: permlink.to_string(),
            title: format!("{} by {}", permlink, author),
            added_by: user(author),
        })
        .await
        .unwrap()
}

/// Delegating store that delays `list_posts` and `list_memberships` per group.
pub struct SlowStore {
    inner: Arc<dyn Store>,
    post_delays: HashMap<GroupName, Duration>,
    membership_delays: HashMap<GroupName, Duration>,
}

impl SlowStore {
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self {
            inner,
            post_delays: HashMap::new(),
            membership_delays: HashMap::new(),
        }
    }

    pub fn delay_posts(mut self, group_name: &str, delay: Duration) -> Self {
        self.post_delays.insert(group(group_name), delay);
        self
    }

    pub fn delay_memberships(mut self, group_name: &str, delay: Duration) -> Self {
        self.membership_delays.insert(group(group_name), delay);
        self
    }
}

#[async_trait::async_trait]
impl Store for SlowStore {
    async fn create_group(&self, params: &CreateGroupParams) -> Result<Group, StoreError> {
        self.inner.create_group(params).await
    }

    async fn get_group(&self, name: &GroupName) -> Result<Group, StoreError> {
        self.inner.get_group(name).await
    }

    async fn list_groups_by_owner(&self, owner: &UserName) -> Result<Vec<Group>, StoreError> {
        self.inner.list_groups_by_owner(owner).await
    }

    async fn list_groups_by_names(&self, names: &[GroupName]) -> Result<Vec<Group>, StoreError> {
        self.inner.list_groups_by_names(names).await
    }

    async fn list_recent_groups(&self, limit: u32) -> Result<Vec<Group>, StoreError> {
        self.inner.list_recent_groups(limit).await
    }

    async fn list_active_groups(
        &self,
        scope: &ActivityScope,
        limit: u32,
    ) -> Result<Vec<Group>, StoreError> {
        self.inner.list_active_groups(scope, limit).await
    }

    async fn delete_group(&self, name: &GroupName) -> Result<DeletedGroup, StoreError> {
        self.inner.delete_group(name).await
    }

    async fn get_membership(
        &self,
        group: &GroupName,
        user: &UserName,
    ) -> Result<Membership, StoreError> {
        self.inner.get_membership(group, user).await
    }

    async fn list_memberships(
        &self,
        group: &GroupName,
        filter: MembershipFilter,
    ) -> Result<Vec<Membership>, StoreError> {
        if let Some(delay) = self.membership_delays.get(group) {
            tokio::time::sleep(*delay).await;
        }
        self.inner.list_memberships(group, filter).await
    }

    async fn list_user_memberships(&self, user: &UserName) -> Result<Vec<Membership>, StoreError> {
        self.inner.list_user_memberships(user).await
    }

    async fn insert_membership(&self, params: &NewMembership) -> Result<Membership, StoreError> {
        self.inner.insert_membership(params).await
    }

    async fn update_membership_role(
        &self,
        group: &GroupName,
        user: &UserName,
        expected: Role,
        new: Role,
    ) -> Result<Membership, StoreError> {
        self.inner
            .update_membership_role(group, user, expected, new)
            .await
    }

    async fn delete_membership(
        &self,
        group: &GroupName,
        user: &UserName,
        expected: Role,
    ) -> Result<(), StoreError> {
        self.inner.delete_membership(group, user, expected).await
    }

    async fn insert_post(&self, params: &NewPost) -> Result<Post, StoreError> {
        self.inner.insert_post(params).await
    }

    async fn get_post(
        &self,
        group: &GroupName,
        author: &UserName,
        permlink: &str,
    ) -> Result<Post, StoreError> {
        self.inner.get_post(group, author, permlink).await
    }

    async fn list_posts(
        &self,
        group: &GroupName,
        limit: Option<u32>,
    ) -> Result<Vec<Post>, StoreError> {
        if let Some(delay) = self.post_delays.get(group) {
            tokio::time::sleep(*delay).await;
        }
        self.inner.list_posts(group, limit).await
    }

    async fn delete_post(
        &self,
        group: &GroupName,
        author: &UserName,
        permlink: &str,
    ) -> Result<(), StoreError> {
        self.inner.delete_post(group, author, permlink).await
    }
}
