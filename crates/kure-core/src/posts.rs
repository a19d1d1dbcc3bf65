use std::sync::Arc;

use kure_storage::{GroupName, NewPost, Post, Role, Store, StoreError, UserName};

use crate::catalog::NameRule;
use crate::error::{EngineError, Result};
use crate::gate::{RequestGate, Requirement};

/// Add, list and moderate a group's posts.
#[derive(Clone)]
pub struct PostIndex {
    store: Arc<dyn Store>,
    gate: RequestGate,
    names: NameRule,
}

impl PostIndex {
    pub fn new(store: Arc<dyn Store>, gate: RequestGate, names: NameRule) -> Self {
        Self { store, gate, names }
    }

    /// Newest first, at most `limit` when given.
    pub async fn list_by_group(&self, group: &GroupName, limit: Option<u32>) -> Result<Vec<Post>> {
        let group = &self.names.canonical(group.as_str());
        self.store
            .list_posts(group, limit)
            .await
            .map_err(EngineError::internal("list_posts"))
    }

    /// Add `@author/permlink` to a group. `added_by` must be a member.
    pub async fn add_post(
        &self,
        group: &GroupName,
        author: &UserName,
        permlink: &str,
        title: &str,
        added_by: &UserName,
    ) -> Result<Post> {
        let group = &self.names.canonical(group.as_str());
        if permlink.is_empty() {
            return Err(EngineError::Validation(
                "permlink must not be empty".to_string(),
            ));
        }
        self.gate
            .authorize(group, added_by, Requirement::AtLeast(Role::Member))
            .await?;

        let params = NewPost {
            group: group.clone(),
            author: author.clone(),
            permlink: permlink.to_string(),
            title: title.to_string(),
            added_by: added_by.clone(),
        };
        match self.store.insert_post(&params).await {
            Ok(post) => {
                tracing::info!(group = %group, author = %author, permlink, by = %added_by, id = post.id.0, "post added");
                Ok(post)
            }
            Err(StoreError::AlreadyExists) => Err(EngineError::Conflict(format!(
                "post @{}/{} is already in {}",
                author, permlink, group
            ))),
            Err(StoreError::NotFound) => Err(EngineError::NotFound(format!("group {}", group))),
            Err(e) => Err(EngineError::internal("insert_post")(e)),
        }
    }

    /// Remove a post from a group. Allowed for its author and for moderators
    /// and above.
    pub async fn delete_post(
        &self,
        group: &GroupName,
        author: &UserName,
        permlink: &str,
        requested_by: &UserName,
    ) -> Result<()> {
        let group = &self.names.canonical(group.as_str());
        match self.store.get_post(group, author, permlink).await {
            Ok(_) => {}
            Err(StoreError::NotFound) => return Err(not_found(group, author, permlink)),
            Err(e) => return Err(EngineError::internal("get_post")(e)),
        }

        if requested_by != author {
            self.gate
                .authorize(group, requested_by, Requirement::Above(Role::Member))
                .await?;
        }

        match self.store.delete_post(group, author, permlink).await {
            Ok(()) => {
                tracing::info!(group = %group, author = %author, permlink, by = %requested_by, "post deleted");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(not_found(group, author, permlink)),
            Err(e) => Err(EngineError::internal("delete_post")(e)),
        }
    }
}

fn not_found(group: &GroupName, author: &UserName, permlink: &str) -> EngineError {
    EngineError::NotFound(format!("post @{}/{} in {}", author, permlink, group))
}
