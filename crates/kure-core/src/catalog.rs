//! Group lifecycle: naming rules, ownership limit, cascading delete.

use std::sync::Arc;

use kure_storage::{
    CreateGroupParams, DeletedGroup, Group, GroupName, Role, Store, StoreError, UserName,
    Visibility,
};

use crate::config::CatalogConfig;
use crate::error::{EngineError, Result};
use crate::gate::{RequestGate, Requirement};

/// Input for [`GroupCatalog::create_group_with`].
#[derive(Clone, Debug)]
pub struct NewGroup {
    pub name: String,
    /// Defaults to `name` as given.
    pub display: Option<String>,
    pub owner: UserName,
    pub visibility: Visibility,
}

/// Maps user-supplied group names onto stored identifiers.
///
/// Every service entry point runs incoming names through the rule, so
/// "GamerZ" and "gamerz" reach the same group when names are case
/// insensitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameRule {
    case_insensitive: bool,
}

impl NameRule {
    pub fn new(case_insensitive: bool) -> Self {
        Self { case_insensitive }
    }

    pub fn canonical(&self, name: &str) -> GroupName {
        if self.case_insensitive {
            GroupName::new(name.to_lowercase())
        } else {
            GroupName::new(name)
        }
    }
}

impl From<&CatalogConfig> for NameRule {
    fn from(config: &CatalogConfig) -> Self {
        Self::new(config.case_insensitive_names)
    }
}

#[derive(Clone)]
pub struct GroupCatalog {
    store: Arc<dyn Store>,
    gate: RequestGate,
    names: NameRule,
    config: CatalogConfig,
}

impl GroupCatalog {
    pub fn new(store: Arc<dyn Store>, gate: RequestGate, config: CatalogConfig) -> Self {
        Self {
            store,
            gate,
            names: NameRule::from(&config),
            config,
        }
    }

    /// Check a proposed group name: configured length bounds, letters, digits,
    /// space, `_` and `-` only.
    pub fn validate_name(&self, name: &str) -> Result<()> {
        let len = name.chars().count();
        if len < self.config.name_min_len || len > self.config.name_max_len {
            return Err(EngineError::Validation(format!(
                "group name must be {} to {} characters, got {}",
                self.config.name_min_len, self.config.name_max_len, len
            )));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-')))
        {
            return Err(EngineError::Validation(format!(
                "group name contains invalid character {:?}",
                bad
            )));
        }
        Ok(())
    }

    /// The identifier a user-supplied name maps to.
    pub fn canonical_name(&self, name: &str) -> GroupName {
        self.names.canonical(name)
    }

    /// Create a public group displayed under `name`.
    pub async fn create_group(&self, name: &str, owner: &UserName) -> Result<Group> {
        self.create_group_with(NewGroup {
            name: name.to_string(),
            display: None,
            owner: owner.clone(),
            visibility: Visibility::Public,
        })
        .await
    }

    pub async fn create_group_with(&self, new: NewGroup) -> Result<Group> {
        self.validate_name(&new.name)?;
        if new.owner.as_str().is_empty() {
            return Err(EngineError::Validation("owner must not be empty".to_string()));
        }
        let display = match new.display {
            Some(d) if d.trim().is_empty() => {
                return Err(EngineError::Validation(
                    "display name must not be empty".to_string(),
                ))
            }
            Some(d) => d,
            None => new.name.clone(),
        };

        let params = CreateGroupParams {
            name: self.canonical_name(&new.name),
            display,
            owner: new.owner,
            visibility: new.visibility,
            max_owned: self.config.max_owned_groups,
        };

        match self.store.create_group(&params).await {
            Ok(group) => {
                tracing::info!(group = %group.name, owner = %group.owner, visibility = group.visibility.as_str(), "group created");
                Ok(group)
            }
            Err(StoreError::AlreadyExists) => Err(EngineError::Conflict(format!(
                "group {} already exists",
                params.name
            ))),
            Err(StoreError::LimitExceeded) => {
                tracing::warn!(owner = %params.owner, limit = self.config.max_owned_groups, "group ownership limit reached");
                Err(EngineError::LimitExceeded {
                    owner: params.owner,
                    limit: self.config.max_owned_groups,
                })
            }
            Err(e) => Err(EngineError::internal("create_group")(e)),
        }
    }

    /// Delete a group with its memberships and posts. Owner only.
    pub async fn delete_group(
        &self,
        name: &GroupName,
        requested_by: &UserName,
    ) -> Result<DeletedGroup> {
        let name = &self.names.canonical(name.as_str());
        self.get_group(name).await?;
        self.gate
            .authorize(name, requested_by, Requirement::AtLeast(Role::Owner))
            .await?;

        match self.store.delete_group(name).await {
            Ok(deleted) => {
                tracing::info!(
                    group = %name,
                    by = %requested_by,
                    memberships = deleted.memberships,
                    posts = deleted.posts,
                    "group deleted"
                );
                Ok(deleted)
            }
            Err(StoreError::NotFound) => Err(not_found(name)),
            Err(e) => Err(EngineError::internal("delete_group")(e)),
        }
    }

    pub async fn get_group(&self, name: &GroupName) -> Result<Group> {
        let name = &self.names.canonical(name.as_str());
        match self.store.get_group(name).await {
            Ok(g) => Ok(g),
            Err(StoreError::NotFound) => Err(not_found(name)),
            Err(e) => Err(EngineError::internal("get_group")(e)),
        }
    }

    /// Groups owned by `user`, newest first.
    pub async fn list_owned(&self, user: &UserName) -> Result<Vec<Group>> {
        self.store
            .list_groups_by_owner(user)
            .await
            .map_err(EngineError::internal("list_groups_by_owner"))
    }
}

fn not_found(name: &GroupName) -> EngineError {
    EngineError::NotFound(format!("group {}", name))
}
