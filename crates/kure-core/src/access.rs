//! Membership management: join requests, grants, approvals, revocations.

use std::sync::Arc;

use kure_storage::{
    GroupName, Membership, MembershipFilter, NewMembership, Role, Store, StoreError, UserName,
};

use crate::catalog::NameRule;
use crate::config::ConfigError;
use crate::error::{EngineError, Result};
use crate::gate::{deny, RequestGate, Requirement};

#[derive(Clone)]
pub struct AccessStore {
    store: Arc<dyn Store>,
    gate: RequestGate,
    names: NameRule,
    approved_role: Role,
}

impl AccessStore {
    /// Fails unless `approved_role` is Moderator or Member.
    pub fn new(
        store: Arc<dyn Store>,
        gate: RequestGate,
        names: NameRule,
        approved_role: Role,
    ) -> std::result::Result<Self, ConfigError> {
        match approved_role {
            Role::Moderator | Role::Member => Ok(Self {
                store,
                gate,
                names,
                approved_role,
            }),
            other => Err(ConfigError::ApprovedRole(other)),
        }
    }

    /// The user's role in the group, `None` if they are not a member.
    pub async fn get_access(&self, group: &GroupName, user: &UserName) -> Result<Option<Role>> {
        let group = &self.names.canonical(group.as_str());
        self.gate.role_of(group, user).await
    }

    /// Memberships sorted by user. Pending requests only with `include_pending`.
    pub async fn list_members(
        &self,
        group: &GroupName,
        include_pending: bool,
    ) -> Result<Vec<Membership>> {
        let group = &self.names.canonical(group.as_str());
        let filter = if include_pending {
            MembershipFilter::All
        } else {
            MembershipFilter::Members
        };
        self.store
            .list_memberships(group, filter)
            .await
            .map_err(EngineError::internal("list_memberships"))
    }

    pub async fn list_pending(&self, group: &GroupName) -> Result<Vec<Membership>> {
        let group = &self.names.canonical(group.as_str());
        self.store
            .list_memberships(group, MembershipFilter::Pending)
            .await
            .map_err(EngineError::internal("list_memberships"))
    }

    /// Ask to join a group. Creates a pending membership.
    pub async fn request_access(&self, group: &GroupName, user: &UserName) -> Result<Membership> {
        let group = &self.names.canonical(group.as_str());
        match self.store.get_group(group).await {
            Ok(_) => {}
            Err(StoreError::NotFound) => return Err(group_not_found(group)),
            Err(e) => return Err(EngineError::internal("get_group")(e)),
        }

        if let Some(role) = self.gate.role_of(group, user).await? {
            return Err(already_member(group, user, role));
        }

        let params = NewMembership {
            group: group.clone(),
            user: user.clone(),
            access: Role::Pending,
        };
        match self.store.insert_membership(&params).await {
            Ok(m) => {
                tracing::info!(group = %group, user = %user, "access requested");
                Ok(m)
            }
            // Lost a race against another insert for the same pair
            Err(StoreError::AlreadyExists) => match self.gate.role_of(group, user).await? {
                Some(role) => Err(already_member(group, user, role)),
                None => Err(concurrent_change(group, user)),
            },
            Err(StoreError::NotFound) => Err(group_not_found(group)),
            Err(e) => Err(EngineError::internal("insert_membership")(e)),
        }
    }

    /// Give `user` the role `role`, inserting or updating their membership.
    pub async fn grant_access(
        &self,
        group: &GroupName,
        granted_by: &UserName,
        user: &UserName,
        role: Role,
    ) -> Result<Membership> {
        let group = &self.names.canonical(group.as_str());
        match role {
            Role::Owner => {
                return Err(EngineError::Conflict(format!(
                    "{} already has an owner",
                    group
                )))
            }
            Role::Pending => {
                return Err(EngineError::Validation(
                    "pending is not grantable; use request_access".to_string(),
                ))
            }
            Role::Moderator | Role::Member => {}
        }

        let granter = self
            .gate
            .authorize(group, granted_by, Requirement::Above(role))
            .await?;

        let Some(current) = self.gate.role_of(group, user).await? else {
            let params = NewMembership {
                group: group.clone(),
                user: user.clone(),
                access: role,
            };
            return match self.store.insert_membership(&params).await {
                Ok(m) => {
                    tracing::info!(group = %group, user = %user, %role, by = %granted_by, "access granted");
                    Ok(m)
                }
                Err(StoreError::AlreadyExists) => Err(concurrent_change(group, user)),
                Err(StoreError::NotFound) => Err(group_not_found(group)),
                Err(e) => Err(EngineError::internal("insert_membership")(e)),
            };
        };

        if current == Role::Owner {
            return Err(deny(
                group,
                granted_by,
                format!("the owner's access to {} cannot be changed", group),
            ));
        }
        if !granter.outranks(current) {
            return Err(deny(
                group,
                granted_by,
                format!("{} cannot change the access of {} ({})", granted_by, user, current),
            ));
        }
        if current == role {
            return Err(EngineError::Conflict(format!(
                "{} already has {} access to {}",
                user, role, group
            )));
        }

        match self
            .store
            .update_membership_role(group, user, current, role)
            .await
        {
            Ok(m) => {
                tracing::info!(group = %group, user = %user, from = %current, to = %role, by = %granted_by, "access changed");
                Ok(m)
            }
            Err(StoreError::Conflict) | Err(StoreError::NotFound) => {
                Err(concurrent_change(group, user))
            }
            Err(e) => Err(EngineError::internal("update_membership_role")(e)),
        }
    }

    /// Promote a pending request to the configured approved role.
    pub async fn approve_pending(
        &self,
        group: &GroupName,
        approved_by: &UserName,
        user: &UserName,
    ) -> Result<Membership> {
        let group = &self.names.canonical(group.as_str());
        self.gate
            .authorize(group, approved_by, Requirement::Above(Role::Member))
            .await?;

        if self.gate.role_of(group, user).await? != Some(Role::Pending) {
            return Err(no_pending_request(group, user));
        }

        match self
            .store
            .update_membership_role(group, user, Role::Pending, self.approved_role)
            .await
        {
            Ok(m) => {
                tracing::info!(group = %group, user = %user, role = %m.access, by = %approved_by, "request approved");
                Ok(m)
            }
            Err(StoreError::Conflict) | Err(StoreError::NotFound) => {
                Err(no_pending_request(group, user))
            }
            Err(e) => Err(EngineError::internal("update_membership_role")(e)),
        }
    }

    /// Remove a membership. Also used to reject pending requests and to leave
    /// a group.
    pub async fn revoke_access(
        &self,
        group: &GroupName,
        revoked_by: &UserName,
        user: &UserName,
    ) -> Result<()> {
        let group = &self.names.canonical(group.as_str());
        let Some(target) = self.gate.role_of(group, user).await? else {
            return Err(EngineError::NotFound(format!(
                "{} has no membership in {}",
                user, group
            )));
        };

        if revoked_by == user {
            if target == Role::Owner {
                return Err(deny(
                    group,
                    revoked_by,
                    format!("the owner cannot leave {}; delete the group instead", group),
                ));
            }
        } else {
            self.gate
                .authorize(group, revoked_by, Requirement::Above(target))
                .await?;
        }

        match self.store.delete_membership(group, user, target).await {
            Ok(()) => {
                tracing::info!(group = %group, user = %user, role = %target, by = %revoked_by, "access revoked");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(EngineError::NotFound(format!(
                "{} has no membership in {}",
                user, group
            ))),
            Err(StoreError::Conflict) => Err(concurrent_change(group, user)),
            Err(e) => Err(EngineError::internal("delete_membership")(e)),
        }
    }
}

fn group_not_found(group: &GroupName) -> EngineError {
    EngineError::NotFound(format!("group {}", group))
}

fn already_member(group: &GroupName, user: &UserName, role: Role) -> EngineError {
    EngineError::AlreadyMember {
        group: group.clone(),
        user: user.clone(),
        role,
    }
}

fn no_pending_request(group: &GroupName, user: &UserName) -> EngineError {
    EngineError::NotFound(format!("no pending request from {} in {}", user, group))
}

fn concurrent_change(group: &GroupName, user: &UserName) -> EngineError {
    EngineError::Conflict(format!(
        "membership of {} in {} changed concurrently",
        user, group
    ))
}
