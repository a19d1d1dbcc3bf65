//! Authorization checks for mutating operations.

use std::sync::Arc;

use kure_storage::{GroupName, Role, Store, StoreError, UserName};

use crate::error::{EngineError, Result};

/// What a caller's role must satisfy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// `role` or anything more privileged.
    AtLeast(Role),
    /// Strictly more privileged than `role`.
    Above(Role),
}

impl Requirement {
    pub fn satisfied_by(&self, actual: Role) -> bool {
        match *self {
            Requirement::AtLeast(required) => actual.is_at_least(required),
            Requirement::Above(other) => actual.outranks(other),
        }
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Requirement::AtLeast(r) => write!(f, "at least {}", r),
            Requirement::Above(r) => write!(f, "above {}", r),
        }
    }
}

/// Resolves a caller's role in a group and checks it against a requirement.
///
/// Group names are compared as given; callers pass canonical names.
#[derive(Clone)]
pub struct RequestGate {
    store: Arc<dyn Store>,
}

impl RequestGate {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// The user's role in the group, `None` when there is no membership.
    pub async fn role_of(&self, group: &GroupName, user: &UserName) -> Result<Option<Role>> {
        match self.store.get_membership(group, user).await {
            Ok(m) => Ok(Some(m.access)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(EngineError::internal("get_membership")(e)),
        }
    }

    /// Returns the caller's role if it meets `requirement`.
    ///
    /// Non-members and pending requests are denied whatever the requirement.
    pub async fn authorize(
        &self,
        group: &GroupName,
        user: &UserName,
        requirement: Requirement,
    ) -> Result<Role> {
        match self.role_of(group, user).await? {
            Some(role) if role.is_member() && requirement.satisfied_by(role) => Ok(role),
            Some(role) if role.is_member() => Err(deny(
                group,
                user,
                format!("{} needs {} in {}, has {}", user, requirement, group, role),
            )),
            _ => Err(deny(
                group,
                user,
                format!("{} is not a member of {}", user, group),
            )),
        }
    }
}

/// Log and build a `PermissionDenied`.
pub(crate) fn deny(group: &GroupName, user: &UserName, reason: String) -> EngineError {
    tracing::warn!(group = %group, user = %user, %reason, "permission denied");
    EngineError::PermissionDenied(reason)
}
