use kure_storage::{GroupName, Role, StoreError, UserName};
use thiserror::Error;

/// Errors surfaced by every kure service.
///
/// Policy errors (`Validation`, `PermissionDenied`, ...) are decided by the
/// engine. Store failures it does not expect become `Internal`, tagged with the
/// sub-operation that failed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("{owner} already owns {limit} groups")]
    LimitExceeded { owner: UserName, limit: u32 },
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{user} already has {role} access to {group}")]
    AlreadyMember {
        group: GroupName,
        user: UserName,
        role: Role,
    },
    #[error("{op} failed: {source}")]
    Internal {
        op: &'static str,
        #[source]
        source: StoreError,
    },
}

/// Stable classification for mapping errors onto an outer API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    LimitExceeded,
    PermissionDenied,
    NotFound,
    AlreadyMember,
    Internal,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            EngineError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::AlreadyMember { .. } => ErrorKind::AlreadyMember,
            EngineError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub(crate) fn internal(op: &'static str) -> impl FnOnce(StoreError) -> EngineError {
        move |source| EngineError::Internal { op, source }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
