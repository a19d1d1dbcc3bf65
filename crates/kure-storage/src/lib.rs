//! Storage abstraction for kure.
//!
//! Backend crates (e.g., kure-store-sqlite) implement this trait so
//! `kure-core` doesn't depend on any specific database engine or schema details.

mod store;
mod types;

pub use store::*;
pub use types::*;

use thiserror::Error;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("conflict")]
    Conflict,
    #[error("ownership limit exceeded")]
    LimitExceeded,
    #[error("backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    // Compile-time check that the engine can hold backends as trait objects.
    fn _store_is_object_safe(store: Arc<dyn Store>) -> Arc<dyn Store> {
        store
    }

    #[test]
    fn test_store_error_display() {
        assert_eq!(StoreError::NotFound.to_string(), "not found");
        assert_eq!(StoreError::AlreadyExists.to_string(), "already exists");
        assert_eq!(StoreError::Conflict.to_string(), "conflict");
        assert_eq!(
            StoreError::LimitExceeded.to_string(),
            "ownership limit exceeded"
        );
        let err = StoreError::Backend("database is locked".to_string());
        assert!(err.to_string().contains("backend error"));
        assert!(err.to_string().contains("database is locked"));
    }

    #[cfg(feature = "test-support")]
    #[tokio::test]
    async fn mock_store_usable_as_trait_object() {
        let mut mock = MockStore::new();
        mock.expect_get_group()
            .returning(|_| Err(StoreError::NotFound));
        let store: Arc<dyn Store> = Arc::new(mock);
        let err = store
            .get_group(&GroupName::new("gamerz"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
