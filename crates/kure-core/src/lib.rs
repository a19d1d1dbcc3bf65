//! Community-group access control and view aggregation.
//!
//! [`Kure`] wires every service to one shared [`Store`]. The services hold no
//! state of their own; the store is the only source of truth, and it enforces
//! the uniqueness invariants the services rely on under concurrency.

mod access;
mod catalog;
mod config;
mod error;
mod gate;
mod posts;
mod views;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use kure_storage::Store;

pub use access::AccessStore;
pub use catalog::{GroupCatalog, NameRule, NewGroup};
pub use config::{AccessConfig, CatalogConfig, ConfigError, KureConfig, ViewConfig};
pub use error::{EngineError, ErrorKind, Result};
pub use gate::{RequestGate, Requirement};
pub use posts::PostIndex;
pub use views::{
    AggregationEngine, CommunityOverview, GroupActivity, GroupDetail, UserGroup, UserGroupsKind,
    Viewer, ViewerAccess,
};

#[derive(Clone)]
pub struct Kure {
    pub gate: RequestGate,
    pub access: AccessStore,
    pub catalog: GroupCatalog,
    pub posts: PostIndex,
    pub views: AggregationEngine,
}

impl Kure {
    /// Wire the services over `store`. Fails if `config` does not validate.
    pub fn new(
        store: Arc<dyn Store>,
        config: KureConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let gate = RequestGate::new(store.clone());
        let names = NameRule::from(&config.catalog);
        Ok(Self {
            access: AccessStore::new(
                store.clone(),
                gate.clone(),
                names,
                config.access.default_approved_role,
            )?,
            catalog: GroupCatalog::new(store.clone(), gate.clone(), config.catalog),
            posts: PostIndex::new(store.clone(), gate.clone(), names),
            views: AggregationEngine::new(store, names, config.views),
            gate,
        })
    }
}
