//! Type definitions for kure storage.

mod groups;
mod ids;
mod memberships;
mod posts;
mod roles;

// Re-export all types from submodules
pub use groups::*;
pub use ids::*;
pub use memberships::*;
pub use posts::*;
pub use roles::*;
