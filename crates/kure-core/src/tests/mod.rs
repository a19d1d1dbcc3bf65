//! Engine scenario tests.
//!
//! - `common` - Shared helpers: in-memory engine, seeding, a latency-injecting store
//! - `access` - Join requests, grants, approvals, revocations
//! - `catalog` - Group naming, ownership limit, cascading delete
//! - `posts` - Post listing, adding and moderation
//! - `views` - Composed read views and their ordering
//! - `failures` - Store failures surfacing as internal errors

pub mod common;

mod failures;
