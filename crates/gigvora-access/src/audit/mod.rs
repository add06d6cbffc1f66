//! Audit views over resolved authorization.
//!
//! - [`explain`] answers "why does (or doesn't) this actor hold P, and who
//!   could grant it?"
//! - [`AuthorizationSnapshot`] is a flat, serializable record of a
//!   resolution suitable for audit logs.

pub mod explain;
pub mod snapshot;

pub use explain::{explain, PermissionExplanation};
pub use snapshot::{AuthorizationSnapshot, SnapshotEntry};
