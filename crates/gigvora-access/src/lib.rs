//! Gigvora Access — permission resolution for the Gigvora marketplace.
//!
//! Loads the platform's static permission matrix (memberships, permissions,
//! implication edges, escalation paths) into a read-only registry, then
//! resolves an actor's memberships and explicit grants into a transitively
//! closed permission set with per-permission source attribution.

pub mod audit;
pub mod config;
pub mod error;
pub mod matrix;
pub mod query;
pub mod registry;
pub mod resolve;
pub mod time;

// Re-export primary types
pub use config::AccessConfig;
pub use error::{AccessError, Result};
pub use matrix::{
    Membership, MembershipKey, Permission, PermissionKey, PermissionMatrix, ValidationReport,
};
pub use registry::{LoadMode, PermissionRegistry};
pub use resolve::{
    resolve, resolve_for, AuthorizationRequest, AuthorizationState, PermissionSource,
};

// Re-export audit and query types
pub use audit::{explain, AuthorizationSnapshot, PermissionExplanation};
pub use query::{query_memberships, query_permissions, MembershipQuery, PermissionQuery, SortOrder};
