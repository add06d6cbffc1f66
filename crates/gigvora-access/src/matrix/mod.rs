//! Permission matrix — the static document the registry is built from.
//!
//! The matrix module provides:
//! - Normalized permission and membership keys
//! - Permission definitions with implication edges and escalation paths
//! - Membership definitions with aliases and the `grantAll` wildcard
//! - JSON loading (file, bytes, or the embedded Gigvora default)
//! - Whole-document validation and fingerprinting

pub mod document;
pub mod membership;
pub mod permission;
pub mod validate;

pub use document::{PermissionMatrix, MATRIX_FORMAT_VERSION};
pub use membership::{Membership, MembershipKey};
pub use permission::{permission_key_covers, Permission, PermissionKey};
pub use validate::{MatrixIssue, ValidationReport};
