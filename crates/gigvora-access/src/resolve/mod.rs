//! Authorization resolution — memberships and explicit grants in, a
//! transitively closed, source-attributed permission set out.

pub mod engine;
pub mod types;

pub use engine::{resolve, resolve_for};
pub use types::{AuthorizationRequest, AuthorizationState, PermissionSource, EXPLICIT_SOURCE};
