//! Flat, serializable audit records of a resolution.

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};
use crate::resolve::AuthorizationState;

/// One resolved permission and what sourced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub permission: String,
    pub sources: Vec<String>,
}

/// Audit record of an [`AuthorizationState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationSnapshot {
    /// Matrix fingerprint the decision was made against.
    pub fingerprint: String,
    /// RFC 3339 resolution time.
    pub resolved_at: String,
    pub memberships: Vec<String>,
    pub grant_all: bool,
    pub permissions: Vec<SnapshotEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_memberships: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_permissions: Vec<String>,
}

impl AuthorizationSnapshot {
    pub fn capture(state: &AuthorizationState) -> Self {
        let permissions = state
            .sources
            .iter()
            .map(|(key, sources)| SnapshotEntry {
                permission: key.to_string(),
                sources: sources.iter().map(ToString::to_string).collect(),
            })
            .collect();

        Self {
            fingerprint: state.fingerprint.clone(),
            resolved_at: crate::time::micros_to_rfc3339(state.resolved_at),
            memberships: state.memberships.iter().map(ToString::to_string).collect(),
            grant_all: state.grant_all,
            permissions,
            unknown_memberships: state.unknown_memberships.clone(),
            unknown_permissions: state.unknown_permissions.clone(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AccessError::SerializationError(e.to_string()))
    }
}
