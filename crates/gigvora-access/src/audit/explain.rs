//! Per-permission explanations.

use serde::Serialize;

use crate::matrix::{MembershipKey, PermissionKey};
use crate::registry::PermissionRegistry;
use crate::resolve::{AuthorizationState, PermissionSource};

/// Why a permission is (or is not) held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionExplanation {
    pub permission: PermissionKey,
    pub label: String,
    pub granted: bool,
    /// Granted through a `grantAll` membership.
    pub via_grant_all: bool,
    pub sources: Vec<PermissionSource>,
    /// Held permissions that directly imply this one.
    pub implied_by: Vec<PermissionKey>,
    pub escalation_path: Vec<MembershipKey>,
    /// Escalation path entries the actor does not hold (empty when granted).
    pub escalation_candidates: Vec<MembershipKey>,
}

/// Explain `key` for a resolved state. Unknown keys return `None`.
pub fn explain(
    registry: &PermissionRegistry,
    state: &AuthorizationState,
    key: &str,
) -> Option<PermissionExplanation> {
    let permission = registry.permission(key)?;
    let granted = state.has_permission(permission.key.as_str());

    let sources: Vec<PermissionSource> = state
        .sources_for(permission.key.as_str())
        .map(|s| s.iter().cloned().collect())
        .unwrap_or_default();

    let via_grant_all = state.grant_all
        && sources.iter().any(|source| match source {
            PermissionSource::Membership(m) => {
                registry.membership(m.as_str()).is_some_and(|m| m.grant_all)
            }
            PermissionSource::Explicit => false,
        });

    let implied_by = registry
        .implying_parents(permission.key.as_str())
        .iter()
        .filter(|parent| state.permissions.contains(*parent))
        .cloned()
        .collect();

    let escalation_candidates = if granted {
        Vec::new()
    } else {
        permission
            .escalation_path
            .iter()
            .filter(|m| !state.memberships.contains(*m))
            .cloned()
            .collect()
    };

    Some(PermissionExplanation {
        permission: permission.key.clone(),
        label: permission.display_label().to_string(),
        granted,
        via_grant_all,
        sources,
        implied_by,
        escalation_path: permission.escalation_path.clone(),
        escalation_candidates,
    })
}
