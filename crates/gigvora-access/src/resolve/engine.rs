//! Closure computation with source attribution.
//!
//! Resolution seeds a work stack with each held membership's direct
//! permissions and each explicit grant, then follows implication edges
//! until nothing changes. A permission reached from P inherits all of P's
//! sources; a permission is revisited whenever its source set grows, so
//! attribution reaches a fixed point regardless of visiting order.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::matrix::PermissionKey;
use crate::registry::PermissionRegistry;

use super::types::{AuthorizationRequest, AuthorizationState, PermissionSource};

/// Resolve a request against a registry.
pub fn resolve(
    registry: &PermissionRegistry,
    request: &AuthorizationRequest,
) -> AuthorizationState {
    // 1. Canonicalize memberships.
    let mut memberships = BTreeSet::new();
    let mut unknown_memberships = Vec::new();
    let mut wildcard_sources: BTreeSet<PermissionSource> = BTreeSet::new();

    for raw in &request.memberships {
        match registry.membership(raw) {
            Some(membership) => {
                if memberships.insert(membership.key.clone()) && membership.grant_all {
                    wildcard_sources.insert(PermissionSource::Membership(membership.key.clone()));
                }
            }
            None => {
                debug!("ignoring unknown membership {raw:?}");
                unknown_memberships.push(raw.clone());
            }
        }
    }

    // 2. Seed direct grants.
    let mut sources: BTreeMap<PermissionKey, BTreeSet<PermissionSource>> = BTreeMap::new();
    let mut stack: Vec<PermissionKey> = Vec::new();

    for key in &memberships {
        let Some(membership) = registry.membership(key.as_str()) else {
            continue;
        };
        for permission in &membership.permissions {
            let source = PermissionSource::Membership(key.clone());
            if sources.entry(permission.clone()).or_default().insert(source) {
                stack.push(permission.clone());
            }
        }
    }

    let mut unknown_permissions = Vec::new();
    for raw in &request.explicit {
        let key = PermissionKey::new(raw);
        if !registry.contains_permission(key.as_str()) {
            debug!("ignoring unknown explicit permission {raw:?}");
            unknown_permissions.push(raw.clone());
            continue;
        }
        if sources
            .entry(key.clone())
            .or_default()
            .insert(PermissionSource::Explicit)
        {
            stack.push(key);
        }
    }

    // 3. Follow implication edges to a fixed point.
    while let Some(current) = stack.pop() {
        let Some(permission) = registry.permission(current.as_str()) else {
            continue;
        };
        let inherited = sources.get(&current).cloned().unwrap_or_default();

        for implied in &permission.implies {
            let entry = sources.entry(implied.clone()).or_default();
            let before = entry.len();
            entry.extend(inherited.iter().cloned());
            if before == 0 || entry.len() > before {
                stack.push(implied.clone());
            }
        }
    }

    // 4. Wildcard memberships widen to the whole universe.
    let grant_all = !wildcard_sources.is_empty();
    if grant_all {
        for key in registry.universe() {
            sources
                .entry(key.clone())
                .or_default()
                .extend(wildcard_sources.iter().cloned());
        }
    }

    let permissions = sources.keys().cloned().collect();

    AuthorizationState {
        memberships,
        permissions,
        sources,
        grant_all,
        unknown_memberships,
        unknown_permissions,
        fingerprint: registry.fingerprint().to_string(),
        resolved_at: crate::time::now_micros(),
    }
}

/// Resolve from plain key slices.
pub fn resolve_for(
    registry: &PermissionRegistry,
    memberships: &[&str],
    explicit: &[&str],
) -> AuthorizationState {
    let request = AuthorizationRequest::new()
        .memberships(memberships.iter().copied())
        .grants(explicit.iter().copied());
    resolve(registry, &request)
}
