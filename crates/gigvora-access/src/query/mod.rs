//! Catalogue queries over a [`PermissionRegistry`].
//!
//! - [`PermissionQuery`] / [`query_permissions`] — filter permissions by
//!   category, surface, and key pattern, then sort and limit.
//! - [`MembershipQuery`] / [`query_memberships`] — filter memberships by
//!   tier or by a permission they (transitively) grant.
//!
//! ## Query execution model
//!
//! Each query function:
//! 1. Collects an initial candidate set from the most selective index hint
//!    available, or falls back to a full scan.
//! 2. Applies every specified filter in turn to narrow the set.
//! 3. Sorts the results according to [`SortOrder`].
//! 4. Applies an optional result limit.

use crate::matrix::{permission_key_covers, Membership, Permission, PermissionKey};
use crate::registry::PermissionRegistry;

// ── SortOrder ─────────────────────────────────────────────────────────────────

/// Sort direction for permission results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    KeyAscending,
    KeyDescending,
}

// ── PermissionQuery ───────────────────────────────────────────────────────────

/// Query parameters for filtering [`Permission`] definitions.
///
/// All fields are optional.  Unset fields impose no restriction.
/// When multiple filters are set they are combined with logical AND.
#[derive(Debug, Clone, Default)]
pub struct PermissionQuery {
    pub category: Option<String>,
    pub surface: Option<String>,
    /// Key pattern, e.g. `wallet:*` or an exact key.
    pub pattern: Option<String>,
    pub limit: Option<usize>,
    pub sort: SortOrder,
}

// ── MembershipQuery ───────────────────────────────────────────────────────────

/// Query parameters for filtering [`Membership`] definitions.
#[derive(Debug, Clone, Default)]
pub struct MembershipQuery {
    pub tier: Option<String>,
    /// Only memberships whose resolved permissions include this key.
    /// `grantAll` memberships always match.
    pub granting: Option<String>,
}

// ── query_permissions ─────────────────────────────────────────────────────────

/// Execute a [`PermissionQuery`] against a registry.
pub fn query_permissions<'a>(
    registry: &'a PermissionRegistry,
    query: &PermissionQuery,
) -> Vec<&'a Permission> {
    // Priority: surface index > category index > full scan.
    let mut candidates: Vec<&Permission> = match (&query.surface, &query.category) {
        (Some(surface), _) => registry.permissions_for_surface(surface),
        (None, Some(category)) => registry.permissions_in_category(category),
        (None, None) => registry.permissions(),
    };

    if let Some(category) = &query.category {
        candidates.retain(|p| &p.category == category);
    }

    if let Some(pattern) = &query.pattern {
        candidates.retain(|p| permission_key_covers(pattern, p.key.as_str()));
    }

    match query.sort {
        SortOrder::KeyAscending => candidates.sort_by(|a, b| a.key.cmp(&b.key)),
        SortOrder::KeyDescending => candidates.sort_by(|a, b| b.key.cmp(&a.key)),
    }

    if let Some(limit) = query.limit {
        candidates.truncate(limit);
    }

    candidates
}

// ── query_memberships ─────────────────────────────────────────────────────────

/// Execute a [`MembershipQuery`] against a registry, in document order.
pub fn query_memberships<'a>(
    registry: &'a PermissionRegistry,
    query: &MembershipQuery,
) -> Vec<&'a Membership> {
    let granting = query.granting.as_deref().map(PermissionKey::new);

    registry
        .memberships()
        .into_iter()
        .filter(|m| query.tier.as_ref().map_or(true, |tier| &m.tier == tier))
        .filter(|m| match &granting {
            None => true,
            Some(target) => membership_grants(registry, m, target),
        })
        .collect()
}

fn membership_grants(
    registry: &PermissionRegistry,
    membership: &Membership,
    target: &PermissionKey,
) -> bool {
    if membership.grant_all {
        return registry.universe().contains(target);
    }
    membership.permissions.iter().any(|direct| {
        direct == target || registry.implies(direct.as_str(), target.as_str())
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
