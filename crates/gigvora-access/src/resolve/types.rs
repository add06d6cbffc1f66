//! Types for authorization resolution.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};
use crate::matrix::{permission_key_covers, MembershipKey, PermissionKey};
use crate::registry::PermissionRegistry;

/// Literal used for explicitly granted permissions.
pub const EXPLICIT_SOURCE: &str = "explicit";

/// What granted a resolved permission.
///
/// Serialized as the membership key, or the literal `"explicit"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PermissionSource {
    /// Granted (directly or by implication) through a membership.
    Membership(MembershipKey),
    /// Granted explicitly to the actor.
    Explicit,
}

impl PermissionSource {
    pub fn membership(key: impl Into<MembershipKey>) -> Self {
        Self::Membership(key.into())
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit)
    }
}

impl From<String> for PermissionSource {
    fn from(raw: String) -> Self {
        if raw == EXPLICIT_SOURCE {
            Self::Explicit
        } else {
            Self::Membership(MembershipKey::new(raw))
        }
    }
}

impl From<PermissionSource> for String {
    fn from(source: PermissionSource) -> Self {
        match source {
            PermissionSource::Membership(key) => key.into(),
            PermissionSource::Explicit => EXPLICIT_SOURCE.to_string(),
        }
    }
}

impl std::fmt::Display for PermissionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Membership(key) => write!(f, "{key}"),
            Self::Explicit => write!(f, "{EXPLICIT_SOURCE}"),
        }
    }
}

/// An actor's raw authorization inputs.
///
/// Membership keys may be aliases; unknown keys are tolerated and
/// reported on the resolved state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    #[serde(default)]
    pub memberships: Vec<String>,
    /// Explicitly granted permission keys.
    #[serde(default)]
    pub explicit: Vec<String>,
}

impl AuthorizationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a membership key or alias.
    pub fn membership(mut self, key: impl Into<String>) -> Self {
        self.memberships.push(key.into());
        self
    }

    /// Add several membership keys or aliases.
    pub fn memberships<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.memberships.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Add an explicit permission grant.
    pub fn grant(mut self, key: impl Into<String>) -> Self {
        self.explicit.push(key.into());
        self
    }

    /// Add several explicit permission grants.
    pub fn grants<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.explicit.extend(keys.into_iter().map(Into::into));
        self
    }
}

/// Resolved, per-request authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationState {
    /// Canonical memberships held.
    pub memberships: BTreeSet<MembershipKey>,
    /// Transitively closed permission set.
    pub permissions: BTreeSet<PermissionKey>,
    /// Which memberships (or explicit grants) sourced each permission.
    pub sources: BTreeMap<PermissionKey, BTreeSet<PermissionSource>>,
    /// A held membership carries `grantAll`.
    pub grant_all: bool,
    /// Requested membership keys the registry does not know.
    pub unknown_memberships: Vec<String>,
    /// Requested explicit permission keys the registry does not know.
    pub unknown_permissions: Vec<String>,
    /// Fingerprint of the matrix the state was resolved against.
    pub fingerprint: String,
    /// Resolution time, microseconds since epoch.
    pub resolved_at: u64,
}

impl AuthorizationState {
    /// Is `key` held? A `grant_all` state holds every key.
    pub fn has_permission(&self, key: &str) -> bool {
        self.grant_all || self.permissions.contains(&PermissionKey::new(key))
    }

    /// Is at least one of `keys` held? False for an empty list.
    pub fn has_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.has_permission(k))
    }

    /// Are all of `keys` held? True for an empty list.
    pub fn has_all(&self, keys: &[&str]) -> bool {
        keys.iter().all(|k| self.has_permission(k))
    }

    /// Require `key`, failing with `AccessError::PermissionDenied`.
    pub fn require(&self, key: &str) -> Result<()> {
        if self.has_permission(key) {
            Ok(())
        } else {
            Err(AccessError::PermissionDenied {
                permission: PermissionKey::new(key).to_string(),
            })
        }
    }

    /// Is the membership (by key or alias) held?
    pub fn has_membership(&self, registry: &PermissionRegistry, key_or_alias: &str) -> bool {
        registry
            .canonical_membership(key_or_alias)
            .is_some_and(|key| self.memberships.contains(key))
    }

    /// Sources of a resolved permission; `None` when not resolved.
    pub fn sources_for(&self, key: &str) -> Option<&BTreeSet<PermissionSource>> {
        self.sources.get(&PermissionKey::new(key))
    }

    /// Held permissions covered by a wildcard pattern (e.g. `wallet:*`).
    pub fn permissions_matching(&self, pattern: &str) -> Vec<&PermissionKey> {
        self.permissions
            .iter()
            .filter(|k| permission_key_covers(pattern, k.as_str()))
            .collect()
    }

    /// Does any held permission unlock `surface`?
    pub fn can_access_surface(&self, registry: &PermissionRegistry, surface: &str) -> bool {
        registry
            .permissions_for_surface(surface)
            .iter()
            .any(|p| self.has_permission(p.key.as_str()))
    }
}
