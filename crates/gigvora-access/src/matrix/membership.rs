//! Memberships — role-like bundles of permissions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};

use super::permission::PermissionKey;

/// Normalized membership key.
///
/// Normalization trims, lowercases, and maps `-` and spaces to `_`, so
/// `"Workspace-Admin"` and `"workspace admin"` both become
/// `workspace_admin`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct MembershipKey(String);

impl MembershipKey {
    /// Normalize a raw key without validating it.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw
            .as_ref()
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();
        Self(normalized)
    }

    /// Normalize and validate a raw key.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let key = Self::new(raw.as_ref());
        if key.is_valid() {
            Ok(key)
        } else {
            Err(AccessError::InvalidMembershipKey(raw.as_ref().to_string()))
        }
    }

    /// A valid key is non-empty ASCII alphanumerics and underscores.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MembershipKey {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for MembershipKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<MembershipKey> for String {
    fn from(key: MembershipKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for MembershipKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// A grant bundle conferring a set of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    /// Canonical key.
    pub key: MembershipKey,
    #[serde(default)]
    pub label: String,
    /// Tier label (e.g., "core", "operations", "platform").
    #[serde(default)]
    pub tier: String,
    /// Directly granted permissions.
    #[serde(default)]
    pub permissions: BTreeSet<PermissionKey>,
    /// Wildcard membership: every permission, bypassing normal checks.
    #[serde(default)]
    pub grant_all: bool,
    /// Alternative keys resolving to this definition.
    #[serde(default)]
    pub aliases: Vec<MembershipKey>,
}

impl Membership {
    pub fn new(key: impl Into<MembershipKey>) -> Self {
        Self {
            key: key.into(),
            label: String::new(),
            tier: String::new(),
            permissions: BTreeSet::new(),
            grant_all: false,
            aliases: Vec::new(),
        }
    }

    /// Builder-style: grant a permission directly.
    pub fn granting(mut self, permission: impl Into<PermissionKey>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Builder-style: register an alias.
    pub fn aliased(mut self, alias: impl Into<MembershipKey>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Builder-style: set the tier.
    pub fn in_tier(mut self, tier: impl Into<String>) -> Self {
        self.tier = tier.into();
        self
    }

    /// Builder-style: mark as a wildcard membership.
    pub fn with_grant_all(mut self) -> Self {
        self.grant_all = true;
        self
    }

    /// Label for display; falls back to the key.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            self.key.as_str()
        } else {
            &self.label
        }
    }
}
