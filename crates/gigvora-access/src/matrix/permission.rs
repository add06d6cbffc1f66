//! Permission keys, definitions, and wildcard pattern matching.
//!
//! Permission keys are `category:action` strings, optionally nested:
//!   - `calendar:manage` — manage workspace calendars
//!   - `wallet:ledger:reconcile` — reconcile wallet ledgers
//!
//! Patterns used by queries accept a trailing wildcard:
//!   - `wallet:*` — anything under `wallet:`
//!   - `*` — every permission

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};

use super::membership::MembershipKey;

/// Normalized permission key (trimmed, lowercase).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PermissionKey(String);

impl PermissionKey {
    /// Normalize a raw key without validating it.
    ///
    /// Matrix documents are deserialized through this path so that
    /// malformed keys can be reported by validation instead of aborting
    /// the parse.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    /// Normalize and validate a raw key.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let key = Self::new(raw.as_ref());
        if key.is_valid() {
            Ok(key)
        } else {
            Err(AccessError::InvalidPermissionKey(raw.as_ref().to_string()))
        }
    }

    /// A valid key is non-empty, contains no whitespace and no wildcard.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && !self.0.contains(char::is_whitespace) && !self.0.contains('*')
    }

    /// Leading segment of the key (`calendar` for `calendar:manage`).
    pub fn namespace(&self) -> &str {
        self.0.split(':').next().unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PermissionKey {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for PermissionKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<PermissionKey> for String {
    fn from(key: PermissionKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// An atomic authorization capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// Unique key (e.g., "calendar:manage").
    pub key: PermissionKey,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// Grouping used by admin dashboards (e.g., "compliance").
    #[serde(default)]
    pub category: String,
    /// UI/API surfaces this permission unlocks.
    #[serde(default)]
    pub surfaces: Vec<String>,
    /// Permissions granted transitively by holding this one.
    #[serde(default)]
    pub implies: Vec<PermissionKey>,
    /// Memberships, in order, that can grant this permission.
    #[serde(default)]
    pub escalation_path: Vec<MembershipKey>,
}

impl Permission {
    /// Minimal definition with only a key; everything else empty.
    pub fn new(key: impl Into<PermissionKey>) -> Self {
        Self {
            key: key.into(),
            label: String::new(),
            description: String::new(),
            category: String::new(),
            surfaces: Vec::new(),
            implies: Vec::new(),
            escalation_path: Vec::new(),
        }
    }

    /// Label for display; falls back to the key.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            self.key.as_str()
        } else {
            &self.label
        }
    }

    /// Builder-style: add an implication edge.
    pub fn implying(mut self, key: impl Into<PermissionKey>) -> Self {
        self.implies.push(key.into());
        self
    }

    /// Builder-style: set the category.
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Builder-style: add a surface identifier.
    pub fn on_surface(mut self, surface: impl Into<String>) -> Self {
        self.surfaces.push(surface.into());
        self
    }

    /// Builder-style: append a membership to the escalation path.
    pub fn escalates_to(mut self, membership: impl Into<MembershipKey>) -> Self {
        self.escalation_path.push(membership.into());
        self
    }
}

/// Check whether a pattern covers a permission key.
///
/// Matching rules:
/// - `*` matches everything
/// - `ns:*` matches `ns` itself and anything under `ns:`
/// - anything else matches exactly (after normalization)
pub fn permission_key_covers(pattern: &str, key: &str) -> bool {
    let pattern = pattern.trim().to_lowercase();
    let key = key.trim().to_lowercase();

    if pattern == "*" || pattern == key {
        return true;
    }

    if let Some(prefix) = pattern.strip_suffix(":*") {
        if key == prefix {
            return true;
        }
        return key.starts_with(prefix) && key.as_bytes().get(prefix.len()) == Some(&b':');
    }

    false
}
