//! Permission registry — the read-only index built once from a matrix.
//!
//! A [`PermissionRegistry`] holds owned copies of every permission and
//! membership and supports O(1) lookups by key or alias, set lookups by
//! category and surface, and memoized implication closures. It is never
//! mutated after [`PermissionRegistry::build`], so it can be shared across
//! threads behind an `Arc` (see [`global`]).

pub mod global;

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{info, warn};

use crate::error::{AccessError, Result};
use crate::matrix::{
    Membership, MembershipKey, Permission, PermissionKey, PermissionMatrix, ValidationReport,
};

/// How a registry reacts to matrix validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Any issue aborts the build.
    #[default]
    Strict,
    /// Issues are logged; offending entries are dropped and the first
    /// definition of a duplicated key wins.
    Lenient,
}

impl std::str::FromStr for LoadMode {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(AccessError::InvalidConfig(format!(
                "unknown load mode {other:?} (expected strict or lenient)"
            ))),
        }
    }
}

impl std::fmt::Display for LoadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Lenient => write!(f, "lenient"),
        }
    }
}

/// Read-only index over a permission matrix.
#[derive(Debug)]
pub struct PermissionRegistry {
    /// Primary store: permission key → definition.
    permissions: HashMap<PermissionKey, Permission>,
    /// Primary store: canonical membership key → definition.
    memberships: HashMap<MembershipKey, Membership>,
    /// Canonical keys and aliases → canonical key.
    aliases: HashMap<MembershipKey, MembershipKey>,
    /// Memberships in document order.
    membership_order: Vec<MembershipKey>,
    /// Secondary index: category → permission keys (sorted).
    by_category: HashMap<String, Vec<PermissionKey>>,
    /// Secondary index: surface → permission keys (sorted).
    by_surface: HashMap<String, Vec<PermissionKey>>,
    /// Reverse edges: permission → permissions that directly imply it.
    implied_from: HashMap<PermissionKey, Vec<PermissionKey>>,
    /// Memoized closure: permission → everything reachable via `implies`.
    closure: HashMap<PermissionKey, BTreeSet<PermissionKey>>,
    universe: BTreeSet<PermissionKey>,
    /// Issues tolerated while building (always empty in strict mode).
    issues: ValidationReport,
    fingerprint: String,
    built_at: u64,
}

impl PermissionRegistry {
    /// Build a registry from a matrix document.
    ///
    /// # Errors
    ///
    /// In [`LoadMode::Strict`], returns `AccessError::InvalidMatrix` when the
    /// matrix has any validation issue.
    pub fn build(matrix: PermissionMatrix, mode: LoadMode) -> Result<Self> {
        let fingerprint = matrix.fingerprint()?;
        let report = matrix.validate();

        if !report.is_clean() {
            match mode {
                LoadMode::Strict => return Err(AccessError::InvalidMatrix(report)),
                LoadMode::Lenient => {
                    for issue in &report.issues {
                        warn!("permission matrix: {issue} (dropped)");
                    }
                }
            }
        }

        // ── Permissions: first valid definition wins ──────────────────────
        let mut permissions: HashMap<PermissionKey, Permission> = HashMap::new();
        for permission in matrix.permissions {
            if !permission.key.is_valid() || permissions.contains_key(&permission.key) {
                continue;
            }
            permissions.insert(permission.key.clone(), permission);
        }
        let universe: BTreeSet<PermissionKey> = permissions.keys().cloned().collect();

        // ── Memberships and aliases ───────────────────────────────────────
        let mut memberships: HashMap<MembershipKey, Membership> = HashMap::new();
        let mut membership_order = Vec::new();
        for mut membership in matrix.memberships {
            if !membership.key.is_valid() || memberships.contains_key(&membership.key) {
                continue;
            }
            membership.permissions.retain(|p| universe.contains(p));
            membership_order.push(membership.key.clone());
            memberships.insert(membership.key.clone(), membership);
        }

        let mut aliases: HashMap<MembershipKey, MembershipKey> = membership_order
            .iter()
            .map(|key| (key.clone(), key.clone()))
            .collect();
        for key in &membership_order {
            for alias in &memberships[key].aliases {
                if alias.is_valid() && !aliases.contains_key(alias) {
                    aliases.insert(alias.clone(), key.clone());
                }
            }
        }

        // ── Prune edges and canonicalize escalation paths ─────────────────
        for permission in permissions.values_mut() {
            let mut seen = HashSet::new();
            permission
                .implies
                .retain(|k| universe.contains(k) && seen.insert(k.clone()));

            let mut seen = HashSet::new();
            permission.escalation_path = permission
                .escalation_path
                .iter()
                .filter_map(|m| aliases.get(m).cloned())
                .filter(|m| seen.insert(m.clone()))
                .collect();
        }

        // ── Secondary indexes ─────────────────────────────────────────────
        let mut by_category: HashMap<String, Vec<PermissionKey>> = HashMap::new();
        let mut by_surface: HashMap<String, Vec<PermissionKey>> = HashMap::new();
        let mut implied_from: HashMap<PermissionKey, Vec<PermissionKey>> = HashMap::new();
        for key in &universe {
            let permission = &permissions[key];
            if !permission.category.is_empty() {
                by_category
                    .entry(permission.category.clone())
                    .or_default()
                    .push(key.clone());
            }
            for surface in &permission.surfaces {
                let keys = by_surface.entry(surface.clone()).or_default();
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
            for implied in &permission.implies {
                implied_from
                    .entry(implied.clone())
                    .or_default()
                    .push(key.clone());
            }
        }

        let closure = universe
            .iter()
            .map(|key| (key.clone(), reachable_from(key, &permissions)))
            .collect();

        let registry = Self {
            permissions,
            memberships,
            aliases,
            membership_order,
            by_category,
            by_surface,
            implied_from,
            closure,
            universe,
            issues: report,
            fingerprint,
            built_at: crate::time::now_micros(),
        };

        info!(
            "registry built: {} permissions, {} memberships, {mode} mode, fingerprint {}",
            registry.universe.len(),
            registry.membership_order.len(),
            &registry.fingerprint[..12]
        );

        Ok(registry)
    }

    /// Build from the embedded Gigvora matrix.
    pub fn builtin() -> Result<Self> {
        Self::build(PermissionMatrix::builtin()?, LoadMode::Strict)
    }

    // ── Permission lookups ────────────────────────────────────────────────

    /// Look up a permission by key. Unknown keys return `None`.
    pub fn permission(&self, key: &str) -> Option<&Permission> {
        self.permissions.get(&PermissionKey::new(key))
    }

    pub fn contains_permission(&self, key: &str) -> bool {
        self.permissions.contains_key(&PermissionKey::new(key))
    }

    /// Every permission reachable from `key` through implication edges.
    ///
    /// The key itself is included only when a cycle leads back to it.
    pub fn implied_by(&self, key: &str) -> Option<&BTreeSet<PermissionKey>> {
        self.closure.get(&PermissionKey::new(key))
    }

    /// Does holding `holder` grant `target` (directly or transitively)?
    pub fn implies(&self, holder: &str, target: &str) -> bool {
        let target = PermissionKey::new(target);
        self.closure
            .get(&PermissionKey::new(holder))
            .is_some_and(|reached| reached.contains(&target))
    }

    /// Permissions whose `implies` list names `key` directly.
    pub fn implying_parents(&self, key: &str) -> &[PermissionKey] {
        self.implied_from
            .get(&PermissionKey::new(key))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Ordered canonical memberships that can grant `key`.
    pub fn escalation_path(&self, key: &str) -> Option<&[MembershipKey]> {
        self.permission(key).map(|p| p.escalation_path.as_slice())
    }

    pub fn permissions_in_category(&self, category: &str) -> Vec<&Permission> {
        self.collect_keys(self.by_category.get(category))
    }

    pub fn permissions_for_surface(&self, surface: &str) -> Vec<&Permission> {
        self.collect_keys(self.by_surface.get(surface))
    }

    /// All permissions, sorted by key.
    pub fn permissions(&self) -> Vec<&Permission> {
        self.universe
            .iter()
            .filter_map(|k| self.permissions.get(k))
            .collect()
    }

    /// The full permission universe, sorted.
    pub fn universe(&self) -> &BTreeSet<PermissionKey> {
        &self.universe
    }

    /// Known categories, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.by_category.keys().map(String::as_str).collect();
        categories.sort_unstable();
        categories
    }

    /// Known surfaces, sorted.
    pub fn surfaces(&self) -> Vec<&str> {
        let mut surfaces: Vec<&str> = self.by_surface.keys().map(String::as_str).collect();
        surfaces.sort_unstable();
        surfaces
    }

    // ── Membership lookups ────────────────────────────────────────────────

    /// Look up a membership by canonical key or alias.
    pub fn membership(&self, key_or_alias: &str) -> Option<&Membership> {
        self.canonical_membership(key_or_alias)
            .and_then(|key| self.memberships.get(key))
    }

    /// Resolve an alias (or canonical key) to the canonical key.
    pub fn canonical_membership(&self, key_or_alias: &str) -> Option<&MembershipKey> {
        self.aliases.get(&MembershipKey::new(key_or_alias))
    }

    /// All memberships in document order.
    pub fn memberships(&self) -> Vec<&Membership> {
        self.membership_order
            .iter()
            .filter_map(|k| self.memberships.get(k))
            .collect()
    }

    // ── Metadata ──────────────────────────────────────────────────────────

    pub fn len_permissions(&self) -> usize {
        self.universe.len()
    }

    pub fn len_memberships(&self) -> usize {
        self.membership_order.len()
    }

    /// Fingerprint of the matrix this registry was built from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Build time, microseconds since epoch.
    pub fn built_at(&self) -> u64 {
        self.built_at
    }

    /// Issues tolerated during a lenient build.
    pub fn issues(&self) -> &ValidationReport {
        &self.issues
    }

    fn collect_keys(&self, keys: Option<&Vec<PermissionKey>>) -> Vec<&Permission> {
        keys.map(|keys| {
            keys.iter()
                .filter_map(|k| self.permissions.get(k))
                .collect()
        })
        .unwrap_or_default()
    }
}

/// Depth-first walk of implication edges starting below `start`.
fn reachable_from(
    start: &PermissionKey,
    permissions: &HashMap<PermissionKey, Permission>,
) -> BTreeSet<PermissionKey> {
    let mut reached = BTreeSet::new();
    let mut stack: Vec<&PermissionKey> = permissions
        .get(start)
        .map(|p| p.implies.iter().collect())
        .unwrap_or_default();

    while let Some(key) = stack.pop() {
        if reached.insert(key.clone()) {
            if let Some(permission) = permissions.get(key) {
                stack.extend(permission.implies.iter());
            }
        }
    }

    reached
}

// ── Tests ─────────────────────────────────────────────────────────────────────
