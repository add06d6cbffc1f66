//! Whole-document validation.
//!
//! Validation never stops at the first problem: every issue is collected
//! into a [`ValidationReport`] so that an operator can fix a matrix in one
//! pass.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::{AccessError, Result};

use super::document::PermissionMatrix;
use super::membership::MembershipKey;
use super::permission::PermissionKey;

/// A single structural problem in a matrix document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatrixIssue {
    InvalidPermissionKey {
        key: String,
    },
    InvalidMembershipKey {
        key: String,
    },
    DuplicatePermission {
        key: PermissionKey,
    },
    DuplicateMembership {
        key: MembershipKey,
    },
    /// An alias collides with a canonical key or another alias.
    AliasConflict {
        alias: MembershipKey,
        membership: MembershipKey,
        existing: MembershipKey,
    },
    /// An implication edge points at an unknown permission.
    DanglingImplication {
        permission: PermissionKey,
        implied: PermissionKey,
    },
    UnknownGrantedPermission {
        membership: MembershipKey,
        permission: PermissionKey,
    },
    UnknownEscalationMembership {
        permission: PermissionKey,
        membership: MembershipKey,
    },
}

impl std::fmt::Display for MatrixIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPermissionKey { key } => write!(f, "invalid permission key {key:?}"),
            Self::InvalidMembershipKey { key } => write!(f, "invalid membership key {key:?}"),
            Self::DuplicatePermission { key } => write!(f, "duplicate permission {key}"),
            Self::DuplicateMembership { key } => write!(f, "duplicate membership {key}"),
            Self::AliasConflict {
                alias,
                membership,
                existing,
            } => write!(
                f,
                "alias {alias} of {membership} already resolves to {existing}"
            ),
            Self::DanglingImplication {
                permission,
                implied,
            } => write!(f, "{permission} implies unknown permission {implied}"),
            Self::UnknownGrantedPermission {
                membership,
                permission,
            } => write!(f, "{membership} grants unknown permission {permission}"),
            Self::UnknownEscalationMembership {
                permission,
                membership,
            } => write!(
                f,
                "escalation path of {permission} names unknown membership {membership}"
            ),
        }
    }
}

/// Outcome of validating a matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<MatrixIssue>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// `Ok(())` when clean, `AccessError::InvalidMatrix` otherwise.
    pub fn into_result(self) -> Result<()> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(AccessError::InvalidMatrix(self))
        }
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.issues.is_empty() {
            return write!(f, "no issues");
        }
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "- {issue}")?;
        }
        Ok(())
    }
}

/// Validate a matrix document.
pub(crate) fn validate_matrix(matrix: &PermissionMatrix) -> ValidationReport {
    let mut issues = Vec::new();

    // Permission keys: validity and uniqueness.
    let mut permission_keys: HashSet<&PermissionKey> = HashSet::new();
    for permission in &matrix.permissions {
        if !permission.key.is_valid() {
            issues.push(MatrixIssue::InvalidPermissionKey {
                key: permission.key.to_string(),
            });
        }
        if !permission_keys.insert(&permission.key) {
            issues.push(MatrixIssue::DuplicatePermission {
                key: permission.key.clone(),
            });
        }
    }

    // Membership keys: validity, uniqueness, then aliases against the
    // complete canonical set.
    let mut canonical: HashSet<&MembershipKey> = HashSet::new();
    for membership in &matrix.memberships {
        if !membership.key.is_valid() {
            issues.push(MatrixIssue::InvalidMembershipKey {
                key: membership.key.to_string(),
            });
        }
        if !canonical.insert(&membership.key) {
            issues.push(MatrixIssue::DuplicateMembership {
                key: membership.key.clone(),
            });
        }
    }

    let mut alias_owner: HashMap<&MembershipKey, &MembershipKey> = HashMap::new();
    for membership in &matrix.memberships {
        for alias in &membership.aliases {
            if !alias.is_valid() {
                issues.push(MatrixIssue::InvalidMembershipKey {
                    key: alias.to_string(),
                });
                continue;
            }
            if alias == &membership.key {
                continue;
            }
            if canonical.contains(alias) {
                issues.push(MatrixIssue::AliasConflict {
                    alias: alias.clone(),
                    membership: membership.key.clone(),
                    existing: alias.clone(),
                });
                continue;
            }
            match alias_owner.get(alias) {
                Some(existing) if *existing != &membership.key => {
                    issues.push(MatrixIssue::AliasConflict {
                        alias: alias.clone(),
                        membership: membership.key.clone(),
                        existing: (*existing).clone(),
                    });
                }
                Some(_) => {}
                None => {
                    alias_owner.insert(alias, &membership.key);
                }
            }
        }
    }

    // References.
    for permission in &matrix.permissions {
        for implied in &permission.implies {
            if !permission_keys.contains(implied) {
                issues.push(MatrixIssue::DanglingImplication {
                    permission: permission.key.clone(),
                    implied: implied.clone(),
                });
            }
        }
        for member in &permission.escalation_path {
            if !canonical.contains(member) && !alias_owner.contains_key(member) {
                issues.push(MatrixIssue::UnknownEscalationMembership {
                    permission: permission.key.clone(),
                    membership: member.clone(),
                });
            }
        }
    }

    for membership in &matrix.memberships {
        for granted in &membership.permissions {
            if !permission_keys.contains(granted) {
                issues.push(MatrixIssue::UnknownGrantedPermission {
                    membership: membership.key.clone(),
                    permission: granted.clone(),
                });
            }
        }
    }

    ValidationReport { issues }
}
