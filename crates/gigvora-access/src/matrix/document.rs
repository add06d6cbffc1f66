//! The matrix document: parsing, loading, and fingerprinting.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AccessError, Result};

use super::membership::Membership;
use super::permission::Permission;
use super::validate::{self, ValidationReport};

/// Current matrix document version.
pub const MATRIX_FORMAT_VERSION: u32 = 1;

/// Embedded Gigvora default matrix.
const BUILTIN_MATRIX: &str = include_str!("../../data/permission_matrix.json");

fn default_version() -> u32 {
    MATRIX_FORMAT_VERSION
}

/// Root permission matrix document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionMatrix {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub memberships: Vec<Membership>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl PermissionMatrix {
    /// Empty matrix; useful as a starting point for programmatic builds.
    pub fn new() -> Self {
        Self {
            version: MATRIX_FORMAT_VERSION,
            memberships: Vec::new(),
            permissions: Vec::new(),
        }
    }

    /// Parse a matrix from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json_slice(json.as_bytes())
    }

    /// Parse a matrix from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let matrix: Self = serde_json::from_slice(bytes).map_err(|e| {
            AccessError::InvalidFileFormat(format!("failed to parse permission matrix: {e}"))
        })?;

        if matrix.version > MATRIX_FORMAT_VERSION {
            return Err(AccessError::InvalidFileFormat(format!(
                "unsupported matrix version {} (max {MATRIX_FORMAT_VERSION})",
                matrix.version
            )));
        }

        Ok(matrix)
    }

    /// Read and parse a matrix file.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Io` if the file cannot be read and
    /// `AccessError::InvalidFileFormat` if it is not a matrix document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Self::from_json_slice(&bytes).map_err(|e| match e {
            AccessError::InvalidFileFormat(msg) => {
                AccessError::InvalidFileFormat(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// The Gigvora default matrix shipped with the library.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_MATRIX)
    }

    /// Write the matrix as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AccessError::SerializationError(e.to_string()))?;
        std::fs::write(path, json.as_bytes())?;
        Ok(())
    }

    /// Collect every structural issue in the document.
    pub fn validate(&self) -> ValidationReport {
        validate::validate_matrix(self)
    }

    /// SHA-256 of the canonical JSON serialization, hex encoded.
    pub fn fingerprint(&self) -> Result<String> {
        let canonical =
            serde_json::to_vec(self).map_err(|e| AccessError::SerializationError(e.to_string()))?;
        Ok(hex::encode(Sha256::digest(&canonical)))
    }
}

impl Default for PermissionMatrix {
    fn default() -> Self {
        Self::new()
    }
}
