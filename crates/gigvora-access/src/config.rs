//! Registry configuration.
//!
//! The matrix location and load mode come from the environment
//! (`GIGVORA_PERMISSION_MATRIX`, `GIGVORA_PERMISSION_MODE`) and can be
//! overridden programmatically, e.g. by CLI flags.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{AccessError, Result};
use crate::matrix::PermissionMatrix;
use crate::registry::{LoadMode, PermissionRegistry};

/// Environment variable naming the matrix file.
pub const MATRIX_PATH_ENV: &str = "GIGVORA_PERMISSION_MATRIX";

/// Environment variable selecting `strict` or `lenient` loading.
pub const LOAD_MODE_ENV: &str = "GIGVORA_PERMISSION_MODE";

/// Where the matrix comes from and how strictly it is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessConfig {
    /// Matrix file; `None` selects the embedded default matrix.
    pub matrix_path: Option<PathBuf>,
    pub mode: LoadMode,
}

impl AccessConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let matrix_path = non_empty(MATRIX_PATH_ENV).map(PathBuf::from);
        let mode = match non_empty(LOAD_MODE_ENV) {
            Some(raw) => raw.parse::<LoadMode>().map_err(|e| match e {
                AccessError::InvalidConfig(msg) => {
                    AccessError::InvalidConfig(format!("{LOAD_MODE_ENV}: {msg}"))
                }
                other => other,
            })?,
            None => LoadMode::default(),
        };

        Ok(Self { matrix_path, mode })
    }

    pub fn with_matrix_path(mut self, path: impl AsRef<Path>) -> Self {
        self.matrix_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_mode(mut self, mode: LoadMode) -> Self {
        self.mode = mode;
        self
    }

    /// Load the configured matrix document.
    pub fn load_matrix(&self) -> Result<PermissionMatrix> {
        match &self.matrix_path {
            Some(path) => {
                debug!("loading permission matrix from {}", path.display());
                PermissionMatrix::load(path)
            }
            None => {
                debug!("loading embedded permission matrix");
                PermissionMatrix::builtin()
            }
        }
    }

    /// Load the configured matrix and build a registry from it.
    pub fn load_registry(&self) -> Result<PermissionRegistry> {
        PermissionRegistry::build(self.load_matrix()?, self.mode)
    }
}
