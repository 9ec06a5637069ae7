//! Deployment configuration sourced from the process environment.
//!
//! Configuration selects and parameterizes the storage backend and locates
//! the catalog document. It is a deployment concern: nothing in the
//! data-plane contract depends on where these values came from.

use std::env;
use std::path::PathBuf;

use crate::{LakeError, Result};

pub const DEFAULT_DATA_ROOT: &str = "data";
pub const DEFAULT_CATALOG_PATH: &str = "data/table_catalog.json";

/// Which storage backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    S3,
}

/// Credentials and addressing for an S3-compatible object store.
#[derive(Debug, Clone)]
pub struct S3Settings {
    /// Custom endpoint for S3-compatible stores; AWS proper when absent.
    pub endpoint: Option<String>,
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub backend: BackendKind,
    /// Filesystem root (local) or in-bucket key prefix (s3) for data files.
    pub data_root: String,
    /// Location of the persisted catalog document (always a local path).
    pub catalog_path: PathBuf,
    pub s3: Option<S3Settings>,
}

impl Settings {
    /// Read settings from `LAKELET_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = match lookup("LAKELET_BACKEND").as_deref() {
            None | Some("local") => BackendKind::Local,
            Some("s3") => BackendKind::S3,
            Some(other) => {
                return Err(LakeError::Config(format!(
                    "unknown LAKELET_BACKEND '{}', expected 'local' or 's3'",
                    other
                )))
            }
        };

        let data_root =
            lookup("LAKELET_DATA_ROOT").unwrap_or_else(|| DEFAULT_DATA_ROOT.to_string());
        let catalog_path = lookup("LAKELET_CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH));

        let s3 = if backend == BackendKind::S3 {
            let require = |key: &str| {
                lookup(key).ok_or_else(|| {
                    LakeError::Config(format!("{} is required for the s3 backend", key))
                })
            };
            Some(S3Settings {
                endpoint: lookup("LAKELET_S3_ENDPOINT"),
                bucket: require("LAKELET_S3_BUCKET")?,
                region: lookup("LAKELET_S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: require("LAKELET_S3_ACCESS_KEY_ID")?,
                secret_access_key: require("LAKELET_S3_SECRET_ACCESS_KEY")?,
            })
        } else {
            None
        };

        Ok(Settings {
            backend,
            data_root,
            catalog_path,
            s3,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            data_root: DEFAULT_DATA_ROOT.to_string(),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            s3: None,
        }
    }
}
