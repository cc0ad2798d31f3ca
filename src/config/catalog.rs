//! Catalog configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Location of the YAML record type catalog
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Load the catalog's seed records into the document store
    #[serde(default = "default_seed")]
    pub seed: bool,
}

impl CatalogConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("CATALOG__PATH"));
        }
        Ok(())
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            seed: default_seed(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("demos/catalog.yaml")
}

fn default_seed() -> bool {
    true
}
