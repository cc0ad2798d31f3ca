//! Permission configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Which permission checker guards record operations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionsConfig {
    /// YAML role table; every actor may do everything when unset
    #[serde(default)]
    pub roles_path: Option<PathBuf>,
}

impl PermissionsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if matches!(&self.roles_path, Some(path) if path.as_os_str().is_empty()) {
            return Err(ValidationError::MissingRequired("PERMISSIONS__ROLES_PATH"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all_by_default() {
        let config = PermissionsConfig::default();
        assert!(config.roles_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_roles_path_is_invalid() {
        let config = PermissionsConfig {
            roles_path: Some(PathBuf::new()),
        };
        assert!(config.validate().is_err());
    }
}
