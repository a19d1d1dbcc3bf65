//! Engine configuration.
//!
//! Loaded from a JSON file (`KureConfig::load_from`) or from environment
//! variables (`KureConfig::from_env`):
//!
//! ```bash
//! KURE_DEFAULT_APPROVED_ROLE=member   # or moderator
//! KURE_MAX_OWNED_GROUPS=4
//! KURE_NAME_MIN_LEN=4
//! KURE_NAME_MAX_LEN=17
//! KURE_CASE_INSENSITIVE_NAMES=true
//! KURE_PAGE_SIZE=20
//! ```
//!
//! Unset keys keep their defaults. [`crate::Kure::new`] validates the config
//! and refuses one that does not pass `validate()`.

use kure_storage::Role;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidVar { key: String, value: String },
    #[error("Approved role must be moderator or member, got {0}")]
    ApprovedRole(Role),
    #[error("Invalid name bounds: min {min}, max {max}")]
    NameBounds { min: usize, max: usize },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct KureConfig {
    pub access: AccessConfig,
    pub catalog: CatalogConfig,
    pub views: ViewConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AccessConfig {
    /// Role a pending request is promoted to on approval.
    pub default_approved_role: Role,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            default_approved_role: Role::Member,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CatalogConfig {
    pub max_owned_groups: u32,
    pub name_min_len: usize,
    pub name_max_len: usize,
    /// Lowercase group names before using them as identifiers.
    pub case_insensitive_names: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_owned_groups: 4,
            name_min_len: 4,
            name_max_len: 17,
            case_insensitive_names: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ViewConfig {
    pub default_page_size: u32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
        }
    }
}

impl KureConfig {
    /// Load config from a JSON file. Missing sections and keys take defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = var("KURE_DEFAULT_APPROVED_ROLE") {
            config.access.default_approved_role = parse_var("KURE_DEFAULT_APPROVED_ROLE", &v)?;
        }
        if let Some(v) = var("KURE_MAX_OWNED_GROUPS") {
            config.catalog.max_owned_groups = parse_var("KURE_MAX_OWNED_GROUPS", &v)?;
        }
        if let Some(v) = var("KURE_NAME_MIN_LEN") {
            config.catalog.name_min_len = parse_var("KURE_NAME_MIN_LEN", &v)?;
        }
        if let Some(v) = var("KURE_NAME_MAX_LEN") {
            config.catalog.name_max_len = parse_var("KURE_NAME_MAX_LEN", &v)?;
        }
        if let Some(v) = var("KURE_CASE_INSENSITIVE_NAMES") {
            config.catalog.case_insensitive_names = v.to_lowercase() == "true" || v == "1";
        }
        if let Some(v) = var("KURE_PAGE_SIZE") {
            config.views.default_page_size = parse_var("KURE_PAGE_SIZE", &v)?;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.access.default_approved_role {
            Role::Moderator | Role::Member => {}
            other => return Err(ConfigError::ApprovedRole(other)),
        }
        let (min, max) = (self.catalog.name_min_len, self.catalog.name_max_len);
        if min == 0 || min > max {
            return Err(ConfigError::NameBounds { min, max });
        }
        if self.catalog.max_owned_groups == 0 {
            return Err(ConfigError::Zero("max_owned_groups"));
        }
        if self.views.default_page_size == 0 {
            return Err(ConfigError::Zero("default_page_size"));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidVar {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let c = KureConfig::default();
        assert_eq!(c.access.default_approved_role, Role::Member);
        assert_eq!(c.catalog.max_owned_groups, 4);
        assert_eq!(c.catalog.name_min_len, 4);
        assert_eq!(c.catalog.name_max_len, 17);
        assert!(c.catalog.case_insensitive_names);
        assert_eq!(c.views.default_page_size, 20);
        c.validate().unwrap();
    }

    #[test]
    fn test_from_vars_overrides() {
        let c = KureConfig::from_vars(vars(&[
            ("KURE_DEFAULT_APPROVED_ROLE", "moderator"),
            ("KURE_MAX_OWNED_GROUPS", "10"),
            ("KURE_CASE_INSENSITIVE_NAMES", "false"),
            ("KURE_PAGE_SIZE", " 50 "),
        ]))
        .unwrap();
        assert_eq!(c.access.default_approved_role, Role::Moderator);
        assert_eq!(c.catalog.max_owned_groups, 10);
        assert!(!c.catalog.case_insensitive_names);
        assert_eq!(c.views.default_page_size, 50);
        assert_eq!(c.catalog.name_max_len, 17);
    }

    #[test]
    fn test_from_vars_rejects_garbage() {
        let err = KureConfig::from_vars(vars(&[("KURE_MAX_OWNED_GROUPS", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { ref key, .. } if key == "KURE_MAX_OWNED_GROUPS"));

        let err =
            KureConfig::from_vars(vars(&[("KURE_DEFAULT_APPROVED_ROLE", "admin")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { .. }));
    }

    #[test]
    fn test_validate() {
        let mut c = KureConfig::default();
        c.access.default_approved_role = Role::Owner;
        assert!(matches!(c.validate(), Err(ConfigError::ApprovedRole(Role::Owner))));
        c.access.default_approved_role = Role::Pending;
        assert!(c.validate().is_err());

        let mut c = KureConfig::default();
        c.catalog.name_min_len = 20;
        assert!(matches!(c.validate(), Err(ConfigError::NameBounds { .. })));

        let mut c = KureConfig::default();
        c.views.default_page_size = 0;
        assert!(matches!(c.validate(), Err(ConfigError::Zero("default_page_size"))));
    }

    #[test]
    fn test_load_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kure.json");
        std::fs::write(
            &path,
            r#"{ "catalog": { "max_owned_groups": 2 }, "views": { "default_page_size": 5 } }"#,
        )
        .unwrap();

        let c = KureConfig::load_from(&path).unwrap();
        assert_eq!(c.catalog.max_owned_groups, 2);
        assert_eq!(c.catalog.name_min_len, 4);
        assert_eq!(c.views.default_page_size, 5);
        assert_eq!(c.access, AccessConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = KureConfig::load_from("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }
}
