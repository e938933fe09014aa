//! Metering configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tally_core::{Error, Result};

/// Maps plan usage groups to implementations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeteringConfig {
    /// Kind used for groups without an explicit mapping. `None` rejects
    /// unmapped groups.
    #[serde(default = "default_kind")]
    pub default_kind: Option<String>,
    /// Group name to implementation kind.
    #[serde(default)]
    pub groups: HashMap<String, String>,
    /// Extra license properties each kind defers to the cycle boundary.
    #[serde(default)]
    pub scheduled_properties: HashMap<String, Vec<String>>,
}

fn default_kind() -> Option<String> {
    Some("metered".to_string())
}

impl Default for MeteringConfig {
    fn default() -> Self {
        Self {
            default_kind: default_kind(),
            groups: HashMap::new(),
            scheduled_properties: HashMap::new(),
        }
    }
}

impl MeteringConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = MeteringConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, MeteringConfig::default());
        assert_eq!(config.default_kind.as_deref(), Some("metered"));
    }

    #[test]
    fn test_parse_group_mapping() {
        let yaml = r#"
default_kind: null
groups:
  api_calls: metered
  editors: seats
scheduled_properties:
  metered: [product]
"#;
        let config = MeteringConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.default_kind, None);
        assert_eq!(config.groups["editors"], "seats");
        assert_eq!(config.scheduled_properties["metered"], vec!["product"]);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = MeteringConfig::from_yaml_str("groups: [1, 2").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("tally-config-{}.yaml", std::process::id()));
        std::fs::write(&path, "groups:\n  editors: seats\n").unwrap();
        let config = MeteringConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.groups["editors"], "seats");
    }
}
