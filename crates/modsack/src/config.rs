use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::module::{DefaultStreams, Module};

/// Module-related configuration, loaded in one explicit step and immutable
/// afterwards. There is no hidden environment read: callers decide when and
/// from what to load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Platform the modules target, as `name:stream` (e.g. `platform:f38`).
    pub platform_module: Option<String>,

    /// Default stream per module name, applied to modules without explicit
    /// enablement.
    pub default_streams: DefaultStreams,
}

impl ModuleConfig {
    /// Parse a configuration document from JSON.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// The platform pseudo-module described by `platform_module`, if set.
    pub fn platform(&self) -> Option<Module> {
        let id = self.platform_module.as_deref()?;
        let (name, stream) = match id.split_once(':') {
            Some((name, stream)) => (name, stream),
            None => (id, ""),
        };
        Some(Module::platform(name, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SackError;
    use crate::module::SYSTEM_REPO_ID;

    #[test]
    fn test_from_json_binds_defaults_in_order() {
        let config = ModuleConfig::from_json(
            r#"{
                "platform_module": "platform:f38",
                "default_streams": {
                    "nodejs": "18",
                    "postgresql": "15"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.platform_module.as_deref(), Some("platform:f38"));
        let names: Vec<_> = config.default_streams.keys().cloned().collect();
        assert_eq!(names, vec!["nodejs", "postgresql"]);
        assert_eq!(config.default_streams["nodejs"], "18");
    }

    #[test]
    fn test_missing_fields_default() {
        let config = ModuleConfig::from_json("{}").unwrap();
        assert!(config.platform_module.is_none());
        assert!(config.default_streams.is_empty());
        assert!(config.platform().is_none());
    }

    #[test]
    fn test_parse_failure_is_a_config_error() {
        let err = ModuleConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SackError::ConfigParse(_)));
    }

    #[test]
    fn test_platform_builds_a_system_repo_module() {
        let config = ModuleConfig::from_json(
            r#"{"platform_module": "platform:f38"}"#,
        )
        .unwrap();
        let platform = config.platform().unwrap();
        assert_eq!(platform.name, "platform");
        assert_eq!(platform.stream, "f38");
        assert_eq!(platform.repo_id, SYSTEM_REPO_ID);
    }
}
