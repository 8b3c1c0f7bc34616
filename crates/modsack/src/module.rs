use std::cell::Cell;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Repository id of the synthetic system repository. Units living there
/// stand for "already satisfied" state (the platform pseudo-module, the
/// installed base) and are never real selectable candidates.
pub const SYSTEM_REPO_ID: &str = "@System";

/// Name → stream mapping applied to modules without explicit enablement.
/// Insertion order is preserved.
pub type DefaultStreams = IndexMap<String, String>;

/// Runtime enablement state of a module. Session data, not metadata: it is
/// not part of the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleState {
    #[default]
    Unknown,
    Enabled,
    Disabled,
    /// Selected through its default stream rather than explicit enablement.
    Default,
}

/// One module stream: a named, versioned set of package artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub stream: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub arch: String,
    /// Exact package identifiers (NEVRA strings) this stream ships.
    #[serde(default)]
    pub artifacts: Vec<String>,
    /// Id of the repository the metadata came from.
    #[serde(default)]
    pub repo_id: String,
    #[serde(skip)]
    state: Cell<ModuleState>,
}

impl Module {
    pub fn new(
        name: impl Into<String>,
        stream: impl Into<String>,
        version: u64,
    ) -> Self {
        Self {
            name: name.into(),
            stream: stream.into(),
            version,
            context: String::new(),
            arch: String::new(),
            artifacts: Vec::new(),
            repo_id: String::new(),
            state: Cell::new(ModuleState::Unknown),
        }
    }

    /// The platform pseudo-module: lives in the system repository so a
    /// solver can satisfy platform dependencies without the result ever
    /// marking it active.
    pub fn platform(name: impl Into<String>, stream: impl Into<String>) -> Self {
        let mut module = Self::new(name, stream, 0);
        module.repo_id = SYSTEM_REPO_ID.to_string();
        module
    }

    pub fn name_stream(&self) -> String {
        format!("{}:{}", self.name, self.stream)
    }

    /// Full identifier: `name:stream:version:context:arch`.
    pub fn nsvca(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.name, self.stream, self.version, self.context, self.arch
        )
    }

    /// The dependency string a solver job for this module is keyed by.
    pub fn solver_dep(&self) -> String {
        format!("module({}:{}:{})", self.name, self.stream, self.version)
    }

    pub fn state(&self) -> ModuleState {
        self.state.get()
    }

    pub fn set_state(&self, state: ModuleState) {
        self.state.set(state);
    }

    pub fn enable(&self) {
        self.state.set(ModuleState::Enabled);
    }

    pub fn disable(&self) {
        self.state.set(ModuleState::Disabled);
    }

    pub fn reset(&self) {
        self.state.set(ModuleState::Unknown);
    }

    pub fn is_enabled(&self) -> bool {
        self.state.get() == ModuleState::Enabled
    }

    pub fn is_disabled(&self) -> bool {
        self.state.get() == ModuleState::Disabled
    }

    /// Whether this module's stream is the declared default for its name.
    /// A missing mapping means "no default", not an error.
    pub fn is_default(&self, defaults: &DefaultStreams) -> bool {
        defaults.get(self.name.as_str()) == Some(&self.stream)
    }

    pub fn in_system_repo(&self) -> bool {
        self.repo_id == SYSTEM_REPO_ID
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name_stream())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodejs() -> Module {
        let mut module = Module::new("nodejs", "18", 20230815);
        module.context = "abcd1234".to_string();
        module.arch = "x86_64".to_string();
        module.repo_id = "appstream".to_string();
        module
    }

    #[test]
    fn test_identifiers() {
        let module = nodejs();
        assert_eq!(module.name_stream(), "nodejs:18");
        assert_eq!(module.nsvca(), "nodejs:18:20230815:abcd1234:x86_64");
        assert_eq!(module.solver_dep(), "module(nodejs:18:20230815)");
        assert_eq!(module.to_string(), "nodejs:18");
    }

    #[test]
    fn test_state_transitions() {
        let module = nodejs();
        assert_eq!(module.state(), ModuleState::Unknown);
        assert!(!module.is_enabled());

        module.enable();
        assert!(module.is_enabled());

        module.disable();
        assert!(module.is_disabled());

        module.reset();
        assert_eq!(module.state(), ModuleState::Unknown);
    }

    #[test]
    fn test_default_stream_lookup() {
        let module = nodejs();
        let mut defaults = DefaultStreams::new();
        assert!(!module.is_default(&defaults));

        defaults.insert("nodejs".to_string(), "18".to_string());
        assert!(module.is_default(&defaults));

        defaults.insert("nodejs".to_string(), "20".to_string());
        assert!(!module.is_default(&defaults));
    }

    #[test]
    fn test_platform_module_is_in_system_repo() {
        let platform = Module::platform("platform", "f38");
        assert!(platform.in_system_repo());
        assert_eq!(platform.name_stream(), "platform:f38");
    }

    #[test]
    fn test_metadata_deserialization_defaults_runtime_state() {
        let module: Module = serde_json::from_str(
            r#"{
                "name": "postgresql",
                "stream": "15",
                "version": 20230601,
                "artifacts": ["postgresql-15.3-1.x86_64"],
                "repo_id": "appstream"
            }"#,
        )
        .unwrap();
        assert_eq!(module.name_stream(), "postgresql:15");
        assert_eq!(module.arch, "");
        assert_eq!(module.state(), ModuleState::Unknown);
    }
}
