use serde::Serialize;

/// Version of the pattern language this engine accepts.
pub const RPL_VERSION: &str = "1.3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub name: String,
    pub value: Option<String>,
    pub description: String,
}

impl ConfigEntry {
    pub fn new(name: &str, value: Option<String>, description: &str) -> Self {
        ConfigEntry {
            name: name.to_string(),
            value,
            description: description.to_string(),
        }
    }
}

/// Engine introspection, in the order entries are reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineConfig {
    /// Fixed when the engine was built
    pub build: Vec<ConfigEntry>,
    /// Current session state
    pub runtime: Vec<ConfigEntry>,
}

impl EngineConfig {
    pub fn get(&self, name: &str) -> Option<&ConfigEntry> {
        self.build
            .iter()
            .chain(self.runtime.iter())
            .find(|entry| entry.name == name)
    }

    /// `[[build entries], [runtime entries]]`
    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(&(&self.build, &self.runtime)).unwrap_or_else(|_| b"[[],[]]".to_vec())
    }
}
