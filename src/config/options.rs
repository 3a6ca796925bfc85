use crate::config::types::{Result, ScriptError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lifecycle switches for one controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Dispose models on controller disposal instead of only detaching them
    #[serde(default = "default_dispose_models")]
    pub dispose_models: bool,
    /// Record stage and rule durations
    #[serde(default)]
    pub profile_execution: bool,
}

fn default_dispose_models() -> bool {
    true
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            dispose_models: default_dispose_models(),
            profile_execution: false,
        }
    }
}

impl ExecutionOptions {
    pub fn profiled() -> Self {
        Self {
            profile_execution: true,
            ..Self::default()
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| ScriptError::Config(format!("Failed to parse options JSON: {}", e)))
    }

    /// Load options from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScriptError::Config(format!("Failed to read options file: {}", e)))?;
        Self::from_json_str(&content)
    }

    /// Load options from ./scriptbox.json
    pub fn load_default() -> Result<Self> {
        let path = std::env::current_dir()
            .map_err(|e| ScriptError::Config(format!("Failed to get current directory: {}", e)))?
            .join("scriptbox.json");

        if !path.exists() {
            return Err(ScriptError::Config(
                "scriptbox.json not found in current directory".to_string(),
            ));
        }

        Self::load_from_file(path)
    }
}
