use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use crate::{DialogError, DialogResult};

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Actions executed in one turn before the turn is aborted.
    #[serde(default = "default_max_steps_per_turn")]
    pub max_steps_per_turn: usize,

    #[serde(default = "default_max_stack_depth")]
    pub max_stack_depth: usize,

    /// Applied to inputs that do not set their own `max_turn_count`.
    #[serde(default)]
    pub default_input_max_turn_count: Option<u32>,

    /// Language used to pick templates from a dictionary renderer.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Text templates by language and id, addressed as `@id` from dialogs.
    #[serde(default)]
    pub templates: HashMap<String, HashMap<String, String>>,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_true")]
    pub persist_user_scope: bool,

    #[serde(default = "default_true")]
    pub persist_conversation_scope: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            persist_user_scope: default_true(),
            persist_conversation_scope: default_true(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps_per_turn: default_max_steps_per_turn(),
            max_stack_depth: default_max_stack_depth(),
            default_input_max_turn_count: None,
            locale: default_locale(),
            templates: HashMap::new(),
            storage: StorageConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> DialogResult<Self> {
        let file = File::open(path)
            .map_err(|e| DialogError::Config(format!("Failed to open config file: {}", e)))?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)
            .map_err(|e| DialogError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_str(s: &str) -> DialogResult<Self> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| DialogError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DialogResult<()> {
        if self.max_steps_per_turn == 0 {
            return Err(DialogError::Config(
                "max_steps_per_turn must be greater than 0".to_string(),
            ));
        }
        if self.max_stack_depth == 0 {
            return Err(DialogError::Config(
                "max_stack_depth must be greater than 0".to_string(),
            ));
        }
        if self.default_input_max_turn_count == Some(0) {
            return Err(DialogError::Config(
                "default_input_max_turn_count must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_max_steps_per_turn() -> usize {
    1000
}

fn default_max_stack_depth() -> usize {
    32
}

fn default_locale() -> String {
    "en-us".to_string()
}

fn default_true() -> bool {
    true
}
