use std::path::Path;

use courseplan_storage::LogBounds;
use courseplan_storage::action_log::{DEFAULT_CAPACITY, DEFAULT_TRIM_BATCH};
use serde::Deserialize;

use crate::error::EngineError;

pub const DEFAULT_SCHEDULE_NAME: &str = "Schedule";
pub const DEFAULT_CUSTOM_EVENT_COLOR: &str = "#551a8b";

pub const DEFAULT_PALETTE: [&str; 10] = [
    "#0B8043", "#D50000", "#E67C73", "#F4511E", "#F6BF26", "#33B679", "#039BE5", "#3F51B5",
    "#7986CB", "#8E24AA",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActionLogConfig {
    pub capacity: usize,
    pub trim_batch: usize,
}

impl Default for ActionLogConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            trim_batch: DEFAULT_TRIM_BATCH,
        }
    }
}

impl ActionLogConfig {
    pub fn bounds(&self) -> LogBounds {
        LogBounds {
            capacity: self.capacity,
            trim_batch: self.trim_batch,
        }
    }
}

/// Engine settings. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Base for proposed schedule names; the first schedule is `"{base} 1"`.
    pub default_schedule_name: String,
    pub action_log: ActionLogConfig,
    /// Maximum undo snapshots kept. `None` keeps every snapshot.
    pub undo_depth: Option<usize>,
    pub color_palette: Vec<String>,
    pub custom_event_color: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_schedule_name: DEFAULT_SCHEDULE_NAME.to_string(),
            action_log: ActionLogConfig::default(),
            undo_depth: None,
            color_palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            custom_event_color: DEFAULT_CUSTOM_EVENT_COLOR.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.action_log.capacity == 0 {
            return Err(EngineError::Config("action_log.capacity must be positive".into()));
        }
        if self.action_log.trim_batch == 0 || self.action_log.trim_batch > self.action_log.capacity
        {
            return Err(EngineError::Config(
                "action_log.trim_batch must be between 1 and capacity".into(),
            ));
        }
        if self.color_palette.is_empty() {
            return Err(EngineError::Config("color_palette must not be empty".into()));
        }
        if self.default_schedule_name.trim().is_empty() {
            return Err(EngineError::Config("default_schedule_name must not be blank".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.action_log.bounds(), LogBounds::default());
    }

    #[test]
    fn partial_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            default_schedule_name = "Plan"
            undo_depth = 50

            [action_log]
            capacity = 200
            "#,
        )
        .unwrap();
        assert_eq!(config.default_schedule_name, "Plan");
        assert_eq!(config.undo_depth, Some(50));
        assert_eq!(config.action_log.capacity, 200);
        assert_eq!(config.action_log.trim_batch, DEFAULT_TRIM_BATCH);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_bounds() {
        assert!(matches!(
            EngineConfig::from_toml_str("autosave_interval = 3"),
            Err(EngineError::ConfigParse(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[action_log]\ncapacity = 10\ntrim_batch = 20"),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("color_palette = []"),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courseplan.toml");
        std::fs::write(&path, "custom_event_color = \"#000000\"\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.custom_event_color, "#000000");

        assert!(matches!(
            EngineConfig::load(dir.path().join("missing.toml")),
            Err(EngineError::Io(_))
        ));
    }
}
