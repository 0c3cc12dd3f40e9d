//! Editor configuration, read from `easel.config.json`.

use easel_drag::{DragConfig, ZoneConfig};
use easel_sync::SyncConfig;
use easel_tree::{ContentFilter, SerializerConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_NAME: &str = "easel.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Every tunable of the canvas core; missing fields take their defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub content: ContentFilter,
    pub serializer: SerializerConfig,
    pub sync: SyncConfig,
    pub drag: DragConfig,
    pub zones: ZoneConfig,
}

impl EditorConfig {
    /// Load `easel.config.json` from a directory, or defaults if absent
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = dir.as_ref().join(DEFAULT_CONFIG_NAME);
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.into())?;
        Self::from_json(&content)
    }

    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let zones = &self.zones;
        for (name, value) in [
            ("zones.acceptThreshold", zones.accept_threshold),
            ("zones.autoApplyThreshold", zones.auto_apply_threshold),
            ("zones.boundaryScore", zones.boundary_score),
            ("zones.directionalRatio", zones.directional_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{} must be within [0, 1], got {}", name, value));
            }
        }
        if zones.auto_apply_threshold < zones.accept_threshold {
            return invalid("zones.autoApplyThreshold must not be below zones.acceptThreshold");
        }
        if zones.directional_min_px > zones.directional_max_px {
            return invalid("zones.directionalMinPx must not exceed zones.directionalMaxPx");
        }
        for (name, value) in [
            ("zones.flowLayoutBoost", zones.flow_layout_boost),
            ("zones.momentumBoost", zones.momentum_boost),
            ("zones.insertionReachPx", zones.insertion_reach_px),
        ] {
            if value <= 0.0 {
                return invalid(format!("{} must be positive", name));
            }
        }
        if zones.min_width < 0.0 || zones.min_height < 0.0 || zones.multi_child_bonus < 0.0 {
            return invalid("zone sizes and bonuses must not be negative");
        }

        let drag = &self.drag;
        if drag.positioning_threshold_px < 0.0
            || drag.internal_threshold_px < 0.0
            || drag.external_threshold_px < 0.0
        {
            return invalid("drag thresholds must not be negative");
        }
        for (name, value) in [
            ("drag.watchdogMs", drag.watchdog_ms),
            ("drag.frameIntervalMs", drag.frame_interval_ms),
            ("drag.velocityWindowMs", drag.velocity_window_ms),
            ("sync.debounceMs", self.sync.debounce_ms),
            ("sync.ackTimeoutMs", self.sync.ack_timeout_ms),
            ("sync.backoffBaseMs", self.sync.backoff_base_ms),
        ] {
            if value == 0 {
                return invalid(format!("{} must be non-zero", name));
            }
        }
        if self.sync.backoff_base_ms > self.sync.backoff_max_ms {
            return invalid("sync.backoffBaseMs must not exceed sync.backoffMaxMs");
        }
        if !self.content.is_marker_class(&drag.indicator_class) {
            return invalid(format!(
                "drag.indicatorClass '{}' must be listed in content.markerClasses",
                drag.indicator_class
            ));
        }
        if self.serializer.id_prefix.trim().is_empty() {
            return invalid("serializer.idPrefix must not be empty");
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        EditorConfig::default().validate().unwrap();
    }

    #[test]
    fn test_parse_partial_config() {
        let json = r#"{
            "sync": { "debounceMs": 300, "maxRetries": 5 },
            "zones": { "acceptThreshold": 0.4 },
            "content": { "skipTags": ["script"] }
        }"#;

        let config = EditorConfig::from_json(json).unwrap();
        assert_eq!(config.sync.debounce_ms, 300);
        assert_eq!(config.sync.max_retries, 5);
        assert_eq!(config.sync.ack_timeout_ms, 2000);
        assert_eq!(config.zones.accept_threshold, 0.4);
        assert_eq!(config.content.skip_tags, vec!["script"]);
        assert_eq!(config.drag.watchdog_ms, 3000);
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let json = r#"{ "zones": { "acceptThreshold": 0.8, "autoApplyThreshold": 0.5 } }"#;
        assert!(matches!(EditorConfig::from_json(json), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_zero_durations() {
        let json = r#"{ "drag": { "frameIntervalMs": 0 } }"#;
        assert!(matches!(EditorConfig::from_json(json), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_indicator_must_be_marker() {
        let json = r#"{ "drag": { "indicatorClass": "drop-here" } }"#;
        assert!(matches!(EditorConfig::from_json(json), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new().unwrap();
        assert_eq!(EditorConfig::load(dir.path()).unwrap(), EditorConfig::default());

        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "serializer": { "idPrefix": "node" } }"#,
        )
        .unwrap();
        assert_eq!(EditorConfig::load(dir.path()).unwrap().serializer.id_prefix, "node");
    }
}
