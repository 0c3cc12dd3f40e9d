use crate::classifier::DragMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gesture thresholds and timers of a drag session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DragConfig {
    /// Displacement before a positioning drag starts (px)
    pub positioning_threshold_px: f64,

    /// Displacement before an internal move starts (px)
    pub internal_threshold_px: f64,

    /// Displacement before a palette drag starts (px)
    pub external_threshold_px: f64,

    /// Session is abandoned after this long without pointer activity
    pub watchdog_ms: u64,

    /// Minimum spacing of zone recomputations
    pub frame_interval_ms: u64,

    /// Sliding window for pointer velocity
    pub velocity_window_ms: u64,

    /// Class of the drop indicator node (must be a marker class)
    pub indicator_class: String,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            positioning_threshold_px: 3.0,
            internal_threshold_px: 5.0,
            external_threshold_px: 10.0,
            watchdog_ms: 3000,
            frame_interval_ms: 16,
            velocity_window_ms: 100,
            indicator_class: "easel-drop-indicator".to_string(),
        }
    }
}

impl DragConfig {
    /// Displacement a session must exceed before it becomes a drag
    pub fn threshold(&self, mode: DragMode) -> f64 {
        match mode {
            DragMode::Positioning => self.positioning_threshold_px,
            DragMode::Internal => self.internal_threshold_px,
            DragMode::External => self.external_threshold_px,
            DragMode::Disabled => f64::INFINITY,
        }
    }

    pub fn watchdog(&self) -> Duration {
        Duration::from_millis(self.watchdog_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn velocity_window(&self) -> Duration {
        Duration::from_millis(self.velocity_window_ms)
    }
}

/// Candidate filtering, scoring weights and selection cutoffs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoneConfig {
    /// Smallest element that can become a drop candidate
    pub min_width: f64,
    pub min_height: f64,

    /// Lowest score a zone may be selected with
    pub accept_threshold: f64,

    /// Selections at or above this score get live feedback
    pub auto_apply_threshold: f64,

    /// Multiplier for flex and grid containers
    pub flow_layout_boost: f64,

    /// Added when a container already holds several children
    pub multi_child_bonus: f64,

    /// Directional band thickness as a share of the sibling's size
    pub directional_ratio: f64,
    pub directional_min_px: f64,
    pub directional_max_px: f64,

    /// Pointer speed (px/s) above which momentum counts
    pub momentum_speed: f64,
    pub momentum_boost: f64,

    /// Half-width of an insertion strip; its score falls to zero at this distance
    pub insertion_reach_px: f64,

    /// Score of the append-to-root fallback while the pointer is on the canvas
    pub boundary_score: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            min_width: 50.0,
            min_height: 50.0,
            accept_threshold: 0.3,
            auto_apply_threshold: 0.7,
            flow_layout_boost: 1.2,
            multi_child_bonus: 0.1,
            directional_ratio: 0.25,
            directional_min_px: 8.0,
            directional_max_px: 40.0,
            momentum_speed: 600.0,
            momentum_boost: 1.15,
            insertion_reach_px: 24.0,
            boundary_score: 0.3,
        }
    }
}

impl ZoneConfig {
    /// Band thickness for a sibling dimension
    pub fn band_thickness(&self, dimension: f64) -> f64 {
        (dimension * self.directional_ratio).clamp(self.directional_min_px, self.directional_max_px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_ordered_by_mode() {
        let config = DragConfig::default();
        assert!(config.threshold(DragMode::Positioning) < config.threshold(DragMode::Internal));
        assert!(config.threshold(DragMode::Internal) < config.threshold(DragMode::External));
        assert!(config.threshold(DragMode::Disabled).is_infinite());
    }

    #[test]
    fn test_band_thickness_clamped() {
        let config = ZoneConfig::default();
        assert_eq!(config.band_thickness(20.0), 8.0);
        assert_eq!(config.band_thickness(100.0), 25.0);
        assert_eq!(config.band_thickness(400.0), 40.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ZoneConfig = serde_json::from_str(r#"{"acceptThreshold": 0.5}"#).unwrap();
        assert_eq!(config.accept_threshold, 0.5);
        assert_eq!(config.auto_apply_threshold, 0.7);
    }
}
