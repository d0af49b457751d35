//! The persistent progress record.
//!
//! The JSON layout matches existing save files: camelCase keys, an
//! epoch-millisecond timestamp, scene markers as bare 1s.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutable game state carried inside the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Affinity flag values.
    #[serde(default)]
    pub affinity: HashMap<String, i64>,
}

/// Everything the game persists between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Scene identifiers the player has finished, in completion order.
    #[serde(default)]
    pub completed_scenes: Vec<String>,
    /// When the record last changed, as epoch milliseconds on disk.
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Mutable game state (affinity values).
    #[serde(default)]
    pub game_state: GameState,
    /// Scenes the player has at least opened; marker value is always 1.
    #[serde(default)]
    pub scene_markers: HashMap<String, i64>,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            completed_scenes: Vec::new(),
            timestamp: Utc::now(),
            game_state: GameState::default(),
            scene_markers: HashMap::new(),
        }
    }
}

impl ProgressRecord {
    /// True when the scene is in the completed list.
    pub fn is_completed(&self, scene: &str) -> bool {
        self.completed_scenes.iter().any(|s| s == scene)
    }

    /// Append a scene to the completed list once. Returns whether the
    /// record changed.
    pub fn mark_completed(&mut self, scene: &str) -> bool {
        if self.is_completed(scene) {
            return false;
        }
        self.completed_scenes.push(scene.to_string());
        self.touch();
        true
    }

    /// Set the visited marker for a scene once. Returns whether the
    /// record changed.
    pub fn mark_visited(&mut self, scene: &str) -> bool {
        if self.scene_markers.contains_key(scene) {
            return false;
        }
        self.scene_markers.insert(scene.to_string(), 1);
        self.touch();
        true
    }

    /// Current value of an affinity flag; absent flags read as 0.
    pub fn affinity(&self, flag: &str) -> i64 {
        self.game_state.affinity.get(flag).copied().unwrap_or(0)
    }

    /// Apply a signed delta to an affinity flag, materializing it at 0
    /// first if absent. Returns the new value.
    pub fn adjust_affinity(&mut self, flag: &str, delta: i64) -> i64 {
        let value = self
            .game_state
            .affinity
            .entry(flag.to_string())
            .or_insert(0);
        *value = value.saturating_add(delta);
        let value = *value;
        self.touch();
        value
    }

    /// Number of completed scenes.
    pub fn completion_count(&self) -> usize {
        self.completed_scenes.len()
    }

    /// Refresh the change timestamp.
    pub fn touch(&mut self) {
        self.timestamp = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_save_payload() {
        let json = r#"{
            "completedScenes": ["scene1", "scene3"],
            "timestamp": 1712345678901,
            "gameState": {"affinity": {"yurina": 2}},
            "sceneMarkers": {"scene1": 1}
        }"#;
        let record: ProgressRecord = serde_json::from_str(json).unwrap();
        assert!(record.is_completed("scene1"));
        assert!(!record.is_completed("scene2"));
        assert_eq!(record.affinity("yurina"), 2);
        assert_eq!(record.scene_markers.get("scene1"), Some(&1));
        assert_eq!(record.timestamp.timestamp_millis(), 1_712_345_678_901);
    }

    #[test]
    fn serializes_camel_case_and_millis() {
        let mut record = ProgressRecord::default();
        record.mark_completed("scene1");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""completedScenes":["scene1"]"#), "{json}");
        assert!(json.contains(r#""gameState""#), "{json}");
        assert!(json.contains(r#""sceneMarkers""#), "{json}");
        // Timestamp is a bare integer, not an ISO string.
        assert!(!json.contains(r#""timestamp":""#), "{json}");
    }

    #[test]
    fn missing_fields_default() {
        let record: ProgressRecord = serde_json::from_str("{}").unwrap();
        assert!(record.completed_scenes.is_empty());
        assert!(record.scene_markers.is_empty());
        assert_eq!(record.affinity("anyone"), 0);
    }

    #[test]
    fn completion_is_idempotent() {
        let mut record = ProgressRecord::default();
        assert!(record.mark_completed("scene2"));
        assert!(!record.mark_completed("scene2"));
        assert_eq!(record.completion_count(), 1);
    }

    #[test]
    fn visit_marker_sets_once() {
        let mut record = ProgressRecord::default();
        assert!(record.mark_visited("scene2"));
        assert!(!record.mark_visited("scene2"));
        assert_eq!(record.scene_markers.get("scene2"), Some(&1));
    }

    #[test]
    fn affinity_accumulates() {
        let mut record = ProgressRecord::default();
        assert_eq!(record.adjust_affinity("yurina", 3), 3);
        assert_eq!(record.adjust_affinity("yurina", -1), 2);
        assert_eq!(record.affinity("yurina"), 2);
        // A zero delta still materializes the flag.
        assert_eq!(record.adjust_affinity("moe", 0), 0);
        assert!(record.game_state.affinity.contains_key("moe"));
    }
}
