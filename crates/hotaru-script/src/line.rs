//! Scene script data model.
//!
//! A scene is an ordered list of story lines plus maps from logical asset
//! keys to asset paths. Scripts are stored as JSON with camelCase field
//! names, matching the on-disk format the game's scenes ship in.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::RawAction;
use crate::error::{ScriptError, ScriptResult};

/// One line of a scene: dialogue, narration, or an inline command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryLine {
    /// Speaker name shown in the name box; `None` hides the box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Display text; may contain `[s]` segment markers and break markup.
    #[serde(default)]
    pub text: String,
    /// Raw bracket command, e.g. `[fadeout time=500]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Background asset key to switch to when this line displays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// BGM asset key to play, or the literal `bgm stop`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgm: Option<String>,
    /// Sound-effect or voice asset key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Video asset key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    /// Embedded action object, dispatched after the line's assets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RawAction>,
}

impl StoryLine {
    /// A plain narrative line with no speaker.
    pub fn narration(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// A dialogue line with a speaker.
    pub fn dialogue(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: Some(speaker.into()),
            text: text.into(),
            ..Self::default()
        }
    }

    /// A command-only line.
    pub fn command(raw: impl Into<String>) -> Self {
        Self {
            command: Some(raw.into()),
            ..Self::default()
        }
    }

    /// The raw command text, if this line is a command line.
    ///
    /// Presence of a non-empty `command` field decides the dispatch path;
    /// the line's text and assets are ignored on command lines.
    pub fn command_text(&self) -> Option<&str> {
        self.command.as_deref().filter(|c| !c.is_empty())
    }
}

/// A complete scene script: story lines plus asset maps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneScript {
    /// Scene identifier; when absent, derived from the script file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<String>,
    /// Ordered story lines.
    #[serde(default)]
    pub story: Vec<StoryLine>,
    /// Background key → image path.
    #[serde(default)]
    pub background: HashMap<String, String>,
    /// BGM key → audio path (looped playback).
    #[serde(default)]
    pub bgm: HashMap<String, String>,
    /// Sound-effect / voice key → audio path (one-shot playback).
    #[serde(default)]
    pub audio: HashMap<String, String>,
    /// Video key → video path.
    #[serde(default)]
    pub videos: HashMap<String, String>,
    /// Event-illustration key → image path.
    #[serde(default)]
    pub events: HashMap<String, String>,
}

impl SceneScript {
    /// Parse a scene script from a JSON string.
    pub fn from_json(payload: &str) -> ScriptResult<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Load a scene script from a JSON file.
    pub fn load(path: &Path) -> ScriptResult<Self> {
        let payload = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&payload)
    }

    /// Scene identifier: the embedded `sceneId`, else the file stem.
    pub fn scene_id_or(&self, path: &Path) -> String {
        match &self.scene_id {
            Some(id) => id.clone(),
            None => scene_id_from_path(path),
        }
    }

    /// Number of story lines.
    pub fn len(&self) -> usize {
        self.story.len()
    }

    /// True when the scene has no story lines.
    pub fn is_empty(&self) -> bool {
        self.story.is_empty()
    }

    /// Background path for a key.
    pub fn background_path(&self, key: &str) -> Option<&str> {
        self.background.get(key).map(String::as_str)
    }

    /// BGM path for a key.
    pub fn bgm_path(&self, key: &str) -> Option<&str> {
        self.bgm.get(key).map(String::as_str)
    }

    /// True when the key names a BGM track. Sound-effect playback skips
    /// keys that are also BGM keys; the bgm field owns those.
    pub fn is_bgm_key(&self, key: &str) -> bool {
        self.bgm.contains_key(key)
    }

    /// Sound-effect path for a key.
    pub fn audio_path(&self, key: &str) -> Option<&str> {
        self.audio.get(key).map(String::as_str)
    }

    /// Video path for a key.
    pub fn video_path(&self, key: &str) -> Option<&str> {
        self.videos.get(key).map(String::as_str)
    }

    /// Event-illustration path for a key.
    pub fn event_path(&self, key: &str) -> Option<&str> {
        self.events.get(key).map(String::as_str)
    }
}

/// Derive a scene identifier from a script path: the file stem, so
/// `scenes/scene3.json` identifies `scene3`.
pub fn scene_id_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scene".to_string())
}
