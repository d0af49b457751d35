//! Typed actions produced by the command parser or embedded in story lines.
//!
//! The JSON representation is internally tagged on `type` with camelCase
//! names (`fadeOut`, `addSelection`, ...), matching the script files the
//! game ships with. Millisecond durations default per action family:
//! 1000 ms for fades and effects, 1500 ms for scene endings.

use serde::{Deserialize, Serialize};

/// Default duration for fades and most timed effects.
pub const DEFAULT_EFFECT_MS: u64 = 1000;
/// Default duration for scene-ending covers.
pub const DEFAULT_FINISH_MS: u64 = 1500;
/// Default duration of the affinity up/down cue.
pub const DEFAULT_AFFINITY_CUE_MS: u64 = 1000;
/// Per-character reveal delay of the typewriter.
pub const CHAR_DELAY_MS: u64 = 30;

fn default_effect_ms() -> u64 {
    DEFAULT_EFFECT_MS
}

fn default_finish_ms() -> u64 {
    DEFAULT_FINISH_MS
}

fn default_cue_ms() -> u64 {
    DEFAULT_AFFINITY_CUE_MS
}

fn default_black() -> String {
    "black".to_string()
}

fn default_opacity() -> u8 {
    255
}

/// A choice candidate: label plus target scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Label shown to the player.
    pub text: String,
    /// Scene identifier to navigate to when picked.
    pub target: String,
}

/// A typed scene action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    /// Fade the screen out to a solid color.
    FadeOut {
        /// Fade duration in milliseconds.
        #[serde(default = "default_effect_ms")]
        duration: u64,
        /// Cover color.
        #[serde(default = "default_black")]
        background_color: String,
    },
    /// Fade the screen back in from a solid color.
    FadeIn {
        /// Fade duration in milliseconds.
        #[serde(default = "default_effect_ms")]
        duration: u64,
        /// Cover color being removed.
        #[serde(default = "default_black")]
        background_color: String,
    },
    /// Fade out to white.
    FadeOutWhite {
        /// Fade duration in milliseconds.
        #[serde(default = "default_effect_ms")]
        duration: u64,
    },
    /// Clear the speaker name box.
    ClearName,
    /// Hide the text window.
    HideText,
    /// Show the text window.
    ShowText,
    /// Hide every character sprite at once.
    HideAllCharacters,
    /// Hide the event illustration layer.
    HideEventVisual,
    /// Show or hide the message window frame.
    WindowMode {
        /// Whether the window is visible.
        visible: bool,
    },
    /// End the game: clear UI, fade to a color, end the scene.
    FinishGame {
        /// Cover color.
        #[serde(default = "default_black")]
        bg_color: String,
        /// Fade duration in milliseconds.
        #[serde(default = "default_finish_ms")]
        duration: u64,
    },
    /// End the game with an instant cover instead of a fade.
    FinishGameNoTransition {
        /// Cover color.
        #[serde(default = "default_black")]
        bg_color: String,
        /// How long the cover holds before the scene ends, in milliseconds.
        #[serde(default = "default_finish_ms")]
        duration: u64,
    },
    /// End the chapter: fade out, mark the scene completed, return to menu.
    ChapterEnd {
        /// Cover color.
        #[serde(default = "default_black")]
        bg_color: String,
        /// Fade duration in milliseconds.
        #[serde(default = "default_finish_ms")]
        duration: u64,
    },
    /// Swap the background behind a fade-to-black transition.
    BackgroundChange {
        /// Background asset key.
        file: String,
        /// Fade-in duration after the swap, in milliseconds.
        #[serde(default = "default_effect_ms")]
        time: u64,
        /// Optional placement hint passed through to the sink.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<String>,
    },
    /// Swap the background with only a fade-in from transparent.
    BackgroundChangeNoTransition {
        /// Background asset key.
        file: String,
        /// Fade-in duration in milliseconds.
        #[serde(default = "default_effect_ms")]
        time: u64,
    },
    /// Remove the background, revealing the transition color.
    BackgroundErase {
        /// Fade duration in milliseconds.
        #[serde(default = "default_effect_ms")]
        time: u64,
        /// Color left behind the erased background.
        #[serde(default = "default_black")]
        transition: String,
    },
    /// Fade in an event illustration.
    EventShow {
        /// Event asset key.
        file: String,
        /// Target opacity, 0-255.
        #[serde(default = "default_opacity")]
        opacity: u8,
        /// Fade duration in milliseconds.
        #[serde(default = "default_effect_ms")]
        time: u64,
    },
    /// Fade out the event illustration.
    EventHide {
        /// Fade duration in milliseconds.
        #[serde(default = "default_effect_ms")]
        time: u64,
    },
    /// Flash the screen white and back.
    WhiteOut {
        /// Total duration in milliseconds.
        #[serde(default = "default_effect_ms")]
        time: u64,
    },
    /// Fade out the character sprites.
    HideCharacter {
        /// Fade duration in milliseconds.
        #[serde(default = "default_effect_ms")]
        time: u64,
    },
    /// Apply the sepia screen filter.
    SepiaStart,
    /// Remove the sepia screen filter.
    SepiaEnd,
    /// Invert the screen colors.
    NegaposiFlip,
    /// Restore normal screen colors.
    NegaposiFlipEnd,
    /// Evaluate a condition and open a conditional frame.
    Conditional {
        /// Condition source, e.g. `f.yurina >= 2`.
        condition: String,
    },
    /// Swap which arm of the innermost conditional executes.
    ConditionalElse,
    /// Close the innermost conditional frame.
    ConditionalEnd,
    /// Queue a choice candidate for the next `showSelections`.
    AddSelection {
        /// Label shown to the player.
        text: String,
        /// Scene identifier to navigate to when picked.
        target: String,
    },
    /// Present the queued choice candidates.
    ShowSelections,
    /// Present an inline choice list immediately.
    Choice {
        /// Candidates to present.
        choices: Vec<ChoiceOption>,
    },
    /// Adjust an affinity flag, playing an up/down cue for nonzero deltas.
    AffinityChange {
        /// Affinity flag name.
        flag: String,
        /// Signed delta to apply.
        add: i64,
    },
    /// Play the affinity-raised cue on its own.
    AffinityUpShow {
        /// Affinity flag name, if the cue names one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flag: Option<String>,
        /// Cue duration in milliseconds.
        #[serde(default = "default_cue_ms")]
        time: u64,
    },
    /// Play the affinity-lowered cue on its own.
    AffinityDownShow {
        /// Affinity flag name, if the cue names one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flag: Option<String>,
        /// Cue duration in milliseconds.
        #[serde(default = "default_cue_ms")]
        time: u64,
    },
    /// Navigate to another scene, stopping all audio.
    NextScene {
        /// Target scene identifier.
        target: String,
    },
    /// Mark the scene completed and return to the main menu.
    ReturnToMenu,
    /// Hold for a click before advancing.
    WaitForClick,
}

impl Action {
    /// The JSON tag of this action.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::FadeOut { .. } => "fadeOut",
            Self::FadeIn { .. } => "fadeIn",
            Self::FadeOutWhite { .. } => "fadeOutWhite",
            Self::ClearName => "clearName",
            Self::HideText => "hideText",
            Self::ShowText => "showText",
            Self::HideAllCharacters => "hideAllCharacters",
            Self::HideEventVisual => "hideEventVisual",
            Self::WindowMode { .. } => "windowMode",
            Self::FinishGame { .. } => "finishGame",
            Self::FinishGameNoTransition { .. } => "finishGameNoTransition",
            Self::ChapterEnd { .. } => "chapterEnd",
            Self::BackgroundChange { .. } => "backgroundChange",
            Self::BackgroundChangeNoTransition { .. } => "backgroundChangeNoTransition",
            Self::BackgroundErase { .. } => "backgroundErase",
            Self::EventShow { .. } => "eventShow",
            Self::EventHide { .. } => "eventHide",
            Self::WhiteOut { .. } => "whiteOut",
            Self::HideCharacter { .. } => "hideCharacter",
            Self::SepiaStart => "sepiaStart",
            Self::SepiaEnd => "sepiaEnd",
            Self::NegaposiFlip => "negaposiFlip",
            Self::NegaposiFlipEnd => "negaposiFlipEnd",
            Self::Conditional { .. } => "conditional",
            Self::ConditionalElse => "conditionalElse",
            Self::ConditionalEnd => "conditionalEnd",
            Self::AddSelection { .. } => "addSelection",
            Self::ShowSelections => "showSelections",
            Self::Choice { .. } => "choice",
            Self::AffinityChange { .. } => "affinityChange",
            Self::AffinityUpShow { .. } => "affinityUpShow",
            Self::AffinityDownShow { .. } => "affinityDownShow",
            Self::NextScene { .. } => "nextScene",
            Self::ReturnToMenu => "returnToMenu",
            Self::WaitForClick => "waitForClick",
        }
    }

    /// True for the conditional family that only drives the branch tracker.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Conditional { .. } | Self::ConditionalElse | Self::ConditionalEnd
        )
    }
}

/// An action field as it appears in script JSON.
///
/// Unknown action types are preserved rather than failing the whole script
/// load; the player logs and skips them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAction {
    /// A recognized action.
    Known(Box<Action>),
    /// An unrecognized action object, kept for diagnostics.
    Unknown(serde_json::Value),
}

impl RawAction {
    /// The recognized action, if any.
    pub fn as_action(&self) -> Option<&Action> {
        match self {
            Self::Known(action) => Some(action),
            Self::Unknown(_) => None,
        }
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        Self::Known(Box::new(action))
    }
}
