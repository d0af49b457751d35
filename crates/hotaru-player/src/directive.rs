//! The host-facing playback vocabulary.
//!
//! The player never touches a screen or a speaker: each step it emits
//! [`Directive`]s describing what the presentation layer should do, and a
//! [`Phase`] describing what it is now waiting for. Hosts feed observed
//! input back in as [`PlayerEvent`]s.

use hotaru_script::ChoiceOption;
use serde::{Deserialize, Serialize};

/// Where an ended scene hands control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavTarget {
    /// Another scene, by identifier.
    Scene(String),
    /// The main menu.
    MainMenu,
}

/// A full-screen filter the sink can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScreenFilter {
    /// Sepia tone.
    Sepia,
    /// Inverted colors.
    Inverted,
}

/// An animation the host runs and then confirms with
/// [`PlayerEvent::EffectFinished`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectCue {
    /// What to animate.
    pub kind: EffectKind,
    /// How long the animation runs, in milliseconds.
    pub duration_ms: u64,
}

/// The animated effect families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EffectKind {
    /// Fade the screen out to a cover color.
    FadeOut {
        /// Cover color.
        color: String,
    },
    /// Fade a cover color back out of the screen.
    FadeIn {
        /// Cover color being removed.
        color: String,
    },
    /// Flash white and back.
    WhiteOut,
    /// Fade the character sprites out.
    CharacterFade,
    /// Fade the just-shown event illustration in.
    EventFadeIn,
    /// Fade the event illustration out.
    EventFadeOut,
    /// Hold the current frame; nothing animates.
    Hold,
    /// Float the affinity-raised cue.
    AffinityUp {
        /// Flag the cue is about, when known.
        flag: Option<String>,
        /// Delta to display.
        delta: i64,
    },
    /// Float the affinity-lowered cue.
    AffinityDown {
        /// Flag the cue is about, when known.
        flag: Option<String>,
        /// Delta to display.
        delta: i64,
    },
}

/// One instruction to the presentation layer.
///
/// Directives are fire-and-forget except [`Directive::PlayEffect`], whose
/// completion the host reports back, and [`Directive::ShowText`], whose
/// typewriter completion the host reports as
/// [`PlayerEvent::TypingFinished`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Directive {
    /// Show a background image.
    SetBackground {
        /// Image path.
        path: String,
        /// Placement hint from the script, if any.
        position: Option<String>,
    },
    /// Hide the background layer.
    HideBackground,
    /// Show a speaker name.
    SetSpeaker {
        /// Name to display.
        name: String,
    },
    /// Hide the speaker name box.
    ClearSpeaker,
    /// Reveal text with the typewriter.
    ///
    /// `full[..revealed]` appears at once; the host types the rest one
    /// character per `char_delay_ms` and then reports
    /// [`PlayerEvent::TypingFinished`]. When `revealed == full.len()`
    /// there is nothing to type and no report is expected. `'\n'`
    /// characters are canonical line breaks, revealed as one step.
    ShowText {
        /// Complete text of the current reveal.
        full: String,
        /// Byte offset of the already-visible prefix.
        revealed: usize,
        /// Per-character delay in milliseconds.
        char_delay_ms: u64,
    },
    /// Show the message window.
    ShowTextWindow,
    /// Hide the message window.
    HideTextWindow,
    /// Hide every character sprite at once.
    HideAllCharacters,
    /// Show the click-to-continue prompt.
    ShowContinuePrompt,
    /// Show an event illustration, initially transparent.
    ShowEventVisual {
        /// Image path.
        path: String,
        /// Target opacity, 0-255.
        opacity: u8,
    },
    /// Remove the event illustration.
    HideEventVisual,
    /// Cover the screen with a solid color at once.
    CoverScreen {
        /// Cover color.
        color: String,
    },
    /// Apply a full-screen filter.
    ApplyFilter {
        /// Filter to apply.
        filter: ScreenFilter,
    },
    /// Remove a full-screen filter.
    RemoveFilter {
        /// Filter to remove.
        filter: ScreenFilter,
    },
    /// Start looped background music.
    PlayBgm {
        /// Audio path.
        path: String,
    },
    /// Stop background music.
    StopBgm,
    /// Play a one-shot sound.
    PlaySound {
        /// Audio path.
        path: String,
    },
    /// Play a video; fire-and-forget, the host may let it be skipped.
    PlayVideo {
        /// Video path.
        path: String,
    },
    /// Stop every audio channel, background music included.
    StopAllAudio,
    /// Run an animated effect and report back when it completes.
    PlayEffect(EffectCue),
    /// Present a choice list.
    ShowChoices {
        /// Candidates in display order.
        choices: Vec<ChoiceOption>,
    },
    /// Leave this scene.
    Navigate {
        /// Where control goes.
        target: NavTarget,
    },
}

/// What the player is waiting for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Idle; an advance moves to the next line.
    #[default]
    AwaitingCommand,
    /// The typewriter is revealing text.
    Typing,
    /// A text segment is fully shown; an advance reveals the next.
    AwaitingSegmentClick,
    /// A choice list is up; only a pick proceeds.
    AwaitingChoice,
    /// An animated effect is running; only its completion proceeds.
    PlayingEffect,
    /// The scene is over; no event does anything.
    SceneEnded,
}

/// Host input driving the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerEvent {
    /// Click, tap, or key press.
    Advance,
    /// The typewriter finished revealing the current text.
    TypingFinished,
    /// The running effect's animation completed.
    EffectFinished,
    /// The player picked choice `0..n`.
    ChoicePicked(usize),
}

/// One step's output: directives to perform plus the new phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutput {
    /// Instructions for the host, in order.
    pub directives: Vec<Directive>,
    /// What the player now waits for.
    pub phase: Phase,
}

impl StepOutput {
    /// True when this step ended the scene.
    pub fn scene_ended(&self) -> bool {
        self.phase == Phase::SceneEnded
    }
}
