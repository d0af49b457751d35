//! Scene playback for hotaru scripts.
//!
//! This crate turns a parsed [`hotaru_script::SceneScript`] into play: a
//! [`ScenePlayer`] walks the story lines and answers every input with the
//! [`Directive`]s a host should perform and the [`Phase`] it should wait
//! in. The player is host-agnostic. It never draws, plays audio, or
//! sleeps; typewriter pacing and effect timing happen in the host, which
//! reports back with [`PlayerEvent`]s.
//!
//! The pieces compose bottom-up: [`segment`] handles `[s]`-segmented text
//! reveals, [`branch`] tracks nested conditionals, [`directive`] defines
//! the host-facing vocabulary, and [`player`] ties them to a
//! [`hotaru_progress::ProgressStore`].

pub mod branch;
pub mod directive;
pub mod player;
pub mod segment;
pub mod state;

pub use branch::BranchTracker;
pub use directive::{
    Directive, EffectCue, EffectKind, NavTarget, Phase, PlayerEvent, ScreenFilter, StepOutput,
};
pub use player::ScenePlayer;
pub use segment::{Reveal, SegmentRun, normalize_breaks, split_segments};
pub use state::InterpreterState;
