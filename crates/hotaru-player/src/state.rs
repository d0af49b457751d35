//! Explicit interpreter state.
//!
//! Everything playback mutates lives here, in one inspectable struct,
//! rather than scattered across the player: the line cursor, the branch
//! stack, queued and active choices, and the text reveal in progress.

use hotaru_script::ChoiceOption;

use crate::branch::BranchTracker;
use crate::directive::Phase;
use crate::segment::SegmentRun;

/// The observable state of a running scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpreterState {
    /// What the player is currently waiting for.
    pub phase: Phase,
    /// Index of the line being displayed (or just displayed).
    pub line: usize,
    /// Open conditional frames.
    pub branches: BranchTracker,
    /// Choice candidates queued by `[selection]`, not yet shown.
    pub pending_choices: Vec<ChoiceOption>,
    /// The choice list on screen while awaiting a pick.
    pub active_choices: Vec<ChoiceOption>,
    /// The text reveal in progress, while typing or between segments.
    pub run: Option<SegmentRun>,
}
