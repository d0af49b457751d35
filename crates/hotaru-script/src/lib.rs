//! Scene script model, command parsing, and condition evaluation.
//!
//! A scene script is JSON: an ordered list of story lines plus asset maps.
//! This crate owns everything static about a script: the data model, the
//! `[bracket]` command grammar, the condition expression language, and
//! validation with pretty diagnostics. Playing a script is the player
//! crate's job.

/// Typed actions and their JSON encoding.
pub mod action;
/// Bracket command parsing.
pub mod command;
/// Condition expressions over affinity flags.
pub mod condition;
/// Diagnostics with ariadne rendering.
pub mod diagnostics;
/// Error types.
pub mod error;
/// Story lines and scene scripts.
pub mod line;
/// Static script validation.
pub mod validate;

pub use action::{Action, ChoiceOption, RawAction};
pub use command::{Command, parse_action, parse_command};
pub use condition::evaluate_condition;
pub use diagnostics::{Diagnostic, Severity};
pub use error::{ScriptError, ScriptResult};
pub use line::{SceneScript, StoryLine, scene_id_from_path};
pub use validate::{ScriptListing, validate_script};
