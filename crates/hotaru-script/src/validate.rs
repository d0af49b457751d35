//! Static validation of scene scripts.
//!
//! Rendering a script as a one-line-per-story-line listing lets the
//! diagnostics point at real spans. Structural problems (unparsable
//! conditions, unbalanced conditionals) are errors; things the player
//! degrades through at runtime (unknown commands, dangling asset keys)
//! are warnings.

use crate::action::Action;
use crate::command::parse_command;
use crate::condition::parse_condition;
use crate::diagnostics::Diagnostic;
use crate::line::{SceneScript, StoryLine};

/// A rendered script listing with per-line spans.
#[derive(Debug, Clone)]
pub struct ScriptListing {
    text: String,
    line_spans: Vec<std::ops::Range<usize>>,
}

impl ScriptListing {
    /// Render a script, one listing line per story line.
    pub fn render(script: &SceneScript) -> Self {
        let mut text = String::new();
        let mut line_spans = Vec::with_capacity(script.story.len());
        for line in &script.story {
            let start = text.len();
            let content = render_line(line);
            text.push_str(&content);
            line_spans.push(start..text.len());
            text.push('\n');
        }
        Self { text, line_spans }
    }

    /// The full listing text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte span of a story line within the listing.
    pub fn line_span(&self, index: usize) -> std::ops::Range<usize> {
        self.line_spans.get(index).cloned().unwrap_or(0..0)
    }

    /// Span of a substring within a story line, if it occurs there.
    fn find_in_line(&self, index: usize, needle: &str) -> Option<std::ops::Range<usize>> {
        let span = self.line_span(index);
        let content = &self.text[span.clone()];
        content
            .find(needle)
            .map(|at| span.start + at..span.start + at + needle.len())
    }
}

fn render_line(line: &StoryLine) -> String {
    if let Some(raw) = line.command_text() {
        return raw.to_string();
    }
    let mut out = String::new();
    if let Some(speaker) = &line.speaker {
        out.push_str(speaker);
        out.push_str(": ");
    }
    out.push_str(&line.text.replace('\n', " "));
    if let Some(raw) = &line.action {
        if !out.is_empty() {
            out.push(' ');
        }
        match raw.as_action() {
            Some(Action::Conditional { condition }) => {
                out.push_str("@conditional(");
                out.push_str(condition);
                out.push(')');
            }
            Some(action) => {
                out.push('@');
                out.push_str(action.tag());
            }
            None => out.push_str("@<unknown>"),
        }
    }
    out
}

/// Validate a script, returning the listing and all findings.
pub fn validate_script(script: &SceneScript) -> (ScriptListing, Vec<Diagnostic>) {
    let listing = ScriptListing::render(script);
    let mut diags = Vec::new();

    if script.story.is_empty() {
        diags.push(Diagnostic::warning(
            0..0,
            "script has no story lines; playback ends immediately",
        ));
        return (listing, diags);
    }

    // Open conditionals: (span of the opening line, has_else).
    let mut open: Vec<(std::ops::Range<usize>, bool)> = Vec::new();
    // Selections accumulated since the last [showselections].
    let mut pending_selections: Vec<std::ops::Range<usize>> = Vec::new();

    for (index, line) in script.story.iter().enumerate() {
        let span = listing.line_span(index);
        let action = effective_action(line, index, &listing, &mut diags);

        if let Some(action) = &action {
            check_structure(action, index, &listing, &mut open, &mut diags);
            check_selections(action, span.clone(), &mut pending_selections, &mut diags);
            check_asset_refs(action, script, span.clone(), &mut diags);
        }

        if line.command_text().is_none() {
            check_line_assets(line, script, span, &mut diags);
        }
    }

    for (span, _) in open {
        diags.push(
            Diagnostic::error(span, "conditional is never closed")
                .with_label("no matching [endif]"),
        );
    }
    for span in pending_selections {
        diags.push(
            Diagnostic::warning(span, "selection is never shown")
                .with_label("no [showselections] follows"),
        );
    }

    (listing, diags)
}

/// The action a line dispatches: the bracket command's on command lines
/// (the embedded action is ignored there, as at runtime), else the
/// embedded one.
fn effective_action(
    line: &StoryLine,
    index: usize,
    listing: &ScriptListing,
    diags: &mut Vec<Diagnostic>,
) -> Option<Action> {
    if let Some(raw) = line.command_text() {
        let span = listing.line_span(index);
        return match parse_command(raw) {
            None => {
                diags.push(Diagnostic::warning(
                    span,
                    "command line has no [bracket] group; line is a no-op",
                ));
                None
            }
            Some(cmd) => match cmd.to_action() {
                None => {
                    diags.push(
                        Diagnostic::warning(span, format!("unknown command: {}", cmd.name))
                            .with_label("ignored at playback"),
                    );
                    None
                }
                some => some,
            },
        };
    }

    match &line.action {
        None => None,
        Some(raw) => match raw.as_action() {
            Some(action) => Some(action.clone()),
            None => {
                diags.push(
                    Diagnostic::warning(
                        listing.line_span(index),
                        "unrecognized action type; ignored at playback",
                    )
                    .with_label("not a known action"),
                );
                None
            }
        },
    }
}

fn check_structure(
    action: &Action,
    index: usize,
    listing: &ScriptListing,
    open: &mut Vec<(std::ops::Range<usize>, bool)>,
    diags: &mut Vec<Diagnostic>,
) {
    let span = listing.line_span(index);
    match action {
        Action::Conditional { condition } => {
            if let Err(err) = parse_condition(condition) {
                let at = listing
                    .find_in_line(index, condition)
                    .map(|s| s.start + err.span.start..s.start + err.span.end)
                    .unwrap_or(span.clone());
                diags.push(
                    Diagnostic::error(at, format!("condition does not parse: {err}"))
                        .with_label("evaluates to false at playback"),
                );
            }
            open.push((span, false));
        }
        Action::ConditionalElse => match open.last_mut() {
            None => diags.push(
                Diagnostic::error(span, "else without an open conditional")
                    .with_label("no frame to alternate"),
            ),
            Some((_, has_else)) => {
                if *has_else {
                    diags.push(Diagnostic::warning(
                        span,
                        "second else in the same conditional",
                    ));
                }
                *has_else = true;
            }
        },
        Action::ConditionalEnd => {
            if open.pop().is_none() {
                diags.push(
                    Diagnostic::error(span, "endif without an open conditional")
                        .with_label("pop is a no-op at playback"),
                );
            }
        }
        _ => {}
    }
}

fn check_selections(
    action: &Action,
    span: std::ops::Range<usize>,
    pending: &mut Vec<std::ops::Range<usize>>,
    diags: &mut Vec<Diagnostic>,
) {
    match action {
        Action::AddSelection { target, .. } => {
            if target.is_empty() {
                diags.push(Diagnostic::warning(
                    span.clone(),
                    "selection has an empty target scene",
                ));
            }
            pending.push(span);
        }
        Action::ShowSelections => {
            if pending.is_empty() {
                diags.push(
                    Diagnostic::warning(span, "showselections with no selections")
                        .with_label("no-op at playback"),
                );
            }
            pending.clear();
        }
        Action::Choice { choices } => {
            if choices.is_empty() {
                diags.push(
                    Diagnostic::warning(span, "choice has no options")
                        .with_label("no-op at playback"),
                );
            } else if choices.iter().any(|c| c.target.is_empty()) {
                diags.push(Diagnostic::warning(
                    span,
                    "choice option has an empty target scene",
                ));
            }
        }
        Action::NextScene { target } => {
            if target.is_empty() {
                diags.push(Diagnostic::warning(span, "next has an empty target scene"));
            }
        }
        _ => {}
    }
}

fn check_asset_refs(
    action: &Action,
    script: &SceneScript,
    span: std::ops::Range<usize>,
    diags: &mut Vec<Diagnostic>,
) {
    match action {
        Action::BackgroundChange { file, .. } | Action::BackgroundChangeNoTransition { file, .. } => {
            if script.background_path(file).is_none() {
                diags.push(Diagnostic::warning(
                    span,
                    format!("background key not defined: {file}"),
                ));
            }
        }
        Action::EventShow { file, .. } => {
            if script.event_path(file).is_none() {
                diags.push(Diagnostic::warning(
                    span,
                    format!("event key not defined: {file}"),
                ));
            }
        }
        _ => {}
    }
}

fn check_line_assets(
    line: &StoryLine,
    script: &SceneScript,
    span: std::ops::Range<usize>,
    diags: &mut Vec<Diagnostic>,
) {
    if let Some(key) = &line.background {
        if script.background_path(key).is_none() {
            diags.push(Diagnostic::warning(
                span.clone(),
                format!("background key not defined: {key}"),
            ));
        }
    }
    if let Some(key) = &line.bgm {
        if key != "bgm stop" && script.bgm_path(key).is_none() {
            diags.push(Diagnostic::warning(
                span.clone(),
                format!("bgm key not defined: {key}"),
            ));
        }
    }
    if let Some(key) = &line.audio {
        if script.is_bgm_key(key) {
            diags.push(Diagnostic::warning(
                span.clone(),
                format!("audio key {key} is shadowed by the bgm map; it will not play"),
            ));
        } else if script.audio_path(key).is_none() {
            diags.push(Diagnostic::warning(
                span.clone(),
                format!("audio key not defined: {key}"),
            ));
        }
    }
    if let Some(key) = &line.video {
        if script.video_path(key).is_none() {
            diags.push(Diagnostic::warning(
                span,
                format!("video key not defined: {key}"),
            ));
        }
    }
}
