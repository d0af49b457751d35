//! Bracket command parsing.
//!
//! Story lines carry inline commands as bracket text, e.g.
//! `[fadeout time=500 color=white]`. The first bracket group is parsed
//! into a name (lowercased) plus `key=value` params; values may be
//! double-quoted to contain spaces, and all double quotes are stripped.

use std::collections::HashMap;

use crate::action::{Action, DEFAULT_EFFECT_MS, DEFAULT_FINISH_MS};

/// A parsed bracket command: name plus raw parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name, lowercased.
    pub name: String,
    /// Raw `key=value` parameters, quotes stripped.
    pub params: HashMap<String, String>,
}

/// Parse the first bracket group of a raw command string.
///
/// Returns `None` when no non-empty `[...]` group is present.
pub fn parse_command(raw: &str) -> Option<Command> {
    let start = raw.find('[')?;
    let end = raw[start + 1..].find(']')? + start + 1;
    let body = &raw[start + 1..end];
    if body.is_empty() {
        return None;
    }

    let mut tokens = tokenize(body).into_iter();
    let name = tokens.next()?.to_lowercase();

    let mut params = HashMap::new();
    for token in tokens {
        if let Some((key, value)) = split_param(&token) {
            params.insert(key, value);
        }
    }

    Some(Command { name, params })
}

/// Split a bracket body into tokens, keeping double-quoted spans whole.
fn tokenize(body: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in body.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ' ' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Split one `key=value` token; keys are alphanumeric, quotes are stripped
/// from the value. Tokens without `=` and empty values are ignored, so
/// `key=` reads as an absent parameter.
fn split_param(token: &str) -> Option<(String, String)> {
    let (key, value) = token.split_once('=')?;
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    if value.is_empty() {
        return None;
    }
    Some((key.to_string(), value.replace('"', "")))
}

impl Command {
    /// A raw parameter value.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// A string parameter, or a default when absent.
    fn param_or(&self, key: &str, default: &str) -> String {
        self.param(key)
            .map(str::to_string)
            .unwrap_or_else(|| default.to_string())
    }

    /// A millisecond duration parameter. Unparsable, missing, zero, or
    /// negative values all fall back to the default; the script dialect
    /// treats zero as unset.
    fn duration_or(&self, key: &str, default: u64) -> u64 {
        match self.param(key).and_then(leading_int) {
            Some(n) if n > 0 => n as u64,
            _ => default,
        }
    }

    /// Lower this command to a typed action.
    ///
    /// Unknown names lower to `None`; the caller decides how loudly to
    /// complain.
    pub fn to_action(&self) -> Option<Action> {
        match self.name.as_str() {
            "fadeout" => Some(Action::FadeOut {
                duration: self.duration_or("time", DEFAULT_EFFECT_MS),
                background_color: self.param_or("color", "black"),
            }),
            "fadein" => Some(Action::FadeIn {
                duration: self.duration_or("time", DEFAULT_EFFECT_MS),
                background_color: self.param_or("color", "black"),
            }),
            "clearname" | "clear" => Some(Action::ClearName),
            "msgoff" => Some(Action::HideText),
            "msgon" => Some(Action::ShowText),
            "finish" => Some(Action::FinishGame {
                bg_color: self.param_or("bgcolor", "black"),
                duration: self.duration_or("time", DEFAULT_FINISH_MS),
            }),
            "finishwhite" => Some(Action::FinishGame {
                bg_color: self.param_or("bgcolor", "white"),
                duration: self.duration_or("time", DEFAULT_FINISH_MS),
            }),
            "s" => Some(Action::WaitForClick),
            "if" => Some(Action::Conditional {
                condition: self.param("cond")?.to_string(),
            }),
            "else" => Some(Action::ConditionalElse),
            "endif" => Some(Action::ConditionalEnd),
            "selection" => Some(Action::AddSelection {
                text: self.param("text")?.to_string(),
                target: self.param("target")?.to_string(),
            }),
            "showselections" => Some(Action::ShowSelections),
            "next" => Some(Action::NextScene {
                target: self.param("target")?.to_string(),
            }),
            "affinity" => Some(Action::AffinityChange {
                flag: self.param("flag")?.to_string(),
                add: self.param("add").and_then(leading_int).unwrap_or(0),
            }),
            _ => None,
        }
    }
}

/// Parse a raw command string straight to an action.
pub fn parse_action(raw: &str) -> Option<Action> {
    parse_command(raw)?.to_action()
}

/// Parse the leading integer of a string, sign included, ignoring any
/// trailing junk (`"500ms"` parses as 500).
fn leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let rest = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let end = trimmed.len() - rest.len() + digits;
    trimmed[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_fadeout_uses_defaults() {
        let action = parse_action("[fadeout]").unwrap();
        assert_eq!(
            action,
            Action::FadeOut {
                duration: 1000,
                background_color: "black".to_string(),
            }
        );
    }

    #[test]
    fn fadeout_with_params() {
        let action = parse_action("[fadeout time=500 color=white]").unwrap();
        assert_eq!(
            action,
            Action::FadeOut {
                duration: 500,
                background_color: "white".to_string(),
            }
        );
    }

    #[test]
    fn name_is_lowercased() {
        let cmd = parse_command("[FadeOut time=200]").unwrap();
        assert_eq!(cmd.name, "fadeout");
    }

    #[test]
    fn quotes_are_stripped() {
        let cmd = parse_command(r#"[fadeout color="white"]"#).unwrap();
        assert_eq!(cmd.param("color"), Some("white"));
    }

    #[test]
    fn quoted_value_keeps_spaces() {
        let cmd = parse_command(r#"[if cond="f.yurina >= 2"]"#).unwrap();
        assert_eq!(cmd.param("cond"), Some("f.yurina >= 2"));
        assert_eq!(
            cmd.to_action(),
            Some(Action::Conditional {
                condition: "f.yurina >= 2".to_string(),
            })
        );
    }

    #[test]
    fn only_first_bracket_group_counts() {
        let cmd = parse_command("[msgon] trailing [msgoff]").unwrap();
        assert_eq!(cmd.to_action(), Some(Action::ShowText));
    }

    #[test]
    fn no_bracket_group_is_none() {
        assert_eq!(parse_command("just text"), None);
        assert_eq!(parse_command("[]"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn unknown_name_lowers_to_none() {
        let cmd = parse_command("[teleport dest=moon]").unwrap();
        assert_eq!(cmd.name, "teleport");
        assert_eq!(cmd.to_action(), None);
    }

    #[test]
    fn zero_duration_falls_back() {
        let action = parse_action("[fadeout time=0]").unwrap();
        assert_eq!(
            action,
            Action::FadeOut {
                duration: 1000,
                background_color: "black".to_string(),
            }
        );
    }

    #[test]
    fn junk_duration_falls_back() {
        let action = parse_action("[fadein time=fast]").unwrap();
        assert_eq!(
            action,
            Action::FadeIn {
                duration: 1000,
                background_color: "black".to_string(),
            }
        );
    }

    #[test]
    fn duration_ignores_trailing_junk() {
        let action = parse_action("[fadeout time=500ms]").unwrap();
        assert_eq!(
            action,
            Action::FadeOut {
                duration: 500,
                background_color: "black".to_string(),
            }
        );
    }

    #[test]
    fn clear_synonyms() {
        assert_eq!(parse_action("[clearname]"), Some(Action::ClearName));
        assert_eq!(parse_action("[clear]"), Some(Action::ClearName));
    }

    #[test]
    fn message_box_toggles() {
        assert_eq!(parse_action("[msgoff]"), Some(Action::HideText));
        assert_eq!(parse_action("[msgon]"), Some(Action::ShowText));
    }

    #[test]
    fn wait_for_click() {
        assert_eq!(parse_action("[s]"), Some(Action::WaitForClick));
    }

    #[test]
    fn finish_variants() {
        assert_eq!(
            parse_action("[finish time=2000]"),
            Some(Action::FinishGame {
                bg_color: "black".to_string(),
                duration: 2000,
            })
        );
        assert_eq!(
            parse_action("[finishwhite]"),
            Some(Action::FinishGame {
                bg_color: "white".to_string(),
                duration: 1500,
            })
        );
    }

    #[test]
    fn selection_requires_text_and_target() {
        assert_eq!(
            parse_action(r#"[selection text="Go home" target=scene2]"#),
            Some(Action::AddSelection {
                text: "Go home".to_string(),
                target: "scene2".to_string(),
            })
        );
        assert_eq!(parse_action("[selection text=hi]"), None);
    }

    #[test]
    fn next_scene_target() {
        assert_eq!(
            parse_action("[next target=scene4]"),
            Some(Action::NextScene {
                target: "scene4".to_string(),
            })
        );
    }

    #[test]
    fn affinity_with_negative_delta() {
        assert_eq!(
            parse_action("[affinity flag=yurina add=-1]"),
            Some(Action::AffinityChange {
                flag: "yurina".to_string(),
                add: -1,
            })
        );
    }

    #[test]
    fn malformed_params_are_ignored() {
        let cmd = parse_command("[fadeout time=500 nonsense =bad key%=x empty=]").unwrap();
        assert_eq!(cmd.param("time"), Some("500"));
        assert_eq!(cmd.params.len(), 1);
    }
}
