//! Text segmenting for the typewriter.
//!
//! A line's text may contain `[s]` markers splitting it into segments that
//! reveal one click at a time. Display is cumulative: segment *i* shows
//! everything up to and including segment *i*, with only the new suffix
//! typed out. Break markup (`[br]`, escaped `\n`, `<br>` variants, raw
//! newlines) is normalized to a canonical `'\n'` before splitting.

/// Normalize every break marker in `text` to a single `'\n'`.
///
/// Recognized markers, all case-insensitive where letters are involved:
/// `[br]`, the two-character escape `\n`, `<br>` / `<br/>` / `<br />`,
/// and raw `\n` or `\r\n`.
pub fn normalize_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        if let Some(after) = strip_break(rest) {
            out.push('\n');
            rest = after;
        } else {
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    out
}

/// If `s` starts with a break marker, the remainder after it.
fn strip_break(s: &str) -> Option<&str> {
    if s.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("[br]")) {
        return Some(&s[4..]);
    }
    if let Some(rest) = s.strip_prefix("\\n") {
        return Some(rest);
    }
    if let Some(rest) = s.strip_prefix("\r\n") {
        return Some(rest);
    }
    if let Some(rest) = s.strip_prefix('\n') {
        return Some(rest);
    }
    if s.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("<br")) {
        let tail = s[3..].trim_start_matches(' ');
        let tail = tail.strip_prefix('/').unwrap_or(tail);
        return tail.strip_prefix('>');
    }
    None
}

/// Split text on the case-insensitive `[s]` marker.
///
/// Matches the split semantics scripts were written against: `"a[s]b"`
/// gives two parts, a bare `"[s]"` gives two empty parts.
pub fn split_segments(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        if rest.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("[s]")) {
            parts.push(std::mem::take(&mut current));
            rest = &rest[3..];
        } else {
            current.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    parts.push(current);
    parts
}

/// What the typewriter should show for one reveal step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    /// Complete text visible once this reveal finishes.
    pub full: String,
    /// Byte offset of the prefix that is already on screen; the suffix
    /// gets typed character by character.
    pub revealed: usize,
}

/// The per-line segment cursor.
///
/// Unsegmented lines produce exactly one reveal covering the whole text.
/// Segmented lines produce one reveal per non-blank segment; blank
/// segments are stepped over without a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRun {
    segments: Vec<String>,
    index: usize,
    started: bool,
}

impl SegmentRun {
    /// Normalize breaks and split `text` into a fresh cursor.
    pub fn new(text: &str) -> Self {
        Self {
            segments: split_segments(&normalize_breaks(text)),
            index: 0,
            started: false,
        }
    }

    /// True when the text had `[s]` markers.
    ///
    /// Segmented lines wait for a click after each reveal and consume one
    /// extra click to clear; unsegmented lines go straight back to idle.
    pub fn is_split(&self) -> bool {
        self.segments.len() > 1
    }

    /// Advance to the next reveal, or `None` when the line is exhausted.
    ///
    /// The first call yields the first reveal. Blank segments contribute
    /// their characters to later cumulative text but never get a reveal
    /// of their own.
    pub fn next_reveal(&mut self) -> Option<Reveal> {
        if !self.is_split() {
            if self.started {
                return None;
            }
            self.started = true;
            return Some(self.reveal_at(0));
        }

        let mut i = if self.started { self.index + 1 } else { 0 };
        while i < self.segments.len() && self.segments[i].trim().is_empty() {
            i += 1;
        }
        if i >= self.segments.len() {
            return None;
        }
        self.started = true;
        self.index = i;
        Some(self.reveal_at(i))
    }

    /// The reveal currently in progress, if any.
    pub fn current_reveal(&self) -> Option<Reveal> {
        self.started.then(|| self.reveal_at(self.index))
    }

    fn reveal_at(&self, index: usize) -> Reveal {
        Reveal {
            full: self.segments[..=index].concat(),
            revealed: self.segments[..index].iter().map(String::len).sum(),
        }
    }
}
