use std::ops::Range;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("selection {start}..{end} is out of bounds or not on a character boundary")]
    InvalidSelection { start: usize, end: usize },
    #[error("selections overlap at byte {at}")]
    Overlap { at: usize },
    #[error("expected {expected} replacement(s), got {got}")]
    ReplacementCount { expected: usize, got: usize },
}

/// Text plus an ordered set of insertion points (byte ranges).
///
/// Selections are sorted and never overlap. After [`TextBuffer::apply_edits`]
/// each selection covers the text that replaced it, so a second pass rewrites
/// the same insertion points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    selections: Vec<Range<usize>>,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>, mut selections: Vec<Range<usize>>) -> Result<Self, BufferError> {
        let text = text.into();
        selections.sort_by_key(|r| (r.start, r.end));
        let mut prev_end = 0;
        for r in &selections {
            let in_bounds = r.start <= r.end && r.end <= text.len();
            if !in_bounds || !text.is_char_boundary(r.start) || !text.is_char_boundary(r.end) {
                return Err(BufferError::InvalidSelection { start: r.start, end: r.end });
            }
            if r.start < prev_end {
                return Err(BufferError::Overlap { at: r.start });
            }
            prev_end = r.end;
        }
        Ok(Self { text, selections })
    }

    /// Select every match of `pattern`.
    ///
    /// An empty match at the very end of text that is empty or ends in a newline is
    /// skipped, so `(?m)^` selects the start of each line without a phantom last line.
    pub fn with_matches(text: impl Into<String>, pattern: &Regex) -> Self {
        let text = text.into();
        let phantom_tail = text.is_empty() || text.ends_with('\n');
        let selections = pattern
            .find_iter(&text)
            .map(|m| m.range())
            .filter(|r| !(phantom_tail && r.is_empty() && r.start == text.len()))
            .collect();
        Self { text, selections }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn selections(&self) -> &[Range<usize>] {
        &self.selections
    }

    /// Text currently covered by each selection.
    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.selections.iter().map(|r| &self.text[r.clone()])
    }

    /// Replace every selection at once; `replacements[i]` goes to selection `i`.
    pub fn apply_edits(&mut self, replacements: Vec<String>) -> Result<(), BufferError> {
        if replacements.len() != self.selections.len() {
            return Err(BufferError::ReplacementCount {
                expected: self.selections.len(),
                got: replacements.len(),
            });
        }

        let added: usize = replacements.iter().map(String::len).sum();
        let mut out = String::with_capacity(self.text.len() + added);
        let mut new_selections = Vec::with_capacity(self.selections.len());
        let mut last = 0;
        for (range, replacement) in self.selections.iter().zip(replacements) {
            out.push_str(&self.text[last..range.start]);
            let start = out.len();
            out.push_str(&replacement);
            new_selections.push(start..out.len());
            last = range.end;
        }
        out.push_str(&self.text[last..]);

        self.text = out;
        self.selections = new_selections;
        Ok(())
    }
}
