use std::iter::FusedIterator;
use std::sync::Arc;

use insertnum_core::number::{parse_float, parse_int_auto};
use insertnum_core::{FormatEngine, FormatTemplate, ParseError, RenderError, Value};
use thiserror::Error;

use crate::settings::InsertionSettings;

/// A parsed template bound to a numeric sequence `start, start + step, ...`.
#[derive(Debug, Clone)]
pub struct SequenceInserter {
    template: Arc<FormatTemplate>,
    start: f64,
    step: f64,
}

impl SequenceInserter {
    pub fn new(engine: &FormatEngine, settings: &InsertionSettings) -> Result<Self, ParseError> {
        Ok(Self {
            template: engine.parse(&settings.format_template)?,
            start: settings.start,
            step: settings.step,
        })
    }

    pub fn template(&self) -> &FormatTemplate {
        &self.template
    }

    /// The argument rendered for the `index`-th insertion point.
    pub fn value_at(&self, index: usize) -> f64 {
        self.start + index as f64 * self.step
    }

    /// Lazily render `count` strings. Each call starts over from `start`.
    pub fn generate(&self, count: usize) -> Sequence<'_> {
        Sequence {
            inserter: self,
            next: 0,
            count,
        }
    }

    pub fn generate_all(&self, count: usize) -> Result<Vec<String>, RenderError> {
        self.generate(count).collect()
    }
}

/// Iterator returned by [`SequenceInserter::generate`].
#[derive(Debug, Clone)]
pub struct Sequence<'a> {
    inserter: &'a SequenceInserter,
    next: usize,
    count: usize,
}

impl Iterator for Sequence<'_> {
    type Item = Result<String, RenderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let value = self.inserter.value_at(self.next);
        self.next += 1;
        Some(self.inserter.template.render(&[Value::Number(value)]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Sequence<'_> {}

impl FusedIterator for Sequence<'_> {}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverrideError {
    #[error("wrong format string {input:?}: expected `format` or `format:start:step` with a % directive")]
    NoPercentSign { input: String },
}

/// Parse one-shot user input of the form `format` or `format:start:step`.
///
/// Empty input means the user cancelled and yields `Ok(None)`. The only check is
/// for a `%`; bad templates surface later from the parser. Fields after the third
/// `:` are ignored, and a missing start or step keeps its default.
pub fn parse_override(input: &str) -> Result<Option<InsertionSettings>, OverrideError> {
    if input.is_empty() {
        return Ok(None);
    }
    if !input.contains('%') {
        return Err(OverrideError::NoPercentSign {
            input: input.to_string(),
        });
    }

    let mut settings = InsertionSettings::default();
    if !input.contains(':') {
        settings.format_template = input.to_string();
        return Ok(Some(settings));
    }

    let mut fields = input.split(':').take(3);
    settings.format_template = fields.next().unwrap_or_default().to_string();
    if let Some(start) = fields.next() {
        settings.start = parse_number_field(start);
    }
    if let Some(step) = fields.next() {
        settings.step = parse_number_field(step);
    }
    Ok(Some(settings))
}

fn parse_number_field(field: &str) -> f64 {
    if field.contains('.') {
        parse_float(field)
    } else {
        parse_int_auto(field)
    }
}
