use insertnum_core::FormatEngine;
use log::{info, warn};

use crate::buffer::TextBuffer;
use crate::sequence::{parse_override, SequenceInserter};
use crate::settings::InsertionSettings;
use crate::Error;

/// Fills insertion points with number sequences.
///
/// An insertion runs in two independent passes: the default sequence from the
/// configured settings, then an optional one-shot override typed by the user. The
/// override rewrites the same insertion points; when it is cancelled or rejected
/// the default pass stays in place.
#[derive(Debug, Default)]
pub struct Inserter {
    engine: FormatEngine,
    defaults: InsertionSettings,
}

impl Inserter {
    pub fn new(defaults: InsertionSettings) -> Self {
        Self::with_engine(FormatEngine::new(), defaults)
    }

    pub fn with_engine(engine: FormatEngine, defaults: InsertionSettings) -> Self {
        Self { engine, defaults }
    }

    pub fn engine(&self) -> &FormatEngine {
        &self.engine
    }

    pub fn defaults(&self) -> &InsertionSettings {
        &self.defaults
    }

    /// Render one string per selection, then replace them all in one edit.
    ///
    /// Nothing is written unless every string rendered.
    pub fn insert(&self, buffer: &mut TextBuffer, settings: &InsertionSettings) -> Result<(), Error> {
        let sequence = SequenceInserter::new(&self.engine, settings)?;
        let texts = sequence.generate_all(buffer.selections().len())?;
        buffer.apply_edits(texts)?;
        info!(
            "inserted {} value(s) with {:?} from {} step {}",
            buffer.selections().len(),
            settings.format_template,
            settings.start,
            settings.step
        );
        Ok(())
    }

    pub fn apply_default_sequence(&self, buffer: &mut TextBuffer) -> Result<(), Error> {
        self.insert(buffer, &self.defaults)
    }

    /// Second pass driven by user input. Returns the settings that were applied,
    /// or `None` when there was no input (or it was empty).
    pub fn apply_override_if_provided(
        &self,
        buffer: &mut TextBuffer,
        input: Option<&str>,
    ) -> Result<Option<InsertionSettings>, Error> {
        let Some(input) = input else {
            return Ok(None);
        };
        let settings = match parse_override(input) {
            Ok(Some(settings)) => settings,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!("override rejected, keeping default sequence: {e}");
                return Err(e.into());
            }
        };
        self.insert(buffer, &settings)?;
        Ok(Some(settings))
    }

    /// Run the default pass, then ask `prompt` once for an override.
    ///
    /// `prompt` is only called after the default pass has been applied.
    pub fn process_insert<F>(&self, buffer: &mut TextBuffer, prompt: F) -> Result<Option<InsertionSettings>, Error>
    where
        F: FnOnce() -> Option<String>,
    {
        self.apply_default_sequence(buffer)?;
        let input = prompt();
        self.apply_override_if_provided(buffer, input.as_deref())
    }
}
