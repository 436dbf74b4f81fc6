//! insertnum — insert formatted number sequences
//!
//! This crate drives the `insertnum_core` format engine across a set of insertion
//! points: [`SequenceInserter`] renders `start, start + step, ...` through a template,
//! [`TextBuffer`] holds the text and its insertion points, and [`Inserter`] applies
//! the default pass and the optional one-shot override.

mod buffer;
mod insert;
mod sequence;
mod settings;

#[cfg(feature = "pyo3")]
mod python;

pub use buffer::{BufferError, TextBuffer};
pub use insert::Inserter;
pub use insertnum_core::{FormatEngine, FormatError, FormatTemplate, ParseError, RenderError, Value};
pub use sequence::{parse_override, OverrideError, Sequence, SequenceInserter};
pub use settings::{Config, ConfigError, InsertionSettings, SequenceConfig, DEFAULT_FORMAT, DEFAULT_START, DEFAULT_STEP};

use std::path::PathBuf;

use thiserror::Error;

/// Library error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Override(#[from] OverrideError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
