//! insertnum — printf-style format engine (core library)
//!
//! This crate parses format templates such as `"%05d"` or `"%(user.name)s"` into
//! reusable [`FormatTemplate`]s and renders them against [`Value`] arguments with
//! JavaScript-flavoured printf semantics. [`FormatEngine`] adds a parse cache keyed
//! by the template string.

mod engine;
pub mod number;
mod render;
mod template;
mod value;

pub use engine::FormatEngine;
pub use render::MAX_WIDTH;
pub use template::{Accessor, ArgRef, Conversion, Directive, FormatTemplate, KeyPath, Pad, Segment};
pub use value::Value;

use thiserror::Error;

/// Errors raised while parsing a format template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected placeholder at offset {offset}")]
    UnexpectedPlaceholder { offset: usize },
    #[error("failed to parse named argument key {key:?}")]
    MalformedKey { key: String },
    #[error("mixing positional and named placeholders is not supported")]
    MixedReference,
}

/// Errors raised while rendering a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("expecting number but found {found}")]
    TypeMismatch { found: &'static str },
    #[error("property {key:?} does not exist")]
    MissingProperty { key: String },
    #[error("argument {index} was not supplied")]
    MissingArgument { index: usize },
    #[error("failed to serialize argument as JSON: {message}")]
    Json { message: String },
    #[error("field width {width} exceeds the limit of {limit}")]
    WidthTooLarge { width: usize, limit: usize },
}

/// Either half of [`FormatEngine::sprintf`] failing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
