use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

use crate::template::FormatTemplate;
use crate::value::Value;
use crate::{FormatError, ParseError, RenderError};

/// Parses templates once and keeps them for the lifetime of the engine.
///
/// The cache is append-only: entries are immutable once inserted and a template
/// string always parses to the same tree, so concurrent callers that race on a
/// miss may both parse and the first insert wins.
#[derive(Debug, Default)]
pub struct FormatEngine {
    cache: RwLock<HashMap<String, Arc<FormatTemplate>>>,
}

impl FormatEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `template`, reusing a cached tree when this exact string was seen before.
    ///
    /// Templates that fail to parse are not cached.
    pub fn parse(&self, template: &str) -> Result<Arc<FormatTemplate>, ParseError> {
        if let Some(hit) = self.cache.read().unwrap_or_else(PoisonError::into_inner).get(template) {
            debug!("template cache hit: {template:?}");
            return Ok(Arc::clone(hit));
        }

        debug!("template cache miss: {template:?}");
        let parsed = Arc::new(FormatTemplate::parse(template)?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(template.to_string()).or_insert(parsed)))
    }

    pub fn render(&self, template: &FormatTemplate, args: &[Value]) -> Result<String, RenderError> {
        template.render(args)
    }

    /// Parse (through the cache) and render in one call.
    pub fn sprintf(&self, template: &str, args: &[Value]) -> Result<String, FormatError> {
        let parsed = self.parse(template)?;
        Ok(parsed.render(args)?)
    }

    pub fn cached_templates(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear_cache(&self) {
        self.cache.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
