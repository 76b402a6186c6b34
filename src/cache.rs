//! Compiled-template cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::lexer::{compile, Template};

/// Memoizes [`compile`] per template text.
///
/// Entries are never evicted: templates are expected to be a bounded set of
/// string literals.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: Mutex<HashMap<String, Arc<Template>>>,
}

impl TemplateCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled form of `template`, lexing it on first use.
    ///
    /// The lock is held across lookup and insert, so a text is lexed at most
    /// once even under contention.
    pub fn get_or_compile(&self, template: &str) -> Arc<Template> {
        let mut entries = self.entries.lock();
        if let Some(compiled) = entries.get(template) {
            return Arc::clone(compiled);
        }

        let compiled = Arc::new(compile(template));
        debug!(
            len = template.len(),
            tokens = compiled.tokens().len(),
            "template compiled"
        );
        entries.insert(template.to_owned(), Arc::clone(&compiled));
        compiled
    }

    /// Number of distinct template texts compiled so far.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
