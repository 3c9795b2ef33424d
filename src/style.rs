//! Citation styles.
//!
//! A style turns bibliography entries into formatted entries. Styles are
//! looked up by name in a [`StyleRegistry`] and instantiated fresh for every
//! bibliography they format.

use std::collections::HashMap;

use thiserror::Error;

use crate::cache::Entry;

/// Errors that can occur when resolving styles.
#[derive(Error, Debug)]
pub enum StyleError {
    #[error("style '{name}' not found (available: {})", .available.join(", "))]
    NotFound { name: String, available: Vec<String> },
}

/// Styled text produced by a style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RichText {
    Plain(String),
    Emphasis(Vec<RichText>),
    Strong(Vec<RichText>),
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        RichText::Plain(text.into())
    }
}

/// An entry after formatting, ready to be rendered by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedEntry {
    /// Key of the entry this was formatted from.
    pub key: String,
    /// Citation label, e.g. "1" or "Knu84".
    pub label: String,
    pub text: Vec<RichText>,
}

/// A citation style.
pub trait Style {
    /// Formats a batch of entries.
    ///
    /// The style owns the entries and may modify or reorder them; the order
    /// of the returned list is the order the bibliography is rendered in.
    fn format_entries(&mut self, entries: Vec<Entry>) -> Vec<FormattedEntry>;
}

/// Creates a fresh style instance.
pub type StyleFactory = Box<dyn Fn() -> Box<dyn Style>>;

/// Styles available by name.
#[derive(Default)]
pub struct StyleRegistry {
    factories: HashMap<String, StyleFactory>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a style under `name`, replacing any previous registration.
    ///
    /// # Arguments
    ///
    /// * `name` - The style name used in bibliography configurations
    /// * `factory` - Creates a fresh style instance for each bibliography
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Style> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Returns the factory registered under `name`.
    ///
    /// # Arguments
    ///
    /// * `name` - The style name, e.g. "plain"
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::NotFound`] if no style has that name.
    pub fn resolve(&self, name: &str) -> Result<&StyleFactory, StyleError> {
        self.factories.get(name).ok_or_else(|| StyleError::NotFound {
            name: name.to_string(),
            available: self.names(),
        })
    }

    /// Returns true if a style is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the registered style names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for StyleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleRegistry")
            .field("styles", &self.names())
            .finish()
    }
}
