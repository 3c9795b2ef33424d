//! Bibliography cache.
//!
//! Holds the configuration registered for each bibliography placeholder and
//! the parsed entries of each bibliography file. The cache is read-only from
//! the transform's point of view; entries are cloned before formatting.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading a cache snapshot.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn default_style() -> String {
    "plain".to_string()
}

fn default_true() -> bool {
    true
}

/// Configuration of one bibliography placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographyConfig {
    /// Bibliography file identifiers, in the order their entries are listed.
    #[serde(default)]
    pub bibfiles: Vec<String>,
    /// Name of the style used to format the entries.
    #[serde(default = "default_style")]
    pub style: String,
    /// Whether `{` and `}` are removed from the rendered text.
    #[serde(default = "default_true")]
    pub curly_bracket_strip: bool,
}

impl Default for BibliographyConfig {
    fn default() -> Self {
        Self {
            bibfiles: Vec::new(),
            style: default_style(),
            curly_bracket_strip: true,
        }
    }
}

/// One bibliographic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub fields: IndexMap<String, String>,
    /// Person lists keyed by role (e.g. "author", "editor").
    #[serde(default)]
    pub persons: IndexMap<String, Vec<String>>,
}

impl Entry {
    /// Creates an entry with no fields and no persons.
    ///
    /// # Arguments
    ///
    /// * `key` - The entry key, e.g. "knuth1984"
    /// * `entry_type` - The entry type, e.g. "book" or "article"
    pub fn new(key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entry_type: entry_type.into(),
            fields: IndexMap::new(),
            persons: IndexMap::new(),
        }
    }

    /// Sets a field, replacing any previous value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Appends a person to the list for `role`.
    pub fn with_person(mut self, role: impl Into<String>, name: impl Into<String>) -> Self {
        self.persons.entry(role.into()).or_default().push(name.into());
        self
    }

    /// Returns the value of a field, if set.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Parsed data of one bibliography file: entries keyed by entry key, in file
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibFile {
    #[serde(default)]
    pub entries: IndexMap<String, Entry>,
}

impl BibFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a file from entries, keyed by their own keys.
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.key.clone(), e)).collect(),
        }
    }
}

/// Placeholder configurations and bibliography file data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibtexCache {
    /// Configuration per placeholder id.
    #[serde(default)]
    pub bibliographies: HashMap<String, BibliographyConfig>,
    /// Entries per bibliography file identifier.
    #[serde(default)]
    pub bibfiles: HashMap<String, BibFile>,
}

impl BibtexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a cache snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid snapshot.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parses a cache snapshot from JSON.
    ///
    /// # Arguments
    ///
    /// * `json` - Snapshot with `bibliographies` and `bibfiles` objects
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::JsonError`] if the JSON does not describe a cache.
    pub fn from_json_str(json: &str) -> Result<Self, CacheError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Registers the configuration of the placeholder with id `id`.
    pub fn add_bibliography(&mut self, id: impl Into<String>, config: BibliographyConfig) {
        self.bibliographies.insert(id.into(), config);
    }

    /// Stores the entries of a bibliography file under `id`.
    pub fn add_bibfile(&mut self, id: impl Into<String>, bibfile: BibFile) {
        self.bibfiles.insert(id.into(), bibfile);
    }

    /// Returns the configuration registered for a placeholder id.
    pub fn bibliography(&self, id: &str) -> Option<&BibliographyConfig> {
        self.bibliographies.get(id)
    }

    /// Returns the entries stored for a bibliography file.
    pub fn bibfile(&self, id: &str) -> Option<&BibFile> {
        self.bibfiles.get(id)
    }
}
