//! The topic catalog: an ordered, read-only list of topics loaded once at
//! startup, either from the embedded document or from a catalog file.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use figment::providers::{Format, Toml};
use figment::Figment;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

const BUILTIN_TOPICS: &str = include_str!("../assets/topics.toml");

pub const DEFAULT_LANGUAGE: &str = "java";

/// A single learning topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Topic {
    /// Unique identifier, used as the selection key
    pub id: String,
    /// Display name shown in the sidebar and detail header
    pub title: String,
    /// Free-text grouping label, e.g. "Basics"
    pub category: String,
    /// Prose explanation
    #[serde(default)]
    pub description: String,
    /// Example source text, never interpreted
    #[serde(default)]
    pub code: String,
}

/// Catalog document as stored on disk (TOML or JSON).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CatalogFile {
    /// Language of the code samples, used for highlighting, e.g. "java"
    #[serde(default)]
    pub language: Option<String>,
    /// Topics in display order
    #[serde(default)]
    pub topics: Vec<Topic>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("topic #{index} has an empty id")]
    MissingId { index: usize },

    #[error("duplicate topic id: {0}")]
    DuplicateId(String),

    #[error("topic {id} has an empty title")]
    MissingTitle { id: String },

    #[error("topic {id} has an empty category")]
    MissingCategory { id: String },

    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid catalog {origin}: {message}")]
    Format { origin: String, message: String },
}

#[derive(Debug, Clone)]
pub struct Catalog {
    language: String,
    topics: Vec<Topic>,
}

impl Catalog {
    pub fn new(topics: Vec<Topic>) -> Result<Self, CatalogError> {
        validate(&topics)?;
        Ok(Self {
            language: DEFAULT_LANGUAGE.to_string(),
            topics,
        })
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        let file = parse_toml(BUILTIN_TOPICS, "<builtin>")?;
        Self::from_file(file)
    }

    /// Reads a catalog file. `.json` is parsed as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = path.display().to_string();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let file = if is_json {
            parse_json(&contents, &origin)?
        } else {
            parse_toml(&contents, &origin)?
        };
        debug!(path = %origin, topics = file.topics.len(), "catalog file parsed");
        Self::from_file(file)
    }

    fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        let mut catalog = Self::new(file.topics)?;
        if let Some(language) = file
            .language
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            catalog.language = language.to_string();
        }
        Ok(catalog)
    }

    pub fn all(&self) -> &[Topic] {
        &self.topics
    }

    pub fn get(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|topic| topic.id == id)
    }

    pub fn first(&self) -> Option<&Topic> {
        self.topics.first()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

fn validate(topics: &[Topic]) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for (index, topic) in topics.iter().enumerate() {
        if topic.id.trim().is_empty() {
            return Err(CatalogError::MissingId { index });
        }
        if !seen.insert(topic.id.as_str()) {
            return Err(CatalogError::DuplicateId(topic.id.clone()));
        }
        if topic.title.trim().is_empty() {
            return Err(CatalogError::MissingTitle {
                id: topic.id.clone(),
            });
        }
        if topic.category.trim().is_empty() {
            return Err(CatalogError::MissingCategory {
                id: topic.id.clone(),
            });
        }
    }
    Ok(())
}

fn parse_toml(contents: &str, origin: &str) -> Result<CatalogFile, CatalogError> {
    Figment::from(Toml::string(contents))
        .extract()
        .map_err(|err| CatalogError::Format {
            origin: origin.to_string(),
            message: err.to_string(),
        })
}

fn parse_json(contents: &str, origin: &str) -> Result<CatalogFile, CatalogError> {
    serde_json::from_str(contents).map_err(|err| CatalogError::Format {
        origin: origin.to_string(),
        message: err.to_string(),
    })
}

/// JSON Schema describing the catalog file format.
pub fn json_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(CatalogFile);
    serde_json::to_string_pretty(&schema)
}

#[cfg(test)]
pub(crate) fn topic(id: &str, title: &str, category: &str) -> Topic {
    Topic {
        id: id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        description: String::new(),
        code: String::new(),
    }
}
