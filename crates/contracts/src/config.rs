//! RelayConfig - Config Loader output
//!
//! One section per plugin identity, each a flat map of string options.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Handler option listing the subscribed reading types
pub const READING_TYPES_KEY: &str = "reading_types";

/// Accepted spelling of [`READING_TYPES_KEY`] with a space
pub const READING_TYPES_ALIAS: &str = "reading types";

/// Raw option value as written in the config file
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Text(String),
    Boolean(bool),
    Integer(i64),
    Float(f64),
    List(Vec<OptionValue>),
}

impl OptionValue {
    fn into_string(self) -> String {
        match self {
            Self::Text(v) => v,
            Self::Boolean(v) => v.to_string(),
            Self::Integer(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::List(items) => items
                .into_iter()
                .map(Self::into_string)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Options of a single plugin section
///
/// Passed verbatim to the plugin constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, OptionValue>",
    into = "BTreeMap<String, String>"
)]
pub struct PluginConfig {
    options: BTreeMap<String, String>,
}

impl From<BTreeMap<String, OptionValue>> for PluginConfig {
    fn from(raw: BTreeMap<String, OptionValue>) -> Self {
        Self {
            options: raw
                .into_iter()
                .map(|(k, v)| (k, v.into_string()))
                .collect(),
        }
    }
}

impl From<PluginConfig> for BTreeMap<String, String> {
    fn from(config: PluginConfig) -> Self {
        config.options
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PluginConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            options: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl PluginConfig {
    /// Create empty section
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    /// Comma-separated option as a list
    ///
    /// Entries are whitespace-trimmed; empty entries are dropped.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    /// Option parsed into `T`
    ///
    /// Returns `Ok(None)` when the option is absent.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>, T::Err>
    where
        T: FromStr,
    {
        self.get(key).map(|v| v.trim().parse()).transpose()
    }

    /// Reading types a handler subscribes to, if configured
    pub fn reading_types(&self) -> Option<Vec<String>> {
        self.get_list(READING_TYPES_KEY)
            .or_else(|| self.get_list(READING_TYPES_ALIAS))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Whole relay configuration: section name -> plugin options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelayConfig {
    sections: BTreeMap<String, PluginConfig>,
}

impl RelayConfig {
    /// Create empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a section
    pub fn insert_section(&mut self, name: impl Into<String>, section: PluginConfig) {
        self.sections.insert(name.into(), section);
    }

    /// Builder-style [`insert_section`](Self::insert_section)
    pub fn with_section(mut self, name: impl Into<String>, section: PluginConfig) -> Self {
        self.insert_section(name, section);
        self
    }

    /// Section configured for a plugin identity
    pub fn section(&self, name: &str) -> Option<&PluginConfig> {
        self.sections.get(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &PluginConfig)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
