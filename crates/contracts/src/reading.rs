//! Reading - the datum relayed from sources to handlers

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Reading payload
///
/// Semantically unconstrained: whatever the source observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ReadingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for ReadingValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for ReadingValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for ReadingValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for ReadingValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for ReadingValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for ReadingValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// One observed datum
///
/// Immutable once built: fields are private and only the builder methods,
/// which consume `self`, can set them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    reading_type: String,
    value: Option<ReadingValue>,
    timestamp: DateTime<Utc>,
    series_key: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    tags: BTreeMap<String, String>,
}

impl Reading {
    /// Create a reading stamped with the current UTC instant
    ///
    /// The series key defaults to the reading type.
    pub fn new<V: Into<ReadingValue>>(reading_type: impl Into<String>, value: Option<V>) -> Self {
        let reading_type = reading_type.into();
        Self {
            series_key: reading_type.clone(),
            reading_type,
            value: value.map(Into::into),
            timestamp: Utc::now(),
            tags: BTreeMap::new(),
        }
    }

    /// Create a reading carrying a value
    pub fn with_value(reading_type: impl Into<String>, value: impl Into<ReadingValue>) -> Self {
        Self::new(reading_type, Some(value))
    }

    /// Create a value-less reading
    pub fn empty(reading_type: impl Into<String>) -> Self {
        Self::new::<ReadingValue>(reading_type, None)
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_series_key(mut self, series_key: impl Into<String>) -> Self {
        self.series_key = series_key.into();
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_tags<I, K, V>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn reading_type(&self) -> &str {
        &self.reading_type
    }

    pub fn value(&self) -> Option<&ReadingValue> {
        self.value.as_ref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn series_key(&self) -> &str {
        &self.series_key
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}, ",
            self.series_key,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
        )?;
        match &self.value {
            Some(value) => write!(f, "{value}"),
            None => f.write_str("None"),
        }
    }
}

/// A reading is a sequence of exactly one reading
impl IntoIterator for Reading {
    type Item = Reading;
    type IntoIter = std::iter::Once<Reading>;

    fn into_iter(self) -> Self::IntoIter {
        std::iter::once(self)
    }
}
