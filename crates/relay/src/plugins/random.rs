//! RandomSource - emits one random integer reading per poll

use async_trait::async_trait;
use rand::Rng;

use contracts::{PluginConfig, PluginError, Reading, Source};

/// Sample source producing uniformly distributed integers
#[derive(Debug, Clone)]
pub struct RandomSource {
    reading_type: String,
    series_key: Option<String>,
    min: i64,
    max: i64,
}

impl RandomSource {
    /// Create a source drawing from `min..=max`
    pub fn new(reading_type: impl Into<String>, min: i64, max: i64) -> Result<Self, PluginError> {
        if min > max {
            return Err(PluginError::config(
                "min",
                format!("min ({min}) must be <= max ({max})"),
            ));
        }
        Ok(Self {
            reading_type: reading_type.into(),
            series_key: None,
            min,
            max,
        })
    }

    /// Create from a plugin section
    ///
    /// Options: `reading_type` (default "random"), `min` (default 1),
    /// `max` (default 100), `series_key` (optional).
    pub fn from_config(config: &PluginConfig) -> Result<Self, PluginError> {
        let reading_type = config.get("reading_type").unwrap_or("random");
        let min = parse_bound(config, "min", 1)?;
        let max = parse_bound(config, "max", 100)?;

        let mut source = Self::new(reading_type, min, max)?;
        source.series_key = config.get("series_key").map(str::to_string);
        Ok(source)
    }
}

fn parse_bound(config: &PluginConfig, key: &str, default: i64) -> Result<i64, PluginError> {
    config
        .get_parsed::<i64>(key)
        .map_err(|e| PluginError::config(key, e.to_string()))
        .map(|v| v.unwrap_or(default))
}

#[async_trait]
impl Source for RandomSource {
    async fn get_readings(&mut self) -> Result<Vec<Reading>, PluginError> {
        let value = rand::rng().random_range(self.min..=self.max);
        let mut reading = Reading::with_value(self.reading_type.as_str(), value);
        if let Some(series_key) = &self.series_key {
            reading = reading.with_series_key(series_key.as_str());
        }
        Ok(reading.into_iter().collect())
    }
}
