use std::{fmt, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{color::SampleOutput, Result};

pub const DEFAULT_QUALITY: u8 = 10;
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 100;
pub const DEFAULT_PLAYER: &str = "video";
pub const DEFAULT_EVENT: &str = "timeupdate";

/// Colour selection strategy applied to each sampled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "camelCase")]
pub enum Algorithm {
    Dominant,
    #[default]
    Brightest,
    Average,
    CompletePalette,
}

impl Algorithm {
    pub const DOMINANT: &'static str = "dominant";
    pub const BRIGHTEST: &'static str = "brightest";
    pub const AVERAGE: &'static str = "average";
    pub const COMPLETE_PALETTE: &'static str = "completePalette";

    /// Resolves an algorithm by name. Unrecognised names fall back to
    /// [`Algorithm::CompletePalette`] instead of failing.
    pub fn from_name(name: &str) -> Self {
        match name {
            Self::DOMINANT => Self::Dominant,
            Self::BRIGHTEST => Self::Brightest,
            Self::AVERAGE => Self::Average,
            Self::COMPLETE_PALETTE => Self::CompletePalette,
            other => {
                tracing::debug!(algorithm = other, "unknown algorithm, using complete palette");
                Self::CompletePalette
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dominant => Self::DOMINANT,
            Self::Brightest => Self::BRIGHTEST,
            Self::Average => Self::AVERAGE,
            Self::CompletePalette => Self::COMPLETE_PALETTE,
        }
    }
}

impl From<&str> for Algorithm {
    fn from(value: &str) -> Self {
        Self::from_name(value)
    }
}

impl From<String> for Algorithm {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Serialisable sampler settings. Every field may be omitted from a JSON
/// document; missing values take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Pixel stride used by the extractor. 1 is the most accurate and slowest.
    pub quality: u8,
    pub sample_interval_ms: u64,
    pub algorithm: Algorithm,
    /// Name of the event target whose progress events drive sampling.
    pub player: String,
    pub event: String,
    pub debug: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            algorithm: Algorithm::default(),
            player: DEFAULT_PLAYER.to_string(),
            event: DEFAULT_EVENT.to_string(),
            debug: false,
        }
    }
}

impl SamplerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str::<Self>(json)?.normalized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Replaces zero and empty values with their defaults.
    pub fn normalized(mut self) -> Self {
        if self.quality == 0 {
            self.quality = DEFAULT_QUALITY;
        }
        if self.sample_interval_ms == 0 {
            self.sample_interval_ms = DEFAULT_SAMPLE_INTERVAL_MS;
        }
        if self.player.is_empty() {
            self.player = DEFAULT_PLAYER.to_string();
        }
        if self.event.is_empty() {
            self.event = DEFAULT_EVENT.to_string();
        }
        self
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}

/// Receives every sample the sampler produces.
pub type Callback = Box<dyn FnMut(&SampleOutput)>;

/// Everything `Sampler::initialize` accepts: the serialisable settings plus an
/// optional callback. A missing callback behaves as a no-op.
#[derive(Default)]
pub struct SamplerOptions {
    pub config: SamplerConfig,
    pub callback: Option<Callback>,
}

impl SamplerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: SamplerConfig) -> Self {
        Self {
            config,
            callback: None,
        }
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.config.quality = quality;
        self
    }

    pub fn sample_interval_ms(mut self, interval: u64) -> Self {
        self.config.sample_interval_ms = interval;
        self
    }

    pub fn algorithm(mut self, algorithm: impl Into<Algorithm>) -> Self {
        self.config.algorithm = algorithm.into();
        self
    }

    pub fn player(mut self, player: impl Into<String>) -> Self {
        self.config.player = player.into();
        self
    }

    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.config.event = event.into();
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn callback(mut self, callback: impl FnMut(&SampleOutput) + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for SamplerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplerOptions")
            .field("config", &self.config)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SamplerConfig::default();
        assert_eq!(config.quality, 10);
        assert_eq!(config.sample_interval(), Duration::from_millis(100));
        assert_eq!(config.algorithm, Algorithm::Brightest);
        assert_eq!(config.player, "video");
        assert_eq!(config.event, "timeupdate");
        assert!(!config.debug);
    }

    #[test]
    fn unknown_algorithm_names_fall_back_to_complete_palette() {
        assert_eq!(Algorithm::from_name("average"), Algorithm::Average);
        assert_eq!(Algorithm::from_name("loudest"), Algorithm::CompletePalette);
        assert_eq!(Algorithm::from_name(""), Algorithm::CompletePalette);
    }

    #[test]
    fn parses_partial_json_and_normalises_zeroes() {
        let config = SamplerConfig::from_json_str(
            r#"{ "quality": 0, "sample_interval_ms": 40, "algorithm": "weird", "debug": true }"#,
        )
        .unwrap();

        assert_eq!(config.quality, DEFAULT_QUALITY);
        assert_eq!(config.sample_interval_ms, 40);
        assert_eq!(config.algorithm, Algorithm::CompletePalette);
        assert_eq!(config.event, DEFAULT_EVENT);
        assert!(config.debug);
    }

    #[test]
    fn algorithm_serialises_with_canonical_names() {
        let json = serde_json::to_string(&Algorithm::CompletePalette).unwrap();
        assert_eq!(json, "\"completePalette\"");
    }

    #[test]
    fn options_builder_overrides_defaults() {
        let options = SamplerOptions::new()
            .quality(3)
            .algorithm(Algorithm::DOMINANT)
            .event("progress")
            .callback(|_| {});

        assert_eq!(options.config.quality, 3);
        assert_eq!(options.config.algorithm, Algorithm::Dominant);
        assert_eq!(options.config.event, "progress");
        assert!(options.callback.is_some());
    }
}
