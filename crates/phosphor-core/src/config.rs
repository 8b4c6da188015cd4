use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::generator::{PeriodicSignal, MIN_SAMPLE_SPAN};
use crate::signal::AudioDisplay;
use crate::waveform::{ChannelSpec, Waveform};

/// Largest signal buffer accepted from configuration.
pub const MAX_CAPACITY: usize = 1 << 20;

/// Everything that parameterizes one scope run.
///
/// Unknown fields are rejected; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScopeConfig {
    /// Beam color [r, g, b]. Range: 0.0..1.0 each
    pub trace_color: [f32; 3],
    /// Screen color the beam target is cleared to.
    pub background_color: [f32; 3],
    /// Afterimage decay rate K; each tick keeps `max(0, 1 - dt * K)`.
    pub decay_rate: f32,
    pub x: ChannelSpec,
    pub y: ChannelSpec,
    /// Number of samples in the signal buffer.
    pub capacity: usize,
    /// Shortest span one tick's samples are spread across (seconds).
    pub min_sample_span: f64,
    pub audio_display: AudioDisplay,
    pub graticule: bool,
    /// Fraction of the NDC extent left free around the graticule and trace.
    pub graticule_margin: f32,
    /// Multiplier applied to pixels under a grid line.
    pub graticule_darken: f32,
    /// Beam line and dot size in pixels.
    pub line_width: f32,
    /// Draw a dot at the newest sample.
    pub leading_dot: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            trace_color: [0.670, 0.827, 0.905],
            background_color: [0.192, 0.243, 0.270],
            decay_rate: 4.0,
            x: ChannelSpec::new(Waveform::Sinusoid, 1.0, 11000.0, 0.0),
            y: ChannelSpec::new(Waveform::Sinusoid, 1.0, 12000.0, 0.0).with_phase_drift(1.0),
            capacity: 40960,
            min_sample_span: MIN_SAMPLE_SPAN,
            audio_display: AudioDisplay::TimeDomain,
            graticule: true,
            graticule_margin: 0.1,
            graticule_darken: 0.25,
            line_width: 4.0,
            leading_dot: true,
        }
    }
}

impl ScopeConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ScopeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(ConfigError::invalid(format!(
                "capacity {} outside 1..={MAX_CAPACITY}",
                self.capacity
            )));
        }
        if !self.decay_rate.is_finite() || self.decay_rate < 0.0 {
            return Err(ConfigError::invalid(format!(
                "decay_rate must be a finite non-negative number, got {}",
                self.decay_rate
            )));
        }
        if !self.min_sample_span.is_finite() || self.min_sample_span < 0.0 {
            return Err(ConfigError::invalid("min_sample_span must be finite and non-negative"));
        }
        for (name, channel) in [("x", &self.x), ("y", &self.y)] {
            if !channel.is_finite() {
                return Err(ConfigError::invalid(format!("channel {name} has non-finite parameters")));
            }
        }
        if self.trace_color.iter().chain(&self.background_color).any(|c| !c.is_finite()) {
            return Err(ConfigError::invalid("colors must be finite"));
        }
        if !(0.0..1.0).contains(&self.graticule_margin) {
            return Err(ConfigError::invalid("graticule_margin must be in [0, 1)"));
        }
        if !self.graticule_darken.is_finite() || !self.line_width.is_finite() || self.line_width <= 0.0 {
            return Err(ConfigError::invalid("graticule_darken and line_width must be finite, line_width positive"));
        }
        Ok(())
    }

    /// The periodic generator described by the channel settings.
    pub fn periodic_signal(&self) -> PeriodicSignal {
        PeriodicSignal::new(self.x, self.y).with_min_span(self.min_sample_span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        ScopeConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ScopeConfig::from_json(r#"{ "capacity": 512, "graticule": false }"#).unwrap();
        assert_eq!(config.capacity, 512);
        assert!(!config.graticule);
        assert_eq!(config.decay_rate, 4.0);
        assert_eq!(config.y.phase_drift, 1.0);
    }

    #[test]
    fn test_channel_json() {
        let config = ScopeConfig::from_json(
            r#"{ "x": { "waveform": "sawtooth", "frequency": 2.0 }, "audio_display": "xy" }"#,
        )
        .unwrap();
        assert_eq!(config.x.waveform, Waveform::Sawtooth);
        assert_eq!(config.x.frequency, 2.0);
        assert_eq!(config.x.amplitude, 1.0);
        assert_eq!(config.audio_display, AudioDisplay::Xy);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            ScopeConfig::from_json(r#"{ "capacity": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ScopeConfig::from_json(r#"{ "decay_rate": -1.0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ScopeConfig::from_json(r#"{ "graticule_margin": 1.5 }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_fields_and_garbage() {
        assert!(matches!(ScopeConfig::from_json(r#"{ "bloom": 1 }"#), Err(ConfigError::Parse(_))));
        assert!(matches!(ScopeConfig::from_json("not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = ScopeConfig::default();
        config.capacity = 2048;
        config.x.waveform = Waveform::Triangle;
        let json = config.to_json().unwrap();
        let back = ScopeConfig::from_json(&json).unwrap();
        assert_eq!(back.capacity, 2048);
        assert_eq!(back.x.waveform, Waveform::Triangle);
        assert_eq!(back.trace_color, config.trace_color);
        assert_eq!(back.graticule, config.graticule);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ScopeConfig::load(Path::new("/nonexistent/phosphor.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
