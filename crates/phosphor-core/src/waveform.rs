use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt;
use std::str::FromStr;

/// Periodic waveform shapes a scope channel can be driven with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    /// `a * cos(2π·t·f + phase)`
    #[default]
    Sinusoid,
    /// `a * (mod(2·t·f + phase, 2) − 1)`
    Sawtooth,
    /// `a * asin(cos(2π·t·f + phase)) / (π/2)`
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 3] = [Waveform::Sinusoid, Waveform::Sawtooth, Waveform::Triangle];

    /// Evaluate the waveform at time `t` (seconds).
    ///
    /// The sawtooth uses a floored modulo so negative times stay inside
    /// `[-a, a)` instead of wrapping below `-a`.
    pub fn evaluate(self, amplitude: f64, t: f64, frequency: f64, phase: f64) -> f64 {
        match self {
            Waveform::Sinusoid => amplitude * (TAU * t * frequency + phase).cos(),
            Waveform::Sawtooth => amplitude * ((2.0 * t * frequency + phase).rem_euclid(2.0) - 1.0),
            Waveform::Triangle => {
                let c = (TAU * t * frequency + phase).cos().clamp(-1.0, 1.0);
                amplitude * c.asin() / FRAC_PI_2
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sinusoid => "sinusoid",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sinusoid" | "sine" | "sin" | "cos" => Ok(Waveform::Sinusoid),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            "triangle" | "tri" => Ok(Waveform::Triangle),
            other => Err(format!("unknown waveform '{other}' (expected sinusoid, sawtooth or triangle)")),
        }
    }
}

/// Parameters for one deflection channel (X or Y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSpec {
    pub waveform: Waveform,
    pub amplitude: f64,
    /// Hz
    pub frequency: f64,
    /// Radians
    pub phase: f64,
    /// Radians added per second of accumulated run time. Makes Lissajous
    /// figures slowly rotate.
    pub phase_drift: f64,
}

impl Default for ChannelSpec {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sinusoid,
            amplitude: 1.0,
            frequency: 1.0,
            phase: 0.0,
            phase_drift: 0.0,
        }
    }
}

impl ChannelSpec {
    pub fn new(waveform: Waveform, amplitude: f64, frequency: f64, phase: f64) -> Self {
        Self { waveform, amplitude, frequency, phase, phase_drift: 0.0 }
    }

    pub fn with_phase_drift(mut self, phase_drift: f64) -> Self {
        self.phase_drift = phase_drift;
        self
    }

    /// Channel value at time `t`, after `elapsed` seconds of run time.
    pub fn value(&self, t: f64, elapsed: f64) -> f64 {
        let phase = self.phase + self.phase_drift * elapsed;
        self.waveform.evaluate(self.amplitude, t, self.frequency, phase)
    }

    pub fn is_finite(&self) -> bool {
        self.amplitude.is_finite()
            && self.frequency.is_finite()
            && self.phase.is_finite()
            && self.phase_drift.is_finite()
    }
}
