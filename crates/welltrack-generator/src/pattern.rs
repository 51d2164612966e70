//! Pattern shapes for synthetic series.
//!
//! A value at `d` days since the window start is
//! `base_value + pattern(d) + trend_slope * d + noise`, where the noise is
//! uniform in `[-noise_level, noise_level]`. Results are rounded to two
//! decimals.

use std::f64::consts::PI;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GeneratorError, GeneratorResult};

/// Shape of the periodic component.
///
/// Unrecognized names parse to [`PatternType::Unknown`], which contributes
/// nothing, leaving base, trend and noise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PatternType {
    #[default]
    Sine,
    Cosine,
    Sawtooth,
    Square,
    /// Pure noise; amplitude is unused.
    Random,
    /// Slope only; amplitude is unused.
    Trend,
    Unknown,
}

impl PatternType {
    /// Whether the shape repeats with `period_days`.
    pub fn is_periodic(self) -> bool {
        matches!(self, Self::Sine | Self::Cosine | Self::Sawtooth | Self::Square)
    }

    /// The periodic component at `days` since the window start.
    pub fn component(self, days: f64, amplitude: f64, period_days: f64) -> f64 {
        let phase = days / period_days;
        match self {
            Self::Sine => amplitude * (2.0 * PI * phase).sin(),
            Self::Cosine => amplitude * (2.0 * PI * phase).cos(),
            Self::Sawtooth => amplitude * (2.0 * (phase - (0.5 + phase).floor())),
            Self::Square => {
                if (2.0 * PI * phase).sin() >= 0.0 {
                    amplitude
                } else {
                    -amplitude
                }
            }
            Self::Random | Self::Trend | Self::Unknown => 0.0,
        }
    }
}

impl From<&str> for PatternType {
    fn from(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "sine" => Self::Sine,
            "cosine" => Self::Cosine,
            "sawtooth" => Self::Sawtooth,
            "square" => Self::Square,
            "random" => Self::Random,
            "trend" => Self::Trend,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for PatternType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sine => "sine",
            Self::Cosine => "cosine",
            Self::Sawtooth => "sawtooth",
            Self::Square => "square",
            Self::Random => "random",
            Self::Trend => "trend",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Parameters of a pattern series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternParams {
    pub pattern_type: PatternType,
    pub base_value: f64,
    pub amplitude: f64,
    pub period_days: f64,
    /// Added per day since the window start.
    pub trend_slope: f64,
    /// Half-width of the uniform noise band.
    pub noise_level: f64,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            pattern_type: PatternType::Sine,
            base_value: 50.0,
            amplitude: 25.0,
            period_days: 7.0,
            trend_slope: 0.0,
            noise_level: 2.0,
        }
    }
}

impl PatternParams {
    pub fn validate(&self) -> GeneratorResult<()> {
        if !(self.noise_level >= 0.0 && self.noise_level.is_finite()) {
            return Err(GeneratorError::InvalidParameter(format!(
                "noise_level must be a non-negative number, got {}",
                self.noise_level
            )));
        }
        if self.pattern_type.is_periodic() && !(self.period_days > 0.0 && self.period_days.is_finite()) {
            return Err(GeneratorError::InvalidParameter(format!(
                "period_days must be positive for a {} pattern, got {}",
                self.pattern_type, self.period_days
            )));
        }
        Ok(())
    }

    /// The rounded sample at `days` since the window start.
    pub fn value_at<R: Rng>(&self, days: f64, rng: &mut R) -> f64 {
        let pattern = self
            .pattern_type
            .component(days, self.amplitude, self.period_days);
        let noise = uniform_noise(rng, self.noise_level);
        round2(self.base_value + pattern + self.trend_slope * days + noise)
    }
}

/// Uniform noise in `[-level, level]`; zero when `level` is zero.
pub(crate) fn uniform_noise<R: Rng>(rng: &mut R, level: f64) -> f64 {
    if level > 0.0 {
        rng.random_range(-level..=level)
    } else {
        0.0
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
