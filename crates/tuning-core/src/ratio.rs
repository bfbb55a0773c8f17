use serde::Serialize;
use std::fmt;

use crate::error::{Result, TuningError};

/// A frequency ratio relative to a tonic, always with non-zero terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Ratio {
    numerator: u32,
    denominator: u32,
}

impl Ratio {
    pub fn new(numerator: u32, denominator: u32) -> Result<Self> {
        if numerator == 0 || denominator == 0 {
            return Err(TuningError::DegenerateRatio { numerator, denominator });
        }
        Ok(Self { numerator, denominator })
    }

    /// For the built-in tables, whose terms are known to be non-zero.
    pub(crate) const fn from_table(numerator: u32, denominator: u32) -> Self {
        Self { numerator, denominator }
    }

    pub const fn unison() -> Self { Self::from_table(1, 1) }

    pub fn numerator(&self) -> u32 { self.numerator }
    pub fn denominator(&self) -> u32 { self.denominator }

    pub fn as_f64(&self) -> f64 { self.numerator as f64 / self.denominator as f64 }

    /// Size of the interval in 12-TET semitones.
    pub fn semitones(&self) -> f64 { 12.0 * self.as_f64().log2() }

    /// Size of the interval in steps of an arbitrary equal division of the octave.
    pub fn edo_steps(&self, divisions: u32) -> f64 { divisions as f64 * self.as_f64().log2() }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
