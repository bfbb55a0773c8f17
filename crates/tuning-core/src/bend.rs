//! Pitch-bend encoding of the fractional part of a semitone offset.
//!
//! A 14-bit bend is centred on 8192. The encoder assumes 4096 steps per
//! semitone, which is what a channel plays after its pitch-bend sensitivity
//! (RPN 0,0) has been set to ±2 semitones. Nothing checks that setting: a
//! channel left at another sensitivity sounds out of tune without any error,
//! so every channel that receives bends gets [`BendRange::rpn_setup`] first.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TuningError};

pub const BEND_CENTER: u16 = 8192;
pub const BEND_MAX: u16 = 16383;

/// Steps per semitone at the default ±2 semitone sensitivity.
const STEPS_PER_SEMITONE: f64 = 4096.0;

// Registered parameter controllers.
pub const CC_DATA_ENTRY_MSB: u8 = 6;
pub const CC_DATA_ENTRY_LSB: u8 = 38;
pub const CC_RPN_LSB: u8 = 100;
pub const CC_RPN_MSB: u8 = 101;

pub const RPN_PITCH_BEND_SENSITIVITY: u8 = 0;
pub const RPN_TUNING_PROGRAM: u8 = 3;
pub const RPN_TUNING_BANK: u8 = 4;

/// Encodes `delta` semitones as a bend value. `sensitivity` scales the step
/// size relative to the ±2 semitone setup (1.0 for that setup) and must be a
/// positive finite number.
pub fn encode_bend(delta: f64, sensitivity: f64) -> Result<u16> {
    if !(sensitivity.is_finite() && sensitivity > 0.0) {
        return Err(TuningError::InvalidSensitivity(sensitivity));
    }
    Ok(scale_to_bend(delta, sensitivity))
}

fn scale_to_bend(delta: f64, sensitivity: f64) -> u16 {
    let steps = (delta * STEPS_PER_SEMITONE / sensitivity).round();
    (BEND_CENTER as f64 + steps).clamp(0.0, BEND_MAX as f64) as u16
}

/// Inverse of [`encode_bend`], up to quantization.
pub fn decode_bend(value: u16, sensitivity: f64) -> f64 {
    (value as f64 - BEND_CENTER as f64) * sensitivity / STEPS_PER_SEMITONE
}

/// The pitch-bend sensitivity a channel is configured with, 1..=24 semitones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBendRange")]
pub struct BendRange {
    semitones: u8,
}

#[derive(Deserialize)]
struct RawBendRange {
    semitones: u8,
}

impl TryFrom<RawBendRange> for BendRange {
    type Error = TuningError;

    fn try_from(raw: RawBendRange) -> Result<Self> { Self::new(raw.semitones) }
}

impl Default for BendRange {
    fn default() -> Self { Self { semitones: 2 } }
}

impl BendRange {
    pub const MAX_SEMITONES: u8 = 24;

    pub fn new(semitones: u8) -> Result<Self> {
        if !(1..=Self::MAX_SEMITONES).contains(&semitones) {
            return Err(TuningError::InvalidBendRange(semitones));
        }
        Ok(Self { semitones })
    }

    pub fn semitones(&self) -> u8 { self.semitones }

    pub fn sensitivity(&self) -> f64 { self.semitones as f64 / 2.0 }

    pub fn encode(&self, delta: f64) -> u16 { scale_to_bend(delta, self.sensitivity()) }

    /// Controller/value pairs selecting RPN 0,0 and writing this range.
    pub fn rpn_setup(&self) -> [(u8, u8); 4] {
        [
            (CC_RPN_MSB, 0),
            (CC_RPN_LSB, RPN_PITCH_BEND_SENSITIVITY),
            (CC_DATA_ENTRY_LSB, 0),
            (CC_DATA_ENTRY_MSB, self.semitones),
        ]
    }
}

/// Controller/value pairs selecting an MTS tuning bank and program on a channel.
pub fn tuning_select_rpn(bank: u8, program: u8) -> [(u8, u8); 6] {
    [
        (CC_RPN_MSB, 0),
        (CC_RPN_LSB, RPN_TUNING_BANK),
        (CC_DATA_ENTRY_MSB, bank),
        (CC_RPN_MSB, 0),
        (CC_RPN_LSB, RPN_TUNING_PROGRAM),
        (CC_DATA_ENTRY_MSB, program),
    ]
}
