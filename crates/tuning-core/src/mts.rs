//! Per-key records for MIDI Tuning Standard messages.
//!
//! Each key gets an absolute target: an integer semitone plus a 14-bit
//! fraction of a semitone carried as two 7-bit bytes. The semitone is the
//! floor of the exact value, not the nearest one, so the fraction is always
//! non-negative. SysEx framing lives with the serializers.

use serde::Serialize;

use crate::error::{Result, TuningError};
use crate::tables::JustTuning;

/// Number of addressable MIDI keys.
pub const MIDI_KEYS: usize = 128;

const FRACTION_STEPS: f64 = 16384.0;

/// Tuning record for one MIDI key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MtsEntry {
    /// MIDI key being retuned.
    pub key: u8,
    /// Semitone the key sounds at, as a 12-TET MIDI note number.
    pub semitone: u8,
    pub msb: u8,
    pub lsb: u8,
}

impl MtsEntry {
    /// The 14-bit fraction, `msb << 7 | lsb`.
    pub fn fraction(&self) -> u16 { (self.msb as u16) << 7 | self.lsb as u16 }

    /// Absolute pitch in fractional MIDI semitones.
    pub fn semitones(&self) -> f64 { self.semitone as f64 + self.fraction() as f64 / FRACTION_STEPS }
}

/// Builds one record per key from `base_octave_pitch` upwards.
///
/// Key `i` sounds at `base_octave_pitch + 12*log2(tuning[i % 12]) + shift + 12*(i / 12)`.
/// Records are computed independently; nothing carries between keys.
pub fn build_tuning_table(
    tuning: &JustTuning,
    base_octave_pitch: i32,
    shift: i32,
    key_count: usize,
) -> Result<Vec<MtsEntry>> {
    if key_count > MIDI_KEYS {
        return Err(TuningError::KeyRangeOverflow { index: MIDI_KEYS, value: key_count as i64 });
    }

    let mut entries = Vec::with_capacity(key_count);
    for i in 0..key_count {
        let key = base_octave_pitch as i64 + i as i64;
        if !(0..MIDI_KEYS as i64).contains(&key) {
            return Err(TuningError::KeyRangeOverflow { index: i, value: key });
        }

        let semitones = base_octave_pitch as f64
            + tuning.ratio(i % 12).semitones()
            + shift as f64
            + 12.0 * (i / 12) as f64;
        let rounded = semitones.floor();
        if !(0.0..MIDI_KEYS as f64).contains(&rounded) {
            return Err(TuningError::KeyRangeOverflow { index: i, value: rounded as i64 });
        }
        let fractional_scaled = ((semitones - rounded) * FRACTION_STEPS).floor() as u16;

        entries.push(MtsEntry {
            key: key as u8,
            semitone: rounded as u8,
            msb: (fractional_scaled >> 7) as u8,
            lsb: (fractional_scaled & 0x7F) as u8,
        });
    }
    Ok(entries)
}
