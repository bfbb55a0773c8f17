//! Just-intonation tables and their mapping onto MIDI pitch data: nearest
//! semitone plus pitch bend, or MTS per-key tuning records.

pub mod bend;
pub mod error;
pub mod mts;
pub mod ratio;
pub mod resolve;
pub mod tables;

pub use bend::{encode_bend, BendRange, BEND_CENTER};
pub use error::{Result, TuningError};
pub use mts::{build_tuning_table, MtsEntry};
pub use ratio::Ratio;
pub use resolve::{Direction, SemitoneOffset, TuningResolver};
pub use tables::{ChromaticTable, Interval, IntervalTable, JustTuning, Note};

/// Frequency of a (fractional) MIDI note number at A4 = 440 Hz.
pub fn midi_to_hz(m: f64) -> f64 { 440.0 * 2f64.powf((m - 69.0) / 12.0) }
