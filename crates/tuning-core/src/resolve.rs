use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::ratio::Ratio;
use crate::tables::{ChromaticTable, IntervalTable, Note};

/// Which side of its base an interval is measured on.
///
/// Bass roots are written as scale degrees *below* the note they harmonize,
/// chord tones as intervals *above* their root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Below,
    Above,
}

impl Direction {
    fn apply(self, semitones: f64) -> f64 {
        match self {
            Direction::Below => -semitones,
            Direction::Above => semitones,
        }
    }
}

/// Distance from 12-TET, split into the nearest semitone and what is left over.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SemitoneOffset {
    pub raw: f64,
    /// Nearest semitone, ties away from zero.
    pub rounded: i32,
    /// `raw - rounded`, within `[-0.5, 0.5]`.
    pub delta: f64,
}

impl SemitoneOffset {
    pub fn from_raw(raw: f64) -> Self {
        let rounded = raw.round();
        Self { raw, rounded: rounded as i32, delta: raw - rounded }
    }

    pub fn note(&self) -> Note { Note::from_semitone(self.rounded) }

    pub fn pitch_class(&self) -> u8 { self.note().pitch_class() }
}

/// Maps `(base note, interval)` pairs onto semitone offsets using injected tables.
#[derive(Clone, Copy, Debug)]
pub struct TuningResolver<'a> {
    chromatic: &'a ChromaticTable,
    intervals: &'a IntervalTable,
}

impl<'a> TuningResolver<'a> {
    pub fn new(chromatic: &'a ChromaticTable, intervals: &'a IntervalTable) -> Self {
        Self { chromatic, intervals }
    }

    pub fn chromatic(&self) -> &'a ChromaticTable { self.chromatic }

    pub fn intervals(&self) -> &'a IntervalTable { self.intervals }

    /// Offset of `interval` taken from the named `base_note`, shifted by whole octaves.
    pub fn resolve(
        &self,
        base_note: &str,
        interval: &str,
        direction: Direction,
        octave_shift: i32,
    ) -> Result<SemitoneOffset> {
        let base = self.chromatic.note(base_note)?;
        self.resolve_from(base.pitch_class() as i32, interval, direction, octave_shift)
    }

    /// Same as [`resolve`](Self::resolve) from an integer semitone. Chained chord
    /// tones start from their root's *rounded* semitone, so every link rounds
    /// on its own.
    pub fn resolve_from(
        &self,
        base_semitone: i32,
        interval: &str,
        direction: Direction,
        octave_shift: i32,
    ) -> Result<SemitoneOffset> {
        let ratio = self.intervals.ratio(interval)?;
        let offset = offset_from(base_semitone, ratio, direction, octave_shift);
        debug!(
            interval,
            %ratio,
            base_semitone,
            rounded = offset.rounded,
            note = self.chromatic.name(offset.note()),
            delta = offset.delta,
            edo31 = ratio.edo_steps(31),
            "resolved interval"
        );
        Ok(offset)
    }
}

/// The arithmetic behind the resolver, for callers that already hold a ratio.
pub fn offset_from(base_semitone: i32, ratio: Ratio, direction: Direction, octave_shift: i32) -> SemitoneOffset {
    let raw = base_semitone as f64 + direction.apply(ratio.semitones()) + 12.0 * octave_shift as f64;
    SemitoneOffset::from_raw(raw)
}
