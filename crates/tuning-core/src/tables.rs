//! Static lookup data: note names, named just intervals and the 12-key tuning table.
//!
//! The tables are plain values built once and handed to the resolver and the
//! MTS encoder by reference; nothing here is global or mutable.

use serde::Serialize;
use std::collections::HashMap;

use crate::error::{Result, TuningError};
use crate::ratio::Ratio;

const SHARP_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

const FLAT_NAMES: [&str; 12] = [
    "C", "D\u{266D}", "D", "E\u{266D}", "E", "F", "G\u{266D}", "G", "A\u{266D}", "A", "B\u{266D}", "B",
];

/// Sruti names plus a few septimal intervals.
const SRUTI: [(&str, u32, u32); 25] = [
    ("sa", 1, 1),
    ("r1", 256, 243),
    ("r2", 16, 15),
    ("r3", 10, 9),
    ("r4", 9, 8),
    ("g1", 32, 27),
    ("g2", 6, 5),
    ("g3", 5, 4),
    ("g4", 81, 64),
    ("m1", 4, 3),
    ("m2", 27, 20),
    ("m3", 45, 32),
    ("m4", 64, 45),
    ("pa", 3, 2),
    ("d1", 128, 81),
    ("d2", 8, 5),
    ("d3", 5, 3),
    ("d4", 27, 16),
    ("n1", 16, 9),
    ("n2", 9, 5),
    ("n3", 15, 8),
    ("n4", 243, 128),
    ("7/4", 7, 4),
    ("7/5", 7, 5),
    ("7/6", 7, 6),
];

/// 5-limit pure intonation, one ratio per pitch class starting from C.
const FIVE_LIMIT: [(u32, u32); 12] = [
    (1, 1),
    (16, 15),
    (9, 8),
    (6, 5),
    (5, 4),
    (4, 3),
    (45, 32),
    (3, 2),
    (8, 5),
    (5, 3),
    (9, 5),
    (15, 8),
];

/// A pitch class in `0..12`. Equality is by pitch class only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Note { pitch_class: u8 }

impl Note {
    /// Any semitone count folds into its pitch class, negative ones included.
    pub fn from_semitone(semitone: i32) -> Self {
        Self { pitch_class: semitone.rem_euclid(12) as u8 }
    }

    pub fn pitch_class(&self) -> u8 { self.pitch_class }

    /// Absolute MIDI pitch of this note, octave 0 being the one starting at middle C.
    pub fn midi_pitch(&self, octave: i32) -> i32 { 60 + 12 * octave + self.pitch_class as i32 }
}

/// The twelve note names of an octave and the reverse lookup.
#[derive(Clone, Debug)]
pub struct ChromaticTable {
    sharps: [&'static str; 12],
    flats: [&'static str; 12],
}

impl Default for ChromaticTable {
    fn default() -> Self { Self::standard() }
}

impl ChromaticTable {
    pub fn standard() -> Self { Self { sharps: SHARP_NAMES, flats: FLAT_NAMES } }

    /// Looks a note up by its sharp spelling, falling back to the flat one.
    pub fn note(&self, name: &str) -> Result<Note> {
        self.sharps
            .iter()
            .position(|n| *n == name)
            .or_else(|| self.flats.iter().position(|n| *n == name))
            .map(|i| Note { pitch_class: i as u8 })
            .ok_or_else(|| TuningError::UnknownNote(name.to_string()))
    }

    pub fn name(&self, note: Note) -> &'static str { self.sharps[note.pitch_class as usize] }

    pub fn flat_name(&self, note: Note) -> &'static str { self.flats[note.pitch_class as usize] }
}

/// A name bound to a ratio.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Interval {
    pub name: String,
    pub ratio: Ratio,
}

/// Named intervals in declaration order, with a name index.
#[derive(Clone, Debug)]
pub struct IntervalTable {
    entries: Vec<Interval>,
    index: HashMap<String, usize>,
}

impl Default for IntervalTable {
    fn default() -> Self { Self::sruti() }
}

impl IntervalTable {
    /// Builds a table from `(name, ratio)` pairs; names must be unique.
    pub fn new<S: Into<String>>(entries: impl IntoIterator<Item = (S, Ratio)>) -> Result<Self> {
        let mut table = Self { entries: Vec::new(), index: HashMap::new() };
        for (name, ratio) in entries {
            let name = name.into();
            if table.index.contains_key(&name) {
                return Err(TuningError::DuplicateInterval(name));
            }
            table.index.insert(name.clone(), table.entries.len());
            table.entries.push(Interval { name, ratio });
        }
        Ok(table)
    }

    pub fn sruti() -> Self {
        let mut table = Self { entries: Vec::with_capacity(SRUTI.len()), index: HashMap::new() };
        for (i, (name, n, d)) in SRUTI.iter().enumerate() {
            table.index.insert(name.to_string(), i);
            table.entries.push(Interval { name: name.to_string(), ratio: Ratio::from_table(*n, *d) });
        }
        table
    }

    pub fn ratio(&self, name: &str) -> Result<Ratio> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].ratio)
            .ok_or_else(|| TuningError::UnknownInterval(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval> { self.entries.iter() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// One ratio per pitch class, used to retune a keyboard through MTS.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JustTuning { ratios: [Ratio; 12] }

impl Default for JustTuning {
    fn default() -> Self { Self::five_limit() }
}

impl JustTuning {
    pub fn new(ratios: [Ratio; 12]) -> Self { Self { ratios } }

    pub fn five_limit() -> Self {
        Self { ratios: FIVE_LIMIT.map(|(n, d)| Ratio::from_table(n, d)) }
    }

    pub fn ratio(&self, pitch_class: usize) -> Ratio { self.ratios[pitch_class % 12] }
}
