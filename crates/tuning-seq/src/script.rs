//! Declarative track scripts.
//!
//! A script names the channels it uses, which chord member each channel
//! plays, and the ordered steps to play. Intervals always carry an explicit
//! [`Direction`]; there is no implied sign.

use serde::{Deserialize, Serialize};
use tuning_core::{BendRange, Direction};

/// A chord tone stacked on a root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordTone {
    pub interval: String,
    pub direction: Direction,
    #[serde(default)]
    pub octave: i32,
}

impl ChordTone {
    pub fn above(interval: &str, octave: i32) -> Self {
        Self { interval: interval.to_string(), direction: Direction::Above, octave }
    }
}

/// A base note, the root derived from it, and optional chained tones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordVoice {
    pub base: String,
    pub interval: String,
    pub direction: Direction,
    #[serde(default)]
    pub octave: i32,
    #[serde(default)]
    pub third: Option<ChordTone>,
    #[serde(default)]
    pub seventh: Option<ChordTone>,
    #[serde(default)]
    pub ninth: Option<ChordTone>,
    /// Length in sequencer units.
    pub duration: u32,
}

impl ChordVoice {
    pub fn tone(&self, part: Part) -> Option<&ChordTone> {
        match part {
            Part::Third => self.third.as_ref(),
            Part::Seventh => self.seventh.as_ref(),
            Part::Ninth => self.ninth.as_ref(),
            Part::Base | Part::Root => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    Chord(ChordVoice),
    /// A plain MIDI key, for keyboards already retuned through MTS.
    Key {
        channel: u8,
        key: u8,
        #[serde(default = "default_velocity")]
        velocity: u8,
        duration: u32,
    },
}

/// Chord member a voicing plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Part {
    /// The base note itself, in 12-TET.
    Base,
    Root,
    Third,
    Seventh,
    Ninth,
}

impl Part {
    /// Everything but the plain base note carries a pitch bend.
    pub fn bends(self) -> bool { !matches!(self, Part::Base) }
}

/// Routes one chord member to a channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voicing {
    pub part: Part,
    pub channel: u8,
    /// MIDI pitch of semitone 0.
    #[serde(default = "default_base_pitch")]
    pub base_pitch: i32,
    #[serde(default = "default_velocity")]
    pub velocity: u8,
}

impl Voicing {
    pub fn new(part: Part, channel: u8, base_pitch: i32) -> Self {
        Self { part, channel, base_pitch, velocity: default_velocity() }
    }
}

/// MTS tuning bank and program selected through RPNs 4 and 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningSelect {
    pub bank: u8,
    pub program: u8,
}

/// Per-channel setup sent at the start of the track.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSetup {
    pub channel: u8,
    #[serde(default)]
    pub program: Option<u8>,
    #[serde(default)]
    pub pan: Option<u8>,
    #[serde(default)]
    pub bend_range: Option<BendRange>,
    #[serde(default)]
    pub tuning: Option<TuningSelect>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackScript {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub channels: Vec<ChannelSetup>,
    #[serde(default)]
    pub voicings: Vec<Voicing>,
    pub steps: Vec<Step>,
}

fn default_base_pitch() -> i32 { 60 }
fn default_velocity() -> u8 { 81 }
