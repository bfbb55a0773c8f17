//! Turns declarative track scripts into timed MIDI event tracks.
//!
//! - event.rs: event, track and song model
//! - script.rs: serde-loadable scripts (channels, voicings, chord steps)
//! - sequencer.rs: the single-pass sequencer with per-channel bend state

pub mod error;
pub mod event;
pub mod script;
pub mod sequencer;

pub use error::SequenceError;
pub use event::{MusicEvent, Song, TimedEvent, Track, MAX_TICK};
pub use script::{ChannelSetup, ChordTone, ChordVoice, Part, Step, TrackScript, TuningSelect, Voicing};
pub use sequencer::{Sequencer, SequencerConfig};
