//! The built-in pieces: sruti chords over bent channels, and a 5-limit
//! keyboard retuned through MTS.

use anyhow::{bail, Context, Result};
use tracing::info;
use tuning_core::{build_tuning_table, BendRange, ChromaticTable, Direction, IntervalTable, JustTuning, TuningResolver};
use tuning_seq::{
    ChannelSetup, ChordTone, ChordVoice, MusicEvent, Part, Sequencer, SequencerConfig, Song, Step, Track,
    TrackScript, TuningSelect, Voicing,
};

use crate::sysex::{bulk_tuning_dump, single_note_tuning_change};
use crate::RenderOpts;

pub const TICKS_PER_QUARTER: u16 = 480;

const BARITONE_SAX: u8 = 68;
const ENGLISH_HORN: u8 = 70;
const PIANO: u8 = 1;

/// Lookup tables shared by a render; built once and lent out.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    pub chromatic: ChromaticTable,
    pub intervals: IntervalTable,
    pub tuning: JustTuning,
}

impl Tables {
    pub fn resolver(&self) -> TuningResolver<'_> { TuningResolver::new(&self.chromatic, &self.intervals) }
}

/// A over an n3 root, with a g3 third and n3 seventh stacked on it.
pub fn default_chord_steps() -> Vec<ChordVoice> {
    vec![ChordVoice {
        base: "A".into(),
        interval: "n3".into(),
        direction: Direction::Below,
        octave: 0,
        third: Some(ChordTone::above("g3", 0)),
        seventh: Some(ChordTone::above("n3", 0)),
        ninth: Some(ChordTone::above("r4", 1)),
        duration: 4,
    }]
}

const MICROS_PER_MINUTE: f64 = 60_000_000.0;
/// The tempo meta event carries 24 bits.
const MAX_MICROS_PER_QUARTER: f64 = 0xFF_FFFF as f64;

/// Microseconds per quarter note at `bpm`, truncated.
fn tempo_micros(bpm: f64) -> Result<u32> {
    if !(bpm.is_finite() && bpm > 0.0) {
        bail!("tempo must be a positive number of beats per minute, got {bpm}");
    }
    let micros = (MICROS_PER_MINUTE / bpm).trunc();
    if !(1.0..=MAX_MICROS_PER_QUARTER).contains(&micros) {
        bail!("tempo of {bpm} bpm gives {micros} µs per quarter, outside 1..=16777215");
    }
    Ok(micros as u32)
}

/// Tempo, meter and key, plus whatever else belongs at the top of the file.
fn conductor_track(bpm: f64, extra: Vec<MusicEvent>) -> Result<Track> {
    let micros_per_quarter = tempo_micros(bpm)?;
    let mut track = Track::new();
    track.push(MusicEvent::TimeSignature { numerator: 4, denominator: 2, clocks_per_click: 24, notated_32nds: 8 });
    track.push(MusicEvent::Tempo { micros_per_quarter });
    track.push(MusicEvent::KeySignature { sharps: -1, minor: true });
    for ev in extra {
        track.push(ev);
    }
    track.finish(0).context("closing the conductor track")
}

/// Bass roots on one track, the base note with its third and seventh on another.
pub fn chords_song(tables: &Tables, steps: Vec<ChordVoice>, opts: &RenderOpts) -> Result<Song> {
    let bpm = opts.tempo.unwrap_or(95.0);
    let conductor = conductor_track(bpm, Vec::new()).context("building the conductor track")?;
    let steps: Vec<Step> = steps.into_iter().map(Step::Chord).collect();

    let bass = TrackScript {
        name: Some("Bass".into()),
        channels: vec![ChannelSetup {
            channel: 1,
            program: Some(BARITONE_SAX),
            pan: Some(64),
            bend_range: Some(BendRange::default()),
            tuning: None,
        }],
        voicings: vec![Voicing::new(Part::Root, 1, 48)],
        steps: steps.clone(),
    };
    let chords = TrackScript {
        name: Some("Chords".into()),
        channels: vec![
            ChannelSetup { channel: 2, program: Some(ENGLISH_HORN), pan: Some(64), ..Default::default() },
            ChannelSetup {
                channel: 3,
                program: Some(ENGLISH_HORN),
                pan: Some(64),
                bend_range: Some(BendRange::default()),
                tuning: None,
            },
            ChannelSetup {
                channel: 4,
                program: Some(ENGLISH_HORN),
                pan: Some(64),
                bend_range: Some(BendRange::default()),
                tuning: None,
            },
        ],
        voicings: vec![
            Voicing::new(Part::Base, 2, 60),
            Voicing::new(Part::Third, 3, 60),
            Voicing::new(Part::Seventh, 4, 60),
        ],
        steps,
    };

    let sequencer = Sequencer::new(tables.resolver(), SequencerConfig::default());
    let mut song = Song::new(TICKS_PER_QUARTER);
    song.tracks.push(conductor);
    for script in [&bass, &chords] {
        let name = script.name.as_deref().unwrap_or("track");
        let track = sequencer.sequence(script).with_context(|| format!("sequencing the {name} track"))?;
        song.tracks.push(track);
    }
    info!(tracks = song.tracks.len(), bpm, "rendered chords");
    Ok(song)
}

/// Retunes `keys` keys from `base_pitch` to the just table, then plays them in order.
pub fn scale_song(tables: &Tables, opts: &RenderOpts) -> Result<Song> {
    let base_pitch = opts.base_pitch.unwrap_or(48);
    let key_count = opts.keys.unwrap_or(24);
    let shift = opts.shift.unwrap_or(0);
    let device_id = opts.device_id.unwrap_or(0);
    let program = 1;

    let entries = build_tuning_table(&tables.tuning, base_pitch, shift, key_count)
        .context("building the MTS tuning table")?;

    let sysex = if opts.bulk.unwrap_or(false) {
        vec![bulk_tuning_dump(&entries, device_id, program, "just intonation")?]
    } else {
        entries
            .iter()
            .map(|e| single_note_tuning_change(std::slice::from_ref(e), device_id, program))
            .collect::<Result<Vec<_>>>()?
    };
    let extra = sysex.into_iter().map(|data| MusicEvent::SysEx { data }).collect();
    let conductor = conductor_track(opts.tempo.unwrap_or(120.0), extra).context("building the conductor track")?;

    let script = TrackScript {
        name: None,
        channels: vec![
            ChannelSetup { channel: 1, program: Some(PIANO), pan: Some(0), ..Default::default() },
            ChannelSetup {
                channel: 2,
                program: Some(PIANO),
                pan: Some(127),
                bend_range: Some(BendRange::default()),
                tuning: Some(TuningSelect { bank: 0, program }),
            },
        ],
        voicings: Vec::new(),
        steps: entries.iter().map(|e| Step::Key { channel: 2, key: e.key, velocity: 81, duration: 2 }).collect(),
    };
    let sequencer = Sequencer::new(tables.resolver(), SequencerConfig { end_padding: 0, ..Default::default() });
    let notes = sequencer.sequence(&script).context("sequencing the scale track")?;

    let mut song = Song::new(TICKS_PER_QUARTER);
    song.tracks.push(conductor);
    song.tracks.push(notes);
    info!(keys = entries.len(), base_pitch, shift, "rendered MTS scale");
    Ok(song)
}
