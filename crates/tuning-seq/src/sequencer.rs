//! Single-pass sequencing of a [`TrackScript`] into a [`Track`].
//!
//! Per chord step, the root is resolved from the base note and rounded, then
//! each chained tone is resolved from that rounded root and rounded again.
//! The small error this compounds is accepted; it is what the pieces were
//! written against.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};
use tuning_core::bend::{tuning_select_rpn, BEND_CENTER};
use tuning_core::{BendRange, SemitoneOffset, TuningResolver};

use crate::error::SequenceError;
use crate::event::{MusicEvent, Track};
use crate::script::{ChannelSetup, ChordVoice, Part, Step, TrackScript, Voicing};

const CC_PAN: u8 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequencerConfig {
    /// Ticks per script duration unit (an eighth note at 480 PPQ).
    pub ticks_per_unit: u32,
    /// Silence appended before the end-of-track marker.
    pub end_padding: u32,
}

impl Default for SequencerConfig {
    fn default() -> Self { Self { ticks_per_unit: 240, end_padding: 480 } }
}

pub struct Sequencer<'a> {
    resolver: TuningResolver<'a>,
    config: SequencerConfig,
}

/// A note about to sound, with the bend its channel needs first.
struct Sounding {
    channel: u8,
    pitch: u8,
    velocity: u8,
    bend: Option<u16>,
}

impl<'a> Sequencer<'a> {
    pub fn new(resolver: TuningResolver<'a>, config: SequencerConfig) -> Self { Self { resolver, config } }

    pub fn config(&self) -> SequencerConfig { self.config }

    /// Sequences the whole script or nothing.
    pub fn sequence(&self, script: &TrackScript) -> Result<Track, SequenceError> {
        let ranges = bend_ranges(script)?;
        for voicing in &script.voicings {
            check_channel(voicing.channel)?;
            check_value("velocity", voicing.velocity)?;
        }

        let mut track = Track::new();
        if let Some(name) = &script.name {
            track.push(MusicEvent::TrackName { name: name.clone() });
        }
        emit_setup(&mut track, script, &ranges)?;

        // last bend sent per channel; channels start centred
        let mut bends: HashMap<u8, u16> = HashMap::new();

        for (step_index, step) in script.steps.iter().enumerate() {
            let (notes, duration) = match step {
                Step::Chord(chord) => (self.chord_notes(step_index, chord, &script.voicings, &ranges)?, chord.duration),
                Step::Key { channel, key, velocity, duration } => {
                    check_channel(*channel)?;
                    check_value("velocity", *velocity)?;
                    let pitch = midi_pitch(step_index, *key as i32)?;
                    (vec![Sounding { channel: *channel, pitch, velocity: *velocity, bend: None }], *duration)
                }
            };

            for note in &notes {
                let last = bends.get(&note.channel).copied().unwrap_or(BEND_CENTER);
                // a zero bend only needs sending to undo an earlier one
                let wanted = note.bend.unwrap_or(BEND_CENTER);
                if wanted != last {
                    track.push(MusicEvent::PitchBend { channel: note.channel, value: wanted });
                    bends.insert(note.channel, wanted);
                }
                track.push(MusicEvent::NoteOn { channel: note.channel, pitch: note.pitch, velocity: note.velocity });
            }
            self.config
                .ticks_per_unit
                .checked_mul(duration)
                .and_then(|ticks| track.advance(ticks))
                .ok_or(SequenceError::TickOverflow { step: step_index })?;
            for note in &notes {
                track.push(MusicEvent::NoteOff { channel: note.channel, pitch: note.pitch });
            }
        }

        track
            .finish(self.config.end_padding)
            .ok_or(SequenceError::TickOverflow { step: script.steps.len() })
    }

    fn chord_notes(
        &self,
        step: usize,
        chord: &ChordVoice,
        voicings: &[Voicing],
        ranges: &BTreeMap<u8, BendRange>,
    ) -> Result<Vec<Sounding>, SequenceError> {
        let tuning = |source| SequenceError::Tuning { step, source };

        let base = self.resolver.chromatic().note(&chord.base).map_err(tuning)?;
        let root = self
            .resolver
            .resolve(&chord.base, &chord.interval, chord.direction, chord.octave)
            .map_err(tuning)?;
        debug!(
            step,
            base = %chord.base,
            root = self.resolver.chromatic().name(root.note()),
            delta = root.delta,
            duration = chord.duration,
            "chord root"
        );

        let mut notes = Vec::with_capacity(voicings.len());
        for voicing in voicings {
            let offset = match voicing.part {
                Part::Base => SemitoneOffset::from_raw(base.pitch_class() as f64),
                Part::Root => root,
                part => match chord.tone(part) {
                    Some(tone) => self
                        .resolver
                        .resolve_from(root.rounded, &tone.interval, tone.direction, tone.octave)
                        .map_err(tuning)?,
                    None => continue,
                },
            };
            let bend = if voicing.part.bends() {
                let range = ranges.get(&voicing.channel).copied().unwrap_or_default();
                Some(range.encode(offset.delta))
            } else {
                None
            };
            notes.push(Sounding {
                channel: voicing.channel,
                pitch: midi_pitch(step, voicing.base_pitch + offset.rounded)?,
                velocity: voicing.velocity,
                bend,
            });
        }
        Ok(notes)
    }
}

/// Bend range of every channel that either declares one or carries a bending part.
fn bend_ranges(script: &TrackScript) -> Result<BTreeMap<u8, BendRange>, SequenceError> {
    let mut ranges = BTreeMap::new();
    for setup in &script.channels {
        check_channel(setup.channel)?;
        if let Some(range) = setup.bend_range {
            ranges.insert(setup.channel, range);
        }
    }
    for voicing in script.voicings.iter().filter(|v| v.part.bends()) {
        ranges.entry(voicing.channel).or_insert_with(|| {
            warn!(channel = voicing.channel, "no bend range declared for a bending channel, using ±2 semitones");
            BendRange::default()
        });
    }
    Ok(ranges)
}

/// Program, pan, bend range and tuning selection, once per channel, at tick 0.
fn emit_setup(
    track: &mut Track,
    script: &TrackScript,
    ranges: &BTreeMap<u8, BendRange>,
) -> Result<(), SequenceError> {
    let mut declared: Vec<&ChannelSetup> = Vec::new();
    for setup in &script.channels {
        if declared.iter().any(|d| d.channel == setup.channel) {
            warn!(channel = setup.channel, "channel set up twice, keeping the first");
            continue;
        }
        declared.push(setup);
    }

    for setup in &declared {
        let channel = setup.channel;
        if let Some(program) = setup.program {
            check_value("program", program)?;
            track.push(MusicEvent::ProgramChange { channel, program });
        }
        if let Some(pan) = setup.pan {
            check_value("pan", pan)?;
            track.push(MusicEvent::ControlChange { channel, controller: CC_PAN, value: pan });
        }
        if let Some(range) = ranges.get(&channel) {
            push_controls(track, channel, &range.rpn_setup())?;
        }
        if let Some(tuning) = setup.tuning {
            push_controls(track, channel, &tuning_select_rpn(tuning.bank, tuning.program))?;
        }
    }

    // bending channels nobody declared still need their sensitivity set
    for (&channel, range) in ranges {
        if !declared.iter().any(|d| d.channel == channel) {
            push_controls(track, channel, &range.rpn_setup())?;
        }
    }
    Ok(())
}

fn push_controls(track: &mut Track, channel: u8, controls: &[(u8, u8)]) -> Result<(), SequenceError> {
    for &(controller, value) in controls {
        check_value("controller value", value)?;
        track.push(MusicEvent::ControlChange { channel, controller, value });
    }
    Ok(())
}

fn midi_pitch(step: usize, pitch: i32) -> Result<u8, SequenceError> {
    u8::try_from(pitch)
        .ok()
        .filter(|p| *p <= 127)
        .ok_or(SequenceError::PitchOutOfRange { step, pitch })
}

fn check_channel(channel: u8) -> Result<(), SequenceError> {
    if channel > 15 {
        return Err(SequenceError::InvalidChannel(channel));
    }
    Ok(())
}

fn check_value(what: &'static str, value: u8) -> Result<(), SequenceError> {
    if value > 127 {
        return Err(SequenceError::ValueOutOfRange { what, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{TimedEvent, MAX_TICK};
    use crate::script::{ChordTone, TuningSelect};
    use tuning_core::{ChromaticTable, Direction, IntervalTable, TuningError};

    fn chord(base: &str, interval: &str, duration: u32) -> ChordVoice {
        ChordVoice {
            base: base.into(),
            interval: interval.into(),
            direction: Direction::Below,
            octave: 0,
            third: None,
            seventh: None,
            ninth: None,
            duration,
        }
    }

    fn run(script: &TrackScript) -> Result<Track, SequenceError> {
        let chromatic = ChromaticTable::standard();
        let intervals = IntervalTable::sruti();
        let sequencer = Sequencer::new(TuningResolver::new(&chromatic, &intervals), SequencerConfig::default());
        sequencer.sequence(script)
    }

    fn notes(track: &Track) -> Vec<&TimedEvent> {
        track
            .events()
            .iter()
            .filter(|e| matches!(e.event, MusicEvent::NoteOn { .. } | MusicEvent::NoteOff { .. }))
            .collect()
    }

    #[test]
    fn single_voice_timing() {
        let script = TrackScript {
            voicings: vec![Voicing::new(Part::Base, 2, 60)],
            steps: vec![Step::Chord(chord("A", "n3", 4))],
            ..Default::default()
        };
        let track = run(&script).unwrap();
        let events = track.events();
        assert_eq!(
            events,
            &[
                TimedEvent { tick: 0, event: MusicEvent::NoteOn { channel: 2, pitch: 69, velocity: 81 } },
                TimedEvent { tick: 960, event: MusicEvent::NoteOff { channel: 2, pitch: 69 } },
                TimedEvent { tick: 1440, event: MusicEvent::EndOfTrack },
            ]
        );
    }

    #[test]
    fn bend_precedes_note_on() {
        let script = TrackScript {
            voicings: vec![Voicing::new(Part::Root, 1, 48)],
            channels: vec![ChannelSetup { channel: 1, bend_range: Some(BendRange::default()), ..Default::default() }],
            steps: vec![Step::Chord(chord("A", "7/4", 4))],
            ..Default::default()
        };
        let track = run(&script).unwrap();
        let events: Vec<&MusicEvent> = track.events().iter().map(|e| &e.event).collect();
        assert_eq!(
            &events[..6],
            &[
                &MusicEvent::ControlChange { channel: 1, controller: 101, value: 0 },
                &MusicEvent::ControlChange { channel: 1, controller: 100, value: 0 },
                &MusicEvent::ControlChange { channel: 1, controller: 38, value: 0 },
                &MusicEvent::ControlChange { channel: 1, controller: 6, value: 2 },
                &MusicEvent::PitchBend { channel: 1, value: 9469 },
                &MusicEvent::NoteOn { channel: 1, pitch: 47, velocity: 81 },
            ]
        );
    }

    #[test]
    fn chained_tones_start_from_rounded_root() {
        let mut step = chord("A", "n2", 2);
        step.third = Some(ChordTone::above("7/6", 0));
        let script = TrackScript {
            voicings: vec![Voicing::new(Part::Root, 1, 60), Voicing::new(Part::Third, 3, 60)],
            steps: vec![Step::Chord(step)],
            ..Default::default()
        };
        let track = run(&script).unwrap();
        let on: Vec<_> = notes(&track)
            .into_iter()
            .filter_map(|e| match e.event {
                MusicEvent::NoteOn { channel, pitch, .. } => Some((channel, pitch)),
                _ => None,
            })
            .collect();
        // root rounds to -1; 7/6 above -1 is 1.67 -> 2, where the raw root would give 1
        assert_eq!(on, vec![(1, 59), (3, 62)]);
    }

    #[test]
    fn bend_reset_only_after_a_bend() {
        let script = TrackScript {
            voicings: vec![Voicing::new(Part::Root, 1, 60)],
            steps: vec![
                Step::Chord(chord("C", "sa", 1)),
                Step::Chord(chord("C", "pa", 1)),
                Step::Chord(chord("C", "pa", 1)),
                Step::Chord(chord("C", "sa", 1)),
            ],
            ..Default::default()
        };
        let track = run(&script).unwrap();
        let bends: Vec<(u32, u16)> = track
            .events()
            .iter()
            .filter_map(|e| match e.event {
                MusicEvent::PitchBend { value, .. } => Some((e.tick, value)),
                _ => None,
            })
            .collect();
        // 3/2 below C is 7.02 semitones down: -0.0196 -> 8112
        assert_eq!(bends, vec![(240, 8112), (720, 8192)]);
    }

    #[test]
    fn undeclared_bending_channel_gets_rpn_setup() {
        let mut step = chord("A", "n3", 4);
        step.seventh = Some(ChordTone::above("n3", 0));
        let script = TrackScript {
            channels: vec![ChannelSetup { channel: 4, program: Some(70), pan: Some(64), ..Default::default() }],
            voicings: vec![Voicing::new(Part::Seventh, 4, 60)],
            steps: vec![Step::Chord(step)],
            ..Default::default()
        };
        let track = run(&script).unwrap();
        let setup: Vec<&MusicEvent> = track.events().iter().take(6).map(|e| &e.event).collect();
        assert_eq!(setup[0], &MusicEvent::ProgramChange { channel: 4, program: 70 });
        assert_eq!(setup[1], &MusicEvent::ControlChange { channel: 4, controller: 10, value: 64 });
        assert_eq!(setup[5], &MusicEvent::ControlChange { channel: 4, controller: 6, value: 2 });
    }

    #[test]
    fn missing_tone_leaves_voicing_silent() {
        let script = TrackScript {
            voicings: vec![Voicing::new(Part::Base, 2, 60), Voicing::new(Part::Ninth, 5, 60)],
            steps: vec![Step::Chord(chord("D", "pa", 2))],
            ..Default::default()
        };
        let track = run(&script).unwrap();
        assert_eq!(notes(&track).len(), 2);
    }

    #[test]
    fn key_steps_walk_a_scale() {
        let script = TrackScript {
            channels: vec![ChannelSetup {
                channel: 2,
                tuning: Some(TuningSelect { bank: 0, program: 1 }),
                ..Default::default()
            }],
            steps: (48..51).map(|key| Step::Key { channel: 2, key, velocity: 81, duration: 2 }).collect(),
            ..Default::default()
        };
        let sequencer_config = SequencerConfig { end_padding: 0, ..Default::default() };
        let chromatic = ChromaticTable::standard();
        let intervals = IntervalTable::sruti();
        let track = Sequencer::new(TuningResolver::new(&chromatic, &intervals), sequencer_config)
            .sequence(&script)
            .unwrap();
        let controls = track.events().iter().filter(|e| matches!(e.event, MusicEvent::ControlChange { .. })).count();
        assert_eq!(controls, 6);
        assert_eq!(notes(&track).last().unwrap().tick, 1440);
        assert_eq!(track.events().last().unwrap(), &TimedEvent { tick: 1440, event: MusicEvent::EndOfTrack });
    }

    #[test]
    fn failures_abort_the_track() {
        let script = TrackScript {
            voicings: vec![Voicing::new(Part::Root, 1, 60)],
            steps: vec![Step::Chord(chord("A", "pa", 1)), Step::Chord(chord("A", "x1", 1))],
            ..Default::default()
        };
        match run(&script) {
            Err(SequenceError::Tuning { step: 1, source: TuningError::UnknownInterval(name) }) => assert_eq!(name, "x1"),
            other => panic!("unexpected {other:?}"),
        }

        let script = TrackScript {
            voicings: vec![Voicing::new(Part::Root, 1, 0)],
            steps: vec![Step::Chord(chord("C", "pa", 1))],
            ..Default::default()
        };
        assert!(matches!(run(&script), Err(SequenceError::PitchOutOfRange { step: 0, pitch: -7 })));

        let script = TrackScript {
            voicings: vec![Voicing::new(Part::Base, 16, 60)],
            steps: vec![Step::Chord(chord("C", "pa", 1))],
            ..Default::default()
        };
        assert!(matches!(run(&script), Err(SequenceError::InvalidChannel(16))));
    }

    #[test]
    fn overlong_durations_abort_the_track() {
        let script = TrackScript {
            voicings: vec![Voicing::new(Part::Base, 2, 60)],
            steps: vec![Step::Chord(chord("A", "pa", 1)), Step::Chord(chord("A", "pa", 20_000_000))],
            ..Default::default()
        };
        assert!(matches!(run(&script), Err(SequenceError::TickOverflow { step: 1 })));

        // each step fits, the running total does not
        let half = MAX_TICK / 240 / 2 + 1;
        let script = TrackScript {
            steps: (0..2).map(|_| Step::Key { channel: 0, key: 60, velocity: 81, duration: half }).collect(),
            ..Default::default()
        };
        assert!(matches!(run(&script), Err(SequenceError::TickOverflow { step: 1 })));

        // the end padding is checked too
        let script = TrackScript {
            steps: vec![Step::Key { channel: 0, key: 60, velocity: 81, duration: MAX_TICK / 240 }],
            ..Default::default()
        };
        assert!(matches!(run(&script), Err(SequenceError::TickOverflow { step: 1 })));
    }

    #[test]
    fn unknown_base_note_is_reported() {
        let script = TrackScript {
            voicings: vec![Voicing::new(Part::Base, 1, 60)],
            steps: vec![Step::Chord(chord("Z", "pa", 1))],
            ..Default::default()
        };
        assert!(matches!(
            run(&script),
            Err(SequenceError::Tuning { step: 0, source: TuningError::UnknownNote(_) })
        ));
    }
}
