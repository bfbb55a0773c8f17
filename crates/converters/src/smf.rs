//! Standard MIDI File output through `midly`.

use anyhow::{bail, Result};
use midly::{
    num::{u14, u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, PitchBend, Smf, Timing, TrackEvent, TrackEventKind,
};
use tuning_seq::{MusicEvent, Song, Track, MAX_TICK};

/// Serialize to SMF bytes; format 1 when there is more than one track.
pub fn to_mid_bytes(song: &Song) -> Result<Vec<u8>> {
    let format = if song.tracks.len() > 1 { Format::Parallel } else { Format::SingleTrack };
    let mut smf = Smf::new(Header::new(format, Timing::Metrical(u15::new(song.ticks_per_quarter))));
    for track in &song.tracks {
        smf.tracks.push(convert_track(track)?);
    }

    let mut buf = Vec::new();
    smf.write(&mut buf).map_err(|e| anyhow::anyhow!(e))?;
    Ok(buf)
}

const MAX_TEMPO: u32 = 0xFF_FFFF;

// absolute ticks -> deltas; midly would mask anything wider than its fields
fn convert_track(track: &Track) -> Result<Vec<TrackEvent<'_>>> {
    let mut out = Vec::with_capacity(track.events().len());
    let mut last_tick: u32 = 0;
    for ev in track.events() {
        let delta = ev.tick.saturating_sub(last_tick);
        if delta > MAX_TICK {
            bail!("delta of {delta} ticks at tick {} does not fit in 28 bits", ev.tick);
        }
        if let MusicEvent::Tempo { micros_per_quarter } = ev.event {
            if micros_per_quarter == 0 || micros_per_quarter > MAX_TEMPO {
                bail!("tempo of {micros_per_quarter} µs per quarter is not a positive 24-bit value");
            }
        }
        last_tick = ev.tick;
        out.push(TrackEvent { delta: u28::new(delta), kind: event_kind(&ev.event) });
    }
    Ok(out)
}

fn event_kind(event: &MusicEvent) -> TrackEventKind<'_> {
    let midi = |channel: u8, message| TrackEventKind::Midi { channel: u4::new(channel), message };
    match event {
        MusicEvent::TrackName { name } => TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
        MusicEvent::Tempo { micros_per_quarter } => TrackEventKind::Meta(MetaMessage::Tempo(u24::new(*micros_per_quarter))),
        MusicEvent::TimeSignature { numerator, denominator, clocks_per_click, notated_32nds } => {
            TrackEventKind::Meta(MetaMessage::TimeSignature(*numerator, *denominator, *clocks_per_click, *notated_32nds))
        }
        MusicEvent::KeySignature { sharps, minor } => TrackEventKind::Meta(MetaMessage::KeySignature(*sharps, *minor)),
        MusicEvent::ProgramChange { channel, program } => {
            midi(*channel, MidiMessage::ProgramChange { program: u7::new(*program) })
        }
        MusicEvent::ControlChange { channel, controller, value } => midi(
            *channel,
            MidiMessage::Controller { controller: u7::new(*controller), value: u7::new(*value) },
        ),
        MusicEvent::NoteOn { channel, pitch, velocity } => {
            midi(*channel, MidiMessage::NoteOn { key: u7::new(*pitch), vel: u7::new(*velocity) })
        }
        MusicEvent::NoteOff { channel, pitch } => {
            midi(*channel, MidiMessage::NoteOff { key: u7::new(*pitch), vel: u7::new(0) })
        }
        MusicEvent::PitchBend { channel, value } => {
            midi(*channel, MidiMessage::PitchBend { bend: PitchBend(u14::new(*value)) })
        }
        MusicEvent::SysEx { data } => TrackEventKind::SysEx(data),
        MusicEvent::EndOfTrack => TrackEventKind::Meta(MetaMessage::EndOfTrack),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_parseable_file_with_deltas() {
        let mut conductor = Track::new();
        conductor.push(MusicEvent::Tempo { micros_per_quarter: 500000 });
        conductor.push(MusicEvent::SysEx { data: vec![0x7F, 0, 8, 2, 1, 1, 55, 55, 2, 64, 0xF7] });
        let mut notes = Track::new();
        notes.push(MusicEvent::PitchBend { channel: 3, value: 9469 });
        notes.push(MusicEvent::NoteOn { channel: 3, pitch: 62, velocity: 81 });
        notes.advance(960).unwrap();
        notes.push(MusicEvent::NoteOff { channel: 3, pitch: 62 });
        let tracks = vec![conductor.finish(0).unwrap(), notes.finish(480).unwrap()];
        let song = Song { ticks_per_quarter: 480, tracks };

        let bytes = to_mid_bytes(&song).unwrap();
        assert_eq!(&bytes[..4], b"MThd");

        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.tracks.len(), 2);
        let deltas: Vec<u32> = smf.tracks[1].iter().map(|e| e.delta.as_int()).collect();
        assert_eq!(deltas, vec![0, 0, 960, 480]);
        assert!(matches!(
            smf.tracks[1][0].kind,
            TrackEventKind::Midi { message: MidiMessage::PitchBend { bend: PitchBend(b) }, .. } if b.as_int() == 9469
        ));
        assert!(matches!(smf.tracks[0][1].kind, TrackEventKind::SysEx(data) if data.len() == 11));
    }

    #[test]
    fn tempo_wider_than_24_bits_is_refused() {
        for micros_per_quarter in [0, 0x100_0000, u32::MAX] {
            let mut track = Track::new();
            track.push(MusicEvent::Tempo { micros_per_quarter });
            let song = Song { ticks_per_quarter: 480, tracks: vec![track.finish(0).unwrap()] };
            let err = to_mid_bytes(&song).unwrap_err().to_string();
            assert!(err.contains("24-bit"), "{err}");
        }
    }
}
