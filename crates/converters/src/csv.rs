//! CSV-MIDI text, one record per line, as read by `csvmidi`.

use anyhow::Result;
use std::io::Write;
use tuning_seq::{MusicEvent, Song, Track};

pub fn write_csv<W: Write>(song: &Song, out: &mut W) -> Result<()> {
    let format = if song.tracks.len() > 1 { 1 } else { 0 };
    writeln!(out, "0, 0, Header, {}, {}, {}", format, song.tracks.len(), song.ticks_per_quarter)?;
    for (i, track) in song.tracks.iter().enumerate() {
        write_track(i + 1, track, out)?;
    }
    writeln!(out, "0, 0, End_of_file")?;
    Ok(())
}

pub fn to_csv_string(song: &Song) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(song, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

fn write_track<W: Write>(n: usize, track: &Track, out: &mut W) -> Result<()> {
    writeln!(out, "{}, 0, Start_track", n)?;
    for ev in track.events() {
        let t = ev.tick;
        match &ev.event {
            MusicEvent::TrackName { name } => writeln!(out, "{n}, {t}, Title_t, {}", quote(name))?,
            MusicEvent::Tempo { micros_per_quarter } => writeln!(out, "{n}, {t}, Tempo, {micros_per_quarter}")?,
            MusicEvent::TimeSignature { numerator, denominator, clocks_per_click, notated_32nds } => writeln!(
                out,
                "{n}, {t}, Time_signature, {numerator}, {denominator}, {clocks_per_click}, {notated_32nds}"
            )?,
            MusicEvent::KeySignature { sharps, minor } => {
                let mode = if *minor { "minor" } else { "major" };
                writeln!(out, "{n}, {t}, Key_signature, {sharps}, {}", quote(mode))?
            }
            MusicEvent::ProgramChange { channel, program } => writeln!(out, "{n}, {t}, Program_c, {channel}, {program}")?,
            MusicEvent::ControlChange { channel, controller, value } => {
                writeln!(out, "{n}, {t}, Control_c, {channel}, {controller}, {value}")?
            }
            MusicEvent::NoteOn { channel, pitch, velocity } => {
                writeln!(out, "{n}, {t}, Note_on_c, {channel}, {pitch}, {velocity}")?
            }
            MusicEvent::NoteOff { channel, pitch } => writeln!(out, "{n}, {t}, Note_off_c, {channel}, {pitch}, 0")?,
            MusicEvent::PitchBend { channel, value } => writeln!(out, "{n}, {t}, Pitch_bend_c, {channel}, {value}")?,
            MusicEvent::SysEx { data } => {
                write!(out, "{n}, {t}, System_exclusive, {}", data.len())?;
                for b in data {
                    write!(out, ", {b}")?;
                }
                writeln!(out)?
            }
            MusicEvent::EndOfTrack => writeln!(out, "{n}, {t}, End_track")?,
        }
    }
    Ok(())
}

// embedded quotes are doubled
fn quote(s: &str) -> String { format!("\"{}\"", s.replace('"', "\"\"")) }
