use serde::Serialize;

/// One MIDI message or meta event, without timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MusicEvent {
    TrackName { name: String },
    Tempo { micros_per_quarter: u32 },
    /// `denominator` is a power of two exponent, as in the SMF meta event.
    TimeSignature { numerator: u8, denominator: u8, clocks_per_click: u8, notated_32nds: u8 },
    KeySignature { sharps: i8, minor: bool },
    ProgramChange { channel: u8, program: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8 },
    PitchBend { channel: u8, value: u16 },
    /// Message body after the leading `F0`, terminating `F7` included.
    SysEx { data: Vec<u8> },
    EndOfTrack,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimedEvent {
    pub tick: u32,
    pub event: MusicEvent,
}

/// Largest tick a track may reach; SMF delta times are 28-bit.
pub const MAX_TICK: u32 = 0x0FFF_FFFF;

/// Events sharing one tick clock. The clock starts at 0, only moves forward,
/// and never passes [`MAX_TICK`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Track {
    events: Vec<TimedEvent>,
    cursor: u32,
}

impl Track {
    pub fn new() -> Self { Self::default() }

    /// Appends `event` at the current cursor.
    pub fn push(&mut self, event: MusicEvent) {
        self.events.push(TimedEvent { tick: self.cursor, event });
    }

    /// Moves the cursor on by `ticks` and returns the new position, or
    /// `None` (cursor untouched) if that would pass [`MAX_TICK`].
    pub fn advance(&mut self, ticks: u32) -> Option<u32> {
        let next = self.cursor.checked_add(ticks).filter(|t| *t <= MAX_TICK)?;
        self.cursor = next;
        Some(next)
    }

    pub fn cursor(&self) -> u32 { self.cursor }

    /// Pads the clock and closes the track. `None` if the padding runs past [`MAX_TICK`].
    pub fn finish(mut self, padding: u32) -> Option<Self> {
        self.advance(padding)?;
        self.push(MusicEvent::EndOfTrack);
        Some(self)
    }

    pub fn events(&self) -> &[TimedEvent] { &self.events }

    pub fn is_finished(&self) -> bool {
        matches!(self.events.last(), Some(TimedEvent { event: MusicEvent::EndOfTrack, .. }))
    }
}

/// Tracks played in parallel, with their shared resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Song {
    pub ticks_per_quarter: u16,
    pub tracks: Vec<Track>,
}

impl Song {
    pub fn new(ticks_per_quarter: u16) -> Self { Self { ticks_per_quarter, tracks: Vec::new() } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_only_moves_forward() {
        let mut track = Track::new();
        track.push(MusicEvent::ProgramChange { channel: 1, program: 68 });
        assert_eq!(track.advance(960), Some(960));
        track.push(MusicEvent::NoteOff { channel: 1, pitch: 60 });
        let track = track.finish(480).unwrap();

        let ticks: Vec<u32> = track.events().iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![0, 960, 1440]);
        assert!(track.is_finished());
        assert_eq!(track.cursor(), 1440);
    }

    #[test]
    fn cursor_stops_at_the_last_smf_tick() {
        let mut track = Track::new();
        assert_eq!(track.advance(MAX_TICK - 10), Some(MAX_TICK - 10));
        assert_eq!(track.advance(11), None);
        assert_eq!(track.advance(u32::MAX), None);
        assert_eq!(track.cursor(), MAX_TICK - 10);
        assert!(track.clone().finish(11).is_none());
        assert_eq!(track.finish(10).unwrap().events().last().unwrap().tick, MAX_TICK);
    }

    #[test]
    fn events_serialize_tagged() {
        let json = serde_json::to_value(MusicEvent::PitchBend { channel: 3, value: 8673 }).unwrap();
        assert_eq!(json["type"], "pitch_bend");
        assert_eq!(json["value"], 8673);
    }
}
