//! MIDI Tuning Standard SysEx framing around per-key tuning records.
//!
//! Message bodies here start after the implicit `F0` and end with `F7`.

use anyhow::{bail, Result};
use tuning_core::mts::{MtsEntry, MIDI_KEYS};

const SYSEX_END: u8 = 0xF7;
const UNIVERSAL_NON_REAL_TIME: u8 = 0x7E;
const UNIVERSAL_REAL_TIME: u8 = 0x7F;

const MIDI_TUNING_STANDARD: u8 = 0x08;
const BULK_DUMP_REPLY: u8 = 0x01;
const SINGLE_NOTE_TUNING_CHANGE: u8 = 0x02;

const NAME_LEN: usize = 16;

/// Real-time single note tuning change carrying `entries`.
pub fn single_note_tuning_change(entries: &[MtsEntry], device_id: u8, program: u8) -> Result<Vec<u8>> {
    if entries.is_empty() || entries.len() > 127 {
        bail!("a single note tuning change carries 1..=127 keys, got {}", entries.len());
    }
    check_7bit("device id", device_id)?;
    check_7bit("tuning program", program)?;

    let mut data = vec![
        UNIVERSAL_REAL_TIME,
        device_id,
        MIDI_TUNING_STANDARD,
        SINGLE_NOTE_TUNING_CHANGE,
        program,
        entries.len() as u8,
    ];
    for e in entries {
        data.extend_from_slice(&[e.key, e.semitone, e.msb, e.lsb]);
    }
    data.push(SYSEX_END);
    Ok(data)
}

/// Non-real-time bulk dump of a whole 128-key tuning program.
///
/// Keys without an entry keep their 12-TET pitch.
pub fn bulk_tuning_dump(entries: &[MtsEntry], device_id: u8, program: u8, name: &str) -> Result<Vec<u8>> {
    check_7bit("device id", device_id)?;
    check_7bit("tuning program", program)?;

    let mut keys: Vec<[u8; 3]> = (0..MIDI_KEYS as u8).map(|k| [k, 0, 0]).collect();
    for e in entries {
        check_7bit("key", e.key)?;
        keys[e.key as usize] = [e.semitone, e.msb, e.lsb];
    }

    let mut data = vec![UNIVERSAL_NON_REAL_TIME, device_id, MIDI_TUNING_STANDARD, BULK_DUMP_REPLY, program];
    let mut padded: Vec<u8> = name
        .chars()
        .take(NAME_LEN)
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'?' })
        .collect();
    padded.resize(NAME_LEN, b' ');
    data.extend_from_slice(&padded);
    for k in &keys {
        data.extend_from_slice(k);
    }
    let checksum = data.iter().fold(0u8, |acc, b| acc ^ b) & 0x7F;
    data.push(checksum);
    data.push(SYSEX_END);
    Ok(data)
}

fn check_7bit(what: &str, value: u8) -> Result<()> {
    if value > 127 {
        bail!("{what} {value} does not fit in 7 bits");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuning_core::{build_tuning_table, JustTuning};

    #[test]
    fn single_key_change_layout() {
        let entry = MtsEntry { key: 55, semitone: 55, msb: 2, lsb: 64 };
        let data = single_note_tuning_change(&[entry], 0, 1).unwrap();
        assert_eq!(data, vec![0x7F, 0, 0x08, 0x02, 1, 1, 55, 55, 2, 64, 0xF7]);
    }

    #[test]
    fn single_change_limits() {
        assert!(single_note_tuning_change(&[], 0, 1).is_err());
        let entry = MtsEntry { key: 1, semitone: 1, msb: 0, lsb: 0 };
        assert!(single_note_tuning_change(&[entry], 0, 200).is_err());
        assert!(single_note_tuning_change(&vec![entry; 128], 0, 1).is_err());
    }

    #[test]
    fn bulk_dump_layout_and_checksum() {
        let entries = build_tuning_table(&JustTuning::five_limit(), 48, 0, 24).unwrap();
        let data = bulk_tuning_dump(&entries, 0x7F, 1, "5-limit just").unwrap();
        assert_eq!(data.len(), 5 + 16 + 128 * 3 + 2);
        assert_eq!(&data[..5], &[0x7E, 0x7F, 0x08, 0x01, 1]);
        assert_eq!(&data[5..21], b"5-limit just    ");

        let key = |k: usize| &data[21 + 3 * k..24 + 3 * k];
        assert_eq!(key(0), &[0, 0, 0]);
        assert_eq!(key(55), &[55, 2, 64]);
        assert_eq!(key(100), &[100, 0, 0]);

        let body = &data[..data.len() - 2];
        let expected = body.iter().fold(0u8, |a, b| a ^ b) & 0x7F;
        assert_eq!(data[data.len() - 2], expected);
        assert_eq!(*data.last().unwrap(), 0xF7);
        assert!(data[..data.len() - 1].iter().all(|b| *b < 0x80));
    }
}
