use thiserror::Error;

/// Lookup and range failures raised while turning tables into pitches.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuningError {
    #[error("unknown note name {0:?} (not in the chromatic table)")]
    UnknownNote(String),

    #[error("unknown interval name {0:?} (not in the interval table)")]
    UnknownInterval(String),

    #[error("MTS entry {index} is outside the MIDI key range (value {value})")]
    KeyRangeOverflow { index: usize, value: i64 },

    #[error("degenerate ratio {numerator}/{denominator}")]
    DegenerateRatio { numerator: u32, denominator: u32 },

    #[error("interval {0:?} is defined more than once")]
    DuplicateInterval(String),

    #[error("pitch-bend range of {0} semitones is outside 1..=24")]
    InvalidBendRange(u8),

    #[error("pitch-bend sensitivity {0} is not a positive finite number")]
    InvalidSensitivity(f64),
}

pub type Result<T> = std::result::Result<T, TuningError>;
