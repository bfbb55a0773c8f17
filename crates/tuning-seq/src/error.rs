use thiserror::Error;
use tuning_core::TuningError;

/// Why a track could not be sequenced. The whole track is abandoned.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("step {step}: {source}")]
    Tuning { step: usize, source: TuningError },

    #[error("step {step}: MIDI pitch {pitch} is outside 0..=127")]
    PitchOutOfRange { step: usize, pitch: i32 },

    #[error("channel {0} is outside 0..=15")]
    InvalidChannel(u8),

    #[error("step {step}: track runs past the last MIDI tick")]
    TickOverflow { step: usize },

    #[error("{what} {value} is outside 0..=127")]
    ValueOutOfRange { what: &'static str, value: u8 },
}
