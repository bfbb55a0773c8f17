use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tuning_seq::{ChordVoice, Song};

pub mod csv;
pub mod pieces;
pub mod smf;
pub mod sysex;

pub use pieces::{chords_song, default_chord_steps, scale_song, Tables};

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct RenderOpts {
    pub tempo: Option<f64>,      // bpm
    pub device_id: Option<u8>,   // MTS SysEx device
    pub base_pitch: Option<i32>, // first retuned key
    pub keys: Option<usize>,     // number of retuned keys
    pub shift: Option<i32>,      // semitones added to every MTS target
    pub bulk: Option<bool>,      // one bulk dump instead of per-key changes
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(tag = "piece", rename_all = "snake_case")]
pub enum Piece {
    Chords { steps: Option<Vec<ChordVoice>> },
    Scale,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Smf,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(OutputFormat::Csv),
            "smf" | "mid" | "midi" => Ok(OutputFormat::Smf),
            other => bail!("unknown output format {other:?} (expected csv or smf)"),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct RenderRequest {
    pub piece: Piece,
    pub format: OutputFormat,
    pub options: RenderOpts,
}

#[derive(Clone, Debug)]
pub struct RenderResponse {
    pub song: Song,
    pub bytes: Vec<u8>,
}

/// Parses a JSON array of chord steps.
pub fn load_chord_steps(json: &str) -> Result<Vec<ChordVoice>> {
    serde_json::from_str(json).context("chord script is not a valid JSON list of chord steps")
}

/// Public entry helper: build the song for a piece and serialize it.
pub fn handle_render(req: RenderRequest) -> Result<RenderResponse> {
    let tables = Tables::default();
    let song = match req.piece {
        Piece::Chords { steps } => chords_song(&tables, steps.unwrap_or_else(default_chord_steps), &req.options)?,
        Piece::Scale => scale_song(&tables, &req.options)?,
    };
    let bytes = match req.format {
        OutputFormat::Csv => csv::to_csv_string(&song)?.into_bytes(),
        OutputFormat::Smf => smf::to_mid_bytes(&song)?,
    };
    Ok(RenderResponse { song, bytes })
}
