use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use converters::{handle_render, load_chord_steps, OutputFormat, Piece, RenderOpts, RenderRequest};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tuning_core::{midi_to_hz, BendRange, ChromaticTable, Direction, IntervalTable, TuningResolver};

/// sruti – just-intonation intervals to MIDI (CSV-MIDI text or SMF).
/// Commands:
///   - chords   sruti chord piece, bent per channel
///   - scale    keyboard retuned through MTS, then played up
///   - resolve / intervals (debug): table lookups → json
#[derive(Parser, Debug)]
#[command(name = "sruti", version, about = "Just intonation to MIDI")]
struct Cli {
    /// Output file; stdout when absent
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// csv (midicsv text) or smf (binary .mid)
    #[arg(long, global = true, default_value = "csv")]
    format: OutputFormat,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the chord piece
    Chords {
        /// JSON list of chord steps replacing the built-in one
        #[arg(long)]
        script: Option<PathBuf>,

        #[arg(long)]
        tempo: Option<f64>,
    },

    /// Render the MTS scale piece
    Scale {
        /// First retuned MIDI key
        #[arg(long)]
        base_pitch: Option<i32>,

        /// Number of retuned keys (at most 128)
        #[arg(long)]
        keys: Option<usize>,

        /// Semitones added to every tuning target
        #[arg(long, allow_hyphen_values = true)]
        shift: Option<i32>,

        /// One bulk dump instead of a change per key
        #[arg(long)]
        bulk: bool,

        #[arg(long)]
        device_id: Option<u8>,

        #[arg(long)]
        tempo: Option<f64>,
    },

    /// (Debug) Resolve one interval against a base note
    Resolve {
        #[arg(long)]
        base: String,

        #[arg(long)]
        interval: String,

        /// Measure the interval above the base instead of below
        #[arg(long)]
        above: bool,

        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        octave: i32,
    },

    /// (Debug) Dump the interval table
    Intervals,
}

fn write_output(out: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match out {
        Some(p) => {
            if let Some(dir) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir).with_context(|| format!("failed creating {}", dir.display()))?;
            }
            fs::write(p, bytes).with_context(|| format!("failed writing {}", p.display()))?;
            tracing::info!("wrote {}", p.display());
        }
        None => io::stdout().lock().write_all(bytes).context("failed writing stdout")?,
    }
    Ok(())
}

fn render(cli: &Cli, piece: Piece, options: RenderOpts) -> Result<()> {
    let resp = handle_render(RenderRequest { piece, format: cli.format, options })?;
    write_output(cli.out.as_deref(), &resp.bytes)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match &cli.cmd {
        Commands::Chords { script, tempo } => {
            let steps = match script {
                Some(path) => {
                    let json = fs::read_to_string(path)
                        .with_context(|| format!("failed reading script: {}", path.display()))?;
                    Some(load_chord_steps(&json)?)
                }
                None => None,
            };
            let options = RenderOpts { tempo: *tempo, ..Default::default() };
            render(&cli, Piece::Chords { steps }, options)?;
        }

        Commands::Scale { base_pitch, keys, shift, bulk, device_id, tempo } => {
            let options = RenderOpts {
                tempo: *tempo,
                device_id: *device_id,
                base_pitch: *base_pitch,
                keys: *keys,
                shift: *shift,
                bulk: Some(*bulk),
            };
            render(&cli, Piece::Scale, options)?;
        }

        // ----- DEBUG ROUTES -----
        Commands::Resolve { base, interval, above, octave } => {
            let chromatic = ChromaticTable::standard();
            let intervals = IntervalTable::sruti();
            let resolver = TuningResolver::new(&chromatic, &intervals);
            let direction = if *above { Direction::Above } else { Direction::Below };
            let offset = resolver.resolve(base, interval, direction, *octave)?;
            let ratio = intervals.ratio(interval)?;
            let data = serde_json::json!({
                "base": base,
                "interval": interval,
                "ratio": ratio.to_string(),
                "direction": direction,
                "offset": offset,
                "note": chromatic.name(offset.note()),
                "note_flat": chromatic.flat_name(offset.note()),
                "bend": BendRange::default().encode(offset.delta),
                "hz": midi_to_hz(60.0 + offset.raw),
                "edo31": ratio.edo_steps(31),
            });
            let pretty = serde_json::to_string_pretty(&data)?;
            write_output(cli.out.as_deref(), pretty.as_bytes())?;
        }

        Commands::Intervals => {
            let intervals = IntervalTable::sruti();
            let list: Vec<_> = intervals.iter().collect();
            let pretty = serde_json::to_string_pretty(&list)?;
            write_output(cli.out.as_deref(), pretty.as_bytes())?;
        }
    }

    Ok(())
}
