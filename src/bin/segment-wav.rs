//! Feed a WAV recording through a segmentation session and print the
//! detected utterances, one JSON line each.
//!
//! Useful for tuning thresholds against real recordings without a live
//! connection.

use anyhow::{Context, ensure};
use clap::Parser;
use hound::WavReader;
use speechgate::config::Config;
use speechgate::segment::Segment;
use speechgate::session::Session;
use speechgate::vad::{EnergyClassifier, SpeechClassifier};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "segment-wav")]
#[command(about = "Detect utterances in a WAV file using the speechgate endpointer")]
struct Cli {
    /// Path to a 16-bit mono WAV file
    wav: PathBuf,

    /// Configuration file (defaults to ~/.config/speechgate/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Feed size in bytes, simulating arbitrary transport chunking
    #[arg(long, default_value_t = 3200)]
    chunk_bytes: usize,

    /// Classifier aggressiveness (0-3), overriding the configuration
    #[arg(long)]
    aggressiveness: Option<u8>,

    /// Use the RMS energy classifier instead of the WebRTC detector
    #[arg(long)]
    energy: bool,

    /// RMS threshold for --energy (0.0 to 1.0)
    #[arg(long, default_value_t = 0.02)]
    energy_threshold: f32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    ensure!(cli.chunk_bytes > 0, "--chunk-bytes must be non-zero");

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path())?.with_env_overrides(),
    };
    if let Some(level) = cli.aggressiveness {
        config.vad.aggressiveness = level;
    }

    let mut reader = WavReader::open(&cli.wav)
        .with_context(|| format!("failed to open {}", cli.wav.display()))?;
    let spec = reader.spec();
    ensure!(spec.channels == 1, "expected mono, got {} channels", spec.channels);
    ensure!(
        spec.bits_per_sample == 16,
        "expected 16-bit samples, got {}",
        spec.bits_per_sample
    );
    config.audio.sample_rate = spec.sample_rate;

    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<_, _>>()
        .context("failed to read samples")?;
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

    let segments = if cli.energy {
        let classifier = EnergyClassifier::new(cli.energy_threshold);
        run(
            Session::new("segment-wav", &config, classifier)?,
            &bytes,
            cli.chunk_bytes,
        )
    } else {
        run(
            Session::open("segment-wav", &config)?,
            &bytes,
            cli.chunk_bytes,
        )
    };

    let bytes_per_ms = (spec.sample_rate / 1000 * 2) as usize;
    for segment in &segments {
        let record = serde_json::json!({
            "segment_id": segment.segment_id,
            "bytes": segment.len(),
            "duration_ms": segment.len() / bytes_per_ms.max(1),
            "flushed_on_close": segment.flushed_on_close,
        });
        println!("{}", record);
    }

    Ok(())
}

/// Streams the recording through one session in transport-sized chunks,
/// flushing at the end exactly like a closing connection.
fn run<C: SpeechClassifier>(
    mut session: Session<C>,
    bytes: &[u8],
    chunk_bytes: usize,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    for chunk in bytes.chunks(chunk_bytes) {
        segments.extend(session.feed(chunk));
    }
    segments.extend(session.finish());
    segments
}
