use anyhow::{Context, Result};
use clap::Parser;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use hushmic::dsp::utils::frame_rms;
use hushmic::{ConfigOverrides, Pipeline, PipelineState, SuppressorConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "hushmic-denoise",
    about = "Run the noise suppressor over a WAV file"
)]
struct Args {
    /// Noisy input (16-bit PCM or 32-bit float); only the first channel is used
    input: PathBuf,

    /// Denoised mono output, same sample format as the input
    output: PathBuf,

    /// JSON config file; a missing file means defaults
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    frame_ms: Option<u32>,

    /// Seconds at the start of the file used to learn the noise
    #[arg(long)]
    calib_sec: Option<f32>,

    /// High-pass cutoff in Hz (0 disables)
    #[arg(long)]
    highpass: Option<f32>,

    /// Subtraction aggressiveness
    #[arg(long)]
    beta: Option<f32>,

    /// Residual noise floor / minimum gain
    #[arg(long)]
    floor: Option<f32>,

    #[arg(long)]
    ema_alpha: Option<f32>,

    /// Noise adaptation coefficient during calibration
    #[arg(long)]
    calib_alpha: Option<f32>,

    #[arg(long)]
    gain_smooth: Option<f32>,
}

impl Args {
    fn overrides(&self, sample_rate: u32) -> ConfigOverrides {
        ConfigOverrides {
            samplerate: Some(sample_rate),
            frame_ms: self.frame_ms,
            calib_sec: self.calib_sec,
            highpass_hz: self.highpass,
            noise_beta: self.beta,
            noise_floor: self.floor,
            ema_alpha: self.ema_alpha,
            calib_alpha: self.calib_alpha,
            gain_smooth: self.gain_smooth,
            ..Default::default()
        }
    }
}

fn read_first_channel(path: &Path) -> Result<(Vec<f32>, WavSpec)> {
    let mut reader = WavReader::open(path)
        .with_context(|| format!("failed to open input WAV '{}'", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .step_by(channels)
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<Result<Vec<_>, _>>(),
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .step_by(channels)
            .collect::<Result<Vec<_>, _>>(),
        (format, bits) => anyhow::bail!(
            "unsupported WAV format {:?} with {} bits; expected 16-bit int or 32-bit float",
            format,
            bits
        ),
    }
    .with_context(|| format!("failed to decode '{}'", path.display()))?;

    if channels > 1 {
        log::info!("{} channels in input, using channel 0", channels);
    }
    Ok((samples, spec))
}

fn write_mono(path: &Path, input_spec: WavSpec, samples: &[f32]) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        ..input_spec
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create output WAV '{}'", path.display()))?;

    match spec.sample_format {
        SampleFormat::Int => {
            for &s in samples {
                let v = (s * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
                writer.write_sample(v)?;
            }
        }
        SampleFormat::Float => {
            for &s in samples {
                writer.write_sample(s)?;
            }
        }
    }
    writer
        .finalize()
        .with_context(|| format!("failed to finalize '{}'", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let (input, wav_spec) = read_first_channel(&args.input)?;

    let file_config = match &args.config {
        Some(path) => SuppressorConfig::load(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => SuppressorConfig::default(),
    };
    let config = file_config.with_overrides(&args.overrides(wav_spec.sample_rate));

    let mut pipeline = Pipeline::new(config).context("invalid suppressor configuration")?;
    log::debug!("effective config: {:?}", pipeline.config());
    let mut events = pipeline.take_event_drain();
    let hop = pipeline.geometry().hop_len;
    let latency = pipeline.latency_samples();

    // Zero-pad to whole hops plus one frame so the tail flushes out.
    let padded_len = (input.len() + latency).div_ceil(hop) * hop;
    let mut padded = input.clone();
    padded.resize(padded_len, 0.0);
    let mut processed = vec![0.0f32; padded_len];

    for (inp, out) in padded.chunks_exact(hop).zip(processed.chunks_exact_mut(hop)) {
        pipeline.process_hop(inp, out)?;
        if let Some(drain) = events.as_mut() {
            drain.drain_to_log();
        }
    }

    let output = &processed[latency..latency + input.len()];
    write_mono(&args.output, wav_spec, output)?;

    if pipeline.state() == PipelineState::Calibrating {
        log::warn!(
            "input shorter than the calibration period ({:.0}% done); output is unsuppressed",
            pipeline.calibration_progress() * 100.0
        );
    }
    log::info!(
        "{} -> {}: {} samples @ {} Hz, {} hops, rms {:.4} -> {:.4}",
        args.input.display(),
        args.output.display(),
        input.len(),
        wav_spec.sample_rate,
        pipeline.hops_processed(),
        frame_rms(&input),
        frame_rms(output)
    );
    Ok(())
}
