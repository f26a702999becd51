//! Stimulus audio loading and preparation.
//!
//! Two production paths, one per study layout:
//!   • a single merged recording-length WAV, resampled to the encoder's
//!     input rate and embedded immediately ([`encode_merged_audio`]);
//!   • per-task stimulus WAVs, each cut to the duration that actually played
//!     during acquisition, upsampled and concatenated, with the embedding
//!     deferred to training time ([`task_waveform`]).
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ndarray::{concatenate, Array2, Axis};

use crate::encoder::AudioEncoder;
use crate::resample::resample;

/// Decode a WAV file into `[channels, frames]` in [-1, 1] plus its sample
/// rate. Integer PCM (16/24/32 bit) is scaled by the full-scale value;
/// 32-bit float is passed through.
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<(Array2<f32>, f64)> {
    let path = path.as_ref();
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("opening wav {}", path.display()))?;
    let spec = reader.spec();
    let n_ch = spec.channels as usize;
    if n_ch == 0 {
        bail!("wav has zero channels: {}", path.display());
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("decoding {}", path.display()))?,
        hound::SampleFormat::Int => {
            let full_scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<std::result::Result<_, _>>()
                .with_context(|| format!("decoding {}", path.display()))?
        }
    };

    let n_frames = interleaved.len() / n_ch;
    let mut out = Array2::zeros((n_ch, n_frames));
    for (i, &v) in interleaved[..n_frames * n_ch].iter().enumerate() {
        out[[i % n_ch, i / n_ch]] = v;
    }
    Ok((out, spec.sample_rate as f64))
}

/// Average the channels of `[C, T]` audio down to a mono signal.
pub fn mixdown(wave: &Array2<f32>) -> Vec<f32> {
    let n_ch = wave.nrows() as f32;
    wave.columns()
        .into_iter()
        .map(|col| col.sum() / n_ch)
        .collect()
}

/// Load the merged stimulus track, resample it to the encoder's input rate
/// and embed it. Returns `[D, T_steps]` covering the whole recording.
pub fn encode_merged_audio(path: &Path, encoder: &dyn AudioEncoder) -> Result<Array2<f32>> {
    let (wave, rate) = load_wav(path)?;
    log::info!(
        "audio before resampling: {} ch × {} samples @ {rate} Hz",
        wave.nrows(),
        wave.ncols()
    );

    let mono = mixdown(&wave);
    let mono = Array2::from_shape_vec((1, mono.len()), mono)?;
    let at_rate = resample(&mono, rate, encoder.input_sample_rate())?;
    log::info!(
        "audio length: {:.1} s at {} Hz",
        at_rate.ncols() as f64 / encoder.input_sample_rate(),
        encoder.input_sample_rate()
    );

    encoder.feature_extract(&at_rate.row(0).to_vec())
}

/// Assemble one task's deferred-encoding waveform: cut each stimulus file to
/// the duration that really played (`(rate · dur) as usize` samples),
/// upsample to `upsample_hz` and concatenate along time. `durations[i]`
/// belongs to `paths[i]`; a count mismatch means the events and stimuli
/// disagree and is fatal.
pub fn task_waveform(
    paths: &[PathBuf],
    durations: &[f64],
    upsample_hz: f64,
) -> Result<Array2<f32>> {
    if paths.is_empty() {
        bail!("no stimulus files to assemble");
    }
    if paths.len() != durations.len() {
        bail!(
            "{} stimulus files but {} recorded durations",
            paths.len(),
            durations.len()
        );
    }

    let mut pieces = Vec::with_capacity(paths.len());
    for (path, &dur) in paths.iter().zip(durations) {
        let (wave, rate) = load_wav(path)?;
        let mut mono = mixdown(&wave);

        let cutoff = (rate * dur) as usize;
        if mono.len() > cutoff {
            mono.truncate(cutoff);
        } else {
            log::warn!(
                "no audio cutoff for {}: {} samples <= {cutoff}",
                path.display(),
                mono.len()
            );
        }

        let mono = Array2::from_shape_vec((1, mono.len()), mono)?;
        pieces.push(resample(&mono, rate, upsample_hz)?);
    }

    let views: Vec<_> = pieces.iter().map(|p| p.view()).collect();
    Ok(concatenate(Axis(1), &views)?)
}
