//! Audio feature encoders.
//!
//! The alignment model trains against embeddings of the stimulus audio, not
//! the waveform itself. Pretrained speech encoders (wav2vec 2.0 and friends)
//! run outside this crate; here only the contract they must satisfy is
//! defined, plus a cheap deterministic stand-in so the pipeline can run and
//! be tested without model weights.
use anyhow::{bail, Result};
use ndarray::Array2;

/// A speech feature encoder: strided mono waveform in, `[D, T_steps]`
/// embedding out.
pub trait AudioEncoder {
    /// Cache keys are derived from this, so two differently-configured
    /// encoders must not share a name.
    fn name(&self) -> String;

    /// Sample rate the encoder was trained at. Waveforms are resampled to
    /// this before [`AudioEncoder::feature_extract`].
    fn input_sample_rate(&self) -> f64;

    /// Embedding dimension D.
    fn embed_channels(&self) -> usize;

    /// Input samples consumed per output step.
    fn frame_stride(&self) -> usize;

    /// Output steps produced for a waveform of `input_len` samples.
    fn output_len(&self, input_len: usize) -> usize {
        input_len / self.frame_stride()
    }

    /// Encode a mono waveform into `[D, output_len]`.
    fn feature_extract(&self, wave: &[f32]) -> Result<Array2<f32>>;
}

/// Deterministic stand-in encoder: non-overlapping frames of `stride`
/// samples, each projected onto half-cosine basis functions (channel 0 is
/// the plain frame mean). Same stride as the wav2vec 2.0 feature extractor
/// at 16 kHz so cache shapes and timing match the real thing.
pub struct CosineBankEncoder {
    channels: usize,
    stride: usize,
}

impl CosineBankEncoder {
    pub fn new(channels: usize, stride: usize) -> Self {
        Self { channels, stride }
    }
}

impl Default for CosineBankEncoder {
    /// 512 channels at stride 320, the wav2vec 2.0 base geometry.
    fn default() -> Self {
        Self::new(512, 320)
    }
}

impl AudioEncoder for CosineBankEncoder {
    fn name(&self) -> String {
        format!("cosbank{}x{}", self.channels, self.stride)
    }

    fn input_sample_rate(&self) -> f64 {
        16_000.0
    }

    fn embed_channels(&self) -> usize {
        self.channels
    }

    fn frame_stride(&self) -> usize {
        self.stride
    }

    fn feature_extract(&self, wave: &[f32]) -> Result<Array2<f32>> {
        let n_steps = self.output_len(wave.len());
        if n_steps == 0 {
            bail!(
                "waveform of {} samples is shorter than one {}-sample frame",
                wave.len(),
                self.stride
            );
        }
        let mut out = Array2::zeros((self.channels, n_steps));
        let norm = 2.0 / self.stride as f32;
        for step in 0..n_steps {
            let frame = &wave[step * self.stride..(step + 1) * self.stride];
            for d in 0..self.channels {
                let v = if d == 0 {
                    frame.iter().sum::<f32>() / self.stride as f32
                } else {
                    frame
                        .iter()
                        .enumerate()
                        .map(|(t, &w)| {
                            let phase = std::f32::consts::PI * d as f32 * (t as f32 + 0.5)
                                / self.stride as f32;
                            w * phase.cos()
                        })
                        .sum::<f32>()
                        * norm
                };
                out[[d, step]] = v;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_len_is_floor_of_strides() {
        let enc = CosineBankEncoder::new(8, 320);
        assert_eq!(enc.output_len(320), 1);
        assert_eq!(enc.output_len(639), 1);
        assert_eq!(enc.output_len(640), 2);
        assert_eq!(enc.output_len(319), 0);
    }

    #[test]
    fn constant_wave_lands_in_mean_channel_only() {
        let enc = CosineBankEncoder::new(4, 16);
        let wave = vec![0.5_f32; 64];
        let emb = enc.feature_extract(&wave).unwrap();
        assert_eq!(emb.shape(), &[4, 4]);
        for step in 0..4 {
            approx::assert_abs_diff_eq!(emb[[0, step]], 0.5, epsilon = 1e-6_f32);
            // Half-cosine projections of a constant are zero.
            for d in 1..4 {
                approx::assert_abs_diff_eq!(emb[[d, step]], 0.0, epsilon = 1e-5_f32);
            }
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let enc = CosineBankEncoder::new(16, 32);
        let wave: Vec<f32> = (0..320).map(|t| ((t * 37) % 61) as f32 / 61.0).collect();
        let a = enc.feature_extract(&wave).unwrap();
        let b = enc.feature_extract(&wave).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn short_wave_is_an_error() {
        let enc = CosineBankEncoder::default();
        assert!(enc.feature_extract(&vec![0.0; 100]).is_err());
    }

    #[test]
    fn name_encodes_geometry() {
        assert_eq!(CosineBankEncoder::default().name(), "cosbank512x320");
    }
}
