//! Cross-modal temporal alignment.
//!
//! Neural responses lag the audio that evokes them, so the brain signal is
//! shifted forward against the audio before windowing: drop the first
//! `shift` brain samples and the last `shift` audio samples. Both tensors
//! must already live on the same time grid (equal sample rate); the shift is
//! specified in milliseconds and converted at that rate.
use anyhow::{bail, Result};
use ndarray::{s, Array2, Array3, Axis};

/// Convert a latency in milliseconds to whole samples at `srate`,
/// rounding to nearest.
pub fn shift_samples(srate: f64, shift_ms: f64) -> usize {
    (srate * shift_ms / 1000.0).round() as usize
}

/// Shift `brain` ([S, C, T]) forward against `audio` ([C_a, T']) by
/// `shift_ms` milliseconds at `srate` Hz, then truncate both to the common
/// remaining length. A zero shift only performs the truncation.
pub fn shift_forward(
    brain: &Array3<f32>,
    audio: &Array2<f32>,
    srate: f64,
    shift_ms: f64,
) -> Result<(Array3<f32>, Array2<f32>)> {
    if shift_ms < 0.0 {
        bail!("latency shift must be non-negative, got {shift_ms} ms");
    }
    let shift = shift_samples(srate, shift_ms);
    let t_brain = brain.len_of(Axis(2));
    let t_audio = audio.ncols();
    if shift >= t_brain || shift >= t_audio {
        bail!(
            "shift of {shift} samples consumes the whole sequence \
             (brain {t_brain}, audio {t_audio})"
        );
    }
    let common = (t_brain - shift).min(t_audio - shift);
    let brain_out = brain.slice(s![.., .., shift..shift + common]).to_owned();
    let audio_out = audio.slice(s![.., ..common]).to_owned();
    Ok((brain_out, audio_out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn shift_rounds_to_nearest_sample() {
        // 135.06 Hz · 150 ms = 20.259 → 20
        assert_eq!(shift_samples(135.06, 150.0), 20);
        // 130 Hz · 150 ms = 19.5 → 20 (not truncated to 19)
        assert_eq!(shift_samples(130.0, 150.0), 20);
        assert_eq!(shift_samples(120.0, 0.0), 0);
    }

    #[test]
    fn brain_loses_head_audio_loses_tail() {
        let brain = Array3::from_shape_fn((2, 3, 100), |(_, _, t)| t as f32);
        let audio = Array2::from_shape_fn((4, 100), |(_, t)| t as f32);
        let (b, a) = shift_forward(&brain, &audio, 1000.0, 10.0).unwrap();
        assert_eq!(b.shape(), &[2, 3, 90]);
        assert_eq!(a.shape(), &[4, 90]);
        // Brain sample 0 was sample 10; audio keeps its first 90 samples.
        assert_eq!(b[[0, 0, 0]], 10.0);
        assert_eq!(a[[0, 89]], 89.0);
    }

    #[test]
    fn zero_shift_truncates_to_common_length() {
        let brain = Array3::zeros((1, 2, 120));
        let audio = Array2::zeros((4, 100));
        let (b, a) = shift_forward(&brain, &audio, 120.0, 0.0).unwrap();
        assert_eq!(b.shape(), &[1, 2, 100]);
        assert_eq!(a.shape(), &[4, 100]);
    }

    #[test]
    fn unequal_lengths_truncate_after_shift() {
        let brain = Array3::from_shape_fn((1, 1, 50), |(_, _, t)| t as f32);
        let audio = Array2::zeros((2, 80));
        let (b, a) = shift_forward(&brain, &audio, 1000.0, 5.0).unwrap();
        // brain: 50 - 5 = 45 left, audio: 80 - 5 = 75 → common 45.
        assert_eq!(b.shape(), &[1, 1, 45]);
        assert_eq!(a.shape(), &[2, 45]);
        assert_eq!(b[[0, 0, 0]], 5.0);
    }

    #[test]
    fn overlong_shift_is_an_error() {
        let brain = Array3::zeros((1, 1, 10));
        let audio = Array2::zeros((1, 10));
        assert!(shift_forward(&brain, &audio, 1000.0, 20.0).is_err());
        assert!(shift_forward(&brain, &audio, 1000.0, -1.0).is_err());
    }
}
