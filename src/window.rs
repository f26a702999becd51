//! Windowing / batchifying.
//!
//! Slices aligned brain and audio sequences into fixed-length,
//! non-overlapping windows, the unit the training loop consumes. Two
//! layouts exist:
//!   • one shared audio track for every subject (stacked EEG): the audio
//!     windows are broadcast across subjects and the flat order is
//!     subject-major;
//!   • one recording at a time (MEG), brain and audio windowed
//!     independently with their own window lengths.
//! Remainder samples past the last full window are dropped, never padded.
use anyhow::{bail, Result};
use ndarray::{s, Array2, Array3};

/// Number of full windows of length `win` in a sequence of `len` samples.
pub fn window_count(len: usize, win: usize) -> usize {
    len / win
}

/// Window a stacked tensor `brain` ([S, C, T]) against one shared `audio`
/// track ([C_a, T], same time grid), broadcasting the audio across subjects.
///
/// Returns `(x [S·n, C, win], y [S·n, C_a, win], subjects [S·n])` with
/// `n = T / win`, flat order subject-major: all of subject 0's windows in
/// time order, then subject 1's, and so on.
pub fn batchify_shared(
    brain: &Array3<f32>,
    audio: &Array2<f32>,
    win: usize,
) -> Result<(Array3<f32>, Array3<f32>, Vec<usize>)> {
    if win == 0 {
        bail!("window length must be positive");
    }
    let (n_subj, n_ch, n_times) = brain.dim();
    if audio.ncols() != n_times {
        bail!(
            "brain and audio disagree on length: {} vs {} samples",
            n_times,
            audio.ncols()
        );
    }
    let n = window_count(n_times, win);
    if n == 0 {
        log::warn!("sequence of {n_times} samples is shorter than one {win}-sample window");
    }

    let n_emb = audio.nrows();
    let mut x = Array3::zeros((n_subj * n, n_ch, win));
    let mut y = Array3::zeros((n_subj * n, n_emb, win));
    let mut subjects = Vec::with_capacity(n_subj * n);
    for subj in 0..n_subj {
        for w in 0..n {
            let flat = subj * n + w;
            let span = w * win..(w + 1) * win;
            x.slice_mut(s![flat, .., ..])
                .assign(&brain.slice(s![subj, .., span.clone()]));
            y.slice_mut(s![flat, .., ..]).assign(&audio.slice(s![.., span]));
            subjects.push(subj);
        }
    }
    Ok((x, y, subjects))
}

/// Window one recording's `brain` ([C, T]) and its `audio` ([C_a, T_a])
/// independently, with separate window lengths (the modalities live on
/// different time grids here).
///
/// When the two window counts disagree the surplus windows are dropped from
/// the longer side with a warning; a hard failure would lose the rest of an
/// otherwise good corpus.
pub fn batchify_recording(
    brain: &Array2<f32>,
    audio: &Array2<f32>,
    brain_win: usize,
    audio_win: usize,
) -> Result<(Array3<f32>, Array3<f32>)> {
    if brain_win == 0 || audio_win == 0 {
        bail!("window length must be positive");
    }
    let n_brain = window_count(brain.ncols(), brain_win);
    let n_audio = window_count(audio.ncols(), audio_win);
    let n = if n_brain != n_audio {
        log::warn!(
            "window counts disagree: brain {n_brain} vs audio {n_audio}; keeping {}",
            n_brain.min(n_audio)
        );
        n_brain.min(n_audio)
    } else {
        n_brain
    };

    let mut x = Array3::zeros((n, brain.nrows(), brain_win));
    let mut y = Array3::zeros((n, audio.nrows(), audio_win));
    for w in 0..n {
        x.slice_mut(s![w, .., ..])
            .assign(&brain.slice(s![.., w * brain_win..(w + 1) * brain_win]));
        y.slice_mut(s![w, .., ..])
            .assign(&audio.slice(s![.., w * audio_win..(w + 1) * audio_win]));
    }
    Ok((x, y))
}
