//! Windowed training datasets.
//!
//! Each corpus backend produces the same thing: a bank of fixed-length
//! windows pairing a brain-signal excerpt with its concurrent audio
//! representation and the subject who produced it. Backends differ only in
//! how they get there:
//!
//! * [`brennan::BrennanDataset`] — EEG, one shared stimulus, embedded audio;
//! * [`gwilliams::GwilliamsDataset`] — MEG, per-task stimuli, raw waveform
//!   targets;
//! * [`toy::ToyDataset`] — synthetic cosine traces for smoke tests.
pub mod brennan;
pub mod gwilliams;
pub mod toy;

pub use brennan::BrennanDataset;
pub use gwilliams::GwilliamsDataset;
pub use toy::ToyDataset;

use anyhow::{bail, Result};
use ndarray::{s, Array3};

/// One training example: time-aligned brain and audio windows plus the
/// subject the brain window came from.
#[derive(Debug, Clone)]
pub struct WindowSample {
    /// Brain signal, `[channels, window_samples]`.
    pub brain: ndarray::Array2<f32>,
    /// Audio representation over the same span, `[channels, window_samples]`.
    pub audio: ndarray::Array2<f32>,
    /// Zero-based subject index.
    pub subject: usize,
}

/// Random access over preprocessed windows.
pub trait Dataset {
    /// Number of windows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `index`-th window, or `None` past the end.
    fn get(&self, index: usize) -> Option<WindowSample>;
}

/// In-memory window bank shared by every backend: brain windows
/// `[N, C_b, W_b]`, audio windows `[N, C_a, W_a]` and one subject label per
/// window.
pub struct WindowBank {
    x: Array3<f32>,
    y: Array3<f32>,
    subjects: Vec<usize>,
}

impl WindowBank {
    /// Bundle windows that were produced together. The three window counts
    /// must agree.
    pub fn new(x: Array3<f32>, y: Array3<f32>, subjects: Vec<usize>) -> Result<Self> {
        if x.shape()[0] != y.shape()[0] || x.shape()[0] != subjects.len() {
            bail!(
                "window counts disagree: {} brain, {} audio, {} subjects",
                x.shape()[0],
                y.shape()[0],
                subjects.len()
            );
        }
        Ok(Self { x, y, subjects })
    }

    /// Append another bank produced with the same window geometry.
    pub fn extend(&mut self, other: WindowBank) -> Result<()> {
        if self.x.shape()[1..] != other.x.shape()[1..]
            || self.y.shape()[1..] != other.y.shape()[1..]
        {
            bail!("window geometry disagrees across banks");
        }
        self.x.append(ndarray::Axis(0), other.x.view())?;
        self.y.append(ndarray::Axis(0), other.y.view())?;
        self.subjects.extend(other.subjects);
        Ok(())
    }

    /// Subject label of every window, in order.
    pub fn subjects(&self) -> &[usize] {
        &self.subjects
    }

    /// The full brain-window tensor, `[N, C, W]`.
    pub fn brain_windows(&self) -> &Array3<f32> {
        &self.x
    }

    /// The full audio-window tensor, `[N, C, W]`.
    pub fn audio_windows(&self) -> &Array3<f32> {
        &self.y
    }
}

impl Dataset for WindowBank {
    fn len(&self) -> usize {
        self.subjects.len()
    }

    fn get(&self, index: usize) -> Option<WindowSample> {
        if index >= self.subjects.len() {
            return None;
        }
        Some(WindowSample {
            brain: self.x.slice(s![index, .., ..]).to_owned(),
            audio: self.y.slice(s![index, .., ..]).to_owned(),
            subject: self.subjects[index],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn bank_indexing() {
        let x = Array3::from_shape_fn((3, 2, 4), |(n, c, t)| (n * 100 + c * 10 + t) as f32);
        let y = Array3::zeros((3, 5, 4));
        let bank = WindowBank::new(x, y, vec![0, 0, 1]).unwrap();

        assert_eq!(bank.len(), 3);
        let sample = bank.get(2).unwrap();
        assert_eq!(sample.subject, 1);
        assert_eq!(sample.brain[[1, 3]], 213.0);
        assert!(bank.get(3).is_none());
    }

    #[test]
    fn mismatched_counts_rejected() {
        let x = Array3::<f32>::zeros((3, 2, 4));
        let y = Array3::<f32>::zeros((2, 5, 4));
        assert!(WindowBank::new(x, y, vec![0, 0, 1]).is_err());
    }

    #[test]
    fn extend_concatenates_windows() {
        let bank = |n: usize, subj: usize| {
            WindowBank::new(
                Array3::from_elem((n, 2, 4), subj as f32),
                Array3::zeros((n, 5, 4)),
                vec![subj; n],
            )
            .unwrap()
        };
        let mut a = bank(2, 0);
        a.extend(bank(3, 1)).unwrap();
        assert_eq!(a.len(), 5);
        assert_eq!(a.subjects(), &[0, 0, 1, 1, 1]);
        assert_eq!(a.get(4).unwrap().brain[[0, 0]], 1.0);
    }

    #[test]
    fn extend_rejects_different_geometry() {
        let mut a = WindowBank::new(
            Array3::zeros((1, 2, 4)),
            Array3::zeros((1, 5, 4)),
            vec![0],
        )
        .unwrap();
        let b = WindowBank::new(
            Array3::zeros((1, 2, 8)),
            Array3::zeros((1, 5, 8)),
            vec![0],
        )
        .unwrap();
        assert!(a.extend(b).is_err());
    }
}
