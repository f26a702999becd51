//! Pipeline configuration.
//!
//! One config struct per corpus, with defaults matching the published
//! acquisition parameters. Everything is plain data; the dataset builders
//! in [`crate::dataset`] consume these by value.
use std::path::PathBuf;

/// Settings for the EEG listening study (single shared audiobook stimulus).
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use cortalign::BrennanConfig;
///
/// let cfg = BrennanConfig {
///     seq_len: 128,            // shorter training windows
///     num_subjects: Some(2),   // quick smoke run
///     ..BrennanConfig::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct BrennanConfig {
    /// Corpus root, containing `raw/` and `audio/merged_audio.wav`.
    ///
    /// Default: `data/Brennan2018`.
    pub data_root: PathBuf,
    /// Samples per training window.
    ///
    /// Default: `256`.
    pub seq_len: usize,
    /// Neural response latency compensation, in milliseconds. The brain
    /// trace is advanced by `round(srate * shift_ms / 1000)` samples
    /// relative to the audio before windowing.
    ///
    /// Default: `150.0` ms.
    pub shift_ms: f64,
    /// High-pass edge in Hz, applied at the native sampling rate.
    ///
    /// Default: `1.0` Hz.
    pub l_freq: f32,
    /// Scalp channels to keep (the leading rows of each recording).
    ///
    /// Default: `60`.
    pub num_channels: usize,
    /// Cap on the number of subjects, applied after exclusions. `None`
    /// keeps every recording found.
    ///
    /// Default: `None`.
    pub num_subjects: Option<usize>,
    /// Zero-based positions in the natural-sorted recording list to skip,
    /// e.g. subjects rejected for excessive artifacts.
    ///
    /// Default: empty.
    pub excluded_subjects: Vec<usize>,
}

impl Default for BrennanConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data/Brennan2018"),
            seq_len: 256,
            shift_ms: 150.0,
            l_freq: 1.0,
            num_channels: 60,
            num_subjects: None,
            excluded_subjects: Vec::new(),
        }
    }
}

/// Settings for the MEG listening study (four audiobooks, two sessions).
#[derive(Debug, Clone)]
pub struct GwilliamsConfig {
    /// Corpus root, containing `sub-*/ses-*/meg/` and `stimuli/audio/`.
    ///
    /// Default: `data/Gwilliams2022`.
    pub data_root: PathBuf,
    /// Subjects to process (`sub-01` .. `sub-{n:02}`).
    ///
    /// Default: `27`.
    pub num_subjects: usize,
    /// Sessions per subject (`ses-0` .. ).
    ///
    /// Default: `2`.
    pub num_sessions: usize,
    /// Tasks per session, also the number of stimulus groups.
    ///
    /// Default: `4`.
    pub num_tasks: usize,
    /// Sensor channels to keep from each run.
    ///
    /// Default: `208`.
    pub num_channels: usize,
    /// Window length in seconds; windows hold `seq_len_s * resample_hz`
    /// sensor samples.
    ///
    /// Default: `3`.
    pub seq_len_s: usize,
    /// Target rate for the sensor signal after band-pass filtering.
    ///
    /// Default: `120.0` Hz.
    pub resample_hz: f64,
    /// Rate the stimulus waveform is raised to before concatenation, chosen
    /// so one window of audio is an integer sample count.
    ///
    /// Default: `38530.0` Hz.
    pub audio_upsample_hz: f64,
    /// Band-pass lower edge in Hz, applied at the native sampling rate.
    ///
    /// Default: `0.5` Hz.
    pub l_freq: f32,
    /// Band-pass upper edge in Hz.
    ///
    /// Default: `30.0` Hz.
    pub h_freq: f32,
    /// Stimulus file-name prefix for each task, index-aligned with task
    /// numbers.
    ///
    /// Default: `["lw1", "cable", "easy", "the"]`.
    pub task_prefixes: Vec<String>,
}

impl Default for GwilliamsConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data/Gwilliams2022"),
            num_subjects: 27,
            num_sessions: 2,
            num_tasks: 4,
            num_channels: 208,
            seq_len_s: 3,
            resample_hz: 120.0,
            audio_upsample_hz: 38_530.0,
            l_freq: 0.5,
            h_freq: 30.0,
            task_prefixes: ["lw1", "cable", "easy", "the"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl GwilliamsConfig {
    /// Sensor samples per training window.
    pub fn meg_len(&self) -> usize {
        (self.resample_hz * self.seq_len_s as f64).round() as usize
    }

    /// Waveform samples per training window.
    pub fn audio_len(&self) -> usize {
        (self.audio_upsample_hz * self.seq_len_s as f64).round() as usize
    }
}

/// Settings for the synthetic smoke-test corpus.
#[derive(Debug, Clone)]
pub struct ToyConfig {
    /// Windows to generate.
    ///
    /// Default: `10000`.
    pub num_samples: usize,
    /// Samples per window.
    ///
    /// Default: `256`.
    pub seq_len: usize,
    /// Brain channels; the leading `x_dim` rows of each target window.
    ///
    /// Default: `60`.
    pub x_dim: usize,
    /// Target channels.
    ///
    /// Default: `512`.
    pub y_dim: usize,
    /// Subject labels are drawn uniformly from `0..num_subjects`.
    ///
    /// Default: `33`.
    pub num_subjects: usize,
    /// RNG seed; equal seeds give identical datasets.
    ///
    /// Default: `0`.
    pub seed: u64,
}

impl Default for ToyConfig {
    fn default() -> Self {
        Self {
            num_samples: 10_000,
            seq_len: 256,
            x_dim: 60,
            y_dim: 512,
            num_subjects: 33,
            seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gwilliams_window_lengths() {
        let cfg = GwilliamsConfig::default();
        assert_eq!(cfg.meg_len(), 360);
        assert_eq!(cfg.audio_len(), 115_590);
    }

    #[test]
    fn defaults_are_consistent() {
        let cfg = GwilliamsConfig::default();
        assert_eq!(cfg.task_prefixes.len(), cfg.num_tasks);
        let brennan = BrennanConfig::default();
        assert!(brennan.num_subjects.is_none());
        assert!(brennan.excluded_subjects.is_empty());
    }
}
