//! # cortalign — paired brain/speech dataset preparation in pure Rust
//!
//! `cortalign` turns raw electrophysiology corpora into windowed training
//! sets for brain-to-speech alignment: each example pairs a brain-signal
//! window with the speech-audio representation that played at the same
//! time, tagged with the subject it came from. The DSP core (FIR design,
//! zero-phase filtering, FFT resampling) is ported from
//! [MNE-Python](https://mne.tools) — pure Rust +
//! [RustFFT](https://crates.io/crates/rustfft), no Python, no BLAS.
//!
//! ## Pipeline overview
//!
//! ```text
//! EEG study (shared stimulus)          MEG study (per-task stimuli)
//!   raw/S01.safetensors                  sub-01/ses-0/meg/*_meg.safetensors
//!     │                                    │
//!     ├─ keep first 60 channels            ├─ keep first 208 channels
//!     ├─ highpass 1 Hz (native rate)       ├─ trim silent spans (events.tsv)
//!     ├─ resample → embedding length       ├─ bandpass 0.5–30 Hz (native rate)
//!     ├─ robust scale per channel          ├─ resample → 120 Hz
//!     ├─ shift 150 ms vs audio             ├─ robust scale per channel
//!     └─ cut into 256-sample windows       └─ cut into 3 s windows
//!          │                                    │
//!          └─→ (X, Y, subject) triples ←────────┘
//! ```
//!
//! Audio follows the corpus: the EEG study's single merged track is embedded
//! up front through an [`encoder::AudioEncoder`]; the MEG study's stimuli are
//! cut to their played durations and kept as raw waveform.
//!
//! ## Quick start
//!
//! ```
//! use cortalign::{Dataset, ToyConfig, ToyDataset};
//!
//! let ds = ToyDataset::new(&ToyConfig {
//!     num_samples: 100,
//!     ..ToyConfig::default()
//! }).unwrap();
//!
//! let sample = ds.get(0).unwrap();
//! assert_eq!(sample.brain.shape(), &[60, 256]);
//! assert_eq!(sample.audio.shape(), &[512, 256]);
//! ```
//!
//! Building a real corpus (expensive stages cache into `store`):
//!
//! ```no_run
//! use cortalign::{BrennanConfig, BrennanDataset, CosineBankEncoder, Dataset, DiskStore};
//!
//! let cfg = BrennanConfig::default();
//! let store = DiskStore::new("cache/brennan").unwrap();
//! let encoder = CosineBankEncoder::default();
//!
//! let ds = BrennanDataset::build(&cfg, &encoder, &store).unwrap();
//! println!("{} windows at {:.1} Hz", ds.len(), ds.srate());
//! ```
//!
//! ## Running individual steps
//!
//! Each stage is also exposed as a standalone function:
//!
//! ```no_run
//! use cortalign::filter::{design_bandpass, apply_fir_zero_phase};
//! use cortalign::resample::resample;
//! use cortalign::scale::robust_scale_inplace;
//! use ndarray::Array2;
//!
//! let mut data: Array2<f32> = Array2::zeros((208, 60_000)); // [C, T]
//!
//! // Bandpass 0.5–30 Hz at the native 1 kHz
//! let h = design_bandpass(0.5, 30.0, 1000.0);
//! apply_fir_zero_phase(&mut data, &h).unwrap();
//!
//! // Resample 1 kHz → 120 Hz
//! let mut data = resample(&data, 1000.0, 120.0).unwrap();
//!
//! // Median/IQR scaling per channel
//! let fits = robust_scale_inplace(&mut data);
//! assert_eq!(fits.len(), 208);
//! ```

pub mod align;
pub mod annot;
pub mod audio;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod filter;
pub mod io;
pub mod resample;
pub mod scale;
pub mod sources;
pub mod store;
pub mod trim;
pub mod window;

// ── Crate-root re-exports ─────────────────────────────────────────────────
//
// Everything a downstream user is likely to need is available directly as
// `cortalign::Foo` without having to know the internal module layout.

// config
pub use config::{BrennanConfig, GwilliamsConfig, ToyConfig};

// dataset — the three corpus backends and the access trait
pub use dataset::{
    BrennanDataset, Dataset, GwilliamsDataset, ToyDataset, WindowBank, WindowSample,
};

// encoder
pub use encoder::{AudioEncoder, CosineBankEncoder};

// store
pub use store::{DiskStore, MemStore, TensorStore};

// alignment and windowing
pub use align::{shift_forward, shift_samples};
pub use window::{batchify_recording, batchify_shared, window_count};

// annotations and trimming
pub use annot::{parse_events, Annotation};
pub use trim::{sound_segments, trim_silent_spans, Segment};

// filter — design helpers + convolution
pub use filter::{
    apply_fir_zero_phase, design_bandpass, design_filter, design_highpass, filter_1d,
};

// io — tensor container helpers
pub use io::{TensorFile, TensorWriter};

// resample
pub use resample::{resample, resample_to_len};

// scale
pub use scale::robust_scale_inplace;
