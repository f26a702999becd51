//! EEG audiobook listening study.
//!
//! Every subject heard the same merged stimulus track, so the pipeline
//! embeds the audio once and pairs each subject's EEG against that shared
//! embedding. Per recording: keep the scalp channels, high-pass at the
//! native rate, resample down to exactly the embedding's length, then
//! robust-scale each channel. A latency shift advances the EEG relative to
//! the audio before both are cut into windows.
use std::time::Instant;

use anyhow::{bail, Result};
use ndarray::{Array2, Array3, Axis};

use crate::align::shift_forward;
use crate::audio::encode_merged_audio;
use crate::config::BrennanConfig;
use crate::dataset::{Dataset, WindowBank, WindowSample};
use crate::encoder::AudioEncoder;
use crate::filter::{apply_fir_zero_phase, design_highpass};
use crate::io::TensorWriter;
use crate::resample::resample_to_len;
use crate::scale::robust_scale_inplace;
use crate::sources::{brennan_raw_files, keep_channels, load_raw};
use crate::store::TensorStore;
use crate::window::batchify_shared;

/// Windowed EEG/audio-embedding pairs from the audiobook study.
pub struct BrennanDataset {
    bank: WindowBank,
    srate: f64,
}

impl BrennanDataset {
    /// Build the dataset, reusing cached stages where available.
    ///
    /// Two entries live in `store`: the stimulus embedding under
    /// `embd_{encoder name}` and the preprocessed EEG under `processed_X`.
    /// When both exist the raw corpus is never touched.
    pub fn build<S: TensorStore>(
        cfg: &BrennanConfig,
        encoder: &dyn AudioEncoder,
        store: &S,
    ) -> Result<Self> {
        let audio = Self::audio_embedding(cfg, encoder, store)?;
        let (brain, srate) = Self::brain_preproc(cfg, audio.ncols(), store)?;

        let (brain, audio) = shift_forward(&brain, &audio, srate, cfg.shift_ms)?;
        let (x, y, subjects) = batchify_shared(&brain, &audio, cfg.seq_len)?;
        log::info!(
            "dataset ready: {} windows of {} samples at {srate:.3} Hz",
            subjects.len(),
            cfg.seq_len
        );
        Ok(Self {
            bank: WindowBank::new(x, y, subjects)?,
            srate,
        })
    }

    /// Effective EEG sampling rate after the resample to embedding length.
    pub fn srate(&self) -> f64 {
        self.srate
    }

    fn audio_embedding<S: TensorStore>(
        cfg: &BrennanConfig,
        encoder: &dyn AudioEncoder,
        store: &S,
    ) -> Result<Array2<f32>> {
        let key = format!("embd_{}", encoder.name());
        if store.exists(&key) {
            log::info!("loading cached audio embedding ({key})");
            return store.read(&key)?.matrix("Y");
        }

        let t = Instant::now();
        let wav = cfg.data_root.join("audio").join("merged_audio.wav");
        let embd = encode_merged_audio(&wav, encoder)?;
        log::info!(
            "embedded audio: {:?} in {:.1?}",
            embd.shape(),
            t.elapsed()
        );

        let mut w = TensorWriter::new();
        w.put_matrix("Y", &embd);
        store.write(&key, &w)?;
        Ok(embd)
    }

    fn brain_preproc<S: TensorStore>(
        cfg: &BrennanConfig,
        target_len: usize,
        store: &S,
    ) -> Result<(Array3<f32>, f64)> {
        if store.exists("processed_X") {
            return Self::load_cached_brain(store);
        }

        let files = brennan_raw_files(&cfg.data_root)?;
        let total = files.len();
        let selected: Vec<_> = files
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !cfg.excluded_subjects.contains(i))
            .map(|(_, p)| p)
            .take(cfg.num_subjects.unwrap_or(usize::MAX))
            .collect();
        if selected.is_empty() {
            bail!("every EEG recording was excluded");
        }
        log::info!("processing {} of {total} EEG recordings", selected.len());

        let mut per_subject = Vec::with_capacity(selected.len());
        let mut srate = 0.0_f64;
        for (idx, path) in selected.iter().enumerate() {
            let t = Instant::now();
            let (data, sfreq) = load_raw(path)?;
            let mut data = keep_channels(data, cfg.num_channels)?;

            let taps = design_highpass(cfg.l_freq, sfreq as f32);
            apply_fir_zero_phase(&mut data, &taps)?;

            let (mut data, effective) = resample_to_len(&data, target_len, sfreq)?;
            if idx > 0 && (effective - srate).abs() > 1e-6 {
                log::warn!(
                    "effective rate drifted across recordings: {srate:.6} -> {effective:.6} Hz"
                );
            }
            srate = effective;

            robust_scale_inplace(&mut data);
            log::info!("preprocessed {} in {:.1?}", path.display(), t.elapsed());
            per_subject.push(data);
        }

        let views: Vec<_> = per_subject.iter().map(|m| m.view()).collect();
        let x = ndarray::stack(Axis(0), &views)?;

        let mut w = TensorWriter::new();
        for (i, m) in per_subject.iter().enumerate() {
            w.put_matrix(&format!("subject{:02}", i + 1), m);
        }
        w.put_scalar_f64("srate", srate);
        store.write("processed_X", &w)?;

        Ok((x, srate))
    }

    fn load_cached_brain<S: TensorStore>(store: &S) -> Result<(Array3<f32>, f64)> {
        let file = store.read("processed_X")?;
        let srate = file.scalar_f64("srate")?;

        let mut per_subject = Vec::new();
        for name in file.names() {
            if name.starts_with("subject") {
                per_subject.push(file.matrix(name)?);
            }
        }
        if per_subject.is_empty() {
            bail!("processed_X cache holds no subject matrices");
        }

        let views: Vec<_> = per_subject.iter().map(|m| m.view()).collect();
        let x = ndarray::stack(Axis(0), &views)?;
        log::info!("loaded cached EEG: {:?} at {srate:.3} Hz", x.shape());
        Ok((x, srate))
    }
}

impl Dataset for BrennanDataset {
    fn len(&self) -> usize {
        self.bank.len()
    }

    fn get(&self, index: usize) -> Option<WindowSample> {
        self.bank.get(index)
    }
}
