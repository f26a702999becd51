//! MEG multi-task listening study.
//!
//! Subjects heard four audiobooks across two sessions, with silent breaks
//! between sounds recorded in per-run events tables. The pipeline trims the
//! silence out of each sensor trace, band-passes at the native rate,
//! resamples and scales, and caches every run under its own key so an
//! interrupted pass resumes where it stopped. Stimulus audio is cut to the
//! durations that actually played, upsampled, and kept as raw waveform;
//! embedding is deferred to training time.
use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::{Context, Result};
use ndarray::Array2;

use crate::config::GwilliamsConfig;
use crate::dataset::{Dataset, WindowBank, WindowSample};
use crate::filter::{apply_fir_zero_phase, design_bandpass};
use crate::io::TensorWriter;
use crate::resample::resample;
use crate::scale::robust_scale_inplace;
use crate::sources::{
    keep_channels, load_events, load_raw, subject_of_key, task_of_key, wav_files, RecordingId,
};
use crate::store::TensorStore;
use crate::trim::trim_silent_spans;
use crate::window::batchify_recording;

/// Seconds of stimulus that played during each run, keyed by task label.
type DurationMap = BTreeMap<String, Vec<f64>>;

/// Windowed MEG/waveform pairs from the multi-task study.
pub struct GwilliamsDataset {
    bank: WindowBank,
}

impl GwilliamsDataset {
    /// Build the dataset, reusing cached stages where available.
    ///
    /// Three entries live in `store`: per-run preprocessed MEG under
    /// `processed_X`, per-task stimulus waveforms under `processed_Y`, and
    /// the played-duration ledger under `real_durations`. `processed_X` is
    /// rewritten after every run, so a crashed pass loses at most the run
    /// it was working on.
    pub fn build<S: TensorStore>(cfg: &GwilliamsConfig, store: &S) -> Result<Self> {
        let durations = Self::brain_preproc(cfg, store)?;
        Self::audio_preproc(cfg, &durations, store)?;
        let bank = Self::batchfy(cfg, store)?;
        log::info!("dataset ready: {} windows", bank.len());
        Ok(Self { bank })
    }

    fn brain_preproc<S: TensorStore>(cfg: &GwilliamsConfig, store: &S) -> Result<DurationMap> {
        let mut entries: Vec<(String, Array2<f32>)> = Vec::new();
        if store.exists("processed_X") {
            let file = store.read("processed_X")?;
            for name in file.names() {
                let matrix = file.matrix(name)?;
                entries.push((name.to_string(), matrix));
            }
            log::info!("resuming: {} runs already preprocessed", entries.len());
        }
        let mut durations: DurationMap = if store.exists_json("real_durations") {
            serde_json::from_value(store.read_json("real_durations")?)
                .context("real_durations cache is malformed")?
        } else {
            DurationMap::new()
        };

        for subject in 0..cfg.num_subjects {
            for session in 0..cfg.num_sessions {
                for task in 0..cfg.num_tasks {
                    let id = RecordingId { subject, session, task };
                    let key = id.description();
                    if entries.iter().any(|(k, _)| *k == key) {
                        log::info!("skipping {key}: already cached");
                        continue;
                    }

                    let meg_path = id.meg_path(&cfg.data_root);
                    if !meg_path.is_file() {
                        log::warn!("no sensor data found for {key}");
                        continue;
                    }

                    let t = Instant::now();
                    let (data, sfreq) = load_raw(&meg_path)?;
                    let data = keep_channels(data, cfg.num_channels)?;

                    let events = load_events(&id.events_path(&cfg.data_root))?;
                    let (mut data, durs) = trim_silent_spans(&data, &events)?;
                    Self::update_real_durations(&mut durations, task, durs, &key);

                    let taps = design_bandpass(cfg.l_freq, cfg.h_freq, sfreq as f32);
                    apply_fir_zero_phase(&mut data, &taps)?;

                    let mut data = resample(&data, sfreq, cfg.resample_hz)?;
                    robust_scale_inplace(&mut data);

                    log::info!("preprocessed {key} in {:.1?}", t.elapsed());
                    entries.push((key, data));

                    let mut w = TensorWriter::new();
                    for (k, m) in &entries {
                        w.put_matrix(k, m);
                    }
                    store.write("processed_X", &w)?;
                    store.write_json("real_durations", &serde_json::to_value(&durations)?)?;
                }
            }
        }

        Ok(durations)
    }

    /// Record how long each sound of `task` really played. Runs of the same
    /// task replay the same stimuli, so entries normally agree; when they
    /// do not, warn and keep the latest run's measurement.
    fn update_real_durations(
        durations: &mut DurationMap,
        task: usize,
        durs: Vec<f64>,
        key: &str,
    ) {
        let label = format!("task{task}");
        if let Some(prev) = durations.get(&label) {
            let close = prev.len() == durs.len()
                && prev
                    .iter()
                    .zip(&durs)
                    .all(|(a, b)| (a - b).abs() <= 1e-8 + 1e-5 * b.abs());
            if !close {
                log::warn!("real durations for {label} differ across runs; keeping {key}'s");
            }
        }
        durations.insert(label, durs);
    }

    fn audio_preproc<S: TensorStore>(
        cfg: &GwilliamsConfig,
        durations: &DurationMap,
        store: &S,
    ) -> Result<()> {
        if store.exists("processed_Y") {
            log::info!("stimulus waveforms already cached");
            return Ok(());
        }

        let stim_dir = cfg.data_root.join("stimuli").join("audio");
        let mut w = TensorWriter::new();
        for (task, prefix) in cfg.task_prefixes.iter().take(cfg.num_tasks).enumerate() {
            let label = format!("task{task}");
            let paths = wav_files(&stim_dir, prefix)?;
            let durs = durations
                .get(&label)
                .with_context(|| format!("no run provided durations for {label}"))?;

            let t = Instant::now();
            let wave = crate::audio::task_waveform(&paths, durs, cfg.audio_upsample_hz)?;
            log::info!(
                "assembled {label}: {} samples in {:.1?}",
                wave.ncols(),
                t.elapsed()
            );
            w.put_matrix(&label, &wave);
        }
        store.write("processed_Y", &w)
    }

    fn batchfy<S: TensorStore>(cfg: &GwilliamsConfig, store: &S) -> Result<WindowBank> {
        let x_file = store.read("processed_X")?;
        let y_file = store.read("processed_Y")?;
        let meg_len = cfg.meg_len();
        let audio_len = cfg.audio_len();

        let mut bank: Option<WindowBank> = None;
        for key in x_file.names() {
            let meg = x_file.matrix(key)?;
            let task = task_of_key(key)?;
            let audio = y_file
                .matrix(task)
                .with_context(|| format!("no stimulus waveform for {task}"))?;

            let (x, y) = batchify_recording(&meg, &audio, meg_len, audio_len)?;
            let count = x.shape()[0];
            if count == 0 {
                continue;
            }

            let subject = subject_of_key(key)?;
            let windows = WindowBank::new(x, y, vec![subject; count])?;
            match bank.as_mut() {
                Some(b) => b.extend(windows)?,
                None => bank = Some(windows),
            }
        }

        bank.context("no windows produced; every cached run came up empty")
    }
}

impl Dataset for GwilliamsDataset {
    fn len(&self) -> usize {
        self.bank.len()
    }

    fn get(&self, index: usize) -> Option<WindowSample> {
        self.bank.get(index)
    }
}
