//! End-to-end runs of the EEG pipeline on a synthetic corpus.
mod common;

use std::path::{Path, PathBuf};

use common::{tone, write_raw, write_wav};
use cortalign::{BrennanConfig, BrennanDataset, CosineBankEncoder, Dataset, DiskStore};

/// Lay out `subjects` EEG recordings (3 ch, 10 s at 64 Hz) plus 1 s of
/// merged stimulus at the encoder's input rate.
fn synth_corpus(root: &Path, subjects: usize) {
    std::fs::create_dir_all(root.join("raw")).unwrap();
    std::fs::create_dir_all(root.join("audio")).unwrap();

    for i in 0..subjects {
        write_raw(
            &root.join("raw").join(format!("S{:02}.safetensors", i + 1)),
            3,
            640,
            64.0,
            move |c, t| (0.3 * (t as f32 + c as f32 * 7.0)).sin() + i as f32,
        );
    }
    write_wav(
        &root.join("audio").join("merged_audio.wav"),
        16_000,
        &tone(16_000, 16_000.0, 440.0),
    );
}

fn small_cfg(root: PathBuf) -> BrennanConfig {
    BrennanConfig {
        data_root: root,
        seq_len: 10,
        shift_ms: 200.0,
        num_channels: 2,
        ..BrennanConfig::default()
    }
}

#[test]
fn end_to_end_two_subjects() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("Brennan2018");
    synth_corpus(&root, 2);

    let store = DiskStore::new(dir.path().join("cache")).unwrap();
    let encoder = CosineBankEncoder::new(4, 320);
    let ds = BrennanDataset::build(&small_cfg(root), &encoder, &store).unwrap();

    // 16000 stimulus samples embed to 50 frames; the EEG resamples down to
    // match, giving 64 * 50/640 = 5 Hz. 200 ms is then 1 sample of shift,
    // 49 usable samples, 4 ten-sample windows per subject.
    approx::assert_abs_diff_eq!(ds.srate(), 5.0, epsilon = 1e-9);
    assert_eq!(ds.len(), 8);

    let subjects: Vec<_> = (0..ds.len()).map(|i| ds.get(i).unwrap().subject).collect();
    assert_eq!(subjects, vec![0, 0, 0, 0, 1, 1, 1, 1]);

    let sample = ds.get(5).unwrap();
    assert_eq!(sample.brain.shape(), &[2, 10]);
    assert_eq!(sample.audio.shape(), &[4, 10]);
    // The audio side is shared across subjects.
    assert_eq!(sample.audio, ds.get(1).unwrap().audio);

    assert!(dir.path().join("cache/processed_X.safetensors").is_file());
    assert!(dir
        .path()
        .join("cache/embd_cosbank4x320.safetensors")
        .is_file());
}

#[test]
fn rebuild_runs_from_cache_alone() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("Brennan2018");
    synth_corpus(&root, 2);

    let store = DiskStore::new(dir.path().join("cache")).unwrap();
    let encoder = CosineBankEncoder::new(4, 320);
    let first = BrennanDataset::build(&small_cfg(root.clone()), &encoder, &store).unwrap();

    // Remove the corpus; the second build must not miss it.
    std::fs::remove_dir_all(&root).unwrap();
    let second = BrennanDataset::build(&small_cfg(root), &encoder, &store).unwrap();

    assert_eq!(second.len(), first.len());
    approx::assert_abs_diff_eq!(second.srate(), first.srate(), epsilon = 1e-12);
    let (a, b) = (first.get(3).unwrap(), second.get(3).unwrap());
    assert_eq!(a.brain, b.brain);
    assert_eq!(a.audio, b.audio);
}

#[test]
fn exclusions_apply_before_the_subject_cap() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("Brennan2018");
    synth_corpus(&root, 3);

    let store = DiskStore::new(dir.path().join("cache")).unwrap();
    let encoder = CosineBankEncoder::new(4, 320);
    let cfg = BrennanConfig {
        excluded_subjects: vec![0],
        num_subjects: Some(1),
        ..small_cfg(root)
    };
    let ds = BrennanDataset::build(&cfg, &encoder, &store).unwrap();

    // Only S02 survives the exclusion and the cap: one subject's windows.
    assert_eq!(ds.len(), 4);
    assert!((0..ds.len()).all(|i| ds.get(i).unwrap().subject == 0));

    // S02's recordings carry a +1.0 offset; after robust scaling the windows
    // must still be finite, non-constant signal.
    let sample = ds.get(0).unwrap();
    assert!(sample.brain.iter().all(|v| v.is_finite()));
    assert!(sample.brain.iter().any(|v| v.abs() > 1e-3));
}
