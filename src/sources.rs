//! Corpus layouts on disk.
//!
//! Raw electrophysiology lives in tensor containers carrying a `data`
//! matrix (`[channels, samples]`) and an `sfreq` scalar. The two supported
//! layouts:
//!
//! ```text
//! Brennan2018/                      Gwilliams2022/
//! ├── raw/S01.safetensors           ├── sub-01/ses-0/meg/
//! ├── raw/S02.safetensors           │   ├── sub-01_ses-0_task-0_meg.safetensors
//! ├── ...                           │   ├── sub-01_ses-0_task-0_events.tsv
//! └── audio/merged_audio.wav        │   └── ...
//!                                   └── stimuli/audio/lw1_0.wav, ...
//! ```
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ndarray::Array2;

use crate::annot::{parse_events, Annotation};
use crate::io::TensorFile;

// ── Natural ordering ─────────────────────────────────────────────────────

/// Compare strings with embedded numbers by value, so `S2 < S10`.
/// Digit runs compare numerically (leading zeros ignored, shorter run of
/// equal value first), everything else byte-wise.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let run = |s: &[u8], mut k: usize| {
                let start = k;
                while k < s.len() && s[k].is_ascii_digit() {
                    k += 1;
                }
                (start, k)
            };
            let (ai, ae) = run(a, i);
            let (bi, be) = run(b, j);
            let trim = |s: &[u8]| {
                let mut t = s;
                while t.len() > 1 && t[0] == b'0' {
                    t = &t[1..];
                }
                t
            };
            let da = trim(&a[ai..ae]);
            let db = trim(&b[bi..be]);
            let ord = da.len().cmp(&db.len()).then_with(|| da.cmp(db));
            if ord != Ordering::Equal {
                return ord;
            }
            i = ae;
            j = be;
        } else {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                ord => return ord,
            }
        }
    }
    (a.len() - i).cmp(&(b.len() - j))
}

/// Sort paths by the natural order of their file names.
pub fn natural_sorted(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort_by(|x, y| {
        let xs = x.file_name().map(|n| n.to_string_lossy().into_owned());
        let ys = y.file_name().map(|n| n.to_string_lossy().into_owned());
        natural_cmp(xs.as_deref().unwrap_or(""), ys.as_deref().unwrap_or(""))
    });
    paths
}

// ── File discovery ───────────────────────────────────────────────────────

/// All `raw/*.safetensors` under `root`, natural-sorted. One file per
/// subject; position in this list is the subject index.
pub fn brennan_raw_files(root: &Path) -> Result<Vec<PathBuf>> {
    let raw_dir = root.join("raw");
    let mut files = Vec::new();
    let entries = fs::read_dir(&raw_dir)
        .with_context(|| format!("listing {}", raw_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("safetensors") {
            files.push(path);
        }
    }
    if files.is_empty() {
        bail!("no raw recordings under {}", raw_dir.display());
    }
    Ok(natural_sorted(files))
}

/// The `.wav` files in `dir` whose names start with `prefix`, natural-sorted.
pub fn wav_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_wav = path.extension().and_then(|e| e.to_str()) == Some("wav");
        let starts = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(prefix));
        if is_wav && starts {
            files.push(path);
        }
    }
    if files.is_empty() {
        bail!("no {prefix}*.wav under {}", dir.display());
    }
    Ok(natural_sorted(files))
}

// ── Raw loading ──────────────────────────────────────────────────────────

/// Read one raw container: the `data` matrix and its `sfreq`.
pub fn load_raw(path: &Path) -> Result<(Array2<f32>, f64)> {
    let file = TensorFile::open(path)?;
    let data = file
        .matrix("data")
        .with_context(|| format!("no data matrix in {}", path.display()))?;
    let sfreq = file
        .scalar_f64("sfreq")
        .with_context(|| format!("no sfreq in {}", path.display()))?;
    if sfreq <= 0.0 {
        bail!("non-positive sfreq {sfreq} in {}", path.display());
    }
    Ok((data, sfreq))
}

/// Keep the first `n` channels, the convention for discarding reference and
/// auxiliary rows appended after the scalp/sensor block.
pub fn keep_channels(data: Array2<f32>, n: usize) -> Result<Array2<f32>> {
    if data.nrows() < n {
        bail!("recording has {} channels, need {n}", data.nrows());
    }
    if data.nrows() == n {
        return Ok(data);
    }
    Ok(data.slice(ndarray::s![..n, ..]).to_owned())
}

// ── Session-based layout ─────────────────────────────────────────────────

/// One acquisition run: a subject listening to one task in one session.
/// All indices are zero-based; file names use one-based subject numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordingId {
    pub subject: usize,
    pub session: usize,
    pub task: usize,
}

impl RecordingId {
    /// Cache key for this run, e.g. `subject01_sess0_task0`.
    pub fn description(&self) -> String {
        format!(
            "subject{:02}_sess{}_task{}",
            self.subject + 1,
            self.session,
            self.task
        )
    }

    fn stem(&self) -> String {
        format!(
            "sub-{:02}_ses-{}_task-{}",
            self.subject + 1,
            self.session,
            self.task
        )
    }

    fn meg_dir(&self, root: &Path) -> PathBuf {
        root.join(format!("sub-{:02}", self.subject + 1))
            .join(format!("ses-{}", self.session))
            .join("meg")
    }

    /// Path of this run's raw sensor container.
    pub fn meg_path(&self, root: &Path) -> PathBuf {
        self.meg_dir(root).join(format!("{}_meg.safetensors", self.stem()))
    }

    /// Path of this run's events table.
    pub fn events_path(&self, root: &Path) -> PathBuf {
        self.meg_dir(root).join(format!("{}_events.tsv", self.stem()))
    }
}

/// Parse an events table from disk.
pub fn load_events(path: &Path) -> Result<Vec<Annotation>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_events(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Recover the zero-based subject index from a run key like
/// `subject01_sess0_task0`.
pub fn subject_of_key(key: &str) -> Result<usize> {
    let head = key
        .split('_')
        .next()
        .and_then(|h| h.strip_prefix("subject"))
        .with_context(|| format!("malformed run key {key:?}"))?;
    let one_based: usize = head
        .parse()
        .with_context(|| format!("malformed run key {key:?}"))?;
    if one_based == 0 {
        bail!("malformed run key {key:?}");
    }
    Ok(one_based - 1)
}

/// Recover the task label (`task{t}`) from a run key.
pub fn task_of_key(key: &str) -> Result<&str> {
    match key.rsplit('_').next() {
        Some(t) if t.starts_with("task") => Ok(t),
        _ => bail!("malformed run key {key:?}"),
    }
}
