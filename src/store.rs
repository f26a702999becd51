//! Cache storage for preprocessed tensors.
//!
//! Dataset builders talk to a [`TensorStore`] instead of the filesystem so
//! that the expensive preprocessing stages can be cached, resumed after an
//! interruption, and exercised hermetically in tests. [`DiskStore`] is the
//! production backend; [`MemStore`] keeps everything in memory.
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::io::{TensorFile, TensorWriter};

/// Keyed storage for tensor containers and JSON sidecars.
///
/// Keys are logical names like `processed_X`; the backend decides how they
/// map to actual storage. A read of a missing key is an error, so callers
/// gate reads on [`exists`](TensorStore::exists).
pub trait TensorStore {
    fn exists(&self, key: &str) -> bool;
    fn exists_json(&self, key: &str) -> bool;
    fn read(&self, key: &str) -> Result<TensorFile>;
    fn write(&self, key: &str, writer: &TensorWriter) -> Result<()>;
    fn read_json(&self, key: &str) -> Result<serde_json::Value>;
    fn write_json(&self, key: &str, value: &serde_json::Value) -> Result<()>;
}

/// Directory-backed store: `{root}/{key}.safetensors` and `{root}/{key}.json`.
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Create the store rooted at `root`, making the directory if needed.
    pub fn new<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("creating cache dir {}", root.display()))?;
        Ok(Self { root })
    }

    fn tensor_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.safetensors"))
    }

    fn json_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl TensorStore for DiskStore {
    fn exists(&self, key: &str) -> bool {
        self.tensor_path(key).is_file()
    }

    fn exists_json(&self, key: &str) -> bool {
        self.json_path(key).is_file()
    }

    fn read(&self, key: &str) -> Result<TensorFile> {
        TensorFile::open(self.tensor_path(key))
    }

    fn write(&self, key: &str, writer: &TensorWriter) -> Result<()> {
        writer.write(self.tensor_path(key))
    }

    fn read_json(&self, key: &str) -> Result<serde_json::Value> {
        let path = self.json_path(key);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    fn write_json(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let path = self.json_path(key);
        let text = serde_json::to_string_pretty(value)?;
        fs::write(&path, text).with_context(|| format!("writing {}", path.display()))
    }
}

/// In-memory store for tests. Serializes through the same container format
/// as [`DiskStore`] so round-trip behavior matches.
#[derive(Default)]
pub struct MemStore {
    tensors: RefCell<HashMap<String, Vec<u8>>>,
    json: RefCell<HashMap<String, serde_json::Value>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TensorStore for MemStore {
    fn exists(&self, key: &str) -> bool {
        self.tensors.borrow().contains_key(key)
    }

    fn exists_json(&self, key: &str) -> bool {
        self.json.borrow().contains_key(key)
    }

    fn read(&self, key: &str) -> Result<TensorFile> {
        match self.tensors.borrow().get(key) {
            Some(bytes) => TensorFile::from_bytes(bytes.clone()),
            None => bail!("no cached tensor under key {key:?}"),
        }
    }

    fn write(&self, key: &str, writer: &TensorWriter) -> Result<()> {
        let bytes = writer.to_bytes()?;
        self.tensors.borrow_mut().insert(key.to_string(), bytes);
        Ok(())
    }

    fn read_json(&self, key: &str) -> Result<serde_json::Value> {
        match self.json.borrow().get(key) {
            Some(v) => Ok(v.clone()),
            None => bail!("no cached json under key {key:?}"),
        }
    }

    fn write_json(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        self.json.borrow_mut().insert(key.to_string(), value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn check_round_trip(store: &dyn TensorStore) {
        assert!(!store.exists("processed_X"));

        let mut w = TensorWriter::new();
        w.put_matrix("subject01", &arr2(&[[1.0_f32, 2.0], [3.0, 4.0]]));
        w.put_scalar_f64("srate", 120.0);
        store.write("processed_X", &w).unwrap();

        assert!(store.exists("processed_X"));
        let file = store.read("processed_X").unwrap();
        assert_eq!(file.names(), vec!["srate", "subject01"]);
        assert_eq!(file.matrix("subject01").unwrap(), arr2(&[[1.0, 2.0], [3.0, 4.0]]));
        approx::assert_abs_diff_eq!(file.scalar_f64("srate").unwrap(), 120.0);
    }

    fn check_json_round_trip(store: &dyn TensorStore) {
        assert!(!store.exists_json("real_durations"));
        let value = serde_json::json!({"task0": [12.5, 3.25]});
        store.write_json("real_durations", &value).unwrap();
        assert!(store.exists_json("real_durations"));
        assert_eq!(store.read_json("real_durations").unwrap(), value);
    }

    #[test]
    fn disk_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path().join("cache")).unwrap();
        check_round_trip(&store);
        check_json_round_trip(&store);
        assert!(dir.path().join("cache/processed_X.safetensors").is_file());
        assert!(dir.path().join("cache/real_durations.json").is_file());
    }

    #[test]
    fn mem_store_round_trips() {
        let store = MemStore::new();
        check_round_trip(&store);
        check_json_round_trip(&store);
    }

    #[test]
    fn missing_keys_error() {
        let store = MemStore::new();
        assert!(store.read("nope").is_err());
        assert!(store.read_json("nope").is_err());
    }
}
