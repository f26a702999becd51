//! Tensor container I/O.
//!
//! Raw recordings and cached intermediates travel as safetensors files:
//! a little-endian `u64` header length, a JSON header mapping tensor names
//! to `{dtype, shape, data_offsets}`, then the concatenated payload bytes.
//! The same format is written by the out-of-crate converters that turn the
//! study-specific raw formats into plain arrays, so no tensor runtime is
//! needed on either side.
//!
//! Reading is dtype-tolerant (F32/F64/I32 all land in `f32` arrays); writing
//! emits F32 matrices and F64 scalars. Multi-entry files support the
//! incremental read-modify-write cache pattern via [`TensorWriter::copy_all`].
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::Array2;

// ── Reader ────────────────────────────────────────────────────────────────

/// A parsed tensor container, entries addressable by name.
pub struct TensorFile {
    bytes: Vec<u8>,
    header: serde_json::Value,
    data_start: usize,
}

impl TensorFile {
    /// Read and parse `path`. Fails on truncated files or malformed headers.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading tensor file {}", path.display()))?;
        Self::from_bytes(bytes).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parse an in-memory container.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < 8 {
            bail!("tensor container too small: {} bytes", bytes.len());
        }
        let n = u64::from_le_bytes(bytes[..8].try_into().unwrap()) as usize;
        if bytes.len() < 8 + n {
            bail!("tensor header truncated");
        }
        let header: serde_json::Value = serde_json::from_slice(&bytes[8..8 + n])
            .context("parsing tensor header")?;
        if !header.is_object() {
            bail!("tensor header is not a JSON object");
        }
        Ok(Self { bytes, header, data_start: 8 + n })
    }

    /// Entry names, sorted (the header map is ordered by key).
    pub fn names(&self) -> Vec<&str> {
        self.header
            .as_object()
            .map(|m| m.keys().map(String::as_str).filter(|k| *k != "__metadata__").collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.header.get(name).is_some()
    }

    /// Load a 2-D entry as `f32`, converting from F64/I32 payloads if needed.
    pub fn matrix(&self, name: &str) -> Result<Array2<f32>> {
        let (values, shape) = self.values_f64(name)?;
        if shape.len() != 2 {
            bail!("entry '{name}' has shape {shape:?}, expected 2-D");
        }
        let data: Vec<f32> = values.into_iter().map(|v| v as f32).collect();
        Array2::from_shape_vec((shape[0], shape[1]), data)
            .with_context(|| format!("shaping entry '{name}'"))
    }

    /// Load a single-element entry as `f64`.
    pub fn scalar_f64(&self, name: &str) -> Result<f64> {
        let (values, _) = self.values_f64(name)?;
        match values.first() {
            Some(&v) => Ok(v),
            None => bail!("entry '{name}' is empty"),
        }
    }

    /// Raw payload view plus dtype/shape, for byte-exact copies.
    fn raw_entry(&self, name: &str) -> Result<(&str, Vec<usize>, &[u8])> {
        let entry = self
            .header
            .get(name)
            .with_context(|| format!("missing tensor entry '{name}'"))?;
        let dtype = entry["dtype"]
            .as_str()
            .with_context(|| format!("entry '{name}' has no dtype"))?;
        let shape: Vec<usize> = entry["shape"]
            .as_array()
            .with_context(|| format!("entry '{name}' has no shape"))?
            .iter()
            .map(|v| v.as_u64().unwrap_or(0) as usize)
            .collect();
        let offsets = entry["data_offsets"]
            .as_array()
            .with_context(|| format!("entry '{name}' has no data_offsets"))?;
        if offsets.len() != 2 {
            bail!("entry '{name}' has malformed data_offsets");
        }
        let s = offsets[0].as_u64().unwrap_or(0) as usize;
        let e = offsets[1].as_u64().unwrap_or(0) as usize;
        if self.data_start + e > self.bytes.len() || s > e {
            bail!("entry '{name}' offsets out of bounds");
        }
        Ok((dtype, shape, &self.bytes[self.data_start + s..self.data_start + e]))
    }

    fn values_f64(&self, name: &str) -> Result<(Vec<f64>, Vec<usize>)> {
        let (dtype, shape, raw) = self.raw_entry(name)?;
        let values: Vec<f64> = match dtype {
            "F32" => raw
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes(b.try_into().unwrap()) as f64)
                .collect(),
            "F64" => raw
                .chunks_exact(8)
                .map(|b| f64::from_le_bytes(b.try_into().unwrap()))
                .collect(),
            "I32" => raw
                .chunks_exact(4)
                .map(|b| i32::from_le_bytes(b.try_into().unwrap()) as f64)
                .collect(),
            other => bail!("entry '{name}' has unsupported dtype {other}"),
        };
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            bail!("entry '{name}': {} values for shape {shape:?}", values.len());
        }
        Ok((values, shape))
    }
}

// ── Writer ────────────────────────────────────────────────────────────────

/// Builder for a tensor container file.
#[derive(Default)]
pub struct TensorWriter {
    entries: Vec<(String, &'static str, Vec<usize>, Vec<u8>)>,
}

impl TensorWriter {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Add (or replace) a 2-D F32 entry.
    pub fn put_matrix(&mut self, name: &str, data: &Array2<f32>) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.put_raw(name, "F32", vec![data.nrows(), data.ncols()], bytes);
    }

    /// Add (or replace) a single-element F64 entry.
    pub fn put_scalar_f64(&mut self, name: &str, value: f64) {
        self.put_raw(name, "F64", vec![1], value.to_le_bytes().to_vec());
    }

    /// Copy every entry of an existing file byte-for-byte. Entries later
    /// re-added under the same name replace the copies; this is the
    /// read-modify-write step of the incremental cache.
    pub fn copy_all(&mut self, source: &TensorFile) -> Result<()> {
        for name in source.names() {
            let (dtype, shape, raw) = source.raw_entry(name)?;
            let dtype: &'static str = match dtype {
                "F32" => "F32",
                "F64" => "F64",
                "I32" => "I32",
                other => bail!("cannot copy entry '{name}' of dtype {other}"),
            };
            self.put_raw(name, dtype, shape, raw.to_vec());
        }
        Ok(())
    }

    pub fn put_raw(&mut self, name: &str, dtype: &'static str, shape: Vec<usize>, bytes: Vec<u8>) {
        self.entries.retain(|(n, ..)| n != name);
        self.entries.push((name.to_string(), dtype, shape, bytes));
    }

    /// Serialize to an in-memory container.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut header = serde_json::Map::new();
        let mut offset = 0usize;
        for (name, dtype, shape, bytes) in &self.entries {
            header.insert(
                name.clone(),
                serde_json::json!({
                    "dtype": dtype,
                    "shape": shape,
                    "data_offsets": [offset, offset + bytes.len()],
                }),
            );
            offset += bytes.len();
        }
        let header_bytes = serde_json::to_vec(&header)?;
        // Pad the header to an 8-byte boundary so payloads stay aligned.
        let pad = (8 - header_bytes.len() % 8) % 8;

        let mut out = Vec::with_capacity(8 + header_bytes.len() + pad + offset);
        out.write_all(&((header_bytes.len() + pad) as u64).to_le_bytes())?;
        out.write_all(&header_bytes)?;
        out.write_all(&b" ".repeat(pad))?;
        for (_, _, _, bytes) in &self.entries {
            out.write_all(bytes)?;
        }
        Ok(out)
    }

    /// Serialize to `path`, creating parent directories as needed.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(path, self.to_bytes()?)
            .with_context(|| format!("writing {}", path.display()))
    }
}
