/// Shared helpers for building synthetic corpora on disk.
use std::path::Path;

use cortalign::io::TensorWriter;
use ndarray::Array2;

#[allow(unused)]
/// Write a raw recording container (`data` [C, T] plus `sfreq`).
pub fn write_raw<F>(path: &Path, channels: usize, len: usize, sfreq: f64, value: F)
where
    F: Fn(usize, usize) -> f32,
{
    let data = Array2::from_shape_fn((channels, len), |(c, t)| value(c, t));
    let mut w = TensorWriter::new();
    w.put_matrix("data", &data);
    w.put_scalar_f64("sfreq", sfreq);
    w.write(path).unwrap();
}

#[allow(unused)]
/// Write a mono 16-bit PCM WAV from samples in [-1, 1].
pub fn write_wav(path: &Path, rate: u32, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut w = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        w.write_sample(v).unwrap();
    }
    w.finalize().unwrap();
}

#[allow(unused)]
/// `len` samples of a half-amplitude sine at `hz`, sampled at `rate`.
pub fn tone(len: usize, rate: f64, hz: f64) -> Vec<f32> {
    (0..len)
        .map(|t| (0.5 * (2.0 * std::f64::consts::PI * hz * t as f64 / rate).sin()) as f32)
        .collect()
}
