//! FIR filter design matching MNE / `scipy.signal.firwin`.
//!
//! All kernels are Hamming-windowed sincs with MNE's automatic transition
//! bandwidths and lengths:
//!   • lower edge at `l_freq`: trans bw = min(max(0.25 * l_freq, 2.0), l_freq)
//!   • upper edge at `h_freq`: trans bw = min(max(0.25 * h_freq, 2.0), nyq - h_freq)
//!   • taps per transition    = ceil(3.3 / trans_bw * sfreq), rounded to odd
//! A highpass is a spectrally inverted lowpass; a bandpass is the difference
//! of the two edge lowpasses embedded centered in a common odd length.
use std::f64::consts::PI;

use anyhow::{bail, Result};

/// Transition bandwidth for a lower band edge (highpass side).
///
/// Rule: `min(max(0.25 * l_freq, 2.0), l_freq)`
pub fn lower_trans_bandwidth(l_freq: f32) -> f32 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

/// Transition bandwidth for an upper band edge (lowpass side).
///
/// Rule: `min(max(0.25 * h_freq, 2.0), sfreq / 2 - h_freq)`
pub fn upper_trans_bandwidth(h_freq: f32, sfreq: f32) -> f32 {
    (0.25 * h_freq).max(2.0).min(sfreq / 2.0 - h_freq)
}

/// Number of FIR taps for a given transition bandwidth.
/// Returns an odd integer (required for zero-phase linear-phase FIR).
///
/// Formula: `ceil(3.3 / trans_bw * sfreq)` rounded up to odd.
pub fn auto_filter_length(trans_bw: f32, sfreq: f32) -> usize {
    let n_raw = (3.3 / trans_bw * sfreq).ceil() as usize;
    if n_raw % 2 == 0 { n_raw + 1 } else { n_raw }
}

/// Hamming-windowed sinc lowpass prototype with unit DC gain.
///
/// `cutoff_hz` is the -6 dB point. `n` must be odd.
pub fn firwin(n: usize, cutoff_hz: f32, sfreq: f32) -> Vec<f64> {
    assert!(n % 2 == 1, "firwin requires odd N for linear-phase filter");
    let alpha = (n - 1) as f64 / 2.0;
    let nyq = sfreq as f64 / 2.0;
    let fc = cutoff_hz as f64 / nyq; // normalised [0, 1]

    let win = hamming(n);

    let mut h: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 - alpha;
            // f(x) = sin(π·fc·x) / (π·x);  lim_{x→0} f(x) = fc
            let sinc = if x == 0.0 { fc } else { (PI * fc * x).sin() / (PI * x) };
            sinc * win[i]
        })
        .collect();

    // Normalise so sum = 1 (unit DC gain).
    let s: f64 = h.iter().sum();
    h.iter_mut().for_each(|v| *v /= s);
    h
}

/// Hamming window of length `n`.
pub fn hamming(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Zero-phase highpass: unity above `l_freq`, -6 dB at `l_freq - trans_bw/2`.
///
/// Matches `mne.filter.create_filter(None, sfreq, l_freq=l_freq, h_freq=None,
///   fir_window='hamming', fir_design='firwin', phase='zero')`.
pub fn design_highpass(l_freq: f32, sfreq: f32) -> Vec<f32> {
    let trans_bw = lower_trans_bandwidth(l_freq);
    let n = auto_filter_length(trans_bw, sfreq);
    let h_lp = firwin(n, l_freq - trans_bw / 2.0, sfreq);

    // Spectral inversion: highpass = delta[N/2] - lowpass.
    let mut h: Vec<f64> = h_lp.iter().map(|&v| -v).collect();
    h[n / 2] += 1.0;
    h.iter().map(|&v| v as f32).collect()
}

/// Zero-phase lowpass: unity below `h_freq`, -6 dB at `h_freq + trans_bw/2`.
pub fn design_lowpass(h_freq: f32, sfreq: f32) -> Vec<f32> {
    let trans_bw = upper_trans_bandwidth(h_freq, sfreq);
    let n = auto_filter_length(trans_bw, sfreq);
    firwin(n, h_freq + trans_bw / 2.0, sfreq)
        .iter()
        .map(|&v| v as f32)
        .collect()
}

/// Zero-phase bandpass passing `l_freq..h_freq`.
///
/// Each edge gets its own transition bandwidth and tap count; the shorter
/// edge kernel is embedded centered in the longer one and the difference of
/// the two lowpasses forms the band.
pub fn design_bandpass(l_freq: f32, h_freq: f32, sfreq: f32) -> Vec<f32> {
    let tb_l = lower_trans_bandwidth(l_freq);
    let tb_h = upper_trans_bandwidth(h_freq, sfreq);
    let n_l = auto_filter_length(tb_l, sfreq);
    let n_h = auto_filter_length(tb_h, sfreq);
    let n = n_l.max(n_h);

    let lp_low = firwin(n_l, l_freq - tb_l / 2.0, sfreq);
    let lp_high = firwin(n_h, h_freq + tb_h / 2.0, sfreq);

    let mut h = vec![0.0_f64; n];
    let off_h = (n - n_h) / 2;
    for (i, &v) in lp_high.iter().enumerate() {
        h[off_h + i] += v;
    }
    let off_l = (n - n_l) / 2;
    for (i, &v) in lp_low.iter().enumerate() {
        h[off_l + i] -= v;
    }
    h.iter().map(|&v| v as f32).collect()
}

/// Pick the kernel for an optional band, `mne.filter.create_filter` style:
/// `(Some, None)` highpass, `(None, Some)` lowpass, `(Some, Some)` bandpass.
pub fn design_filter(l_freq: Option<f32>, h_freq: Option<f32>, sfreq: f32) -> Result<Vec<f32>> {
    let nyq = sfreq / 2.0;
    if let Some(l) = l_freq {
        if l <= 0.0 || l >= nyq {
            bail!("highpass cutoff {l} Hz outside (0, {nyq}) at sfreq {sfreq}");
        }
    }
    if let Some(h) = h_freq {
        if h <= 0.0 || h >= nyq {
            bail!("lowpass cutoff {h} Hz outside (0, {nyq}) at sfreq {sfreq}");
        }
    }
    match (l_freq, h_freq) {
        (Some(l), Some(h)) if l < h => Ok(design_bandpass(l, h, sfreq)),
        (Some(l), Some(h)) => bail!("band edges reversed: l_freq {l} >= h_freq {h}"),
        (Some(l), None) => Ok(design_highpass(l, sfreq)),
        (None, Some(h)) => Ok(design_lowpass(h, sfreq)),
        (None, None) => bail!("no band requested: l_freq and h_freq are both None"),
    }
}
