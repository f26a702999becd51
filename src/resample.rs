//! FFT-based resampler exactly matching MNE's `resample(..., method='fft')`.
//!
//! Algorithm (from `mne/cuda.py _fft_resample`):
//!   1. Pad with reflect-limited samples on each side (auto npad).
//!   2. rfft(padded)  →  complex half-spectrum.
//!   3. If downsampling: double the Nyquist bin (use_len = new_len).
//!      If upsampling:   halve  the Nyquist bin (use_len = old_len).
//!   4. Scale all bins by `new_len_padded / old_len_padded`.
//!   5. irfft(spectrum, n=new_len_padded)  — irfft handles zero-padding or
//!      truncation of the spectrum automatically.
//!   6. Strip the resampled padding edges.
//!
//! Two entry points: [`resample`] converts between sample rates
//! (1000 Hz MEG → 120 Hz), [`resample_to_len`] hits an exact output length
//! (EEG resampled to the audio embedding count) and reports the effective
//! rate that results.
use anyhow::Result;
use ndarray::Array2;
use rustfft::FftPlanner;

/// Compute the auto npad as MNE does: pad to the next power of 2.
///
/// ```text
/// min_add = min(n // 8, 100) * 2
/// total   = 2^ceil(log2(n + min_add)) - n
/// npads   = [total // 2, total - total // 2]
/// ```
pub fn auto_npad(n: usize) -> (usize, usize) {
    let min_add = (n / 8).min(100) * 2;
    let sum = n + min_add;
    let next_pow2 = 1usize << ((sum as f64).log2().ceil() as u32);
    let total = next_pow2 - n;
    (total / 2, total - total / 2)
}

/// Resample `data` ([C, T]) from `src_sfreq` to `dst_sfreq`.
pub fn resample(data: &Array2<f32>, src_sfreq: f64, dst_sfreq: f64) -> Result<Array2<f32>> {
    if (src_sfreq - dst_sfreq).abs() < 1e-9 {
        return Ok(data.clone());
    }
    resample_by_ratio(data, dst_sfreq / src_sfreq)
}

/// Resample `data` ([C, T]) so the time axis has exactly `target_len`
/// samples. Returns the data and the effective sample rate
/// `src_sfreq * target_len / T`.
pub fn resample_to_len(
    data: &Array2<f32>,
    target_len: usize,
    src_sfreq: f64,
) -> Result<(Array2<f32>, f64)> {
    let n_in = data.ncols();
    let effective = src_sfreq * target_len as f64 / n_in as f64;
    if target_len == n_in {
        return Ok((data.clone(), effective));
    }
    let out = resample_by_ratio(data, target_len as f64 / n_in as f64)?;
    Ok((out, effective))
}

fn resample_by_ratio(data: &Array2<f32>, ratio: f64) -> Result<Array2<f32>> {
    let n_in = data.ncols();
    let final_len = (ratio * n_in as f64).round() as usize;
    let n_ch = data.nrows();

    let (npad_l, npad_r) = auto_npad(n_in);
    let mut out = Array2::<f32>::zeros((n_ch, final_len));
    for (row_in, mut row_out) in data.rows().into_iter().zip(out.rows_mut()) {
        let row: Vec<f32> = row_in.to_vec();
        let resampled = resample_1d(&row, ratio, npad_l, npad_r)?;
        row_out.assign(&ndarray::ArrayView1::from(&resampled));
    }
    Ok(out)
}

/// Resample a single 1-D f32 signal with explicit (possibly asymmetric) padding.
pub fn resample_1d(x: &[f32], ratio: f64, npad_l: usize, npad_r: usize) -> Result<Vec<f32>> {
    let n_in = x.len();
    if n_in == 0 {
        return Ok(vec![]);
    }
    let final_len = (ratio * n_in as f64).round() as usize;

    // --- 1. Reflect-limited padding (matches MNE's _smart_pad) ----------
    let pad_l = npad_l.min(n_in - 1);
    let pad_r = npad_r.min(n_in - 1);
    let old_len = n_in + pad_l + pad_r;
    // Note: if npad > n_in-1, MNE zero-pads the extra. We clamp to n_in-1.

    let mut x_ext = Vec::with_capacity(old_len);
    for i in (1..=pad_l).rev() {
        x_ext.push(2.0 * x[0] - x[i]);
    }
    x_ext.extend_from_slice(x);
    let last = x[n_in - 1];
    for i in 1..=pad_r {
        let idx = (n_in - 1).saturating_sub(i);
        x_ext.push(2.0 * last - x[idx]);
    }

    // --- 2. Compute padded output length ---------------------------------
    let new_len_padded = (ratio * old_len as f64).round() as usize;
    let shorter = new_len_padded < old_len;
    let use_len = if shorter { new_len_padded } else { old_len };

    // --- 3. rfft of padded signal ----------------------------------------
    // MNE uses scipy.fft.rfft which returns (n//2 + 1) complex coefficients.
    // We simulate rfft with a full FFT and take the first half.
    let mut planner: FftPlanner<f64> = FftPlanner::new();
    let fft = planner.plan_fft_forward(old_len);
    let mut buf: Vec<rustfft::num_complex::Complex<f64>> = x_ext
        .iter()
        .map(|&v| rustfft::num_complex::Complex { re: v as f64, im: 0.0 })
        .collect();
    fft.process(&mut buf);

    let rfft_len = old_len / 2 + 1;
    let mut x_fft: Vec<rustfft::num_complex::Complex<f64>> = buf[..rfft_len].to_vec();

    // --- 4. Handle Nyquist bin -------------------------------------------
    // MNE: if use_len % 2 == 0:
    //          nyq = use_len // 2
    //          x_fft[nyq] *= 2 if shorter else 0.5
    if use_len % 2 == 0 {
        let nyq = use_len / 2;
        if nyq < x_fft.len() {
            let factor = if shorter { 2.0 } else { 0.5 };
            x_fft[nyq] *= factor;
        }
    }

    // --- 5. Scale by new_len_padded / old_len_padded ---------------------
    // (This is what MNE's boxcar window does: W = scale * ones)
    let scale = new_len_padded as f64 / old_len as f64;
    for v in &mut x_fft {
        *v *= scale;
    }

    // --- 6. irfft(x_fft, n=new_len_padded) --------------------------------
    // irfft with n=new_len_padded:
    //   - if new_len_padded < old_len (downsampling): takes only x_fft[0..new_rfft_len],
    //     truncating high frequencies.
    //   - if new_len_padded > old_len (upsampling): zero-pads the spectrum.
    let new_rfft_len = new_len_padded / 2 + 1;
    let mut irfft_in =
        vec![rustfft::num_complex::Complex::<f64>::default(); new_len_padded];

    // Copy available spectrum (truncate or zero-pad).
    let n_copy = x_fft.len().min(new_rfft_len);
    irfft_in[..n_copy].copy_from_slice(&x_fft[..n_copy]);

    // Reconstruct full spectrum from half-spectrum (Hermitian symmetry).
    for i in 1..new_rfft_len {
        let idx = new_len_padded - i;
        if idx < new_len_padded && idx >= new_rfft_len {
            irfft_in[idx] = irfft_in[i].conj();
        }
    }

    let ifft = planner.plan_fft_inverse(new_len_padded);
    ifft.process(&mut irfft_in);
    let inv_scale = 1.0 / new_len_padded as f64;

    // --- 7. Strip padding ------------------------------------------------
    let to_remove_l = (ratio * npad_l as f64).round() as usize;
    let to_remove_r = new_len_padded - final_len - to_remove_l;
    let strip_end = new_len_padded.saturating_sub(to_remove_r);

    let mut result: Vec<f32> = irfft_in[to_remove_l..strip_end]
        .iter()
        .map(|c| (c.re * inv_scale) as f32)
        .collect();
    result.resize(final_len, 0.0);
    Ok(result)
}
