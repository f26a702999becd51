//! Robust per-channel scaling.
//!
//! Matches `sklearn.preprocessing.RobustScaler` fit on one recording:
//!   center = median(channel),  scale = IQR(channel) = q75 − q25
//!   channel = (channel − center) / scale
//! Percentiles use linear interpolation (numpy's default). A zero IQR
//! centers the channel but leaves the spread untouched, as sklearn does by
//! substituting 1 for the zero scale. Fits are per recording, never shared
//! across subjects or sessions.
use ndarray::Array2;

/// Linear-interpolated percentile of an ascending-sorted slice.
/// `q` in [0, 100]. Empty input yields 0.
pub fn percentile(sorted: &[f32], q: f64) -> f32 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let frac = pos - lo as f64;
    if frac == 0.0 || lo + 1 == sorted.len() {
        sorted[lo]
    } else {
        (sorted[lo] as f64 * (1.0 - frac) + sorted[lo + 1] as f64 * frac) as f32
    }
}

/// Scale every channel of `data` ([C, T]) in place by its median and IQR.
/// Returns the fitted `(center, scale)` per channel.
pub fn robust_scale_inplace(data: &mut Array2<f32>) -> Vec<(f32, f32)> {
    let mut fits = Vec::with_capacity(data.nrows());
    for mut row in data.rows_mut() {
        let mut sorted: Vec<f32> = row.to_vec();
        sorted.sort_unstable_by(f32::total_cmp);

        let center = percentile(&sorted, 50.0);
        let iqr = percentile(&sorted, 75.0) - percentile(&sorted, 25.0);
        let scale = if iqr > 0.0 { iqr } else { 1.0 };

        row.mapv_inplace(|v| (v - center) / scale);
        fits.push((center, scale));
    }
    fits
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn percentile_interpolates_linearly() {
        let a = [15.0_f32, 20.0, 35.0, 40.0, 50.0];
        // numpy.percentile(a, 40) == 29.0
        approx::assert_abs_diff_eq!(percentile(&a, 40.0), 29.0, epsilon = 1e-6_f32);
        approx::assert_abs_diff_eq!(percentile(&a, 0.0), 15.0, epsilon = 1e-6_f32);
        approx::assert_abs_diff_eq!(percentile(&a, 100.0), 50.0, epsilon = 1e-6_f32);
    }

    #[test]
    fn median_and_iqr_of_known_channel() {
        // Channel 1..=9: median 5, q25 = 3, q75 = 7, IQR = 4.
        let mut data = Array2::from_shape_fn((1, 9), |(_, t)| (t + 1) as f32);
        let fits = robust_scale_inplace(&mut data);
        assert_eq!(fits, vec![(5.0, 4.0)]);
        approx::assert_abs_diff_eq!(data[[0, 0]], -1.0, epsilon = 1e-6_f32);
        approx::assert_abs_diff_eq!(data[[0, 4]], 0.0, epsilon = 1e-6_f32);
        approx::assert_abs_diff_eq!(data[[0, 8]], 1.0, epsilon = 1e-6_f32);
    }

    #[test]
    fn channels_fit_independently() {
        let mut data = Array2::zeros((2, 5));
        data.row_mut(0).assign(&ndarray::arr1(&[1.0_f32, 2.0, 3.0, 4.0, 5.0]));
        data.row_mut(1).assign(&ndarray::arr1(&[10.0_f32, 20.0, 30.0, 40.0, 50.0]));
        let fits = robust_scale_inplace(&mut data);
        assert_eq!(fits[0].0, 3.0);
        assert_eq!(fits[1].0, 30.0);
        // Both channels normalise to the same profile.
        for t in 0..5 {
            approx::assert_abs_diff_eq!(data[[0, t]], data[[1, t]], epsilon = 1e-6_f32);
        }
    }

    #[test]
    fn constant_channel_centers_without_scaling() {
        let mut data = Array2::from_elem((1, 64), 7.0_f32);
        let fits = robust_scale_inplace(&mut data);
        assert_eq!(fits, vec![(7.0, 1.0)]);
        for &v in data.iter() {
            approx::assert_abs_diff_eq!(v, 0.0, epsilon = 1e-6_f32);
        }
    }

    #[test]
    fn unsorted_input_sorts_before_quantiles() {
        let mut data = Array2::zeros((1, 5));
        data.row_mut(0).assign(&ndarray::arr1(&[50.0_f32, 15.0, 40.0, 20.0, 35.0]));
        let fits = robust_scale_inplace(&mut data);
        assert_eq!(fits[0].0, 35.0);
    }
}
