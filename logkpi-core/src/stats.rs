//! Summary statistics over latency samples.

/// Arithmetic mean. `None` for an empty sample.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Quantile `q` (in `[0, 1]`) with linear interpolation between closest ranks.
///
/// Sorts `values` in place, then interpolates at the fractional rank
/// `q * (n - 1)`. This matches numpy's default `linear` method, including its
/// lerp form: past the midpoint it interpolates down from the upper value.
pub fn percentile(values: &mut [f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    values.sort_by(f64::total_cmp);

    let rank = q * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    Some(lerp(values[lo], values[hi], frac))
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let diff = b - a;
    if t >= 0.5 {
        b - diff * (1.0 - t)
    } else {
        a + diff * t
    }
}

/// Scale-then-round to 2 decimal places, ties to even.
///
/// Rounds `value * 100`, so a value just below a tie can land on it. This is
/// numpy's `round`, which the p90 column follows.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Correctly rounded to 2 decimal places: the exact binary value is rounded,
/// ties to even. Used for the mean.
pub fn round2_exact(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(&[120.0, 80.0]), Some(100.0));
        assert_eq!(mean(&[5.0]), Some(5.0));
    }

    #[test]
    fn percentile_of_empty_is_none() {
        assert_eq!(percentile(&mut [], 0.9), None);
    }

    #[test]
    fn p90_interpolates_between_ranks() {
        let mut values = [500.0, 100.0, 400.0, 200.0, 300.0];
        let p90 = percentile(&mut values, 0.9).unwrap();
        assert!((p90 - 460.0).abs() < 1e-9, "got {p90}");
    }

    #[test]
    fn p90_of_two_values() {
        let mut values = [120.0, 80.0];
        let p90 = percentile(&mut values, 0.9).unwrap();
        assert!((p90 - 116.0).abs() < 1e-9, "got {p90}");
    }

    #[test]
    fn percentile_of_single_value_is_that_value() {
        assert_eq!(percentile(&mut [42.5], 0.9), Some(42.5));
    }

    #[test]
    fn percentile_extremes_are_min_and_max() {
        let mut values = [3.0, 1.0, 2.0];
        assert_eq!(percentile(&mut values, 0.0), Some(1.0));
        assert_eq!(percentile(&mut values, 1.0), Some(3.0));
    }

    #[test]
    fn percentile_on_exact_rank_needs_no_interpolation() {
        // 0.5 * (5 - 1) = 2 → sorted[2]
        let mut values = [10.0, 50.0, 30.0, 20.0, 40.0];
        assert_eq!(percentile(&mut values, 0.5), Some(30.0));
    }

    #[test]
    fn round2_truncates_to_two_decimals() {
        assert_eq!(round2(100.0), 100.0);
        assert_eq!(round2(123.4567), 123.46);
        assert_eq!(round2(0.001), 0.0);
    }

    #[test]
    fn p90_past_midpoint_interpolates_from_upper_value() {
        let mut values = [375.77, 101.22];
        let p90 = percentile(&mut values, 0.9).unwrap();
        assert_eq!(round2(p90), 348.32);
    }

    #[test]
    fn round2_exact_does_not_round_up_below_tie() {
        // 359.075 is stored as 359.07499999999998863...
        let avg = mean(&[373.0, 345.15]).unwrap();
        assert_eq!(round2_exact(avg), 359.07);
        assert_eq!(round2(avg), 359.08);
    }

    #[test]
    fn round2_exact_ties_go_to_even() {
        assert_eq!(round2_exact(0.125), 0.12);
        assert_eq!(round2_exact(0.375), 0.38);
        assert_eq!(round2_exact(123.4567), 123.46);
        assert_eq!(round2_exact(100.0), 100.0);
    }

    #[test]
    fn round2_ties_go_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
    }
}
