use crate::constants::DRIFT_EPSILON;

/// One good tick's peak location.
///
/// `peak_offset` starts out inside `[0, samples_per_tick)` but is signed:
/// window-shift corrections move old records to keep every record on the
/// alignment in effect after the shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakRecord {
    pub tick_index: u64,
    pub peak_offset: i64,
}

/// Median of all pairwise slopes between records, in samples of offset per
/// tick (the Kendall–Thiel robust line fit).
///
/// A minority of corrupted records moves the median far less than it would
/// move a least-squares slope. Returns `None` with fewer than two records.
pub fn pairwise_median_slope(records: &[PeakRecord]) -> Option<f64> {
    if records.len() < 2 {
        return None;
    }

    let mut slopes = Vec::with_capacity(records.len() * (records.len() - 1) / 2);
    for (i, a) in records.iter().enumerate() {
        for b in &records[i + 1..] {
            let run = (b.tick_index - a.tick_index) as f64;
            let rise = (b.peak_offset - a.peak_offset) as f64;
            slopes.push(rise / run);
        }
    }

    slopes.sort_unstable_by(f64::total_cmp);
    let mid = slopes.len() / 2;
    if slopes.len() % 2 == 1 {
        Some(slopes[mid])
    } else {
        Some((slopes[mid - 1] + slopes[mid]) / 2.0)
    }
}

/// Drift of the measured clock against the nominal tick rate.
///
/// Negative is a slow clock, positive a fast one. Derived on demand from
/// the record table; a table with fewer than two records yields a defined
/// zero-drift estimate rather than an error.
#[derive(Debug, Clone, Copy)]
pub struct DriftEstimate {
    pub seconds_per_day: f64,
    /// Records the estimate was computed over
    pub good_ticks: usize,
}

impl DriftEstimate {
    pub fn from_records(
        records: &[PeakRecord],
        frames_per_second: u32,
        ticks_per_hour: u32,
    ) -> Self {
        let seconds_per_day = match pairwise_median_slope(records) {
            Some(slope) => {
                // samples/tick -> seconds/tick -> seconds/hour -> seconds/day;
                // a peak arriving progressively sooner (negative slope) is a
                // fast clock.
                -slope / frames_per_second as f64 * ticks_per_hour as f64 * 24.0
            }
            None => 0.0,
        };
        Self {
            seconds_per_day,
            good_ticks: records.len(),
        }
    }

    pub fn direction(&self) -> &'static str {
        if self.seconds_per_day.abs() < DRIFT_EPSILON {
            "perfect"
        } else if self.seconds_per_day < 0.0 {
            "slow"
        } else {
            "fast"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn records_on_line(count: u64, intercept: i64, slope: i64) -> Vec<PeakRecord> {
        (0..count)
            .map(|i| PeakRecord {
                tick_index: i,
                peak_offset: intercept + slope * i as i64,
            })
            .collect()
    }

    /// Ordinary least-squares slope, for comparison in the robustness test
    fn least_squares_slope(records: &[PeakRecord]) -> f64 {
        let n = records.len() as f64;
        let mean_x = records.iter().map(|r| r.tick_index as f64).sum::<f64>() / n;
        let mean_y = records.iter().map(|r| r.peak_offset as f64).sum::<f64>() / n;
        let mut num = 0.0;
        let mut den = 0.0;
        for r in records {
            let dx = r.tick_index as f64 - mean_x;
            num += dx * (r.peak_offset as f64 - mean_y);
            den += dx * dx;
        }
        num / den
    }

    #[test]
    fn test_exact_line_recovers_slope() {
        for slope in [-3i64, 0, 2, 7] {
            let records = records_on_line(12, 500, slope);
            assert_relative_eq!(
                pairwise_median_slope(&records).unwrap(),
                slope as f64,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_estimator_is_pure() {
        let records = records_on_line(9, 100, 2);
        let first = DriftEstimate::from_records(&records, 44100, 3600);
        let second = DriftEstimate::from_records(&records, 44100, 3600);
        assert_eq!(first.seconds_per_day, second.seconds_per_day);
        assert_eq!(first.good_ticks, second.good_ticks);
    }

    #[test]
    fn test_outlier_moves_median_less_than_least_squares() {
        let mut records = records_on_line(9, 200, 2);
        records[4].peak_offset += 5000;

        let clean_slope = 2.0;
        let median_err = (pairwise_median_slope(&records).unwrap() - clean_slope).abs();
        let ls_err = (least_squares_slope(&records) - clean_slope).abs();

        assert!(
            median_err < ls_err,
            "median err {} not below least-squares err {}",
            median_err,
            ls_err
        );
        assert!(median_err < 0.5);
    }

    #[test]
    fn test_too_few_records_is_zero_drift() {
        let estimate = DriftEstimate::from_records(&[], 44100, 3600);
        assert_eq!(estimate.seconds_per_day, 0.0);
        assert_eq!(estimate.direction(), "perfect");

        let one = records_on_line(1, 42, 0);
        let estimate = DriftEstimate::from_records(&one, 44100, 3600);
        assert_eq!(estimate.seconds_per_day, 0.0);
    }

    #[test]
    fn test_unit_conversion_and_sign() {
        // Peak two samples later every tick: the clock ticks long, so it
        // loses time.
        let records = records_on_line(10, 1000, 2);
        let estimate = DriftEstimate::from_records(&records, 44100, 3600);
        assert_relative_eq!(
            estimate.seconds_per_day,
            -2.0 / 44100.0 * 3600.0 * 24.0,
            epsilon = 1e-9
        );
        assert_eq!(estimate.direction(), "slow");

        // Peak arriving sooner: a fast clock, gaining time
        let records = records_on_line(10, 1000, -2);
        let estimate = DriftEstimate::from_records(&records, 44100, 3600);
        assert!(estimate.seconds_per_day > 0.0);
        assert_eq!(estimate.direction(), "fast");
    }
}
