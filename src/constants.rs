//! Tuning constants for tick detection and window tracking
//!
//! These values control how many ticks make up a calibration group, how
//! many top-amplitude positions the peak analyzer ranks per tick, and when
//! the tracking window is re-centered on a drifting tick.

/// Number of ticks read and analyzed as one group during the initial
/// calibration pass. The sample buffer is sized to hold a whole group.
pub const TICKS_PER_GROUP: usize = 20;

/// Number of top-amplitude sample positions ranked per tick slice when
/// locating the peak.
pub const PEAK_SAMPLES: usize = 20;

/// How many of the ranked positions may sit inside an edge margin before
/// the tick is classified as a boundary tick (both edges at this count, or
/// either edge alone at double it). Also the trim depth applied to each end
/// of the sorted positions before measuring their spread.
pub const PEAK_EDGE_COUNT_LIMIT: usize = PEAK_SAMPLES * 5 / 100;

/// Numerator of the spread limit: a tick is good only when the trimmed
/// positions span less than `samples_per_tick * PEAK_SPREAD_LIMIT /
/// PEAK_SAMPLES`. The same fraction defines the edge margin width.
pub const PEAK_SPREAD_LIMIT: usize = PEAK_SAMPLES * 5 / 100;

/// Percentage of the tick slice at either end that classifies a good peak
/// as early or late for window-tracking purposes.
pub const SHIFT_POINT_PERCENT: usize = 10;

/// Consecutive early (or late) peaks required before the tracker commits
/// to re-centering the detection window.
pub const SHIFT_RUN_LENGTH: usize = 3;

/// Percentage of a calibration group that may be boundary ticks before the
/// whole group is re-aligned by half a tick and retried.
pub const CALIBRATION_BOUNDARY_PERCENT: usize = 75;

/// Number of most-recent peak records used for the periodic partial drift
/// estimate printed with `--stats`.
pub const STATS_WINDOW_TICKS: usize = 60;

/// Drift magnitudes below this many seconds/day are reported as "perfect".
pub const DRIFT_EPSILON: f64 = 1e-6;
