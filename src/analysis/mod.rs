pub mod buffer;
pub mod estimator;
pub mod meter;
pub mod peak;
pub mod tracker;

pub use buffer::SampleBuffer;
pub use estimator::{DriftEstimate, PeakRecord, pairwise_median_slope};
pub use meter::DriftMeter;
pub use peak::{TickAnalyzer, TickClass, TickTiming};
pub use tracker::{ShiftDecision, TickTracker};
