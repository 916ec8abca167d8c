use rolling_stats::Stats;

use crate::analysis::buffer::SampleBuffer;
use crate::analysis::estimator::{DriftEstimate, PeakRecord};
use crate::analysis::peak::{TickAnalyzer, TickClass, TickTiming};
use crate::analysis::tracker::{ShiftDecision, TickTracker};
use crate::audio::SampleSource;
use crate::cancel::CancelToken;
use crate::config::EscapementConfig;
use crate::constants::{CALIBRATION_BOUNDARY_PERCENT, STATS_WINDOW_TICKS, TICKS_PER_GROUP};
use crate::error::{EscapementError, Result};
use crate::vu::render_envelope;

/// One measurement run's entire mutable state.
///
/// Owns the sliding sample buffer, the peak analyzer, the adaptive window
/// tracker and the peak record table. Construct one per run; nothing here
/// is shared or global, so independent runs (and tests) cannot interfere.
pub struct DriftMeter {
    samples_per_tick: usize,
    frames_per_second: u32,
    ticks_per_hour: u32,

    buffer: SampleBuffer,
    analyzer: TickAnalyzer,
    tracker: TickTracker,

    records: Vec<PeakRecord>,
    tick_index: u64,
    boundary_ticks: usize,
    pending_shift: Option<ShiftDecision>,

    show_ticks: bool,
    show_stats: bool,
    offset_stats: Stats<f64>,
    good_since_stats: usize,
    interrupted: bool,
}

impl DriftMeter {
    /// Build a meter for a source running at `frames_per_second`.
    ///
    /// The buffer holds one calibration group plus slack for the
    /// lengthened reads the tracker can request; the record table is
    /// bounded by one hour of ticks.
    pub fn new(config: &EscapementConfig, frames_per_second: u32) -> Result<Self> {
        let ticks_per_hour = config.analysis.ticks_per_hour.per_hour();
        let samples_per_tick = config
            .analysis
            .ticks_per_hour
            .samples_per_tick(frames_per_second)?;

        Ok(Self {
            samples_per_tick,
            frames_per_second,
            ticks_per_hour,
            buffer: SampleBuffer::new((TICKS_PER_GROUP + 2) * samples_per_tick),
            analyzer: TickAnalyzer::new(samples_per_tick),
            tracker: TickTracker::new(samples_per_tick),
            records: Vec::with_capacity(ticks_per_hour as usize),
            tick_index: 0,
            boundary_ticks: 0,
            pending_shift: None,
            show_ticks: config.report.show_ticks,
            show_stats: config.report.show_stats,
            offset_stats: Stats::new(),
            good_since_stats: 0,
            interrupted: false,
        })
    }

    pub fn samples_per_tick(&self) -> usize {
        self.samples_per_tick
    }

    /// Ticks analyzed so far, good or not
    pub fn ticks_analyzed(&self) -> u64 {
        self.tick_index
    }

    pub fn records(&self) -> &[PeakRecord] {
        &self.records
    }

    /// Whether the run stopped on a cancellation request
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// Run one full measurement: calibration, then adaptive tracking until
    /// end of stream, one hour of ticks, or cancellation. Always returns
    /// the estimate over whatever was collected.
    pub fn run(
        &mut self,
        source: &mut dyn SampleSource,
        cancel: &CancelToken,
    ) -> Result<DriftEstimate> {
        self.calibrate(source)?;
        self.track(source, cancel)?;
        Ok(self.estimate())
    }

    /// Drift over the whole record table
    pub fn estimate(&self) -> DriftEstimate {
        DriftEstimate::from_records(&self.records, self.frames_per_second, self.ticks_per_hour)
    }

    /// Drift over the most recent `window` records
    pub fn estimate_recent(&self, window: usize) -> DriftEstimate {
        let start = self.records.len().saturating_sub(window);
        DriftEstimate::from_records(
            &self.records[start..],
            self.frames_per_second,
            self.ticks_per_hour,
        )
    }

    /// Initial calibration: analyze one whole group of ticks at nominal
    /// spacing. If most peaks land at the window edges the nominal
    /// alignment straddles the ticks, so shift by half a tick and retry
    /// exactly once; failing again means the assumed tick rate is too far
    /// off for any alignment to work.
    fn calibrate(&mut self, source: &mut dyn SampleSource) -> Result<()> {
        self.analyze_calibration_group(source)?;

        if !self.excessive_boundary_ticks() {
            log::info!(
                "calibrated: {} of {} ticks good",
                self.records.len(),
                TICKS_PER_GROUP
            );
            return Ok(());
        }

        log::warn!(
            "calibration found {} of {} boundary ticks; re-aligning by half a tick",
            self.boundary_ticks,
            TICKS_PER_GROUP
        );

        // The old alignment's offsets mean nothing under the new one
        self.records.clear();
        self.tick_index = 0;
        self.boundary_ticks = 0;
        self.offset_stats = Stats::new();

        let half = self.samples_per_tick / 2;
        let got = self.buffer.fill_from(source, half)?;
        if got < half {
            return Err(EscapementError::InsufficientData {
                needed: half,
                available: got,
            });
        }
        self.buffer.advance_analyze(half)?;

        self.analyze_calibration_group(source)?;

        if self.excessive_boundary_ticks() {
            return Err(EscapementError::CalibrationFailed {
                boundary_ticks: self.boundary_ticks,
                group_ticks: TICKS_PER_GROUP,
            });
        }
        log::info!(
            "calibrated after re-alignment: {} of {} ticks good",
            self.records.len(),
            TICKS_PER_GROUP
        );
        Ok(())
    }

    fn analyze_calibration_group(&mut self, source: &mut dyn SampleSource) -> Result<()> {
        let group = TICKS_PER_GROUP * self.samples_per_tick;
        let got = self.buffer.fill_from(source, group)?;
        if got < group {
            return Err(EscapementError::InsufficientData {
                needed: group,
                available: got,
            });
        }
        for _ in 0..TICKS_PER_GROUP {
            self.analyze_one_tick(false)?;
        }
        Ok(())
    }

    fn excessive_boundary_ticks(&self) -> bool {
        self.boundary_ticks * 100 >= TICKS_PER_GROUP * CALIBRATION_BOUNDARY_PERCENT
    }

    /// Adaptive tracking loop: one tick per iteration, with the read
    /// length and window alignment adjusted whenever the tracker commits
    /// to a shift. A short read is a clean end of measurement.
    ///
    /// A shift cycle keeps its total read equal to its total cursor
    /// movement, so the live span never grows:
    /// - early: the window start retreats `samples_per_tick - extra` over
    ///   retained data and only `extra` new samples are read; that one
    ///   read stands in for the nominal read.
    /// - late: `extra` samples are skipped ahead of the window and the
    ///   nominal read still follows, `extra + samples_per_tick` in all.
    fn track(&mut self, source: &mut dyn SampleSource, cancel: &CancelToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                log::info!("cancelled after {} ticks", self.tick_index);
                self.interrupted = true;
                return Ok(());
            }
            if self.tick_index >= self.ticks_per_hour as u64 {
                log::info!("one hour of ticks analyzed; stopping");
                return Ok(());
            }

            let shift = self.pending_shift.take();

            let read_len = match shift {
                None => self.samples_per_tick,
                Some(ShiftDecision::Early { extra }) => extra,
                Some(ShiftDecision::Late { extra }) => extra + self.samples_per_tick,
            };

            if let Some(decision) = shift {
                self.apply_shift(decision)?;
            }

            let got = self.buffer.fill_from(source, read_len)?;
            if got < read_len {
                log::info!(
                    "end of stream after {} ticks ({} good)",
                    self.tick_index,
                    self.records.len()
                );
                return Ok(());
            }

            if let Some(ShiftDecision::Late { extra }) = shift {
                self.buffer.advance_analyze(extra)?;
            }

            if let Some(decision) = self.analyze_one_tick(true)? {
                log::debug!(
                    "tick {}: window shift committed: {:?}",
                    self.tick_index,
                    decision
                );
                self.pending_shift = Some(decision);
            }
        }
    }

    /// Re-align the window and put every already-recorded offset on the
    /// new alignment, so records before and after the shift form one
    /// continuous line.
    fn apply_shift(&mut self, decision: ShiftDecision) -> Result<()> {
        if let ShiftDecision::Early { extra } = decision {
            self.buffer
                .retreat_analyze(self.samples_per_tick - extra)?;
        }
        let adjustment = decision.record_adjustment(self.samples_per_tick);
        for record in &mut self.records {
            record.peak_offset += adjustment;
        }
        Ok(())
    }

    /// Analyze the tick at the analyze cursor and consume it.
    ///
    /// Returns the tracker's shift decision, if this tick completed a run.
    fn analyze_one_tick(&mut self, feed_tracker: bool) -> Result<Option<ShiftDecision>> {
        let (class, envelope) = {
            let slice = self.buffer.tick_slice(self.samples_per_tick)?;
            let envelope = (self.show_ticks && log::log_enabled!(log::Level::Debug))
                .then(|| render_envelope(slice, 64));
            (self.analyzer.analyze(slice), envelope)
        };
        self.buffer.advance_analyze(self.samples_per_tick)?;

        if let Some(envelope) = envelope {
            println!("{}", envelope);
        }

        let decision = match class {
            TickClass::Good {
                peak_offset,
                timing,
            } => {
                self.records.push(PeakRecord {
                    tick_index: self.tick_index,
                    peak_offset: peak_offset as i64,
                });
                self.offset_stats.update(peak_offset as f64);
                self.good_since_stats += 1;
                if self.show_ticks {
                    println!(
                        "tick {:>6}: good     offset {:>8}{}",
                        self.tick_index,
                        peak_offset,
                        match timing {
                            TickTiming::Early => " (early)",
                            TickTiming::Late => " (late)",
                            TickTiming::Centered => "",
                        }
                    );
                }
                if feed_tracker {
                    self.tracker.observe(timing)
                } else {
                    None
                }
            }
            TickClass::Boundary => {
                self.boundary_ticks += 1;
                if self.show_ticks {
                    println!("tick {:>6}: boundary", self.tick_index);
                }
                if feed_tracker {
                    self.tracker.observe_unclassified();
                }
                None
            }
            TickClass::Bad => {
                if self.show_ticks {
                    println!("tick {:>6}: bad", self.tick_index);
                }
                if feed_tracker {
                    self.tracker.observe_unclassified();
                }
                None
            }
        };

        self.tick_index += 1;

        if self.show_stats && self.good_since_stats >= TICKS_PER_GROUP {
            self.good_since_stats = 0;
            let recent = self.estimate_recent(STATS_WINDOW_TICKS);
            println!(
                "drift {:+9.3} s/day ({}) over last {} good ticks; offset mean {:.0} sd {:.0}",
                recent.seconds_per_day,
                recent.direction(),
                recent.good_ticks,
                self.offset_stats.mean,
                self.offset_stats.std_dev
            );
        }

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::MemorySource;
    use crate::config::TickRate;
    use approx::assert_relative_eq;

    const RATE: u32 = 44100;
    const TICK: usize = 8820; // 5 ticks/second

    fn config_5_per_second() -> EscapementConfig {
        let mut config = EscapementConfig::default();
        config.analysis.ticks_per_hour = TickRate::from_per_second(5);
        config
    }

    /// Tick train whose true period is `TICK + drift` samples, with the
    /// first peak at `phase`
    fn tick_train(ticks: usize, phase: usize, drift: i64) -> Vec<i16> {
        let period = (TICK as i64 + drift) as usize;
        let len = ticks * period + phase + TICK;
        let mut samples: Vec<i16> = (0..len).map(|i| (i % 5) as i16).collect();
        let mut p = phase;
        while p + 40 < len {
            for k in 0..40 {
                samples[p + k] = 22_000 - (k as i16 * 13);
            }
            p += period;
        }
        samples
    }

    #[test]
    fn test_run_on_steady_clock_is_near_zero_drift() {
        let config = config_5_per_second();
        let mut meter = DriftMeter::new(&config, RATE).unwrap();
        let mut source = MemorySource::new(tick_train(80, TICK / 2, 0), RATE);

        let estimate = meter.run(&mut source, &CancelToken::new()).unwrap();
        assert!(estimate.good_ticks > 40);
        assert_relative_eq!(estimate.seconds_per_day, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_calibration_needs_a_full_group() {
        let config = config_5_per_second();
        let mut meter = DriftMeter::new(&config, RATE).unwrap();
        // Only 5 ticks of data where calibration wants 20
        let mut source = MemorySource::new(tick_train(5, TICK / 2, 0), RATE);

        let err = meter.run(&mut source, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, EscapementError::InsufficientData { .. }));
    }

    #[test]
    fn test_cancellation_yields_partial_estimate() {
        let config = config_5_per_second();
        let mut meter = DriftMeter::new(&config, RATE).unwrap();
        let mut source = MemorySource::new(tick_train(200, TICK / 2, 0), RATE);

        let cancel = CancelToken::new();
        cancel.cancel();

        // Calibration runs to completion; tracking stops immediately
        let estimate = meter.run(&mut source, &cancel).unwrap();
        assert!(meter.interrupted());
        assert_eq!(meter.ticks_analyzed(), TICKS_PER_GROUP as u64);
        assert!(estimate.good_ticks > 0);
    }

    #[test]
    fn test_non_integral_tick_length_rejected() {
        let mut config = EscapementConfig::default();
        config.analysis.ticks_per_hour = TickRate::from_per_hour(7001);
        assert!(DriftMeter::new(&config, RATE).is_err());
    }
}
