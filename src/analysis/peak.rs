use crate::constants::{PEAK_EDGE_COUNT_LIMIT, PEAK_SAMPLES, PEAK_SPREAD_LIMIT, SHIFT_POINT_PERCENT};

/// Where a good peak sits within its tick slice, for window tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickTiming {
    /// Peak within the first `SHIFT_POINT_PERCENT`% of the slice
    Early,
    Centered,
    /// Peak within the last `SHIFT_POINT_PERCENT`% of the slice
    Late,
}

/// Classification of one tick-length slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickClass {
    /// Well-defined peak at `peak_offset` samples into the slice
    Good {
        peak_offset: usize,
        timing: TickTiming,
    },
    /// Peak energy piles up at a slice edge; the true peak may belong to a
    /// neighboring slice
    Boundary,
    /// No tight peak anywhere in the slice
    Bad,
}

/// Locates the amplitude peak within one tick-length slice.
///
/// Ranks every sample position by amplitude, takes the top `PEAK_SAMPLES`
/// positions, and reasons about where they cluster: piled against an edge
/// means a boundary tick, a tight mid-slice cluster means a good tick with
/// the peak at the cluster midpoint, anything looser is a bad tick.
pub struct TickAnalyzer {
    samples_per_tick: usize,
    rank_scratch: Vec<(i16, usize)>,
    top_positions: Vec<usize>,
}

impl TickAnalyzer {
    pub fn new(samples_per_tick: usize) -> Self {
        Self {
            samples_per_tick,
            rank_scratch: Vec::with_capacity(samples_per_tick),
            top_positions: Vec::with_capacity(PEAK_SAMPLES),
        }
    }

    /// Edge margin and maximum good-peak spread, in samples
    fn spread_limit(&self) -> usize {
        self.samples_per_tick * PEAK_SPREAD_LIMIT / PEAK_SAMPLES
    }

    pub fn analyze(&mut self, slice: &[i16]) -> TickClass {
        self.rank_scratch.clear();
        self.rank_scratch
            .extend(slice.iter().enumerate().map(|(i, &s)| (s, i)));
        // Descending amplitude; ties resolve to the earlier position
        self.rank_scratch
            .sort_unstable_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let top = PEAK_SAMPLES.min(self.rank_scratch.len());
        self.top_positions.clear();
        self.top_positions
            .extend(self.rank_scratch[..top].iter().map(|&(_, i)| i));

        let margin = self.spread_limit();
        let near_start = self.top_positions.iter().filter(|&&p| p < margin).count();
        let near_end = self
            .top_positions
            .iter()
            .filter(|&&p| p + margin >= self.samples_per_tick)
            .count();

        if (near_start >= PEAK_EDGE_COUNT_LIMIT && near_end >= PEAK_EDGE_COUNT_LIMIT)
            || near_start >= 2 * PEAK_EDGE_COUNT_LIMIT
            || near_end >= 2 * PEAK_EDGE_COUNT_LIMIT
        {
            return TickClass::Boundary;
        }

        if self.top_positions.len() <= 2 * PEAK_EDGE_COUNT_LIMIT {
            return TickClass::Bad;
        }

        self.top_positions.sort_unstable();
        let low = self.top_positions[PEAK_EDGE_COUNT_LIMIT];
        let high = self.top_positions[self.top_positions.len() - 1 - PEAK_EDGE_COUNT_LIMIT];
        let spread = high - low;

        if spread >= self.spread_limit() {
            return TickClass::Bad;
        }

        let peak_offset = (low + high) / 2;
        TickClass::Good {
            peak_offset,
            timing: self.timing_of(peak_offset),
        }
    }

    fn timing_of(&self, peak_offset: usize) -> TickTiming {
        let shift_margin = self.samples_per_tick * SHIFT_POINT_PERCENT / 100;
        if peak_offset < shift_margin {
            TickTiming::Early
        } else if peak_offset + shift_margin >= self.samples_per_tick {
            TickTiming::Late
        } else {
            TickTiming::Centered
        }
    }
}
