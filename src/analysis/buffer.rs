use crate::audio::SampleSource;
use crate::error::{EscapementError, Result};

/// Sliding window over the incoming sample stream.
///
/// Owns a fixed-capacity buffer and two cursors: `append`, where new
/// samples land, and `analyze`, where the next un-analyzed tick begins.
/// `0 <= analyze <= append <= capacity` holds before and after every
/// operation. When an append would overflow, the live span
/// `[analyze, append)` is compacted to offset 0; the buffer never grows.
pub struct SampleBuffer {
    data: Vec<i16>,
    analyze: usize,
    append: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            analyze: 0,
            append: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn analyze_offset(&self) -> usize {
        self.analyze
    }

    pub fn append_offset(&self) -> usize {
        self.append
    }

    /// Samples appended but not yet analyzed
    pub fn available(&self) -> usize {
        self.append - self.analyze
    }

    /// Make room to append `n` more samples, compacting if necessary.
    ///
    /// Compaction shifts the live span down to offset 0, preserving both
    /// cursors' positions relative to the start of live data. Failure to
    /// make room even then means the buffer was sized wrong for the
    /// request, which is a logic defect rather than a runtime condition.
    pub fn ensure_capacity_for(&mut self, n: usize) -> Result<()> {
        if self.append + n <= self.data.len() {
            return Ok(());
        }

        if self.analyze > self.append {
            return Err(EscapementError::Internal(format!(
                "buffer cursors out of order: analyze {} past append {}",
                self.analyze, self.append
            )));
        }

        self.data.copy_within(self.analyze..self.append, 0);
        self.append -= self.analyze;
        self.analyze = 0;

        if self.append + n > self.data.len() {
            return Err(EscapementError::Internal(format!(
                "buffer overflow: {} live + {} requested exceeds capacity {}",
                self.append,
                n,
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Request `n` samples from `source` at the append cursor.
    ///
    /// Loops over partial deliveries and returns the count actually
    /// appended; fewer than `n` means the source hit end of stream. The
    /// caller decides whether that is fatal (calibration) or a clean stop
    /// (tracking).
    pub fn fill_from(&mut self, source: &mut dyn SampleSource, n: usize) -> Result<usize> {
        self.ensure_capacity_for(n)?;

        let mut got = 0;
        while got < n {
            let read = source.read(&mut self.data[self.append..self.append + (n - got)])?;
            if read == 0 {
                break;
            }
            self.append += read;
            got += read;
        }
        Ok(got)
    }

    /// The next `len` un-analyzed samples
    pub fn tick_slice(&self, len: usize) -> Result<&[i16]> {
        if self.analyze + len > self.append {
            return Err(EscapementError::Internal(format!(
                "tick slice of {} samples requested with only {} available",
                len,
                self.available()
            )));
        }
        Ok(&self.data[self.analyze..self.analyze + len])
    }

    /// Consume `n` samples: the analyze cursor may never pass data that
    /// has not arrived.
    pub fn advance_analyze(&mut self, n: usize) -> Result<()> {
        if self.analyze + n > self.append {
            return Err(EscapementError::Internal(format!(
                "analyze cursor advance of {} past append cursor ({} available)",
                n,
                self.available()
            )));
        }
        self.analyze += n;
        Ok(())
    }

    /// Move the analyze cursor back over `n` already-consumed samples.
    ///
    /// Used when a window shift re-centers the detection window on data
    /// that is still in the buffer. Retreating past the start of retained
    /// data means the caller's cadence accounting is broken.
    pub fn retreat_analyze(&mut self, n: usize) -> Result<()> {
        if n > self.analyze {
            return Err(EscapementError::Internal(format!(
                "analyze cursor retreat of {} past start of retained data (at {})",
                n, self.analyze
            )));
        }
        self.analyze -= n;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::MemorySource;

    fn counting_source(len: usize) -> MemorySource {
        let samples: Vec<i16> = (0..len).map(|i| (i % 1000) as i16).collect();
        MemorySource::new(samples, 44100)
    }

    fn assert_invariant(buffer: &SampleBuffer) {
        assert!(buffer.analyze_offset() <= buffer.append_offset());
        assert!(buffer.append_offset() <= buffer.capacity());
    }

    #[test]
    fn test_fill_and_consume() {
        let mut buffer = SampleBuffer::new(100);
        let mut source = counting_source(250);

        assert_eq!(buffer.fill_from(&mut source, 40).unwrap(), 40);
        assert_invariant(&buffer);
        assert_eq!(buffer.available(), 40);

        assert_eq!(buffer.tick_slice(4).unwrap(), &[0, 1, 2, 3]);
        buffer.advance_analyze(40).unwrap();
        assert_eq!(buffer.available(), 0);
        assert_invariant(&buffer);
    }

    #[test]
    fn test_compaction_preserves_live_data() {
        let mut buffer = SampleBuffer::new(100);
        let mut source = counting_source(250);

        buffer.fill_from(&mut source, 90).unwrap();
        buffer.advance_analyze(80).unwrap();

        // 10 live samples (80..90); next fill must compact to fit 60 more
        buffer.fill_from(&mut source, 60).unwrap();
        assert_invariant(&buffer);
        assert_eq!(buffer.analyze_offset(), 0);
        assert_eq!(buffer.available(), 70);

        let slice = buffer.tick_slice(12).unwrap();
        let expected: Vec<i16> = (80..92).collect();
        assert_eq!(slice, expected.as_slice());
    }

    #[test]
    fn test_invariant_across_operation_sequences() {
        let mut buffer = SampleBuffer::new(64);
        let mut source = counting_source(10_000);

        for step in 0..50 {
            let n = 1 + (step * 7) % 23;
            let got = buffer.fill_from(&mut source, n).unwrap();
            assert_invariant(&buffer);
            let consume = got.min(buffer.available());
            buffer.advance_analyze(consume).unwrap();
            assert_invariant(&buffer);
        }
    }

    #[test]
    fn test_short_source_reports_shortfall() {
        let mut buffer = SampleBuffer::new(100);
        let mut source = counting_source(30);

        assert_eq!(buffer.fill_from(&mut source, 50).unwrap(), 30);
        assert_eq!(buffer.fill_from(&mut source, 50).unwrap(), 0);
        assert_invariant(&buffer);
    }

    #[test]
    fn test_overflow_after_compaction_is_internal_error() {
        let mut buffer = SampleBuffer::new(50);
        let mut source = counting_source(200);

        buffer.fill_from(&mut source, 40).unwrap();
        buffer.advance_analyze(10).unwrap();

        // 30 live samples; 30 more cannot fit a 50-sample buffer
        let err = buffer.fill_from(&mut source, 30).unwrap_err();
        assert!(matches!(err, EscapementError::Internal(_)));
    }

    #[test]
    fn test_retreat_reopens_consumed_data() {
        let mut buffer = SampleBuffer::new(100);
        let mut source = counting_source(60);

        buffer.fill_from(&mut source, 60).unwrap();
        buffer.advance_analyze(50).unwrap();

        buffer.retreat_analyze(20).unwrap();
        assert_invariant(&buffer);
        assert_eq!(buffer.available(), 30);
        assert_eq!(buffer.tick_slice(2).unwrap(), &[30, 31]);

        assert!(buffer.retreat_analyze(31).is_err());
    }

    #[test]
    fn test_analyze_cannot_pass_append() {
        let mut buffer = SampleBuffer::new(100);
        let mut source = counting_source(20);

        buffer.fill_from(&mut source, 20).unwrap();
        assert!(buffer.advance_analyze(21).is_err());
        assert!(buffer.tick_slice(21).is_err());
        buffer.advance_analyze(20).unwrap();
        assert_invariant(&buffer);
    }
}
