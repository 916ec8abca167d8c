use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crossbeam_channel::Receiver;
use hound::WavReader;

use super::AudioCapture;
use crate::config::AudioConfig;
use crate::error::Result;

/// A monotonic stream of rectified 16-bit amplitude samples.
///
/// `read` blocks until it has filled as much of `buf` as the stream can
/// supply and returns the number of samples delivered; 0 means end of
/// stream. Samples are sign-folded magnitudes: the analysis layers only
/// care how far the signal sits above baseline, not which way.
pub trait SampleSource {
    fn read(&mut self, buf: &mut [i16]) -> Result<usize>;
    fn sample_rate(&self) -> u32;
}

/// Fold a signed sample to its magnitude. `i16::MIN` has no positive
/// counterpart and folds to `i16::MAX`.
pub fn fold_sign(sample: i16) -> i16 {
    if sample == i16::MIN {
        i16::MAX
    } else if sample < 0 {
        -sample
    } else {
        sample
    }
}

/// Live capture source backed by the default input device.
pub struct DeviceSource {
    rx: Receiver<Vec<i16>>,
    pending: Vec<i16>,
    pending_pos: usize,
    sample_rate: u32,
    _capture: AudioCapture,
}

impl DeviceSource {
    pub fn new(config: &AudioConfig) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(10);
        let capture = AudioCapture::new(config, tx)?;
        Ok(Self {
            rx,
            pending: Vec::new(),
            pending_pos: 0,
            sample_rate: config.sample_rate,
            _capture: capture,
        })
    }
}

impl SampleSource for DeviceSource {
    fn read(&mut self, buf: &mut [i16]) -> Result<usize> {
        let mut filled = 0;

        while filled < buf.len() {
            if self.pending_pos >= self.pending.len() {
                match self.rx.recv() {
                    Ok(data) => {
                        self.pending = data;
                        self.pending_pos = 0;
                    }
                    // Capture stream closed; deliver what we have.
                    Err(_) => break,
                }
            }

            let available = self.pending.len() - self.pending_pos;
            let wanted = buf.len() - filled;
            let take = available.min(wanted);
            for i in 0..take {
                buf[filled + i] = fold_sign(self.pending[self.pending_pos + i]);
            }
            self.pending_pos += take;
            filled += take;
        }

        Ok(filled)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Sound-file source decoding a WAV file one request at a time.
///
/// Multi-channel files contribute channel 0 only; other sample widths are
/// re-quantized to 16 bits.
pub struct WavFileSource {
    reader: WavReader<BufReader<File>>,
    spec: hound::WavSpec,
}

impl WavFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();
        Ok(Self { reader, spec })
    }

    /// Pull one frame from the file and return channel 0 as a rectified
    /// 16-bit magnitude, or `None` at end of file.
    fn next_frame(&mut self) -> Result<Option<i16>> {
        let channels = self.spec.channels as usize;
        match self.spec.sample_format {
            hound::SampleFormat::Int => {
                let mut samples = self.reader.samples::<i32>();
                let mut first = None;
                for ch in 0..channels {
                    match samples.next() {
                        Some(s) => {
                            if ch == 0 {
                                first = Some(s?);
                            } else {
                                s?;
                            }
                        }
                        None => return Ok(None),
                    }
                }
                match first {
                    Some(raw) => Ok(Some(fold_sign(quantize_to_i16(
                        raw,
                        self.spec.bits_per_sample,
                    )))),
                    None => Ok(None),
                }
            }
            hound::SampleFormat::Float => {
                let mut samples = self.reader.samples::<f32>();
                let mut first = None;
                for ch in 0..channels {
                    match samples.next() {
                        Some(s) => {
                            if ch == 0 {
                                first = Some(s?);
                            } else {
                                s?;
                            }
                        }
                        None => return Ok(None),
                    }
                }
                match first {
                    Some(raw) => {
                        let scaled = (raw.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                        Ok(Some(fold_sign(scaled)))
                    }
                    None => Ok(None),
                }
            }
        }
    }
}

impl SampleSource for WavFileSource {
    fn read(&mut self, buf: &mut [i16]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.next_frame()? {
                Some(sample) => {
                    buf[filled] = sample;
                    filled += 1;
                }
                None => break,
            }
        }
        Ok(filled)
    }

    fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }
}

fn quantize_to_i16(sample: i32, bits_per_sample: u16) -> i16 {
    if bits_per_sample >= 16 {
        (sample >> (bits_per_sample - 16)) as i16
    } else {
        (sample << (16 - bits_per_sample)) as i16
    }
}

/// In-memory source for analysis runs over pre-decoded samples.
///
/// Samples are folded on the way out, so tests and callers can hand over
/// plain signed data.
pub struct MemorySource {
    samples: Vec<i16>,
    position: usize,
    sample_rate: u32,
}

impl MemorySource {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            position: 0,
            sample_rate,
        }
    }
}

impl SampleSource for MemorySource {
    fn read(&mut self, buf: &mut [i16]) -> Result<usize> {
        let remaining = self.samples.len() - self.position;
        let take = remaining.min(buf.len());
        for i in 0..take {
            buf[i] = fold_sign(self.samples[self.position + i]);
        }
        self.position += take;
        Ok(take)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
