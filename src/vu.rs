//! VU-meter mode for checking microphone placement before a measurement.

use std::io::Write;

use crate::audio::SampleSource;
use crate::cancel::CancelToken;
use crate::error::Result;

/// Width of the meter and of rendered tick envelopes, in characters
const METER_WIDTH: usize = 64;

/// Quantize a rectified 16-bit magnitude to a meter column (0..METER_WIDTH)
fn meter_columns(peak: i16) -> usize {
    (peak as usize / 512).min(METER_WIDTH - 1) + 1
}

/// Read 1/20-second blocks and draw a one-line peak meter until the source
/// ends or the run is cancelled.
pub fn run_vu_meter(source: &mut dyn SampleSource, cancel: &CancelToken) -> Result<()> {
    let block = (source.sample_rate() / 20).max(1) as usize;
    let mut buf = vec![0i16; block];
    let stdout = std::io::stdout();

    while !cancel.is_cancelled() {
        let got = source.read(&mut buf)?;
        if got == 0 {
            break;
        }
        let peak = buf[..got].iter().copied().max().unwrap_or(0);

        let mut line = String::with_capacity(METER_WIDTH + 3);
        line.push('[');
        let columns = meter_columns(peak);
        for i in 0..METER_WIDTH {
            line.push(if i < columns { '#' } else { ' ' });
        }
        line.push(']');
        line.push('\r');

        let mut handle = stdout.lock();
        let _ = handle.write_all(line.as_bytes());
        let _ = handle.flush();
    }
    println!();
    Ok(())
}

/// Render a tick slice's amplitude envelope as one fixed-width line.
///
/// Used by the per-tick debug output: each column shows the loudest sample
/// in its bucket, quantized to four glyphs.
pub fn render_envelope(slice: &[i16], width: usize) -> String {
    let mut out = String::with_capacity(width + 2);
    out.push('|');
    if slice.is_empty() {
        out.push('|');
        return out;
    }
    for bucket in 0..width {
        let start = bucket * slice.len() / width;
        let end = (((bucket + 1) * slice.len()) / width).max(start + 1);
        let peak = slice[start..end.min(slice.len())]
            .iter()
            .copied()
            .max()
            .unwrap_or(0);
        out.push(match peak {
            p if p >= 16384 => '#',
            p if p >= 4096 => ':',
            p if p >= 1024 => '.',
            _ => ' ',
        });
    }
    out.push('|');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meter_columns_quantization() {
        assert_eq!(meter_columns(0), 1);
        assert_eq!(meter_columns(511), 1);
        assert_eq!(meter_columns(512), 2);
        assert_eq!(meter_columns(i16::MAX), METER_WIDTH);
    }

    #[test]
    fn test_render_envelope_marks_the_peak_bucket() {
        let mut slice = vec![0i16; 640];
        slice[320] = 30_000;
        let line = render_envelope(&slice, 64);
        assert_eq!(line.len(), 66);
        assert_eq!(line.chars().nth(1 + 32), Some('#'));
        assert!(line.chars().filter(|&c| c == '#').count() == 1);
    }
}
