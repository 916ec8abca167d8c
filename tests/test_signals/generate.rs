/// Deterministic tick train: sharp transients every `period` samples, the
/// first one `phase` samples in, over a quiet repeating floor.
///
/// No randomness; every test run sees identical samples.
pub fn tick_train(num_ticks: usize, period: usize, phase: usize) -> Vec<i16> {
    let len = phase + num_ticks * period + period;
    let mut samples: Vec<i16> = (0..len).map(|i| (i % 5) as i16).collect();

    let mut p = phase;
    for _ in 0..num_ticks {
        write_transient(&mut samples, p);
        p += period;
    }
    samples
}

fn write_transient(samples: &mut [i16], position: usize) {
    for k in 0..40 {
        let idx = position + k;
        if idx >= samples.len() {
            return;
        }
        samples[idx] = 22_000 - (k as i16 * 13);
    }
}
