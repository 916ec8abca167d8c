//! Synthetic clock tick trains for testing the drift meter.
//!
//! Generates a mono 16-bit sample stream of exponentially decaying tick
//! transients on a noise floor, with a configurable true drift rate and
//! optional per-tick timing jitter.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

#[derive(Clone, Debug, serde::Deserialize)]
pub struct TickTrainConfig {
    pub sample_rate: u32,
    pub ticks_per_hour: u32,
    /// True drift of the simulated clock in seconds per day; negative is a
    /// slow clock (ticks spaced wider than nominal)
    pub drift_seconds_per_day: f64,
    pub duration_secs: f64,
    /// Peak amplitude of a tick transient (16-bit full scale)
    pub tick_amplitude: i16,
    /// Standard deviation of the background noise, in sample units
    pub noise_floor: f64,
    /// Standard deviation of per-tick timing jitter, in samples
    pub jitter_samples: f64,
    pub seed: Option<u64>,
}

impl Default for TickTrainConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            ticks_per_hour: 3600,
            drift_seconds_per_day: 0.0,
            duration_secs: 60.0,
            tick_amplitude: 24_000,
            noise_floor: 150.0,
            jitter_samples: 2.0,
            seed: None,
        }
    }
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

/// Generate a tick train according to `config`.
///
/// The true tick period is the nominal period stretched by the drift
/// rate: a clock that loses `d` seconds per day ticks
/// `1 + d/86400` nominal intervals apart.
pub fn generate_tick_train(config: &TickTrainConfig) -> Vec<i16> {
    let mut rng = create_rng(config.seed);

    let nominal_period = 3600.0 * config.sample_rate as f64 / config.ticks_per_hour as f64;
    let period = nominal_period * (1.0 - config.drift_seconds_per_day / 86_400.0);

    let num_samples = (config.duration_secs * config.sample_rate as f64) as usize;
    let mut samples = vec![0i16; num_samples];

    if config.noise_floor > 0.0 {
        let noise = Normal::new(0.0, config.noise_floor).expect("valid noise floor");
        for sample in samples.iter_mut() {
            *sample = (noise.sample(&mut rng) as i32).clamp(-32_768, 32_767) as i16;
        }
    }

    let jitter = if config.jitter_samples > 0.0 {
        Some(Normal::new(0.0, config.jitter_samples).expect("valid jitter"))
    } else {
        None
    };

    // Start half a period in so the first tick is not cut off
    let mut tick_time = period / 2.0;
    while (tick_time as usize) < num_samples {
        let jittered = match &jitter {
            Some(dist) => tick_time + dist.sample(&mut rng),
            None => tick_time,
        };
        write_tick_transient(
            &mut samples,
            jittered.max(0.0) as usize,
            config.tick_amplitude,
        );
        tick_time += period;
    }

    samples
}

/// A short decaying burst, loosely shaped like an escapement impulse
fn write_tick_transient(samples: &mut [i16], position: usize, amplitude: i16) {
    const TRANSIENT_LEN: usize = 48;
    for k in 0..TRANSIENT_LEN {
        let idx = position + k;
        if idx >= samples.len() {
            break;
        }
        let decay = (-(k as f64) / 12.0).exp();
        let polarity = if k % 2 == 0 { 1.0 } else { -0.6 };
        let value = amplitude as f64 * decay * polarity;
        samples[idx] = (samples[idx] as f64 + value).clamp(-32_768.0, 32_767.0) as i16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_matches_duration() {
        let config = TickTrainConfig {
            duration_secs: 2.0,
            seed: Some(1),
            ..Default::default()
        };
        let samples = generate_tick_train(&config);
        assert_eq!(samples.len(), 2 * 44100);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let config = TickTrainConfig {
            duration_secs: 1.0,
            seed: Some(42),
            ..Default::default()
        };
        assert_eq!(generate_tick_train(&config), generate_tick_train(&config));
    }

    #[test]
    fn test_ticks_land_on_the_drifted_period() {
        let config = TickTrainConfig {
            sample_rate: 44100,
            ticks_per_hour: 18_000, // 5/s, period 8820
            drift_seconds_per_day: 0.0,
            duration_secs: 2.0,
            tick_amplitude: 24_000,
            noise_floor: 0.0,
            jitter_samples: 0.0,
            seed: Some(7),
        };
        let samples = generate_tick_train(&config);

        // Peaks at half a period plus multiples of the period
        for tick in 0..9usize {
            let expected = 4410 + tick * 8820;
            assert!(
                samples[expected] > 20_000,
                "no transient at sample {}",
                expected
            );
        }
    }
}
