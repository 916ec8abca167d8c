use std::path::PathBuf;

use escapement::analysis::DriftMeter;
use escapement::audio::{SampleSource, WavFileSource};
use escapement::cancel::CancelToken;
use escapement::config::{EscapementConfig, TickRate};
use escapement::save_wav;
use escapement::simulation::{TickTrainConfig, generate_tick_train};

fn temp_wav(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("escapement_{}_{}.wav", name, std::process::id()))
}

/// Rectification happens on the way out of the file source
#[test]
fn test_wav_source_rectifies_samples() {
    let path = temp_wav("rectify");
    let samples: Vec<i16> = vec![100, -200, 300, -400, 0, i16::MIN];
    save_wav(path.to_str().unwrap(), &samples, 44_100).unwrap();

    let mut source = WavFileSource::new(&path).unwrap();
    assert_eq!(source.sample_rate(), 44_100);

    let mut buf = [0i16; 8];
    let got = source.read(&mut buf).unwrap();
    assert_eq!(got, 6);
    assert_eq!(&buf[..6], &[100, 200, 300, 400, 0, i16::MAX]);
    assert_eq!(source.read(&mut buf).unwrap(), 0);

    let _ = std::fs::remove_file(&path);
}

/// Full pipeline over a file: a simulated clock losing five seconds a day
/// comes back out as roughly five seconds a day slow.
#[test]
fn test_measures_simulated_drift_from_wav_file() {
    let train = TickTrainConfig {
        sample_rate: 44_100,
        ticks_per_hour: 18_000,
        drift_seconds_per_day: -5.0,
        duration_secs: 30.0,
        tick_amplitude: 24_000,
        noise_floor: 150.0,
        jitter_samples: 0.0,
        seed: Some(1234),
    };
    let samples = generate_tick_train(&train);

    let path = temp_wav("drift");
    save_wav(path.to_str().unwrap(), &samples, train.sample_rate).unwrap();

    let mut source = WavFileSource::new(&path).unwrap();

    let mut config = EscapementConfig::default();
    config.analysis.ticks_per_hour = TickRate::from_per_hour(18_000);

    let mut meter = DriftMeter::new(&config, source.sample_rate()).unwrap();
    let estimate = meter.run(&mut source, &CancelToken::new()).unwrap();

    assert!(estimate.good_ticks > 100, "only {} good ticks", estimate.good_ticks);
    assert_eq!(estimate.direction(), "slow");
    assert!(
        (estimate.seconds_per_day + 5.0).abs() < 1.0,
        "expected about -5 s/day, got {:.3}",
        estimate.seconds_per_day
    );

    let _ = std::fs::remove_file(&path);
}
