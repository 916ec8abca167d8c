use thiserror::Error;

#[derive(Error, Debug)]
pub enum EscapementError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Sound file error: {0}")]
    SoundFile(#[from] hound::Error),

    #[error("Insufficient data: need {needed} samples, got {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error(
        "Calibration failed: {boundary_ticks} of {group_ticks} ticks had peaks at the window \
         edges even after re-alignment; check --ticks-per-hour against the actual tick rate"
    )]
    CalibrationFailed {
        boundary_ticks: usize,
        group_ticks: usize,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, EscapementError>;
