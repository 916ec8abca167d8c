pub mod capture;
pub mod source;

pub use capture::AudioCapture;
pub use source::{DeviceSource, MemorySource, SampleSource, WavFileSource, fold_sign};
