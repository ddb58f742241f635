//! Audio input: the `AudioSource` trait and its implementations.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod source;
pub mod wav;

pub use source::{AudioSource, FramePhase, MockAudioSource};
pub use wav::WavAudioSource;
