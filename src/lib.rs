//! hearsay - live audio captioning with post-transcription hooks
//!
//! Captures an audio stream, slices it into fixed-duration chunks,
//! transcribes each chunk, and fans every result out to a configurable set
//! of hooks (console, file, shell command, webhook, AI translation).

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod app;
pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod hooks;
#[cfg(feature = "cli")]
pub mod logging;
pub mod pipeline;
pub mod stt;

// Core traits (source → transcribe → dispatch)
pub use audio::source::AudioSource;
pub use hooks::{Hook, HookContext, HookKind, HookResult};
pub use stt::transcriber::{Transcriber, TranscriptionResult};

// Pipeline
pub use pipeline::orchestrator::{Session, SessionConfig, SessionHandle, SessionSummary};

// Hook system
pub use hooks::dispatcher::{DispatchObserver, DispatchSummary, ResultDispatcher};
pub use hooks::factory::{HookSet, build_hooks};

// Error handling
pub use error::{HearsayError, Result};

// Config
pub use config::Config;
