//! Default configuration constants for hearsay.
//!
//! Shared across config types so the file format, CLI flags, and library
//! defaults stay in agreement.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and is what Whisper expects.
pub const SAMPLE_RATE: u32 = 16000;

/// Default chunk duration in milliseconds.
///
/// Each chunk is transcribed as one unit; 5s balances caption latency against
/// giving the engine enough context per inference call.
pub const CHUNK_DURATION_MS: u32 = 5000;

/// Default overlap between consecutive chunks in milliseconds (0 = disabled).
///
/// When enabled, the trailing fraction of the previous chunk is prepended to
/// the next one so words straddling a boundary are not cut.
pub const OVERLAP_MS: u32 = 0;

/// Frame buffer capacity, in multiples of one chunk's sample count.
///
/// The capture thread must never block on downstream work; when the buffer
/// fills, the oldest frames are dropped and counted.
pub const BUFFER_CHUNKS: usize = 3;

/// Minimum duration for the trailing partial chunk to be flushed at stream
/// end rather than discarded.
pub const MIN_FINAL_CHUNK_MS: u32 = 500;

/// Default Whisper model path.
pub const DEFAULT_MODEL: &str = "models/ggml-base.bin";

/// Default language code for transcription.
///
/// "auto" lets the engine detect the spoken language.
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// How long the session waits for still-running hooks after the last chunk
/// before abandoning them, in milliseconds.
pub const DRAIN_TIMEOUT_MS: u64 = 5000;

/// Capture thread polling interval in milliseconds (~60Hz).
pub const POLL_INTERVAL_MS: u64 = 16;

/// Default execution timeout for command hooks, in seconds.
pub const COMMAND_TIMEOUT_SECS: u64 = 30;

/// Default request timeout for webhook hooks, in seconds.
pub const WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Default request timeout for AI translation hooks, in seconds.
pub const TRANSLATION_TIMEOUT_SECS: u64 = 30;

/// Default timeout for local hooks (console, file append), in seconds.
pub const LOCAL_HOOK_TIMEOUT_SECS: u64 = 5;

/// Default chat-completion endpoint base for the translation hook.
pub const TRANSLATION_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model for the translation hook.
pub const TRANSLATION_MODEL: &str = "gpt-4o-mini";
