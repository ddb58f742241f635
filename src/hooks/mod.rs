//! Post-transcription hooks.
//!
//! Each transcription result is fanned out to every enabled hook. Hooks share
//! one execution contract: `execute` receives a read-only context and always
//! returns a `HookResult`; failures are reported, never thrown. The
//! dispatcher enforces a per-hook timeout around every call.

pub mod command;
pub mod console_log;
pub mod dispatcher;
pub mod factory;
pub mod file_append;
pub mod template;
pub mod translation;
pub mod webhook;

pub use command::CommandHook;
pub use console_log::ConsoleLogHook;
pub use dispatcher::{
    CollectingObserver, DispatchObserver, DispatchSummary, HookOutcome, LogObserver,
    ResultDispatcher,
};
pub use factory::{HookSet, build_hooks};
pub use file_append::FileAppendHook;
pub use translation::AiTranslationHook;
pub use webhook::WebhookHook;

use crate::stt::transcriber::TranscriptionResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The closed set of hook kinds.
///
/// Adding a kind means adding one variant here plus one arm in the factory;
/// dispatch logic never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    ConsoleLog,
    FileAppend,
    Command,
    Webhook,
    AiTranslation,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::ConsoleLog => "console_log",
            HookKind::FileAppend => "file_append",
            HookKind::Command => "command",
            HookKind::Webhook => "webhook",
            HookKind::AiTranslation => "ai_translation",
        }
    }

    pub fn all() -> &'static [HookKind] {
        &[
            HookKind::ConsoleLog,
            HookKind::FileAppend,
            HookKind::Command,
            HookKind::Webhook,
            HookKind::AiTranslation,
        ]
    }
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only context handed to every hook invocation.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// The transcription being dispatched.
    pub result: TranscriptionResult,
    /// Sequence number of the transcribed chunk.
    pub chunk_index: u64,
    /// Wall-clock time this dispatch started.
    pub dispatched_at: SystemTime,
    /// Chunk start as seconds since the unix epoch.
    pub timestamp_secs: f64,
}

impl HookContext {
    pub fn text(&self) -> &str {
        self.result.text.trim()
    }

    pub fn confidence(&self) -> f32 {
        self.result.confidence
    }

    /// Dispatch time as unix seconds (fallback when the chunk has no
    /// meaningful start time).
    pub fn dispatched_unix_secs(&self) -> f64 {
        self.dispatched_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Outcome of one hook execution.
///
/// `elapsed` is stamped by the dispatcher; constructors leave it zero.
#[derive(Debug, Clone)]
pub struct HookResult {
    pub success: bool,
    pub message: String,
    pub elapsed: Duration,
}

impl HookResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            elapsed: Duration::ZERO,
        }
    }
}

/// The single execution contract all hook kinds implement.
///
/// `execute` must not panic and must not return errors through any side
/// channel; everything the caller needs to know goes into the `HookResult`.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Configured name, used in logs and records.
    fn name(&self) -> &str;

    fn kind(&self) -> HookKind;

    /// Per-invocation timeout enforced by the dispatcher.
    fn timeout(&self) -> Duration;

    async fn execute(&self, ctx: &HookContext) -> HookResult;
}

#[cfg(test)]
pub(crate) fn test_context(text: &str, confidence: f32, chunk_index: u64) -> HookContext {
    use crate::stt::transcriber::TranscriptionResult;

    HookContext {
        result: TranscriptionResult {
            chunk_id: chunk_index,
            text: text.to_string(),
            confidence,
            language: "en".to_string(),
            segments: Vec::new(),
        },
        chunk_index,
        dispatched_at: SystemTime::now(),
        timestamp_secs: 1_700_000_000.5,
    }
}
