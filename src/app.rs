//! Captioning application entry point.
//!
//! Composition root for the default command: load config, build the hook
//! set, start the session, run until Ctrl+C or the source drains.

use crate::audio::source::AudioSource;
use crate::audio::wav::WavAudioSource;
use crate::config::Config;
use crate::hooks::dispatcher::ResultDispatcher;
use crate::hooks::factory::build_hooks;
use crate::pipeline::assembler::ChunkAssemblerConfig;
use crate::pipeline::orchestrator::{Session, SessionConfig, SessionSummary};
use crate::stt::transcriber::Transcriber;
use crate::stt::whisper::{WhisperConfig, WhisperTranscriber};
use anyhow::{Context, bail};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// CLI overrides applied on top of the loaded configuration.
#[derive(Debug, Default)]
pub struct CaptionArgs {
    pub device: Option<String>,
    pub model: Option<String>,
    pub language: Option<String>,
    pub chunk_duration_ms: Option<u32>,
    pub wav: Option<PathBuf>,
    pub quiet: bool,
}

/// Run the caption command: capture → transcribe → dispatch hooks.
pub async fn run_caption_command(mut config: Config, args: CaptionArgs) -> anyhow::Result<()> {
    if let Some(device) = args.device {
        config.audio.device = Some(device);
    }
    if let Some(model) = args.model {
        config.stt.model = model;
    }
    if let Some(language) = args.language {
        config.stt.language = language;
    }
    if let Some(chunk_ms) = args.chunk_duration_ms {
        config.audio.chunk_duration_ms = chunk_ms;
    }
    let quiet = args.quiet;

    // Build hooks eagerly; misconfigured ones are already disabled with
    // warnings by the factory.
    let mut hook_set = build_hooks(&config.hooks);
    if config.hooks.enabled && config.hooks.hooks.is_empty() {
        // No hooks configured at all: caption to the terminal by default
        hook_set.hooks.push(Arc::new(
            crate::hooks::console_log::ConsoleLogHook::new("console_log".to_string(), false),
        ));
    }
    if !quiet {
        eprintln!(
            "{} hook(s) active, {} disabled",
            hook_set.hooks.len(),
            hook_set.disabled.len()
        );
        for disabled in &hook_set.disabled {
            eprintln!("  warning: hook '{}' disabled: {}", disabled.name, disabled.reason);
        }
    }

    let dispatcher = ResultDispatcher::new(
        hook_set.hooks,
        Duration::from_millis(config.hooks.drain_timeout_ms),
    )?;

    if !quiet {
        eprintln!("Loading model '{}'...", config.stt.model);
    }
    let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperTranscriber::new(WhisperConfig {
        model_path: PathBuf::from(&config.stt.model),
        language: config.stt.language.clone(),
        threads: None,
    })?);
    if !transcriber.is_ready() {
        bail!("this build has no speech recognition; rebuild with --features whisper");
    }

    let audio_source: Box<dyn AudioSource> = match &args.wav {
        Some(path) => Box::new(
            WavAudioSource::from_path(path)
                .with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => live_source(config.audio.device.as_deref())?,
    };

    let session_config = SessionConfig {
        assembler: ChunkAssemblerConfig {
            chunk_duration_ms: config.audio.chunk_duration_ms,
            overlap_ms: config.audio.overlap_ms,
            sample_rate: config.audio.sample_rate,
            flush_partial: config.audio.flush_partial,
            min_final_chunk_ms: config.audio.min_final_chunk_ms,
        },
        buffer_chunks: config.audio.buffer_chunks,
        poll_interval_ms: crate::defaults::POLL_INTERVAL_MS,
        drain_timeout: Duration::from_millis(config.hooks.drain_timeout_ms),
    };

    let handle = Session::new(session_config).start(audio_source, transcriber, dispatcher)?;

    if !quiet {
        eprintln!("Listening. Press Ctrl+C to stop.");
    }

    // Run until interrupted, a fatal capture error, or a drained file source.
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(Duration::from_millis(200));
    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("failed to wait for Ctrl+C")?;
                if !quiet {
                    eprintln!("\nShutting down...");
                }
                break;
            }
            _ = ticker.tick() => {
                if !handle.is_running() {
                    break;
                }
            }
        }
    }

    let fatal = handle.fatal_error();
    let summary = handle.stop();

    if let Some(summary) = &summary
        && !quiet
    {
        print_summary(summary);
    }

    if let Some(message) = fatal {
        bail!("audio capture failed: {}", message);
    }
    Ok(())
}

fn print_summary(summary: &SessionSummary) {
    eprintln!(
        "Session: {} chunk(s) transcribed, {} failed, {} frame(s) dropped",
        summary.chunks_transcribed, summary.chunks_failed, summary.frames_dropped
    );
    eprintln!(
        "Hooks: {} succeeded, {} failed, {} abandoned",
        summary.dispatch.hook_successes, summary.dispatch.hook_failures, summary.dispatch.abandoned
    );
}

#[cfg(feature = "cpal-audio")]
fn live_source(device: Option<&str>) -> anyhow::Result<Box<dyn AudioSource>> {
    Ok(Box::new(crate::audio::capture::CpalAudioSource::new(
        device,
    )?))
}

#[cfg(not(feature = "cpal-audio"))]
fn live_source(_device: Option<&str>) -> anyhow::Result<Box<dyn AudioSource>> {
    bail!(
        "this build has no live capture support; rebuild with --features cpal-audio \
         or transcribe a file with --wav"
    )
}
