//! End-to-end session tests: mock audio source → chunk assembly →
//! transcription → hook dispatch.

use async_trait::async_trait;
use hearsay::audio::source::{AudioSource, FramePhase, MockAudioSource};
use hearsay::config::HooksConfig;
use hearsay::hooks::{Hook, HookContext, HookKind, HookResult, ResultDispatcher, build_hooks};
use hearsay::pipeline::assembler::ChunkAssemblerConfig;
use hearsay::pipeline::orchestrator::{Session, SessionConfig};
use hearsay::stt::transcriber::{MockTranscriber, Transcriber};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Hook that records every context it sees.
struct RecordingHook {
    name: String,
    seen: Arc<Mutex<Vec<(u64, String, f32)>>>,
}

#[async_trait]
impl Hook for RecordingHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> HookKind {
        HookKind::ConsoleLog
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(2)
    }

    async fn execute(&self, ctx: &HookContext) -> HookResult {
        self.seen.lock().unwrap().push((
            ctx.chunk_index,
            ctx.text().to_string(),
            ctx.confidence(),
        ));
        HookResult::ok("recorded")
    }
}

/// Hook that always fails, for isolation tests.
struct AlwaysFailingHook;

#[async_trait]
impl Hook for AlwaysFailingHook {
    fn name(&self) -> &str {
        "always-failing"
    }

    fn kind(&self) -> HookKind {
        HookKind::Webhook
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(2)
    }

    async fn execute(&self, _ctx: &HookContext) -> HookResult {
        HookResult::failure("simulated downstream failure")
    }
}

fn session_config(chunk_ms: u32) -> SessionConfig {
    SessionConfig {
        assembler: ChunkAssemblerConfig {
            chunk_duration_ms: chunk_ms,
            overlap_ms: 0,
            sample_rate: 16000,
            flush_partial: true,
            min_final_chunk_ms: 500,
        },
        buffer_chunks: 8,
        poll_interval_ms: 1,
        drain_timeout: Duration::from_secs(3),
    }
}

/// A finite source delivering `seconds` of audio in 100ms frames.
fn source_with_seconds(seconds: u32) -> Box<dyn AudioSource> {
    Box::new(MockAudioSource::new().with_frame_sequence(vec![FramePhase {
        samples: vec![700i16; 1600],
        count: seconds * 10,
    }]))
}

fn wait_until_finished(handle: &hearsay::pipeline::orchestrator::SessionHandle) {
    let deadline = Instant::now() + Duration::from_secs(20);
    while handle.is_running() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn twelve_seconds_at_five_second_chunks_reaches_hooks_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let hook = Arc::new(RecordingHook {
        name: "recorder".into(),
        seen: seen.clone(),
    }) as Arc<dyn Hook>;

    let dispatcher = ResultDispatcher::new(vec![hook], Duration::from_secs(3)).unwrap();
    let transcriber = Arc::new(
        MockTranscriber::new("mock")
            .with_response("caption text")
            .with_confidence(0.93),
    ) as Arc<dyn Transcriber>;

    let handle = Session::new(session_config(5000))
        .start(source_with_seconds(12), transcriber, dispatcher)
        .unwrap();
    wait_until_finished(&handle);
    let summary = handle.stop().expect("summary");

    // [0,5), [5,10), and the flushed 2s partial
    assert_eq!(summary.chunks_emitted, 3);
    assert_eq!(summary.chunks_transcribed, 3);
    assert_eq!(summary.dispatch.chunks_dispatched, 3);
    assert_eq!(summary.dispatch.hook_successes, 3);
    assert_eq!(summary.dispatch.abandoned, 0);

    let mut records = seen.lock().unwrap().clone();
    records.sort_by_key(|(chunk, _, _)| *chunk);
    let chunk_ids: Vec<u64> = records.iter().map(|(chunk, _, _)| *chunk).collect();
    assert_eq!(chunk_ids, vec![0, 1, 2]);
    assert!(records.iter().all(|(_, text, _)| text == "caption text"));
    assert!(
        records
            .iter()
            .all(|(_, _, confidence)| (0.0..=1.0).contains(confidence))
    );
}

#[test]
fn failing_hook_never_blocks_its_siblings() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let hooks: Vec<Arc<dyn Hook>> = vec![
        Arc::new(AlwaysFailingHook),
        Arc::new(RecordingHook {
            name: "recorder".into(),
            seen: seen.clone(),
        }),
    ];

    let dispatcher = ResultDispatcher::new(hooks, Duration::from_secs(3)).unwrap();
    let transcriber =
        Arc::new(MockTranscriber::new("mock").with_response("still flowing")) as Arc<dyn Transcriber>;

    let handle = Session::new(session_config(1000))
        .start(source_with_seconds(4), transcriber, dispatcher)
        .unwrap();
    wait_until_finished(&handle);
    let summary = handle.stop().expect("summary");

    assert_eq!(summary.chunks_emitted, 4);
    // Each chunk produced one failure and one success
    assert_eq!(summary.dispatch.hook_failures, 4);
    assert_eq!(summary.dispatch.hook_successes, 4);

    // The recorder saw every chunk despite its failing sibling
    assert_eq!(seen.lock().unwrap().len(), 4);
}

#[test]
fn file_append_hook_built_from_config_receives_every_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("captions.log");

    let hooks_toml = format!(
        r#"
        enabled = true
        drain_timeout_ms = 3000

        [[hooks]]
        kind = "file_append"

        [hooks.config]
        path = "{}"
        format = "{{chunk_index}}: {{text}} ({{confidence:.2f}})"
        "#,
        path.display()
    );
    let hooks_config: HooksConfig = toml::from_str(&hooks_toml).unwrap();
    let set = build_hooks(&hooks_config);
    assert_eq!(set.hooks.len(), 1, "file_append hook should validate");

    let dispatcher = ResultDispatcher::new(set.hooks, Duration::from_secs(3)).unwrap();
    let transcriber = Arc::new(
        MockTranscriber::new("mock")
            .with_response("hello from the pipeline")
            .with_confidence(0.5),
    ) as Arc<dyn Transcriber>;

    let handle = Session::new(session_config(1000))
        .start(source_with_seconds(3), transcriber, dispatcher)
        .unwrap();
    wait_until_finished(&handle);
    let summary = handle.stop().expect("summary");
    assert_eq!(summary.dispatch.hook_successes, 3);

    let contents = std::fs::read_to_string(&path).unwrap();
    let mut lines: Vec<&str> = contents.lines().collect();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "0: hello from the pipeline (0.50)",
            "1: hello from the pipeline (0.50)",
            "2: hello from the pipeline (0.50)",
        ]
    );
}

#[test]
fn per_chunk_transcription_failure_does_not_stall_the_stream() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let hook = Arc::new(RecordingHook {
        name: "recorder".into(),
        seen: seen.clone(),
    }) as Arc<dyn Hook>;

    let dispatcher = ResultDispatcher::new(vec![hook], Duration::from_secs(3)).unwrap();
    let transcriber = Arc::new(
        MockTranscriber::new("mock")
            .with_response("good chunk")
            .failing_on_chunk(1),
    ) as Arc<dyn Transcriber>;

    let handle = Session::new(session_config(1000))
        .start(source_with_seconds(4), transcriber, dispatcher)
        .unwrap();
    wait_until_finished(&handle);
    let summary = handle.stop().expect("summary");

    assert_eq!(summary.chunks_emitted, 4);
    assert_eq!(summary.chunks_failed, 1);
    assert_eq!(summary.chunks_transcribed, 3);

    let mut chunk_ids: Vec<u64> = seen
        .lock()
        .unwrap()
        .iter()
        .map(|(chunk, _, _)| *chunk)
        .collect();
    chunk_ids.sort_unstable();
    assert_eq!(chunk_ids, vec![0, 2, 3]);
}

#[test]
fn unresolved_env_placeholder_disables_only_that_hook() {
    let hooks_toml = r#"
        enabled = true

        [[hooks]]
        kind = "ai_translation"

        [hooks.config]
        api_key = "${HEARSAY_E2E_MISSING_KEY}"

        [[hooks]]
        kind = "console_log"
    "#;
    let hooks_config: HooksConfig = toml::from_str(hooks_toml).unwrap();
    let set = build_hooks(&hooks_config);

    assert_eq!(set.hooks.len(), 1);
    assert_eq!(set.hooks[0].kind(), HookKind::ConsoleLog);
    assert_eq!(set.disabled.len(), 1);
    assert_eq!(set.disabled[0].kind, HookKind::AiTranslation);
    assert!(set.disabled[0].reason.contains("HEARSAY_E2E_MISSING_KEY"));
}
