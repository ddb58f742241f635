//! Result dispatcher: fans each transcription out to all hooks concurrently.
//!
//! The dispatcher owns a dedicated tokio runtime sized to the hook count, so
//! every hook of a chunk runs truly in parallel and a slow hook in chunk N
//! never delays chunk N+1: `dispatch` only spawns and returns. Each
//! invocation is wrapped in the hook's own timeout, and every outcome is
//! recorded through the observer. Nothing a hook does escalates to the
//! caller.

use crate::error::{HearsayError, Result};
use crate::hooks::{Hook, HookContext, HookKind, HookResult};
use crate::stt::transcriber::TranscriptionResult;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime};

/// One recorded hook invocation.
#[derive(Debug, Clone)]
pub struct HookOutcome {
    pub chunk_index: u64,
    pub hook: String,
    pub kind: HookKind,
    pub result: HookResult,
}

/// Receives every hook outcome, success or failure.
pub trait DispatchObserver: Send + Sync {
    fn record(&self, outcome: &HookOutcome);
}

/// Default observer: logs outcomes through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl DispatchObserver for LogObserver {
    fn record(&self, outcome: &HookOutcome) {
        if outcome.result.success {
            tracing::debug!(
                hook = %outcome.hook,
                chunk = outcome.chunk_index,
                elapsed_ms = outcome.result.elapsed.as_millis() as u64,
                "hook ok: {}",
                outcome.result.message
            );
        } else {
            tracing::warn!(
                hook = %outcome.hook,
                chunk = outcome.chunk_index,
                elapsed_ms = outcome.result.elapsed.as_millis() as u64,
                "hook failed: {}",
                outcome.result.message
            );
        }
    }
}

/// Test observer that collects all outcomes.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    outcomes: std::sync::Mutex<Vec<HookOutcome>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> Vec<HookOutcome> {
        self.outcomes.lock().expect("observer lock").clone()
    }

    pub fn len(&self) -> usize {
        self.outcomes.lock().expect("observer lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DispatchObserver for CollectingObserver {
    fn record(&self, outcome: &HookOutcome) {
        self.outcomes
            .lock()
            .expect("observer lock")
            .push(outcome.clone());
    }
}

#[derive(Debug, Default)]
struct Counters {
    chunks_dispatched: AtomicU64,
    hook_successes: AtomicU64,
    hook_failures: AtomicU64,
    in_flight: AtomicU64,
}

/// Final dispatch statistics, produced by `shutdown`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub chunks_dispatched: u64,
    pub hook_successes: u64,
    pub hook_failures: u64,
    /// Hook invocations still running when the drain timeout expired.
    pub abandoned: u64,
}

/// Fans transcription results out to the hook set.
pub struct ResultDispatcher {
    hooks: Vec<Arc<dyn Hook>>,
    /// Dedicated runtime; `None` only after `shutdown` has taken it.
    runtime: Option<tokio::runtime::Runtime>,
    observer: Arc<dyn DispatchObserver>,
    counters: Arc<Counters>,
    drain_timeout: Duration,
}

impl Drop for ResultDispatcher {
    fn drop(&mut self) {
        // A runtime must not be dropped inside an async context; background
        // shutdown never blocks, so dropping the dispatcher is safe anywhere.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl ResultDispatcher {
    /// Create a dispatcher over the given hooks.
    ///
    /// The internal runtime gets one worker per hook so one chunk's hooks
    /// never queue behind each other.
    pub fn new(hooks: Vec<Arc<dyn Hook>>, drain_timeout: Duration) -> Result<Self> {
        Self::with_observer(hooks, drain_timeout, Arc::new(LogObserver))
    }

    pub fn with_observer(
        hooks: Vec<Arc<dyn Hook>>,
        drain_timeout: Duration,
        observer: Arc<dyn DispatchObserver>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(hooks.len().max(1))
            .thread_name("hearsay-hook")
            .enable_all()
            .build()
            .map_err(|e| HearsayError::Other(format!("failed to build hook runtime: {}", e)))?;

        Ok(Self {
            hooks,
            runtime: Some(runtime),
            observer,
            counters: Arc::new(Counters::default()),
            drain_timeout,
        })
    }

    /// Number of hooks receiving dispatches.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Fan one transcription result out to every hook. Never blocks on hook
    /// work; call order across chunks is preserved only per hook invocation
    /// start, not completion.
    pub fn dispatch(&self, result: TranscriptionResult, chunk_start: SystemTime) {
        self.counters.chunks_dispatched.fetch_add(1, Ordering::AcqRel);

        if self.hooks.is_empty() {
            return;
        }

        let timestamp_secs = chunk_start
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        let ctx = Arc::new(HookContext {
            chunk_index: result.chunk_id,
            dispatched_at: SystemTime::now(),
            timestamp_secs,
            result,
        });

        let Some(runtime) = &self.runtime else {
            return;
        };

        self.counters
            .in_flight
            .fetch_add(self.hooks.len() as u64, Ordering::AcqRel);

        for hook in &self.hooks {
            let hook = Arc::clone(hook);
            let ctx = Arc::clone(&ctx);
            let observer = Arc::clone(&self.observer);
            let counters = Arc::clone(&self.counters);

            runtime.spawn(async move {
                let start = Instant::now();
                let timeout = hook.timeout();

                let mut result = match tokio::time::timeout(timeout, hook.execute(&ctx)).await {
                    Ok(result) => result,
                    Err(_) => HookResult::failure(format!(
                        "timed out after {:.1}s",
                        timeout.as_secs_f64()
                    )),
                };
                result.elapsed = start.elapsed();

                if result.success {
                    counters.hook_successes.fetch_add(1, Ordering::AcqRel);
                } else {
                    counters.hook_failures.fetch_add(1, Ordering::AcqRel);
                }

                observer.record(&HookOutcome {
                    chunk_index: ctx.chunk_index,
                    hook: hook.name().to_string(),
                    kind: hook.kind(),
                    result,
                });

                counters.in_flight.fetch_sub(1, Ordering::AcqRel);
            });
        }
    }

    /// Number of hook invocations currently running or queued.
    pub fn in_flight(&self) -> u64 {
        self.counters.in_flight.load(Ordering::Acquire)
    }

    /// Drain phase: wait up to the configured drain timeout for in-flight
    /// hooks, then abandon whatever is still running and tear the runtime
    /// down. Abandoned invocations are counted, not awaited.
    pub fn shutdown(mut self) -> DispatchSummary {
        let deadline = Instant::now() + self.drain_timeout;
        while self.counters.in_flight.load(Ordering::Acquire) > 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }

        let abandoned = self.counters.in_flight.load(Ordering::Acquire);
        if abandoned > 0 {
            tracing::warn!(
                abandoned,
                "drain timeout expired with hooks still running; abandoning them"
            );
        }

        // Non-blocking teardown: abandoned tasks die with the runtime.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }

        DispatchSummary {
            chunks_dispatched: self.counters.chunks_dispatched.load(Ordering::Acquire),
            hook_successes: self.counters.hook_successes.load(Ordering::Acquire),
            hook_failures: self.counters.hook_failures.load(Ordering::Acquire),
            abandoned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::transcriber::TranscriptionResult;
    use async_trait::async_trait;

    fn result_for(chunk_id: u64) -> TranscriptionResult {
        TranscriptionResult {
            chunk_id,
            text: format!("chunk {}", chunk_id),
            confidence: 0.9,
            language: "en".to_string(),
            segments: Vec::new(),
        }
    }

    /// Hook that sleeps asynchronously, then succeeds.
    struct SleepHook {
        name: String,
        delay: Duration,
        timeout: Duration,
    }

    impl SleepHook {
        fn new(name: &str, delay: Duration, timeout: Duration) -> Arc<dyn Hook> {
            Arc::new(Self {
                name: name.to_string(),
                delay,
                timeout,
            })
        }
    }

    #[async_trait]
    impl Hook for SleepHook {
        fn name(&self) -> &str {
            &self.name
        }

        fn kind(&self) -> HookKind {
            HookKind::Command
        }

        fn timeout(&self) -> Duration {
            self.timeout
        }

        async fn execute(&self, _ctx: &HookContext) -> HookResult {
            tokio::time::sleep(self.delay).await;
            HookResult::ok("slept")
        }
    }

    /// Hook that always fails.
    struct FailingHook;

    #[async_trait]
    impl Hook for FailingHook {
        fn name(&self) -> &str {
            "failing"
        }

        fn kind(&self) -> HookKind {
            HookKind::Webhook
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(5)
        }

        async fn execute(&self, _ctx: &HookContext) -> HookResult {
            HookResult::failure("always fails")
        }
    }

    fn wait_for_outcomes(observer: &CollectingObserver, count: usize, budget: Duration) {
        let deadline = Instant::now() + budget;
        while observer.len() < count && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_dispatch_records_every_hook_outcome() {
        let observer = Arc::new(CollectingObserver::new());
        let hooks = vec![
            SleepHook::new("fast-1", Duration::ZERO, Duration::from_secs(1)),
            SleepHook::new("fast-2", Duration::ZERO, Duration::from_secs(1)),
        ];
        let dispatcher =
            ResultDispatcher::with_observer(hooks, Duration::from_secs(2), observer.clone())
                .unwrap();

        dispatcher.dispatch(result_for(0), SystemTime::now());
        wait_for_outcomes(&observer, 2, Duration::from_secs(2));

        let outcomes = observer.outcomes();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.result.success));
        assert!(outcomes.iter().all(|o| o.chunk_index == 0));

        let summary = dispatcher.shutdown();
        assert_eq!(summary.chunks_dispatched, 1);
        assert_eq!(summary.hook_successes, 2);
        assert_eq!(summary.hook_failures, 0);
        assert_eq!(summary.abandoned, 0);
    }

    #[test]
    fn test_slow_hook_times_out_without_delaying_siblings() {
        // Hook #2 has a 1s timeout but sleeps 5s; #1 and #3 finish in 200ms.
        // Expected: [ok, timeout failure, ok] and total wall time near the
        // timeout bound, nowhere near 5.2s.
        let observer = Arc::new(CollectingObserver::new());
        let hooks = vec![
            SleepHook::new("hook-1", Duration::from_millis(200), Duration::from_secs(5)),
            SleepHook::new("hook-2", Duration::from_secs(5), Duration::from_secs(1)),
            SleepHook::new("hook-3", Duration::from_millis(200), Duration::from_secs(5)),
        ];
        let dispatcher =
            ResultDispatcher::with_observer(hooks, Duration::from_secs(3), observer.clone())
                .unwrap();

        let start = Instant::now();
        dispatcher.dispatch(result_for(0), SystemTime::now());
        wait_for_outcomes(&observer, 3, Duration::from_secs(3));
        let wall = start.elapsed();

        let outcomes = observer.outcomes();
        assert_eq!(outcomes.len(), 3);

        let by_name = |name: &str| {
            outcomes
                .iter()
                .find(|o| o.hook == name)
                .unwrap_or_else(|| panic!("no outcome for {name}"))
        };
        assert!(by_name("hook-1").result.success);
        assert!(by_name("hook-3").result.success);

        let timed_out = by_name("hook-2");
        assert!(!timed_out.result.success);
        assert!(timed_out.result.message.contains("timed out"));
        assert!(timed_out.result.elapsed >= Duration::from_millis(900));

        assert!(
            wall < Duration::from_millis(2500),
            "dispatch should be bounded by the timeout, took {:?}",
            wall
        );

        let summary = dispatcher.shutdown();
        assert_eq!(summary.hook_successes, 2);
        assert_eq!(summary.hook_failures, 1);
    }

    #[test]
    fn test_failure_does_not_cancel_siblings_or_next_chunk() {
        let observer = Arc::new(CollectingObserver::new());
        let hooks: Vec<Arc<dyn Hook>> = vec![
            Arc::new(FailingHook),
            SleepHook::new("healthy", Duration::ZERO, Duration::from_secs(1)),
        ];
        let dispatcher =
            ResultDispatcher::with_observer(hooks, Duration::from_secs(2), observer.clone())
                .unwrap();

        dispatcher.dispatch(result_for(0), SystemTime::now());
        dispatcher.dispatch(result_for(1), SystemTime::now());
        wait_for_outcomes(&observer, 4, Duration::from_secs(2));

        let outcomes = observer.outcomes();
        assert_eq!(outcomes.len(), 4);

        for chunk in [0u64, 1] {
            assert!(
                outcomes
                    .iter()
                    .any(|o| o.chunk_index == chunk && o.hook == "healthy" && o.result.success)
            );
            assert!(
                outcomes
                    .iter()
                    .any(|o| o.chunk_index == chunk && o.hook == "failing" && !o.result.success)
            );
        }

        let summary = dispatcher.shutdown();
        assert_eq!(summary.chunks_dispatched, 2);
        assert_eq!(summary.hook_successes, 2);
        assert_eq!(summary.hook_failures, 2);
    }

    #[test]
    fn test_dispatch_does_not_block_caller() {
        let dispatcher = ResultDispatcher::new(
            vec![SleepHook::new(
                "slow",
                Duration::from_secs(2),
                Duration::from_secs(10),
            )],
            Duration::from_millis(100),
        )
        .unwrap();

        let start = Instant::now();
        dispatcher.dispatch(result_for(0), SystemTime::now());
        assert!(
            start.elapsed() < Duration::from_millis(100),
            "dispatch must return immediately"
        );

        // Drain timeout (100ms) is far shorter than the hook (2s): abandoned.
        let summary = dispatcher.shutdown();
        assert_eq!(summary.abandoned, 1);
    }

    #[test]
    fn test_shutdown_waits_for_short_work() {
        let observer = Arc::new(CollectingObserver::new());
        let dispatcher = ResultDispatcher::with_observer(
            vec![SleepHook::new(
                "brief",
                Duration::from_millis(100),
                Duration::from_secs(1),
            )],
            Duration::from_secs(2),
            observer.clone(),
        )
        .unwrap();

        dispatcher.dispatch(result_for(0), SystemTime::now());
        let summary = dispatcher.shutdown();

        assert_eq!(summary.abandoned, 0);
        assert_eq!(summary.hook_successes, 1);
        assert_eq!(observer.len(), 1);
    }

    #[test]
    fn test_dispatch_with_no_hooks_counts_chunks() {
        let dispatcher = ResultDispatcher::new(vec![], Duration::from_millis(100)).unwrap();
        dispatcher.dispatch(result_for(0), SystemTime::now());
        dispatcher.dispatch(result_for(1), SystemTime::now());

        let summary = dispatcher.shutdown();
        assert_eq!(summary.chunks_dispatched, 2);
        assert_eq!(summary.hook_successes, 0);
        assert_eq!(summary.abandoned, 0);
    }

    #[test]
    fn test_elapsed_is_stamped() {
        let observer = Arc::new(CollectingObserver::new());
        let dispatcher = ResultDispatcher::with_observer(
            vec![SleepHook::new(
                "timed",
                Duration::from_millis(50),
                Duration::from_secs(1),
            )],
            Duration::from_secs(2),
            observer.clone(),
        )
        .unwrap();

        dispatcher.dispatch(result_for(0), SystemTime::now());
        wait_for_outcomes(&observer, 1, Duration::from_secs(2));

        let outcomes = observer.outcomes();
        assert!(outcomes[0].result.elapsed >= Duration::from_millis(50));
        dispatcher.shutdown();
    }
}
