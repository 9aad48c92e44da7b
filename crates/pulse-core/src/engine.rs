use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace};

use crate::error::{PulseError, Result};
use crate::registry::MetricRegistry;
use crate::snapshot::Snapshot;

/// Callback receiving one snapshot per instrument per tick. Runs
/// synchronously on the engine's worker.
pub type Sink = Arc<dyn Fn(Snapshot) + Send + Sync>;

/// Periodic sampling loop over a metric registry.
///
/// Each `start()` spawns one worker that fires on a fixed period, enumerates
/// the registry, and hands one snapshot per instrument to the sink. Ticks on
/// a given worker never overlap: a slow sink delays both the rest of the
/// tick and the next tick, and periods that elapse while a tick is still
/// running are dropped rather than queued.
///
/// `stop()` requests shutdown and returns immediately; `wait()` resolves
/// once every worker has drained its in-flight tick and exited. An engine is
/// not restartable after `stop()` and `wait()` have completed.
pub struct SnapshotEngine {
    registry: Arc<MetricRegistry>,
    interval: Duration,
    sink: Sink,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl SnapshotEngine {
    pub fn new(
        registry: Arc<MetricRegistry>,
        interval: Duration,
        sink: impl Fn(Snapshot) + Send + Sync + 'static,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(PulseError::InvalidInterval);
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        Ok(Self {
            registry,
            interval,
            sink: Arc::new(sink),
            cancel_tx,
            cancel_rx,
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Spawn a sampling worker. Calling twice spawns two workers; sampling
    /// once per interval is the caller's responsibility.
    pub fn start(&self) {
        let registry = self.registry.clone();
        let sink = self.sink.clone();
        let mut cancel = self.cancel_rx.clone();
        let period = self.interval;

        let handle = tokio::spawn(async move {
            debug!(period_ms = period.as_millis() as u64, "snapshot worker started");

            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    // Cancellation is only observed here, between ticks; an
                    // in-flight tick always drains over all instruments.
                    _ = cancel.wait_for(|cancelled| *cancelled) => break,
                    _ = ticker.tick() => {
                        let instruments = registry.each();
                        trace!(instruments = instruments.len(), "sampling tick");
                        for (name, instrument) in &instruments {
                            sink(Snapshot::capture(name, instrument));
                        }
                    }
                }
            }

            debug!("snapshot worker stopped");
        });

        // The handle must be stored even if the lock was poisoned, or
        // `wait()` would miss this worker.
        match self.workers.lock() {
            Ok(mut workers) => workers.push(handle),
            Err(poisoned) => poisoned.into_inner().push(handle),
        }
    }

    /// Request shutdown. Non-blocking and safe to call any number of times,
    /// including before `start()`.
    pub fn stop(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Block until every spawned worker has exited. Call after `stop()` to
    /// guarantee no further sink invocations occur.
    pub async fn wait(&self) {
        let handles: Vec<JoinHandle<()>> = match self.workers.lock() {
            Ok(mut workers) => workers.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        };

        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::SnapshotEngine;
    use crate::instrument::MetricKind;
    use crate::registry::MetricRegistry;
    use crate::snapshot::{FieldValue, Snapshot};

    fn collecting_sink() -> (Arc<Mutex<Vec<Snapshot>>>, impl Fn(Snapshot) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        (seen, move |snapshot| {
            sink_seen.lock().unwrap().push(snapshot);
        })
    }

    #[test]
    fn zero_interval_is_rejected() {
        let registry = Arc::new(MetricRegistry::new());
        let result = SnapshotEngine::new(registry, Duration::ZERO, |_| {});
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn samples_counter_once_per_tick() {
        let registry = Arc::new(MetricRegistry::new());
        let counter = registry.counter("requests").unwrap();
        counter.inc(5);

        let (seen, sink) = collecting_sink();
        let engine = SnapshotEngine::new(registry, Duration::from_secs(1), sink).unwrap();
        engine.start();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        engine.stop();
        engine.wait().await;

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        let snapshot = &seen[0];
        assert_eq!(snapshot.kind(), MetricKind::Counter);
        assert_eq!(snapshot.name(), "requests");
        assert_eq!(snapshot.values()["count"], FieldValue::Int(5));
    }

    #[tokio::test(start_paused = true)]
    async fn tick_enumerates_in_registry_order() {
        let registry = Arc::new(MetricRegistry::new());
        registry.counter("b").unwrap();
        registry.counter("a").unwrap();
        registry.counter("c").unwrap();

        let (seen, sink) = collecting_sink();
        let engine = SnapshotEngine::new(registry, Duration::from_secs(1), sink).unwrap();
        engine.start();

        tokio::time::sleep(Duration::from_millis(1100)).await;
        engine.stop();
        engine.wait().await;

        let names: Vec<String> = seen
            .lock()
            .unwrap()
            .iter()
            .take(3)
            .map(|snapshot| snapshot.name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_any_tick_still_terminates() {
        let registry = Arc::new(MetricRegistry::new());
        registry.counter("x").unwrap();

        let (seen, sink) = collecting_sink();
        let engine = SnapshotEngine::new(registry, Duration::from_secs(3600), sink).unwrap();
        engine.stop();
        engine.start();
        engine.wait().await;

        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let registry = Arc::new(MetricRegistry::new());
        let engine = SnapshotEngine::new(registry, Duration::from_secs(1), |_| {}).unwrap();
        engine.start();

        engine.stop();
        engine.stop();
        engine.stop();
        engine.wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn no_sink_calls_after_wait_returns() {
        let registry = Arc::new(MetricRegistry::new());
        registry.counter("x").unwrap();

        let (seen, sink) = collecting_sink();
        let engine = SnapshotEngine::new(registry, Duration::from_millis(10), sink).unwrap();
        engine.start();

        tokio::time::sleep(Duration::from_millis(55)).await;
        engine.stop();
        engine.wait().await;

        let count_at_wait = seen.lock().unwrap().len();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(seen.lock().unwrap().len(), count_at_wait);
    }

    #[tokio::test(start_paused = true)]
    async fn lifecycle_survives_a_poisoned_handle_list() {
        let registry = Arc::new(MetricRegistry::new());
        registry.counter("x").unwrap();

        let (seen, sink) = collecting_sink();
        let engine =
            Arc::new(SnapshotEngine::new(registry, Duration::from_secs(1), sink).unwrap());

        // Poison the workers lock from another thread.
        let other = engine.clone();
        std::thread::spawn(move || {
            let _guard = other.workers.lock().unwrap();
            panic!("poisoning the handle list");
        })
        .join()
        .unwrap_err();

        // The worker spawned afterwards must still be tracked and drained.
        engine.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        engine.stop();
        engine.wait().await;

        let count_at_wait = seen.lock().unwrap().len();
        assert!(count_at_wait > 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(seen.lock().unwrap().len(), count_at_wait);
    }

    #[tokio::test(start_paused = true)]
    async fn health_check_runs_once_per_tick() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let runs = Arc::new(AtomicUsize::new(0));
        let probe = runs.clone();

        let registry = Arc::new(MetricRegistry::new());
        registry
            .health_check("db", move || {
                probe.fetch_add(1, Ordering::Relaxed);
                Ok(())
            })
            .unwrap();

        let (seen, sink) = collecting_sink();
        let engine = SnapshotEngine::new(registry, Duration::from_secs(1), sink).unwrap();
        engine.start();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        engine.stop();
        engine.wait().await;

        let ticks = seen.lock().unwrap().len();
        assert_eq!(runs.load(Ordering::Relaxed), ticks);
        assert_eq!(
            seen.lock().unwrap()[0].values()["error"],
            FieldValue::Null
        );
    }
}
