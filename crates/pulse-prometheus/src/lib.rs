use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use prometheus::{GaugeVec, Opts, Registry};
use tracing::warn;

use pulse_core::{MetricRegistry, Result, Snapshot, SnapshotEngine};

/// Replace the characters Prometheus rejects in metric names (space, `.`,
/// `-`, `=`) with `_`. Total and deterministic over any input.
pub fn sanitize_metric_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' | '.' | '-' | '=' => '_',
            other => other,
        })
        .collect()
}

/// Sink mapping snapshots onto lazily registered Prometheus gauge vectors.
///
/// Each distinct snapshot id gets one `GaugeVec` keyed by a `key` label
/// carrying the field name; numeric fields become series values, non-numeric
/// fields are skipped. A single engine drives the sink uncontended; the
/// series map is still behind a mutex so several engines may share one sink.
pub struct PrometheusSink {
    namespace: String,
    subsystem: String,
    const_labels: HashMap<String, String>,
    registerer: Registry,
    series: Mutex<HashMap<String, GaugeVec>>,
}

impl PrometheusSink {
    pub fn new(
        namespace: impl Into<String>,
        subsystem: impl Into<String>,
        const_labels: HashMap<String, String>,
        registerer: Registry,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            subsystem: subsystem.into(),
            const_labels,
            registerer,
            series: Mutex::new(HashMap::new()),
        }
    }

    pub fn write(&self, snapshot: &Snapshot) {
        let gauges = match self.series_for(snapshot) {
            Some(gauges) => gauges,
            None => return,
        };

        for (key, value) in snapshot.values() {
            if let Some(value) = value.as_f64() {
                gauges.with_label_values(&[key.as_str()]).set(value);
            }
        }
    }

    fn series_for(&self, snapshot: &Snapshot) -> Option<GaugeVec> {
        let mut series = match self.series.lock() {
            Ok(guard) => guard,
            Err(_) => return None,
        };

        if let Some(existing) = series.get(snapshot.id()) {
            return Some(existing.clone());
        }

        let opts = Opts::new(
            sanitize_metric_name(snapshot.name()),
            format!("values sampled from the `{}` instrument", snapshot.name()),
        )
        .namespace(self.namespace.clone())
        .subsystem(self.subsystem.clone())
        .const_labels(self.const_labels.clone());

        let gauges = match GaugeVec::new(opts, &["key"]) {
            Ok(gauges) => gauges,
            Err(err) => {
                warn!(metric = snapshot.name(), error = %err, "invalid export series");
                return None;
            }
        };

        // A failed registration (typically a sanitized-name collision) drops
        // the instrument from export; it is never retried.
        if let Err(err) = self.registerer.register(Box::new(gauges.clone())) {
            warn!(metric = snapshot.name(), error = %err, "failed to register export series");
            return None;
        }

        series.insert(snapshot.id().to_string(), gauges.clone());
        Some(gauges)
    }
}

/// Snapshot engine wired to a Prometheus sink, mirroring the lifecycle of
/// the engine it wraps.
pub struct PrometheusProvider {
    engine: SnapshotEngine,
}

impl PrometheusProvider {
    pub fn new(
        namespace: impl Into<String>,
        subsystem: impl Into<String>,
        metrics: Arc<MetricRegistry>,
        registerer: Registry,
        interval: Duration,
        const_labels: HashMap<String, String>,
    ) -> Result<Self> {
        let sink = Arc::new(PrometheusSink::new(
            namespace,
            subsystem,
            const_labels,
            registerer,
        ));
        let engine = SnapshotEngine::new(metrics, interval, move |snapshot| sink.write(&snapshot))?;
        Ok(Self { engine })
    }

    pub fn start(&self) {
        self.engine.start();
    }

    pub fn stop(&self) {
        self.engine.stop();
    }

    pub async fn wait(&self) {
        self.engine.wait().await;
    }

    pub fn engine(&self) -> &SnapshotEngine {
        &self.engine
    }
}
