pub mod engine;
pub mod error;
pub mod instrument;
pub mod registry;
pub mod snapshot;

pub use engine::{Sink, SnapshotEngine};
pub use error::{PulseError, Result};
pub use instrument::{
    Counter, Gauge, GaugeFloat, HealthCheck, Histogram, HistogramSnapshot, Instrument, Meter,
    MeterSnapshot, MetricKind, Timer, TimerSnapshot,
};
pub use registry::MetricRegistry;
pub use snapshot::{FieldValue, Snapshot};
