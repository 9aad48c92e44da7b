mod counter;
mod gauge;
mod health;
mod histogram;
mod meter;
mod timer;

pub use counter::Counter;
pub use gauge::{Gauge, GaugeFloat};
pub use health::HealthCheck;
pub use histogram::{DEFAULT_RESERVOIR_SIZE, Histogram, HistogramSnapshot};
pub use meter::{Meter, MeterSnapshot};
pub use timer::{Timer, TimerSnapshot};

use std::fmt;
use std::sync::Arc;

/// Kind of a sampled metric. Integer and floating-point gauges both report
/// `Gauge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Meter,
    Timer,
    HealthCheck,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
            Self::Meter => "meter",
            Self::Timer => "timer",
            Self::HealthCheck => "health_check",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of registrable instruments. Each variant holds a shared handle,
/// so cloning an `Instrument` is cheap and clones observe the same state.
#[derive(Debug, Clone)]
pub enum Instrument {
    Counter(Arc<Counter>),
    Gauge(Arc<Gauge>),
    GaugeFloat(Arc<GaugeFloat>),
    Histogram(Arc<Histogram>),
    Meter(Arc<Meter>),
    Timer(Arc<Timer>),
    HealthCheck(Arc<HealthCheck>),
}

impl Instrument {
    pub fn kind(&self) -> MetricKind {
        match self {
            Self::Counter(_) => MetricKind::Counter,
            Self::Gauge(_) | Self::GaugeFloat(_) => MetricKind::Gauge,
            Self::Histogram(_) => MetricKind::Histogram,
            Self::Meter(_) => MetricKind::Meter,
            Self::Timer(_) => MetricKind::Timer,
            Self::HealthCheck(_) => MetricKind::HealthCheck,
        }
    }
}
