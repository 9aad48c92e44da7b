use std::time::{Duration, Instant};

use super::histogram::{Histogram, HistogramSnapshot};
use super::meter::{Meter, MeterSnapshot};

/// Duration instrument combining a histogram over recorded durations
/// (in nanoseconds) with a meter marking one event per record.
#[derive(Debug, Default)]
pub struct Timer {
    histogram: Histogram,
    meter: Meter,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, duration: Duration) {
        self.histogram.update(duration.as_nanos() as i64);
        self.meter.mark(1);
    }

    /// Run `f` and record how long it took.
    pub fn time<T>(&self, f: impl FnOnce() -> T) -> T {
        let started_at = Instant::now();
        let output = f();
        self.update(started_at.elapsed());
        output
    }

    pub fn count(&self) -> i64 {
        self.histogram.count()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            histogram: self.histogram.snapshot(),
            meter: self.meter.snapshot(),
        }
    }
}

/// Point-in-time view over both halves of a timer.
#[derive(Debug, Clone)]
pub struct TimerSnapshot {
    pub histogram: HistogramSnapshot,
    pub meter: MeterSnapshot,
}
