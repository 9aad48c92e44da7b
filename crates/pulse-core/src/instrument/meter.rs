use std::sync::Mutex;
use std::time::{Duration, Instant};

const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Event-rate instrument: total count plus exponentially weighted
/// moving-average rates over 1, 5 and 15 minute windows.
///
/// The moving averages advance in fixed 5-second steps. Instead of a
/// background ticker, elapsed steps are applied lazily whenever the meter is
/// marked or read.
#[derive(Debug)]
pub struct Meter {
    inner: Mutex<MeterState>,
}

#[derive(Debug)]
struct MeterState {
    count: i64,
    uncounted: i64,
    rate_1m: Ewma,
    rate_5m: Ewma,
    rate_15m: Ewma,
    started_at: Instant,
    last_tick: Instant,
}

impl Meter {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            inner: Mutex::new(MeterState {
                count: 0,
                uncounted: 0,
                rate_1m: Ewma::new(1.0),
                rate_5m: Ewma::new(5.0),
                rate_15m: Ewma::new(15.0),
                started_at: now,
                last_tick: now,
            }),
        }
    }

    pub fn mark(&self, n: i64) {
        if let Ok(mut state) = self.inner.lock() {
            state.advance(Instant::now());
            state.count += n;
            state.uncounted += n;
        }
    }

    pub fn count(&self) -> i64 {
        match self.inner.lock() {
            Ok(state) => state.count,
            Err(_) => 0,
        }
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        let now = Instant::now();
        let mut state = match self.inner.lock() {
            Ok(guard) => guard,
            Err(_) => return MeterSnapshot::default(),
        };

        state.advance(now);
        MeterSnapshot {
            count: state.count,
            rate_1m: state.rate_1m.rate(),
            rate_5m: state.rate_5m.rate(),
            rate_15m: state.rate_15m.rate(),
            rate_mean: state.mean_rate(now),
        }
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

impl MeterState {
    fn advance(&mut self, now: Instant) {
        while now.duration_since(self.last_tick) >= TICK_INTERVAL {
            let instant_rate = self.uncounted as f64 / TICK_INTERVAL.as_secs_f64();
            self.uncounted = 0;
            self.rate_1m.tick(instant_rate);
            self.rate_5m.tick(instant_rate);
            self.rate_15m.tick(instant_rate);
            self.last_tick += TICK_INTERVAL;
        }
    }

    fn mean_rate(&self, now: Instant) -> f64 {
        let elapsed = now.duration_since(self.started_at).as_secs_f64();
        if elapsed == 0.0 {
            0.0
        } else {
            self.count as f64 / elapsed
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MeterSnapshot {
    count: i64,
    rate_1m: f64,
    rate_5m: f64,
    rate_15m: f64,
    rate_mean: f64,
}

impl MeterSnapshot {
    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn rate_1m(&self) -> f64 {
        self.rate_1m
    }

    pub fn rate_5m(&self) -> f64 {
        self.rate_5m
    }

    pub fn rate_15m(&self) -> f64 {
        self.rate_15m
    }

    pub fn rate_mean(&self) -> f64 {
        self.rate_mean
    }
}

/// Exponentially weighted moving average over 5-second ticks, with
/// `alpha = 1 - exp(-5 / 60 / minutes)`. The first tick seeds the average
/// with the instantaneous rate.
#[derive(Debug)]
struct Ewma {
    rate: f64,
    alpha: f64,
    initialized: bool,
}

impl Ewma {
    fn new(minutes: f64) -> Self {
        Self {
            rate: 0.0,
            alpha: 1.0 - (-5.0 / 60.0 / minutes).exp(),
            initialized: false,
        }
    }

    fn tick(&mut self, instant_rate: f64) {
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}
