use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Integer gauge holding the most recently written value.
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Floating-point gauge. The value is stored as raw bits so that reads and
/// writes stay lock-free.
#[derive(Debug, Default)]
pub struct GaugeFloat {
    bits: AtomicU64,
}

impl GaugeFloat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}
