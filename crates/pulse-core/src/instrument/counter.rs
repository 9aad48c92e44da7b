use std::sync::atomic::{AtomicI64, Ordering};

/// Monotonic event counter.
///
/// The count is signed so that callers tracking a level rather than a total
/// can decrement, matching the decrement support of the gauge.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicI64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self, n: i64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn dec(&self, n: i64) {
        self.value.fetch_sub(n, Ordering::Relaxed);
    }

    pub fn count(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::Counter;

    #[test]
    fn counts_increments_and_decrements() {
        let counter = Counter::new();
        counter.inc(1);
        counter.inc(4);
        counter.dec(2);
        assert_eq!(counter.count(), 3);
    }

    #[test]
    fn clear_resets_to_zero() {
        let counter = Counter::new();
        counter.inc(100);
        counter.clear();
        assert_eq!(counter.count(), 0);
    }
}
