use std::sync::Mutex;

use rand::Rng;

pub const DEFAULT_RESERVOIR_SIZE: usize = 1028;

/// Histogram over a uniform random sample of observed values.
///
/// The reservoir holds up to `size` observations chosen uniformly from the
/// full stream (Vitter's Algorithm R), so the derived statistics approximate
/// the whole distribution while memory stays bounded.
#[derive(Debug)]
pub struct Histogram {
    inner: Mutex<Reservoir>,
}

#[derive(Debug)]
struct Reservoir {
    size: usize,
    count: i64,
    values: Vec<i64>,
}

impl Histogram {
    pub fn new() -> Self {
        Self::with_reservoir(DEFAULT_RESERVOIR_SIZE)
    }

    pub fn with_reservoir(size: usize) -> Self {
        Self {
            inner: Mutex::new(Reservoir {
                size,
                count: 0,
                values: Vec::new(),
            }),
        }
    }

    pub fn update(&self, value: i64) {
        let mut reservoir = match self.inner.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };

        reservoir.count += 1;
        if reservoir.values.len() < reservoir.size {
            reservoir.values.push(value);
        } else {
            let slot = rand::thread_rng().gen_range(0..reservoir.count) as usize;
            if slot < reservoir.size {
                reservoir.values[slot] = value;
            }
        }
    }

    pub fn count(&self) -> i64 {
        match self.inner.lock() {
            Ok(guard) => guard.count,
            Err(_) => 0,
        }
    }

    pub fn clear(&self) {
        if let Ok(mut reservoir) = self.inner.lock() {
            reservoir.count = 0;
            reservoir.values.clear();
        }
    }

    /// Point-in-time copy of the reservoir. All derived statistics must be
    /// read from one snapshot so fields stay consistent with each other.
    pub fn snapshot(&self) -> HistogramSnapshot {
        let (count, mut values) = match self.inner.lock() {
            Ok(guard) => (guard.count, guard.values.clone()),
            Err(_) => (0, Vec::new()),
        };
        values.sort_unstable();
        HistogramSnapshot { count, values }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable view over a sorted copy of the reservoir.
#[derive(Debug, Clone)]
pub struct HistogramSnapshot {
    count: i64,
    values: Vec<i64>,
}

impl HistogramSnapshot {
    /// Total number of observations, including those no longer sampled.
    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn min(&self) -> i64 {
        self.values.first().copied().unwrap_or(0)
    }

    pub fn max(&self) -> i64 {
        self.values.last().copied().unwrap_or(0)
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let sum: i64 = self.values.iter().sum();
        sum as f64 / self.values.len() as f64
    }

    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn variance(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let sum: f64 = self
            .values
            .iter()
            .map(|value| {
                let delta = *value as f64 - mean;
                delta * delta
            })
            .sum();
        sum / self.values.len() as f64
    }

    pub fn percentile(&self, p: f64) -> f64 {
        self.percentiles(&[p])[0]
    }

    /// Interpolated percentiles over the sorted sample: the rank of the
    /// `p`-th percentile is `p * (n + 1)`, linearly interpolated between the
    /// two neighboring observations and clamped to the sample bounds.
    pub fn percentiles(&self, ps: &[f64]) -> Vec<f64> {
        let size = self.values.len();
        ps.iter()
            .map(|p| {
                if size == 0 {
                    return 0.0;
                }
                let pos = p * (size as f64 + 1.0);
                if pos < 1.0 {
                    self.values[0] as f64
                } else if pos >= size as f64 {
                    self.values[size - 1] as f64
                } else {
                    let lower = self.values[pos as usize - 1] as f64;
                    let upper = self.values[pos as usize] as f64;
                    lower + (pos - pos.floor()) * (upper - lower)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Histogram;

    #[test]
    fn statistics_match_reference_computation() {
        let histogram = Histogram::new();
        for value in 1..=100 {
            histogram.update(value);
        }

        let snapshot = histogram.snapshot();
        assert_eq!(snapshot.count(), 100);
        assert_eq!(snapshot.min(), 1);
        assert_eq!(snapshot.max(), 100);
        assert_eq!(snapshot.mean(), 50.5);
        // Population variance of 1..=100 is (n^2 - 1) / 12 = 833.25.
        assert!((snapshot.stddev() - 833.25_f64.sqrt()).abs() < 1e-9);

        let ps = snapshot.percentiles(&[0.5, 0.75, 0.95, 0.99, 0.999]);
        assert_eq!(ps[0], 50.5);
        assert_eq!(ps[1], 75.75);
        assert!((ps[2] - 95.95).abs() < 1e-9);
        assert!((ps[3] - 99.99).abs() < 1e-9);
        assert_eq!(ps[4], 100.0);
    }

    #[test]
    fn empty_histogram_reports_zeroes() {
        let snapshot = Histogram::new().snapshot();
        assert_eq!(snapshot.count(), 0);
        assert_eq!(snapshot.min(), 0);
        assert_eq!(snapshot.max(), 0);
        assert_eq!(snapshot.mean(), 0.0);
        assert_eq!(snapshot.stddev(), 0.0);
        assert_eq!(snapshot.percentile(0.99), 0.0);
    }

    #[test]
    fn reservoir_stays_bounded() {
        let histogram = Histogram::with_reservoir(16);
        for value in 0..1000 {
            histogram.update(value);
        }

        let snapshot = histogram.snapshot();
        assert_eq!(snapshot.count(), 1000);
        assert!(snapshot.max() < 1000);
        assert!(snapshot.min() >= 0);
    }
}
