use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{PulseError, Result};
use crate::instrument::{
    Counter, Gauge, GaugeFloat, HealthCheck, Histogram, Instrument, Meter, Timer,
};

/// Named table of instruments sampled by the snapshot engine.
///
/// Registration is write-once per name: re-registering a taken name fails,
/// while the `get_or_*` constructors hand back the existing instrument when
/// the kinds agree.
#[derive(Debug, Default)]
pub struct MetricRegistry {
    instruments: RwLock<HashMap<String, Instrument>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, instrument: Instrument) -> Result<()> {
        let name = name.into();
        let mut instruments = self.instruments.write().map_err(|_| {
            PulseError::InternalError("failed to acquire metric registry lock".to_string())
        })?;

        if instruments.contains_key(&name) {
            return Err(PulseError::AlreadyRegistered(name));
        }

        instruments.insert(name, instrument);
        Ok(())
    }

    pub fn unregister(&self, name: &str) {
        if let Ok(mut instruments) = self.instruments.write() {
            instruments.remove(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Instrument> {
        match self.instruments.read() {
            Ok(instruments) => instruments.get(name).cloned(),
            Err(_) => None,
        }
    }

    /// Point-in-time copy of the registration table, sorted by name so
    /// enumeration order is deterministic.
    pub fn each(&self) -> Vec<(String, Instrument)> {
        let instruments = match self.instruments.read() {
            Ok(guard) => guard,
            Err(_) => return Vec::new(),
        };

        let mut entries = instruments
            .iter()
            .map(|(name, instrument)| (name.clone(), instrument.clone()))
            .collect::<Vec<_>>();

        entries.sort_by(|left, right| left.0.cmp(&right.0));
        entries
    }

    pub fn len(&self) -> usize {
        match self.instruments.read() {
            Ok(instruments) => instruments.len(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counter(&self, name: &str) -> Result<Arc<Counter>> {
        match self.get_or_insert(name, || Instrument::Counter(Arc::new(Counter::new())))? {
            Instrument::Counter(counter) => Ok(counter),
            _ => Err(PulseError::KindMismatch(name.to_string())),
        }
    }

    pub fn gauge(&self, name: &str) -> Result<Arc<Gauge>> {
        match self.get_or_insert(name, || Instrument::Gauge(Arc::new(Gauge::new())))? {
            Instrument::Gauge(gauge) => Ok(gauge),
            _ => Err(PulseError::KindMismatch(name.to_string())),
        }
    }

    pub fn gauge_float(&self, name: &str) -> Result<Arc<GaugeFloat>> {
        match self.get_or_insert(name, || Instrument::GaugeFloat(Arc::new(GaugeFloat::new())))? {
            Instrument::GaugeFloat(gauge) => Ok(gauge),
            _ => Err(PulseError::KindMismatch(name.to_string())),
        }
    }

    pub fn histogram(&self, name: &str) -> Result<Arc<Histogram>> {
        match self.get_or_insert(name, || Instrument::Histogram(Arc::new(Histogram::new())))? {
            Instrument::Histogram(histogram) => Ok(histogram),
            _ => Err(PulseError::KindMismatch(name.to_string())),
        }
    }

    pub fn meter(&self, name: &str) -> Result<Arc<Meter>> {
        match self.get_or_insert(name, || Instrument::Meter(Arc::new(Meter::new())))? {
            Instrument::Meter(meter) => Ok(meter),
            _ => Err(PulseError::KindMismatch(name.to_string())),
        }
    }

    pub fn timer(&self, name: &str) -> Result<Arc<Timer>> {
        match self.get_or_insert(name, || Instrument::Timer(Arc::new(Timer::new())))? {
            Instrument::Timer(timer) => Ok(timer),
            _ => Err(PulseError::KindMismatch(name.to_string())),
        }
    }

    pub fn health_check(
        &self,
        name: &str,
        check: impl Fn() -> std::result::Result<(), String> + Send + Sync + 'static,
    ) -> Result<Arc<HealthCheck>> {
        match self.get_or_insert(name, || {
            Instrument::HealthCheck(Arc::new(HealthCheck::new(check)))
        })? {
            Instrument::HealthCheck(health) => Ok(health),
            _ => Err(PulseError::KindMismatch(name.to_string())),
        }
    }

    fn get_or_insert(&self, name: &str, build: impl FnOnce() -> Instrument) -> Result<Instrument> {
        if let Ok(instruments) = self.instruments.read()
            && let Some(existing) = instruments.get(name)
        {
            return Ok(existing.clone());
        }

        let mut instruments = self.instruments.write().map_err(|_| {
            PulseError::InternalError("failed to acquire metric registry lock".to_string())
        })?;

        Ok(instruments
            .entry(name.to_string())
            .or_insert_with(build)
            .clone())
    }
}
