use std::collections::HashMap;

use crate::instrument::{HistogramSnapshot, Instrument, MeterSnapshot, MetricKind};

/// One field of a snapshot's value map.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl FieldValue {
    /// Numeric view used by exporters; `Text` and `Null` have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Text(_) | Self::Null => None,
        }
    }
}

/// Normalized, kind-agnostic view of one instrument at one tick.
///
/// A snapshot is built fresh for every instrument on every tick and is
/// immutable once handed to the sink. The field set of `values` is fixed per
/// kind; every field is always present.
#[derive(Debug, Clone)]
pub struct Snapshot {
    id: String,
    name: String,
    kind: MetricKind,
    values: HashMap<String, FieldValue>,
    instrument: Instrument,
}

impl Snapshot {
    /// Read the instrument's current state into a snapshot. For a health
    /// check this runs the check, once per capture.
    pub fn capture(name: &str, instrument: &Instrument) -> Self {
        let kind = instrument.kind();
        let mut values = HashMap::new();

        match instrument {
            Instrument::Counter(counter) => {
                values.insert("count".to_string(), FieldValue::Int(counter.count()));
            }
            Instrument::Gauge(gauge) => {
                values.insert("value".to_string(), FieldValue::Int(gauge.value()));
            }
            Instrument::GaugeFloat(gauge) => {
                values.insert("value".to_string(), FieldValue::Float(gauge.value()));
            }
            Instrument::HealthCheck(health) => {
                health.check();
                let error = match health.error() {
                    Some(message) => FieldValue::Text(message),
                    None => FieldValue::Null,
                };
                values.insert("error".to_string(), error);
            }
            Instrument::Histogram(histogram) => {
                histogram_fields(&histogram.snapshot(), &mut values);
            }
            Instrument::Meter(meter) => {
                meter_fields(&meter.snapshot(), &mut values);
            }
            Instrument::Timer(timer) => {
                let snapshot = timer.snapshot();
                histogram_fields(&snapshot.histogram, &mut values);
                meter_fields(&snapshot.meter, &mut values);
                // Count reflects the histogram half, as for a plain histogram.
                values.insert(
                    "count".to_string(),
                    FieldValue::Int(snapshot.histogram.count()),
                );
            }
        }

        Self {
            // Stable within a process lifetime: the registry keeps names
            // unique, and the kind guards against a name being re-registered
            // as a different instrument.
            id: format!("{kind}:{name}"),
            name: name.to_string(),
            kind,
            values,
            instrument: instrument.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn values(&self) -> &HashMap<String, FieldValue> {
        &self.values
    }

    /// The underlying instrument, for sinks that need kind-specific access
    /// beyond the generic value map.
    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }
}

fn histogram_fields(snapshot: &HistogramSnapshot, values: &mut HashMap<String, FieldValue>) {
    let ps = snapshot.percentiles(&[0.5, 0.75, 0.95, 0.99, 0.999]);
    values.insert("count".to_string(), FieldValue::Int(snapshot.count()));
    values.insert("min".to_string(), FieldValue::Int(snapshot.min()));
    values.insert("max".to_string(), FieldValue::Int(snapshot.max()));
    values.insert("mean".to_string(), FieldValue::Float(snapshot.mean()));
    values.insert("stddev".to_string(), FieldValue::Float(snapshot.stddev()));
    values.insert("median".to_string(), FieldValue::Float(ps[0]));
    values.insert("75%".to_string(), FieldValue::Float(ps[1]));
    values.insert("95%".to_string(), FieldValue::Float(ps[2]));
    values.insert("99%".to_string(), FieldValue::Float(ps[3]));
    values.insert("99.9%".to_string(), FieldValue::Float(ps[4]));
}

fn meter_fields(snapshot: &MeterSnapshot, values: &mut HashMap<String, FieldValue>) {
    values.insert("count".to_string(), FieldValue::Int(snapshot.count()));
    values.insert("1m.rate".to_string(), FieldValue::Float(snapshot.rate_1m()));
    values.insert("5m.rate".to_string(), FieldValue::Float(snapshot.rate_5m()));
    values.insert(
        "15m.rate".to_string(),
        FieldValue::Float(snapshot.rate_15m()),
    );
    values.insert(
        "mean.rate".to_string(),
        FieldValue::Float(snapshot.rate_mean()),
    );
}
