use crate::metric::Metric;
use crate::parser::ParseStats;
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// A decoded sample value; the variant follows the metric's value kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Int(v) => v as f64,
            Value::Float(v) => v,
        }
    }
}

/// One (timestamp, value) point of a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Simulation time in seconds
    pub timestamp: f64,
    pub value: Value,
}

/// Samples of one metric for one flow, in log order.
///
/// Log order is the time axis. It is normally non-decreasing but this is not
/// enforced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, timestamp: f64, value: Value) {
        self.samples.push(Sample { timestamp, value });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterate the series as plot coordinates
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.samples
            .iter()
            .map(|sample| (sample.timestamp, sample.value.as_f64()))
    }

    /// Sum of all values.
    ///
    /// Integer values are summed exactly before the conversion to `f64`.
    pub fn sum(&self) -> f64 {
        let mut int_sum: i128 = 0;
        let mut float_sum = 0.0;
        for sample in &self.samples {
            match sample.value {
                Value::Int(v) => int_sum += v as i128,
                Value::Float(v) => float_sum += v,
            }
        }
        int_sum as f64 + float_sum
    }

    /// Arithmetic mean of the values, `None` for an empty series
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.sum() / self.samples.len() as f64)
    }
}

/// Flow identifier to series, iterated in the order flows first appear
pub type Flows = IndexMap<String, Series>;

/// Everything parsed out of one log: per metric, per flow series.
///
/// Every metric has an entry, possibly without flows. A flow entry only
/// exists once it has a sample, so no stored series is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowLog {
    metrics: BTreeMap<Metric, Flows>,
    stats: ParseStats,
}

impl FlowLog {
    pub fn new() -> Self {
        Self {
            metrics: Metric::ALL
                .into_iter()
                .map(|metric| (metric, Flows::new()))
                .collect(),
            stats: ParseStats::default(),
        }
    }

    /// Append a sample to the series of `flow` under `metric`
    pub fn record(&mut self, metric: Metric, flow: &str, timestamp: f64, value: Value) {
        let flows = self.metrics.entry(metric).or_default();
        match flows.get_mut(flow) {
            Some(series) => series.push(timestamp, value),
            None => {
                let mut series = Series::new();
                series.push(timestamp, value);
                flows.insert(flow.to_string(), series);
            }
        }
    }

    /// Flows recorded under `metric`
    pub fn flows(&self, metric: Metric) -> &Flows {
        // Populated for every metric in new()
        &self.metrics[&metric]
    }

    pub fn series(&self, metric: Metric, flow: &str) -> Option<&Series> {
        self.flows(metric).get(flow)
    }

    /// Total number of samples across all metrics and flows
    pub fn sample_count(&self) -> usize {
        self.metrics
            .values()
            .flat_map(|flows| flows.values())
            .map(Series::len)
            .sum()
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    pub(crate) fn set_stats(&mut self, stats: ParseStats) {
        self.stats = stats;
    }
}

impl Default for FlowLog {
    fn default() -> Self {
        Self::new()
    }
}
