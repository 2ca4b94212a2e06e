use std::fmt;
use std::str::FromStr;

/// How the value token of a metric is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Whole token parsed as a signed integer
    Integer,
    /// Token minus its trailing character parsed as a float
    Float,
}

/// The measurement categories traced by the simulation.
///
/// Declaration order is the order of the chart panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    Throughput,
    Delay,
    Trendline,
    Interval,
    Lost,
    Target,
}

/// Returned when a log line names a metric outside the known set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMetric(pub String);

impl fmt::Display for UnknownMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown metric label {:?}", self.0)
    }
}

impl std::error::Error for UnknownMetric {}

impl Metric {
    /// All metrics in panel order
    pub const ALL: [Metric; 6] = [
        Metric::Throughput,
        Metric::Delay,
        Metric::Trendline,
        Metric::Interval,
        Metric::Lost,
        Metric::Target,
    ];

    /// Label used for this metric in the log and in the text report
    pub fn label(self) -> &'static str {
        match self {
            Metric::Throughput => "thr",
            Metric::Delay => "delay",
            Metric::Trendline => "trendline",
            Metric::Interval => "interval",
            Metric::Lost => "lost",
            Metric::Target => "target",
        }
    }

    pub fn value_kind(self) -> ValueKind {
        match self {
            Metric::Trendline => ValueKind::Float,
            _ => ValueKind::Integer,
        }
    }

    /// Vertical axis title, qualified with the unit where the metric has one
    pub fn axis_label(self) -> &'static str {
        match self {
            Metric::Throughput => "Throughput (Kbps)",
            Metric::Delay => "Delay (ms)",
            Metric::Trendline => "Trendline",
            Metric::Interval => "Interval (microsec)",
            Metric::Lost => "Lost",
            Metric::Target => "Target Interval (microsec)",
        }
    }
}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.label() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
