use crate::metric::Metric;
use crate::series::{FlowLog, Series};
use std::fmt;

const THROUGHPUT_UNIT: &str = "Kbps";
const DELAY_UNIT: &str = "ms";

/// Per-flow averages and the combined throughput of one log
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Mean throughput of each flow, in order of first appearance
    pub throughput: Vec<(String, f64)>,
    /// Combined throughput, `None` when no flow reported throughput
    pub total_throughput: Option<f64>,
    /// Mean delay of each flow, in order of first appearance
    pub delay: Vec<(String, f64)>,
}

impl Report {
    pub fn from_log(flow_log: &FlowLog) -> Self {
        let total_throughput = total_throughput(flow_log);
        if total_throughput.is_none() {
            log::warn!("No throughput samples in log, total throughput is undefined");
        }

        Self {
            throughput: averages(flow_log, Metric::Throughput),
            total_throughput,
            delay: averages(flow_log, Metric::Delay),
        }
    }
}

fn averages(log: &FlowLog, metric: Metric) -> Vec<(String, f64)> {
    log.flows(metric)
        .iter()
        .filter_map(|(flow, series)| series.mean().map(|mean| (flow.clone(), mean)))
        .collect()
}

/// Sum of every throughput sample over the length of the longest series.
///
/// This equals the sum of per-flow throughput only when all flows log at the
/// same instants; flows that start late or stop early pull it down.
pub fn total_throughput(log: &FlowLog) -> Option<f64> {
    let flows = log.flows(Metric::Throughput);
    let longest = flows.values().map(Series::len).max()?;
    if longest == 0 {
        return None;
    }
    let sum: f64 = flows.values().map(Series::sum).sum();
    Some(sum / longest as f64)
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flow, mean) in &self.throughput {
            writeln!(
                f,
                "Average {}: {} - {} {}",
                Metric::Throughput,
                flow,
                mean.trunc() as i64,
                THROUGHPUT_UNIT
            )?;
        }
        if let Some(total) = self.total_throughput {
            writeln!(
                f,
                "Total {}: {} {}",
                Metric::Throughput,
                total.trunc() as i64,
                THROUGHPUT_UNIT
            )?;
        }
        for (flow, mean) in &self.delay {
            writeln!(
                f,
                "Average {}: {} - {} {}",
                Metric::Delay,
                flow,
                mean.trunc() as i64,
                DELAY_UNIT
            )?;
        }
        Ok(())
    }
}
