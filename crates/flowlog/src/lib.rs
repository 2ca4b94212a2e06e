//! # Flowlog
//!
//! Parsing and summary statistics for the per-flow trace logs printed by a
//! congestion-control simulation run.
//!
//! Each data line of a log carries a timestamp, a metric label, a flow id and
//! a value:
//!
//! ```text
//! 12.5 s > thr 0(udp) 4321 Kbps
//! 12.5 s > trendline 0(udp) 0.0013
//! ```
//!
//! [`parse_file`] (or [`parse_reader`]) turns a log into a [`FlowLog`], a
//! `Metric -> flow -> Series` map, and [`Report`] computes the per-flow
//! averages printed after a run.
//!
//! ```
//! use flowlog::{parse_reader, Metric, Report};
//!
//! let log = parse_reader("1.0 s > thr 0(udp) 500 Kbps\n2.0 s > thr 0(udp) 700 Kbps\n".as_bytes())
//!     .unwrap();
//! assert_eq!(log.flows(Metric::Throughput).len(), 1);
//!
//! let report = Report::from_log(&log);
//! assert_eq!(report.to_string(), "Average thr: 0(udp) - 600 Kbps\nTotal thr: 600 Kbps\n");
//! ```

pub mod metric;
pub mod parser;
pub mod report;
pub mod series;

pub use metric::{Metric, UnknownMetric, ValueKind};
pub use parser::{parse_file, parse_line, parse_reader, Error, ParseStats, Record, Skip};
pub use report::Report;
pub use series::{FlowLog, Flows, Sample, Series, Value};
