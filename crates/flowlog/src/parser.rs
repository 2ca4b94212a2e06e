use crate::metric::{Metric, ValueKind};
use crate::series::{FlowLog, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Minimum number of space separated tokens in a data line
pub const MIN_TOKENS: usize = 6;

/// First-token marker of non-data lines, e.g. the `(UDP)0: Throughput ...`
/// summary printed at the end of a run
pub const NON_DATA_MARKER: &str = "P)";

/// Errors that abort parsing of a log
#[derive(Error, Debug)]
pub enum Error {
    /// The log could not be opened or read
    #[error("failed to read log: {0}")]
    Io(#[from] std::io::Error),

    /// The first token of a data line is not a number
    #[error("line {line}: invalid timestamp {token:?}")]
    InvalidTimestamp { line: usize, token: String },

    /// The metric label is not one of the known metrics
    #[error("line {line}: unknown metric {label:?}")]
    UnknownMetric { line: usize, label: String },

    /// The value token does not decode for its metric
    #[error("line {line}: invalid {metric} value {token:?}")]
    InvalidValue {
        line: usize,
        metric: Metric,
        token: String,
    },
}

/// One decoded data line
#[derive(Debug, Clone, PartialEq)]
pub struct Record<'a> {
    pub timestamp: f64,
    pub metric: Metric,
    pub flow: &'a str,
    pub value: Value,
}

/// Why a line did not produce a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Fewer than [`MIN_TOKENS`] tokens
    Short,
    /// First token carries [`NON_DATA_MARKER`]
    Marker,
}

/// Counters gathered while parsing a log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    pub samples: usize,
    pub skipped_short: usize,
    pub skipped_marker: usize,
}

/// Classify a raw log line.
///
/// The line is split on single spaces, keeping empty tokens, with its line
/// terminator still attached. The terminator is therefore the trailing
/// character that is dropped from a trendline value at the end of a line.
///
/// `line_no` is only used to annotate errors.
pub fn parse_line(line: &str, line_no: usize) -> Result<Result<Record<'_>, Skip>, Error> {
    let tokens: Vec<&str> = line.split(' ').collect();
    if tokens.len() < MIN_TOKENS {
        return Ok(Err(Skip::Short));
    }
    if tokens[0].contains(NON_DATA_MARKER) {
        return Ok(Err(Skip::Marker));
    }

    let timestamp = tokens[0]
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidTimestamp {
            line: line_no,
            token: tokens[0].to_string(),
        })?;

    let metric = tokens[3]
        .parse::<Metric>()
        .map_err(|e| Error::UnknownMetric {
            line: line_no,
            label: e.0,
        })?;

    let flow = tokens[4];
    let value = decode_value(metric, tokens[5]).ok_or_else(|| Error::InvalidValue {
        line: line_no,
        metric,
        token: tokens[5].to_string(),
    })?;

    Ok(Ok(Record {
        timestamp,
        metric,
        flow,
        value,
    }))
}

/// Decode a value token according to the metric's value kind
pub fn decode_value(metric: Metric, token: &str) -> Option<Value> {
    match metric.value_kind() {
        ValueKind::Integer => token.trim().parse::<i64>().ok().map(Value::Int),
        ValueKind::Float => {
            let mut chars = token.chars();
            chars.next_back()?;
            chars.as_str().trim().parse::<f64>().ok().map(Value::Float)
        }
    }
}

/// Parse a whole log from a buffered reader.
///
/// Short and marker lines are skipped; any other malformed line aborts the
/// parse with an error naming its 1-based line number.
pub fn parse_reader<R: BufRead>(mut reader: R) -> Result<FlowLog, Error> {
    let mut flow_log = FlowLog::new();
    let mut stats = ParseStats::default();
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        stats.lines += 1;

        match parse_line(&line, stats.lines)? {
            Ok(record) => {
                flow_log.record(record.metric, record.flow, record.timestamp, record.value);
                stats.samples += 1;
            }
            Err(Skip::Short) => {
                log::trace!("Skipping short line {}", stats.lines);
                stats.skipped_short += 1;
            }
            Err(Skip::Marker) => {
                log::trace!("Skipping non-data line {}", stats.lines);
                stats.skipped_marker += 1;
            }
        }
    }

    log::info!(
        "Parsed {} lines: {} samples, {} short lines skipped, {} non-data lines skipped",
        stats.lines,
        stats.samples,
        stats.skipped_short,
        stats.skipped_marker
    );

    flow_log.set_stats(stats);
    Ok(flow_log)
}

/// Open and parse the log at `path`
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<FlowLog, Error> {
    let file = File::open(path.as_ref())?;
    parse_reader(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::{Cursor, Write};

    fn parse_str(input: &str) -> Result<FlowLog, Error> {
        parse_reader(Cursor::new(input.as_bytes()))
    }

    #[rstest]
    #[case("12.5 s > thr 0(udp) 4321 Kbps\n", Metric::Throughput, "0(udp)", Value::Int(4321))]
    #[case("12.5 s > delay 1(udp) 37 ms\n", Metric::Delay, "1(udp)", Value::Int(37))]
    #[case("12.5 s > interval 0(udp) 512\n", Metric::Interval, "0(udp)", Value::Int(512))]
    #[case("12.5 s > lost 0(udp) -3\n", Metric::Lost, "0(udp)", Value::Int(-3))]
    #[case("12.5 s > target 2(udp) 1800\n", Metric::Target, "2(udp)", Value::Int(1800))]
    #[case("12.5 s > trendline 0(udp) 0.0125\n", Metric::Trendline, "0(udp)", Value::Float(0.0125))]
    #[case("12.5 s > trendline 0(udp) -0.5X extra\n", Metric::Trendline, "0(udp)", Value::Float(-0.5))]
    fn test_parse_data_lines(
        #[case] line: &str,
        #[case] metric: Metric,
        #[case] flow: &str,
        #[case] value: Value,
    ) {
        let record = parse_line(line, 1).unwrap().unwrap();
        assert_eq!(record.timestamp, 12.5);
        assert_eq!(record.metric, metric);
        assert_eq!(record.flow, flow);
        assert_eq!(record.value, value);
    }

    #[rstest]
    #[case("\n", Skip::Short)]
    #[case("1.0 s > thr\n", Skip::Short)]
    #[case("garbage thr x\n", Skip::Short)]
    #[case("5.0P) a b thr f1 123\n", Skip::Marker)]
    #[case("(UDP)0: Delay      12 ms\n", Skip::Marker)]
    #[case("P) not even a number here\n", Skip::Marker)]
    fn test_skipped_lines(#[case] line: &str, #[case] expected: Skip) {
        assert_eq!(parse_line(line, 1).unwrap(), Err(expected));
    }

    #[test]
    fn test_double_spaces_yield_empty_tokens() {
        // The extra space shifts the label out of token 3
        let result = parse_line("1.0  s > thr 0(udp) 10 Kbps\n", 4);
        match result {
            Err(Error::UnknownMetric { line, label }) => {
                assert_eq!(line, 4);
                assert_eq!(label, ">");
            }
            other => panic!("Expected UnknownMetric, got {:?}", other),
        }
    }

    #[test]
    fn test_trendline_drops_last_character() {
        assert_eq!(
            decode_value(Metric::Trendline, "0.0123\n"),
            Some(Value::Float(0.0123))
        );
        // Without a trailing character a digit is lost
        assert_eq!(
            decode_value(Metric::Trendline, "0.0123"),
            Some(Value::Float(0.012))
        );
        assert_eq!(decode_value(Metric::Trendline, ""), None);
        assert_eq!(decode_value(Metric::Trendline, "x"), None);
    }

    #[rstest]
    #[case("500", Some(Value::Int(500)))]
    #[case("500\n", Some(Value::Int(500)))]
    #[case("500\r\n", Some(Value::Int(500)))]
    #[case("500K", None)]
    #[case("5.0", None)]
    #[case("9223372036854775807", Some(Value::Int(i64::MAX)))]
    #[case("9223372036854775808", None)]
    fn test_integer_values(#[case] token: &str, #[case] expected: Option<Value>) {
        assert_eq!(decode_value(Metric::Throughput, token), expected);
    }

    #[test]
    fn test_invalid_timestamp_is_fatal() {
        let result = parse_str("1.0 s > thr 0(udp) 1 Kbps\nabc s > thr 0(udp) 1 Kbps\n");
        match result {
            Err(Error::InvalidTimestamp { line, token }) => {
                assert_eq!(line, 2);
                assert_eq!(token, "abc");
            }
            other => panic!("Expected InvalidTimestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_metric_is_fatal() {
        let result = parse_str("1.0 s > jitter 0(udp) 1 ms\n");
        match result {
            Err(Error::UnknownMetric { line, label }) => {
                assert_eq!(line, 1);
                assert_eq!(label, "jitter");
            }
            other => panic!("Expected UnknownMetric, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_value_is_fatal() {
        let result = parse_str("1.0 s > delay 0(udp) 1.5 ms\n");
        match result {
            Err(Error::InvalidValue {
                line,
                metric,
                token,
            }) => {
                assert_eq!(line, 1);
                assert_eq!(metric, Metric::Delay);
                assert_eq!(token, "1.5");
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_accepted_lines_match_sample_count() {
        let input = "\
0.1 s > thr 0(udp) 100 Kbps
0.1 s > thr 1(tcp) 200 Kbps
short line
0.1 s > delay 0(udp) 12 ms
0.2 s > trendline 0(udp) 0.01
(UDP)0: Throughput 150 Kbps extra tokens
0.2 s > lost 0(udp) 0
0.2 s > interval 0(udp) 400
0.2 s > target 0(udp) 500
";
        let log = parse_str(input).unwrap();

        assert_eq!(log.sample_count(), 7);
        assert_eq!(
            *log.stats(),
            ParseStats {
                lines: 9,
                samples: 7,
                skipped_short: 1,
                skipped_marker: 1,
            }
        );
        assert_eq!(log.flows(Metric::Throughput).len(), 2);
        assert_eq!(
            log.series(Metric::Trendline, "0(udp)").unwrap().samples()[0].value,
            Value::Float(0.01)
        );
    }

    #[test]
    fn test_short_line_before_data_is_skipped() {
        let log = parse_str("a b c d\n1.0 s > thr f1 500 Kbps\n2.0 s > thr f1 700 Kbps\n")
            .unwrap();
        let series = log.series(Metric::Throughput, "f1").unwrap();
        let points: Vec<_> = series.points().collect();
        assert_eq!(points, vec![(1.0, 500.0), (2.0, 700.0)]);
        assert_eq!(log.stats().skipped_short, 1);
    }

    #[test]
    fn test_marker_line_contributes_nothing() {
        let log = parse_str("(UDP)0: Throughput 150 Kbps x y\n").unwrap();
        assert_eq!(log.sample_count(), 0);
        assert_eq!(log.stats().skipped_marker, 1);
    }

    #[test]
    fn test_marker_outside_first_token_is_a_label() {
        // Only the first token is checked for the marker
        let result = parse_str("5.0 a b P)marker f1 123\n");
        match result {
            Err(Error::UnknownMetric { line, label }) => {
                assert_eq!(line, 1);
                assert_eq!(label, "P)marker");
            }
            other => panic!("Expected UnknownMetric, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_logs_summary() {
        testing_logger::setup();

        parse_str("1.0 s > thr 0(udp) 1 Kbps\nshort\n").unwrap();

        testing_logger::validate(|captured_logs| {
            let summary: Vec<_> = captured_logs
                .iter()
                .filter(|record| record.level == log::Level::Info)
                .collect();
            assert_eq!(summary.len(), 1);
            assert_eq!(
                summary[0].body,
                "Parsed 2 lines: 1 samples, 1 short lines skipped, 0 non-data lines skipped"
            );
        });
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "1.0 s > thr 0(udp) 800 Kbps\n1.0 s > delay 0(udp) 20 ms\n"
        )
        .unwrap();
        file.flush().unwrap();

        let log = parse_file(file.path()).unwrap();
        assert_eq!(log.sample_count(), 2);
        assert_eq!(
            log.series(Metric::Delay, "0(udp)").unwrap().samples()[0].value,
            Value::Int(20)
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = parse_file(dir.path().join("log.out"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
