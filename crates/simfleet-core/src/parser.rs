//! Result-file parsing.
//!
//! The simulator writes one block per sweep. A block opens with a header
//! line containing [`START_MARKER`] and closes with a summary line containing
//! [`END_MARKER`]. Data rows sit strictly inside, after a fixed number of
//! header rows and before a fixed number of footer rows ([`RowWindow`]).
//! Each data row is `voltage<TAB>current`.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ROW_LEAD, DEFAULT_ROW_TRAIL, END_MARKER, START_MARKER};
use crate::error::SimError;

/// Turns a completed result file into a payload.
pub trait OutputParser: Send + Sync {
    /// Parsed payload type.
    type Output: Send + 'static;

    /// Parse the file at `path`.
    fn parse(&self, path: &Path) -> Result<Self::Output, SimError>;
}

/// Offsets between block markers and the data rows they enclose.
///
/// For a block whose start marker is on line `s` and end marker on line `e`,
/// data rows are the half-open range `[s + lead, e - trail)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowWindow {
    pub lead: usize,
    pub trail: usize,
}

impl Default for RowWindow {
    fn default() -> Self {
        Self {
            lead: DEFAULT_ROW_LEAD,
            trail: DEFAULT_ROW_TRAIL,
        }
    }
}

impl RowWindow {
    /// Data-row range for one block. Empty when the markers are too close.
    #[must_use]
    pub fn rows(&self, start_line: usize, end_line: usize) -> std::ops::Range<usize> {
        let first = start_line.saturating_add(self.lead);
        let last = end_line.saturating_sub(self.trail);
        first..last.max(first)
    }
}

/// Current-voltage curve extracted from a result file.
///
/// `voltage` (field 0) is the independent variable and `current` (field 1)
/// the dependent one; both always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IvCurve {
    pub voltage: Vec<f64>,
    pub current: Vec<f64>,
}

impl IvCurve {
    /// Number of (voltage, current) samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.voltage.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voltage.is_empty()
    }

    /// Iterate over `(voltage, current)` pairs in file order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.voltage.iter().copied().zip(self.current.iter().copied())
    }
}

/// Default parser producing an [`IvCurve`].
#[derive(Debug, Clone, Default)]
pub struct IvCurveParser {
    window: RowWindow,
}

impl IvCurveParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser with non-default marker offsets.
    #[must_use]
    pub fn with_window(window: RowWindow) -> Self {
        Self { window }
    }

    /// Collect the data-row line indices of every block, in file order.
    pub fn data_rows(&self, text: &str) -> Result<BTreeSet<usize>, SimError> {
        let mut starts = Vec::new();
        let mut ends = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.contains(START_MARKER) {
                starts.push(idx);
            } else if line.contains(END_MARKER) {
                ends.push(idx);
            }
        }

        // Surplus end markers are expected: the worker appends one after
        // every run even when the simulator already closed the last block.
        if ends.len() < starts.len() {
            return Err(SimError::UnbalancedMarkers {
                starts: starts.len(),
                ends: ends.len(),
            });
        }

        let mut rows = BTreeSet::new();
        for (&start, &end) in starts.iter().zip(&ends) {
            rows.extend(self.window.rows(start, end));
        }
        Ok(rows)
    }

    /// Parse result-file text already in memory.
    pub fn parse_str(&self, text: &str) -> Result<IvCurve, SimError> {
        let rows = self.data_rows(text)?;
        let mut curve = IvCurve {
            voltage: Vec::with_capacity(rows.len()),
            current: Vec::with_capacity(rows.len()),
        };

        for (idx, line) in text.lines().enumerate() {
            if !rows.contains(&idx) {
                continue;
            }
            let (v, j) = parse_row(idx, line)?;
            curve.voltage.push(v);
            curve.current.push(j);
        }

        tracing::trace!(rows = curve.len(), "parsed result file");
        Ok(curve)
    }
}

fn parse_row(idx: usize, line: &str) -> Result<(f64, f64), SimError> {
    let malformed = || SimError::MalformedRow {
        line: idx,
        content: line.to_string(),
    };
    let mut fields = line.trim_end_matches('\r').split('\t');
    let (Some(first), Some(second), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(malformed());
    };
    let v = first.trim().parse::<f64>().map_err(|_| malformed())?;
    let j = second.trim().parse::<f64>().map_err(|_| malformed())?;
    Ok((v, j))
}

impl OutputParser for IvCurveParser {
    type Output = IvCurve;

    fn parse(&self, path: &Path) -> Result<IvCurve, SimError> {
        // Simulator headers may carry non-UTF-8 unit symbols.
        let bytes = std::fs::read(path).map_err(|e| SimError::io(path, e))?;
        self.parse_str(&String::from_utf8_lossy(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a block: header, units line, rows, three footer lines, summary.
    fn block(rows: &[(f64, f64)]) -> String {
        let mut s = String::from("v(V)\tjtot(mA/cm2)\n");
        s.push_str("units\n");
        for (v, j) in rows {
            s.push_str(&format!("{v}\t{j}\n"));
        }
        s.push('\n');
        s.push_str("footer\n");
        s.push_str("footer\n");
        s.push_str("solar cell parameters deduced from calculated IV-curve:\n");
        s
    }

    #[test]
    fn row_window_bounds() {
        let w = RowWindow::default();
        assert_eq!(w.rows(5, 12), 7..9);
        assert!(w.rows(5, 8).is_empty());
        assert!(w.rows(5, 0).is_empty());
    }

    #[test]
    fn huge_lead_gives_no_rows() {
        let w = RowWindow {
            lead: usize::MAX,
            trail: 3,
        };
        assert!(w.rows(5, 12).is_empty());
        let text = block(&[(0.1, 1.0)]);
        let curve = IvCurveParser::with_window(w).parse_str(&text).unwrap();
        assert!(curve.is_empty());
    }

    #[test]
    fn start_at_five_end_at_twelve_yields_two_rows() {
        let mut lines: Vec<String> = (0..14).map(|i| format!("preamble {i}")).collect();
        lines[5] = "v(V)\tjtot".into();
        lines[7] = "0.1\t-20.5".into();
        lines[8] = "0.2\t-19.25".into();
        lines[12] = "deduced".into();
        let text = lines.join("\n");

        let parser = IvCurveParser::new();
        let rows: Vec<usize> = parser.data_rows(&text).unwrap().into_iter().collect();
        assert_eq!(rows, vec![7, 8]);

        let curve = parser.parse_str(&text).unwrap();
        assert_eq!(curve.voltage, vec![0.1, 0.2]);
        assert_eq!(curve.current, vec![-20.5, -19.25]);
    }

    #[test]
    fn multiple_blocks_concatenate_in_order() {
        let text = format!(
            "header\n{}{}",
            block(&[(0.0, -21.0), (0.02, -20.9)]),
            block(&[(0.0, -10.0), (0.02, -9.9), (0.04, -9.8)])
        );
        let curve = IvCurveParser::new().parse_str(&text).unwrap();
        assert_eq!(curve.len(), 5);
        assert_eq!(curve.voltage, vec![0.0, 0.02, 0.0, 0.02, 0.04]);
        assert_eq!(curve.current, vec![-21.0, -20.9, -10.0, -9.9, -9.8]);
    }

    #[test]
    fn surplus_end_markers_are_ignored() {
        let text = format!(
            "{}I have deduced that this is the end",
            block(&[(0.1, 1.0)])
        );
        let curve = IvCurveParser::new().parse_str(&text).unwrap();
        assert_eq!(curve.len(), 1);
    }

    #[test]
    fn missing_end_marker_is_unbalanced() {
        let text = "x\tjtot\nunits\n0.1\t1.0\n";
        assert!(matches!(
            IvCurveParser::new().parse_str(text),
            Err(SimError::UnbalancedMarkers { starts: 1, ends: 0 })
        ));
    }

    #[test]
    fn malformed_rows_fail() {
        let bad_token = block(&[(0.1, 1.0)]).replace("0.1\t1", "0.1\tabc");
        assert!(matches!(
            IvCurveParser::new().parse_str(&bad_token),
            Err(SimError::MalformedRow { line: 2, .. })
        ));

        let three_fields = block(&[(0.1, 1.0)]).replace("0.1\t1", "0.1\t1\t2");
        assert!(matches!(
            IvCurveParser::new().parse_str(&three_fields),
            Err(SimError::MalformedRow { .. })
        ));
    }

    #[test]
    fn crlf_rows_parse() {
        let text = block(&[(0.3, -4.5)]).replace('\n', "\r\n");
        let curve = IvCurveParser::new().parse_str(&text).unwrap();
        assert_eq!(curve.points().collect::<Vec<_>>(), vec![(0.3, -4.5)]);
    }

    #[test]
    fn custom_window() {
        // Only one header row and two footer rows.
        let text = "jtot\n0.1\t1.0\n0.2\t2.0\nfoot\nfoot\ndeduced\n";
        let parser = IvCurveParser::with_window(RowWindow { lead: 1, trail: 2 });
        let curve = parser.parse_str(text).unwrap();
        assert_eq!(curve.voltage, vec![0.1, 0.2]);
    }

    #[test]
    fn empty_file_gives_empty_curve() {
        let curve = IvCurveParser::new().parse_str("").unwrap();
        assert!(curve.is_empty());
    }

    #[test]
    fn parse_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.txt");
        std::fs::write(&path, block(&[(0.0, -1.0), (0.5, 2.0)])).unwrap();
        let curve = IvCurveParser::new().parse(&path).unwrap();
        assert_eq!(curve.len(), 2);

        let missing = IvCurveParser::new().parse(&dir.path().join("nope.txt"));
        assert!(matches!(missing, Err(SimError::Io { .. })));
    }

    #[test]
    fn latin1_header_bytes_still_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.txt");
        let text = block(&[(0.0, -1.0), (0.5, 2.0)]).replace("mA/cm2", "#A/cm2");
        let mut bytes = text.into_bytes();
        let pos = bytes.iter().position(|&b| b == b'#').unwrap();
        // Windows-1252 micro sign, invalid as a lone UTF-8 byte.
        bytes[pos] = 0xB5;
        std::fs::write(&path, bytes).unwrap();

        let curve = IvCurveParser::new().parse(&path).unwrap();
        assert_eq!(curve.voltage, vec![0.0, 0.5]);
    }
}
