//! Benchmark result records and report rendering.
//!
//! Rendering is a pure, order-preserving transform: a markdown table in
//! microseconds, then the original records echoed as ASCII-safe JSONL.

use std::fmt::Write as _;

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid JSON record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("field '{0}' missing")]
    MissingField(&'static str),
    #[error("field '{field}' must be {expected}, got {got}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        got: String,
    },
    #[error("field '{field}' must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<RecordError>,
    },
}

/// One benchmark row, typed view plus the original record.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkResult {
    pub scenario: String,
    pub len: u64,
    pub transducer_len: u64,
    pub branches: u64,
    pub avg_ns: f64,
    pub min_ns: f64,
    pub max_ns: f64,
    pub avg_states: Number,
    record: Map<String, Value>,
}

impl BenchmarkResult {
    /// Parse text holding exactly one JSON object record.
    pub fn parse(text: &str) -> Result<Self, RecordError> {
        let value: Value = serde_json::from_str(text.trim())?;
        match value {
            Value::Object(record) => Self::from_record(record),
            _ => Err(RecordError::NotAnObject),
        }
    }

    /// Build the typed view; fields beyond the known eight are kept but ignored.
    pub fn from_record(record: Map<String, Value>) -> Result<Self, RecordError> {
        let scenario = match field(&record, "scenario")? {
            Value::String(s) => s.clone(),
            other => return Err(wrong_type("scenario", "a string", other)),
        };
        let len = unsigned(&record, "len")?;
        let transducer_len = unsigned(&record, "transducer_len")?;
        let branches = unsigned(&record, "branches")?;
        let avg_ns = nanos(&record, "avg_ns")?;
        let min_ns = nanos(&record, "min_ns")?;
        let max_ns = nanos(&record, "max_ns")?;
        let avg_states = match field(&record, "avg_states")? {
            Value::Number(n) => {
                non_negative("avg_states", n.as_f64().unwrap_or(0.0))?;
                n.clone()
            }
            other => return Err(wrong_type("avg_states", "a number", other)),
        };
        Ok(Self {
            scenario,
            len,
            transducer_len,
            branches,
            avg_ns,
            min_ns,
            max_ns,
            avg_states,
            record,
        })
    }

    /// The record exactly as the engine emitted it.
    #[must_use]
    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    #[must_use]
    pub fn avg_us(&self) -> f64 {
        self.avg_ns / 1000.0
    }

    #[must_use]
    pub fn min_us(&self) -> f64 {
        self.min_ns / 1000.0
    }

    #[must_use]
    pub fn max_us(&self) -> f64 {
        self.max_ns / 1000.0
    }

    /// Single ASCII-only JSON line (no trailing newline).
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        // Serializing a Map<String, Value> cannot fail.
        let json = serde_json::to_string(&self.record).unwrap_or_default();
        escape_non_ascii(&json)
    }
}

fn field<'a>(record: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, RecordError> {
    record.get(name).ok_or(RecordError::MissingField(name))
}

fn wrong_type(field: &'static str, expected: &'static str, got: &Value) -> RecordError {
    RecordError::WrongType {
        field,
        expected,
        got: got.to_string(),
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, RecordError> {
    if value < 0.0 {
        return Err(RecordError::Negative { field, value });
    }
    Ok(value)
}

fn unsigned(record: &Map<String, Value>, name: &'static str) -> Result<u64, RecordError> {
    let value = field(record, name)?;
    value
        .as_u64()
        .ok_or_else(|| wrong_type(name, "a non-negative integer", value))
}

fn nanos(record: &Map<String, Value>, name: &'static str) -> Result<f64, RecordError> {
    let value = field(record, name)?;
    let ns = value
        .as_f64()
        .ok_or_else(|| wrong_type(name, "a number", value))?;
    non_negative(name, ns)
}

/// Replace every non-ASCII char with `\uXXXX` escapes (UTF-16 units).
///
/// Valid on serialized JSON: non-ASCII can only occur inside string literals.
fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(out, "\\u{unit:04x}").ok();
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

const COLUMNS: [(&str, Align); 8] = [
    ("scenario", Align::Left),
    ("len", Align::Right),
    ("transducer_len", Align::Right),
    ("branches", Align::Right),
    ("avg_us", Align::Right),
    ("min_us", Align::Right),
    ("max_us", Align::Right),
    ("avg_states", Align::Right),
];

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Right,
}

fn table_cells(r: &BenchmarkResult) -> [String; 8] {
    [
        r.scenario.clone(),
        r.len.to_string(),
        r.transducer_len.to_string(),
        r.branches.to_string(),
        format!("{:.3}", r.avg_us()),
        format!("{:.3}", r.min_us()),
        format!("{:.3}", r.max_us()),
        r.avg_states.to_string(),
    ]
}

/// Markdown table with padded columns, rows in input order.
#[must_use]
pub fn render_table(results: &[BenchmarkResult]) -> String {
    let rows: Vec<[String; 8]> = results.iter().map(table_cells).collect();
    let mut widths: [usize; 8] = COLUMNS.map(|(name, _)| name.len());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = COLUMNS
        .iter()
        .zip(widths)
        .map(|((name, align), w)| pad(name, w, *align))
        .collect();
    writeln!(out, "| {} |", header.join(" | ")).ok();

    let rule: Vec<String> = COLUMNS
        .iter()
        .zip(widths)
        .map(|((_, align), w)| match align {
            Align::Left => "-".repeat(w),
            Align::Right => format!("{}:", "-".repeat(w - 1)),
        })
        .collect();
    writeln!(out, "| {} |", rule.join(" | ")).ok();

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .zip(COLUMNS.iter().zip(widths))
            .map(|(cell, ((_, align), w))| pad(cell, w, *align))
            .collect();
        writeln!(out, "| {} |", cells.join(" | ")).ok();
    }
    out
}

fn pad(cell: &str, width: usize, align: Align) -> String {
    match align {
        Align::Left => format!("{cell:<width$}"),
        Align::Right => format!("{cell:>width$}"),
    }
}

/// One ASCII-safe JSON line per result, in input order.
#[must_use]
pub fn render_jsonl(results: &[BenchmarkResult]) -> String {
    let mut out = String::new();
    for r in results {
        writeln!(out, "{}", r.to_jsonl()).ok();
    }
    out
}

/// Full report: table, blank line, `# jsonl` marker, JSONL echo.
#[must_use]
pub fn render_report(results: &[BenchmarkResult]) -> String {
    format!(
        "{}\n# jsonl\n{}",
        render_table(results),
        render_jsonl(results)
    )
}

/// Parse JSONL back into results; blank lines are skipped.
pub fn parse_jsonl(text: &str) -> Result<Vec<BenchmarkResult>, RecordError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            BenchmarkResult::parse(line).map_err(|e| RecordError::Line {
                line: i + 1,
                source: Box::new(e),
            })
        })
        .collect()
}
