//! Canonical AT&T text encoding.
//!
//! Arc lines are `src<TAB>dst<TAB>ilabel<TAB>olabel<TAB>weight`, final lines are
//! `state<TAB>weight`. Ordering: arcs of the start state first, then the
//! remaining states in ascending id, each state's arcs in insertion order; then
//! final lines, start state first if final, then ascending id. Every weight is
//! printed, in shortest round-trip decimal form.
//!
//! Decoding accepts the looser forms engines print: whitespace-separated
//! fields, omitted weights (semiring one), 3-field acceptor arcs, blank lines.
//! The start state is the source of the first non-blank line.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::descriptor::{
    Arc, AutomatonBuilder, AutomatonDescriptor, AutomatonError, Label, StateId, Weight,
};

/// Render a weight the way canonical text stores it.
#[must_use]
pub fn format_weight(weight: Weight) -> String {
    if weight == 0.0 {
        // Also folds -0.0.
        String::from("0")
    } else if weight.is_infinite() {
        if weight > 0.0 {
            String::from("Infinity")
        } else {
            String::from("-Infinity")
        }
    } else {
        format!("{weight}")
    }
}

/// Encode `fst` as canonical text. Always ends with a newline.
#[must_use]
pub fn to_att(fst: &AutomatonDescriptor) -> String {
    let start = fst.start();
    let mut by_state: BTreeMap<StateId, Vec<&Arc>> = BTreeMap::new();
    for arc in fst.arcs() {
        by_state.entry(arc.src).or_default().push(arc);
    }

    let mut out = String::new();
    let start_arcs = by_state.remove(&start).unwrap_or_default();
    for arc in start_arcs.into_iter().chain(by_state.into_values().flatten()) {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            arc.src,
            arc.dst,
            arc.ilabel,
            arc.olabel,
            format_weight(arc.weight)
        )
        .ok();
    }

    if let Some(weight) = fst.final_weight(start) {
        writeln!(out, "{start}\t{}", format_weight(weight)).ok();
    }
    for (&state, &weight) in fst.finals() {
        if state != start {
            writeln!(out, "{state}\t{}", format_weight(weight)).ok();
        }
    }
    out
}

/// Decode AT&T text into a validated descriptor.
pub fn from_att(text: &str) -> Result<AutomatonDescriptor, AutomatonError> {
    let mut builder = AutomatonBuilder::new();
    let mut start: Option<StateId> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let head = match fields.len() {
            1 | 2 => {
                let state = parse_state(fields[0], line_no)?;
                let weight = parse_optional_weight(fields.get(1).copied(), line_no)?;
                declare(&mut builder, state, line_no)?;
                builder.set_final(state, weight);
                state
            }
            3..=5 => {
                let src = parse_state(fields[0], line_no)?;
                let dst = parse_state(fields[1], line_no)?;
                let ilabel = parse_label(fields[2], line_no)?;
                let olabel = match fields.get(3) {
                    Some(field) => parse_label(field, line_no)?,
                    None => ilabel,
                };
                let weight = parse_optional_weight(fields.get(4).copied(), line_no)?;
                declare(&mut builder, src, line_no)?;
                declare(&mut builder, dst, line_no)?;
                builder.add_arc(src, dst, ilabel, olabel, weight);
                src
            }
            n => {
                return Err(AutomatonError::Parse {
                    line: line_no,
                    message: format!("expected 1, 2, 3, 4 or 5 fields, got {n}"),
                });
            }
        };
        start.get_or_insert(head);
    }

    if let Some(state) = start {
        builder.set_start(state);
    }
    builder.build()
}

fn declare(builder: &mut AutomatonBuilder, state: StateId, line: usize) -> Result<(), AutomatonError> {
    builder.ensure_state(state).map_err(|e| AutomatonError::Parse {
        line,
        message: e.to_string(),
    })
}

fn parse_state(field: &str, line: usize) -> Result<StateId, AutomatonError> {
    field.parse::<StateId>().map_err(|e| AutomatonError::Parse {
        line,
        message: format!("invalid state id '{field}': {e}"),
    })
}

fn parse_label(field: &str, line: usize) -> Result<Label, AutomatonError> {
    field.parse::<Label>().map_err(|e| AutomatonError::Parse {
        line,
        message: format!("invalid label '{field}': {e}"),
    })
}

fn parse_optional_weight(field: Option<&str>, line: usize) -> Result<Weight, AutomatonError> {
    let Some(field) = field else {
        return Ok(0.0);
    };
    let weight = field.parse::<Weight>().map_err(|e| AutomatonError::Parse {
        line,
        message: format!("invalid weight '{field}': {e}"),
    })?;
    if weight.is_nan() {
        return Err(AutomatonError::NanWeight);
    }
    Ok(weight)
}
