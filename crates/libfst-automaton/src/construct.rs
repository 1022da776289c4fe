//! Constructors for small, intentionally simple automata.
//!
//! Strings map to byte labels (`"a"` is label 97). Path weights are carried on
//! the final state, the way string compilers usually place them.

use crate::descriptor::{
    AutomatonBuilder, AutomatonDescriptor, AutomatonError, EPSILON, Label, Weight,
};

/// Byte labels of `s`.
#[must_use]
pub fn labels_of(s: &str) -> Vec<Label> {
    s.bytes().map(Label::from).collect()
}

/// Linear acceptor for `labels`. An empty slice yields the empty-string acceptor.
pub fn acceptor(labels: &[Label], weight: Weight) -> Result<AutomatonDescriptor, AutomatonError> {
    let pairs: Vec<(Label, Label)> = labels.iter().map(|&l| (l, l)).collect();
    linear(&pairs, weight)
}

/// Linear acceptor for the bytes of `s`.
pub fn string_acceptor(s: &str, weight: Weight) -> Result<AutomatonDescriptor, AutomatonError> {
    acceptor(&labels_of(s), weight)
}

/// Accepts only the empty string.
pub fn epsilon_acceptor() -> Result<AutomatonDescriptor, AutomatonError> {
    acceptor(&[], 0.0)
}

/// Linear transducer mapping `input` to `output`; the shorter side is padded
/// with epsilon.
pub fn cross(input: &str, output: &str, weight: Weight) -> Result<AutomatonDescriptor, AutomatonError> {
    let ins = labels_of(input);
    let outs = labels_of(output);
    let len = ins.len().max(outs.len());
    let pairs: Vec<(Label, Label)> = (0..len)
        .map(|i| {
            (
                ins.get(i).copied().unwrap_or(EPSILON),
                outs.get(i).copied().unwrap_or(EPSILON),
            )
        })
        .collect();
    linear(&pairs, weight)
}

/// Single-state acceptor of `labels*`.
pub fn sigma_star(
    labels: impl IntoIterator<Item = Label>,
) -> Result<AutomatonDescriptor, AutomatonError> {
    let mut b = AutomatonBuilder::new();
    let s = b.add_state();
    b.set_start(s).set_final(s, 0.0);
    for label in labels {
        b.add_arc(s, s, label, label, 0.0);
    }
    b.build()
}

/// Acceptor whose paths share only the start state, one branch per
/// `(string, weight)`. Equal strings with different weights give the
/// ambiguous parallel paths determinization and shortest-path cases need.
pub fn parallel_acceptors(paths: &[(&str, Weight)]) -> Result<AutomatonDescriptor, AutomatonError> {
    let mut b = AutomatonBuilder::new();
    let start = b.add_state();
    b.set_start(start);
    for &(s, weight) in paths {
        let mut cur = start;
        for label in labels_of(s) {
            let next = b.add_state();
            b.add_arc(cur, next, label, label, 0.0);
            cur = next;
        }
        b.set_final(cur, weight);
    }
    b.build()
}

fn linear(pairs: &[(Label, Label)], weight: Weight) -> Result<AutomatonDescriptor, AutomatonError> {
    let mut b = AutomatonBuilder::new();
    let mut cur = b.add_state();
    b.set_start(cur);
    for &(ilabel, olabel) in pairs {
        let next = b.add_state();
        b.add_arc(cur, next, ilabel, olabel, 0.0);
        cur = next;
    }
    b.set_final(cur, weight);
    b.build()
}
