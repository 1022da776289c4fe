//! Automaton descriptors for libfst golden oracles.
//!
//! This crate provides:
//! - [`AutomatonDescriptor`]: a frozen, arena-indexed weighted automaton value
//! - [`AutomatonBuilder`]: the only way to construct one, validating every invariant
//! - Canonical AT&T text encoding and decoding (the oracle comparison unit)
//! - Constructors for the minimal inputs used by golden cases

#![forbid(unsafe_code)]

pub mod att;
pub mod construct;
pub mod descriptor;

pub use att::{format_weight, from_att, to_att};
pub use descriptor::{
    Arc, AutomatonBuilder, AutomatonDescriptor, AutomatonError, EPSILON, Label, StateId, Weight,
};
