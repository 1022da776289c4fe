//! Automaton data model.
//!
//! States are dense indices into an arena; arcs are flat records that refer to
//! those indices, so cyclic automata (closure) need no pointer graph.

use std::collections::BTreeMap;

use thiserror::Error;

/// Dense state identifier.
pub type StateId = u32;
/// Arc label. Label 0 is epsilon.
pub type Label = u32;
/// Tropical weight; `0.0` is the semiring one.
pub type Weight = f64;

/// Reserved epsilon label.
pub const EPSILON: Label = 0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AutomatonError {
    #[error("no start state set")]
    MissingStart,
    #[error("start state {0} is not declared")]
    UndeclaredStart(StateId),
    #[error("arc {index} references undeclared state {state}")]
    UndeclaredArcState { index: usize, state: StateId },
    #[error("final state {0} is not declared")]
    UndeclaredFinal(StateId),
    #[error("automaton has no final state")]
    NoFinalState,
    #[error("state id {0} leaves no room for a state count")]
    StateOverflow(StateId),
    #[error("weight is NaN")]
    NanWeight,
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// A weighted transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub src: StateId,
    pub dst: StateId,
    pub ilabel: Label,
    pub olabel: Label,
    pub weight: Weight,
}

/// A frozen automaton value.
///
/// Invariants (checked by [`AutomatonBuilder::build`]): exactly one declared
/// start state, every arc endpoint and final state declared, at least one
/// final state, no NaN weights.
#[derive(Debug, Clone, PartialEq)]
pub struct AutomatonDescriptor {
    num_states: u32,
    start: StateId,
    arcs: Vec<Arc>,
    finals: BTreeMap<StateId, Weight>,
}

impl AutomatonDescriptor {
    #[must_use]
    pub fn num_states(&self) -> u32 {
        self.num_states
    }

    #[must_use]
    pub fn start(&self) -> StateId {
        self.start
    }

    /// Arcs in insertion order.
    #[must_use]
    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    #[must_use]
    pub fn finals(&self) -> &BTreeMap<StateId, Weight> {
        &self.finals
    }

    /// Final weight of `state`, if final.
    #[must_use]
    pub fn final_weight(&self, state: StateId) -> Option<Weight> {
        self.finals.get(&state).copied()
    }

    /// Arcs leaving `state`, in insertion order.
    pub fn arcs_from(&self, state: StateId) -> impl Iterator<Item = &Arc> {
        self.arcs.iter().filter(move |arc| arc.src == state)
    }

    /// True if any arc carries epsilon on either tape.
    #[must_use]
    pub fn has_epsilon(&self) -> bool {
        self.arcs
            .iter()
            .any(|arc| arc.ilabel == EPSILON || arc.olabel == EPSILON)
    }

    /// True if every arc has identical input and output labels.
    #[must_use]
    pub fn is_acceptor(&self) -> bool {
        self.arcs.iter().all(|arc| arc.ilabel == arc.olabel)
    }

    /// Canonical AT&T text; see [`crate::att`].
    #[must_use]
    pub fn to_att(&self) -> String {
        crate::att::to_att(self)
    }

    /// Two descriptors are oracle-equal iff their canonical text is byte-identical.
    #[must_use]
    pub fn canonical_eq(&self, other: &Self) -> bool {
        self.to_att() == other.to_att()
    }
}

/// Mutable construction surface for [`AutomatonDescriptor`].
#[derive(Debug, Default, Clone)]
pub struct AutomatonBuilder {
    num_states: u32,
    start: Option<StateId>,
    arcs: Vec<Arc>,
    finals: BTreeMap<StateId, Weight>,
}

impl AutomatonBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new state and return its id.
    pub fn add_state(&mut self) -> StateId {
        let id = self.num_states;
        self.num_states += 1;
        id
    }

    /// Declare states until `state` is declared.
    pub fn ensure_state(&mut self, state: StateId) -> Result<(), AutomatonError> {
        if state >= self.num_states {
            self.num_states = state
                .checked_add(1)
                .ok_or(AutomatonError::StateOverflow(state))?;
        }
        Ok(())
    }

    pub fn set_start(&mut self, state: StateId) -> &mut Self {
        self.start = Some(state);
        self
    }

    pub fn set_final(&mut self, state: StateId, weight: Weight) -> &mut Self {
        self.finals.insert(state, weight);
        self
    }

    pub fn add_arc(
        &mut self,
        src: StateId,
        dst: StateId,
        ilabel: Label,
        olabel: Label,
        weight: Weight,
    ) -> &mut Self {
        self.arcs.push(Arc {
            src,
            dst,
            ilabel,
            olabel,
            weight,
        });
        self
    }

    /// Validate and freeze.
    pub fn build(self) -> Result<AutomatonDescriptor, AutomatonError> {
        let start = self.start.ok_or(AutomatonError::MissingStart)?;
        if start >= self.num_states {
            return Err(AutomatonError::UndeclaredStart(start));
        }
        for (index, arc) in self.arcs.iter().enumerate() {
            for state in [arc.src, arc.dst] {
                if state >= self.num_states {
                    return Err(AutomatonError::UndeclaredArcState { index, state });
                }
            }
            if arc.weight.is_nan() {
                return Err(AutomatonError::NanWeight);
            }
        }
        if self.finals.is_empty() {
            return Err(AutomatonError::NoFinalState);
        }
        for (&state, weight) in &self.finals {
            if state >= self.num_states {
                return Err(AutomatonError::UndeclaredFinal(state));
            }
            if weight.is_nan() {
                return Err(AutomatonError::NanWeight);
            }
        }
        Ok(AutomatonDescriptor {
            num_states: self.num_states,
            start,
            arcs: self.arcs,
            finals: self.finals,
        })
    }
}
