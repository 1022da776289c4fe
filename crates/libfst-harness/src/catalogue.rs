//! The golden catalogue: one `(name, builder)` entry per algebra law.
//!
//! Every builder constructs deliberately tiny inputs, asks the engine for the
//! result and, except for `shortest_path`, normalizes it through the engine's
//! `optimize` so the golden text is the minimal canonical machine.

use libfst_automaton::construct::{
    cross, epsilon_acceptor, labels_of, parallel_acceptors, sigma_star, string_acceptor,
};
use libfst_automaton::{AutomatonBuilder, AutomatonDescriptor, EPSILON, Label};

use crate::config::ConfigError;
use crate::engine::{ClosureKind, ProjectSide, ReferenceAlgebraEngine};
use crate::golden::{GoldenCase, GoldenError};

/// Builds one case against an engine.
pub type CaseBuilder = fn(&mut dyn ReferenceAlgebraEngine) -> Result<GoldenCase, GoldenError>;

/// A named algebra law.
#[derive(Clone, Copy)]
pub struct CatalogueEntry {
    pub name: &'static str,
    /// One-line statement of what the golden pins down.
    pub law: &'static str,
    pub build: CaseBuilder,
}

impl std::fmt::Debug for CatalogueEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogueEntry")
            .field("name", &self.name)
            .field("law", &self.law)
            .finish_non_exhaustive()
    }
}

/// Shortest-path cases keep this many paths.
pub const SHORTEST_PATH_N: u32 = 2;

pub const CATALOGUE: &[CatalogueEntry] = &[
    CatalogueEntry {
        name: "compose",
        law: "a:b composed with b:c is a:c",
        build: compose,
    },
    CatalogueEntry {
        name: "determinize",
        law: "parallel a/1 and a/2 resolve to one path with the minimum weight",
        build: determinize,
    },
    CatalogueEntry {
        name: "union",
        law: "a | b",
        build: union,
    },
    CatalogueEntry {
        name: "concat",
        law: "a . b = ab",
        build: concat,
    },
    CatalogueEntry {
        name: "closure_star",
        law: "Kleene star of a",
        build: closure_star,
    },
    CatalogueEntry {
        name: "invert",
        law: "a:b inverted is b:a",
        build: invert,
    },
    CatalogueEntry {
        name: "project_input",
        law: "input tape of a:b is a",
        build: project_input,
    },
    CatalogueEntry {
        name: "project_output",
        law: "output tape of a:b is b",
        build: project_output,
    },
    CatalogueEntry {
        name: "cdrewrite_simple",
        law: "a -> b everywhere over [a-z]*",
        build: cdrewrite_simple,
    },
    CatalogueEntry {
        name: "cdrewrite_context",
        law: "a -> b / c _ d over [a-z]*",
        build: cdrewrite_context,
    },
    CatalogueEntry {
        name: "shortest_path",
        law: "2-best of a/1, b/2, c/0.5 keeps c and a",
        build: shortest_path,
    },
    CatalogueEntry {
        name: "difference",
        law: "{a, b} - {a} = {b}",
        build: difference,
    },
    CatalogueEntry {
        name: "optimize",
        law: "epsilon removal, determinization and minimization of mixed paths",
        build: optimize,
    },
];

/// Look up entries by name, keeping the order of `names`.
///
/// An empty `names` selects the whole catalogue.
pub fn select(names: &[String]) -> Result<Vec<&'static CatalogueEntry>, ConfigError> {
    if names.is_empty() {
        return Ok(CATALOGUE.iter().collect());
    }
    names
        .iter()
        .map(|name| {
            CATALOGUE
                .iter()
                .find(|entry| entry.name == name.as_str())
                .ok_or_else(|| ConfigError::UnknownCase(name.clone()))
        })
        .collect()
}

fn lowercase_sigma() -> Vec<Label> {
    (b'a'..=b'z').map(Label::from).collect()
}

fn compose(engine: &mut dyn ReferenceAlgebraEngine) -> Result<GoldenCase, GoldenError> {
    let a = cross("a", "b", 0.0)?;
    let b = cross("b", "c", 0.0)?;
    let composed = engine.compose(&a, &b)?;
    let golden = engine.optimize(&composed)?;
    Ok(GoldenCase::new("compose", vec![a, b], golden))
}

fn determinize(engine: &mut dyn ReferenceAlgebraEngine) -> Result<GoldenCase, GoldenError> {
    let input = parallel_acceptors(&[("a", 1.0), ("a", 2.0)])?;
    let det = engine.determinize(&input)?;
    let golden = engine.optimize(&det)?;
    Ok(GoldenCase::new("determinize", vec![input], golden))
}

fn union(engine: &mut dyn ReferenceAlgebraEngine) -> Result<GoldenCase, GoldenError> {
    let a = string_acceptor("a", 0.0)?;
    let b = string_acceptor("b", 0.0)?;
    let joined = engine.union(&a, &b)?;
    let golden = engine.optimize(&joined)?;
    Ok(GoldenCase::new("union", vec![a, b], golden))
}

fn concat(engine: &mut dyn ReferenceAlgebraEngine) -> Result<GoldenCase, GoldenError> {
    let a = string_acceptor("a", 0.0)?;
    let b = string_acceptor("b", 0.0)?;
    let joined = engine.concat(&a, &b)?;
    let golden = engine.optimize(&joined)?;
    Ok(GoldenCase::new("concat", vec![a, b], golden))
}

fn closure_star(engine: &mut dyn ReferenceAlgebraEngine) -> Result<GoldenCase, GoldenError> {
    let a = string_acceptor("a", 0.0)?;
    let star = engine.closure(&a, ClosureKind::Star)?;
    let golden = engine.optimize(&star)?;
    Ok(GoldenCase::new("closure_star", vec![a], golden))
}

fn invert(engine: &mut dyn ReferenceAlgebraEngine) -> Result<GoldenCase, GoldenError> {
    let a = cross("a", "b", 0.0)?;
    let inverted = engine.invert(&a)?;
    let golden = engine.optimize(&inverted)?;
    Ok(GoldenCase::new("invert", vec![a], golden))
}

fn project_case(
    engine: &mut dyn ReferenceAlgebraEngine,
    name: &str,
    side: ProjectSide,
) -> Result<GoldenCase, GoldenError> {
    let a = cross("a", "b", 0.0)?;
    let projected = engine.project(&a, side)?;
    let golden = engine.optimize(&projected)?;
    Ok(GoldenCase::new(name, vec![a], golden))
}

fn project_input(engine: &mut dyn ReferenceAlgebraEngine) -> Result<GoldenCase, GoldenError> {
    project_case(engine, "project_input", ProjectSide::Input)
}

fn project_output(engine: &mut dyn ReferenceAlgebraEngine) -> Result<GoldenCase, GoldenError> {
    project_case(engine, "project_output", ProjectSide::Output)
}

fn rewrite_case(
    engine: &mut dyn ReferenceAlgebraEngine,
    name: &str,
    lambda: AutomatonDescriptor,
    rho: AutomatonDescriptor,
) -> Result<GoldenCase, GoldenError> {
    let tau = cross("a", "b", 0.0)?;
    let sigma = sigma_star(lowercase_sigma())?;
    let rule = engine.context_rewrite(&tau, &lambda, &rho, &sigma)?;
    let golden = engine.optimize(&rule)?;
    Ok(GoldenCase::new(name, vec![tau, lambda, rho, sigma], golden))
}

fn cdrewrite_simple(engine: &mut dyn ReferenceAlgebraEngine) -> Result<GoldenCase, GoldenError> {
    rewrite_case(
        engine,
        "cdrewrite_simple",
        epsilon_acceptor()?,
        epsilon_acceptor()?,
    )
}

fn cdrewrite_context(engine: &mut dyn ReferenceAlgebraEngine) -> Result<GoldenCase, GoldenError> {
    rewrite_case(
        engine,
        "cdrewrite_context",
        string_acceptor("c", 0.0)?,
        string_acceptor("d", 0.0)?,
    )
}

fn shortest_path(engine: &mut dyn ReferenceAlgebraEngine) -> Result<GoldenCase, GoldenError> {
    let input = parallel_acceptors(&[("a", 1.0), ("b", 2.0), ("c", 0.5)])?;
    // Left unoptimized: the path order is what this case checks.
    let golden = engine.shortest_path(&input, SHORTEST_PATH_N)?;
    Ok(GoldenCase::new("shortest_path", vec![input], golden))
}

fn difference(engine: &mut dyn ReferenceAlgebraEngine) -> Result<GoldenCase, GoldenError> {
    let a = parallel_acceptors(&[("a", 0.0), ("b", 0.0)])?;
    let b = string_acceptor("a", 0.0)?;
    let diff = engine.difference(&a, &b)?;
    let golden = engine.optimize(&diff)?;
    Ok(GoldenCase::new("difference", vec![a, b], golden))
}

/// Two weighted `ab` paths plus an epsilon-led path, all from one start.
fn optimize_input() -> Result<AutomatonDescriptor, GoldenError> {
    let mut b = AutomatonBuilder::new();
    let start = b.add_state();
    b.set_start(start);
    for weight in [1.0, 2.0] {
        let mut cur = start;
        for label in labels_of("ab") {
            let next = b.add_state();
            b.add_arc(cur, next, label, label, 0.0);
            cur = next;
        }
        b.set_final(cur, weight);
    }
    let after_eps = b.add_state();
    let end = b.add_state();
    let label = Label::from(b'a') + 1;
    b.add_arc(start, after_eps, EPSILON, EPSILON, 0.0)
        .add_arc(after_eps, end, label, label, 0.0)
        .set_final(end, 0.0);
    Ok(b.build()?)
}

fn optimize(engine: &mut dyn ReferenceAlgebraEngine) -> Result<GoldenCase, GoldenError> {
    let input = optimize_input()?;
    let golden = engine.optimize(&input)?;
    Ok(GoldenCase::new("optimize", vec![input], golden))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn catalogue_names_are_unique_and_complete() {
        let names: Vec<&str> = CATALOGUE.iter().map(|e| e.name).collect();
        let unique: BTreeSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len());
        assert_eq!(names.len(), 13);
        assert!(unique.contains("project_input") && unique.contains("project_output"));
    }

    #[test]
    fn select_keeps_requested_order() {
        let picked = select(&[String::from("optimize"), String::from("compose")]).unwrap();
        let names: Vec<&str> = picked.iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["optimize", "compose"]);
        assert_eq!(select(&[]).unwrap().len(), CATALOGUE.len());
        assert_eq!(
            select(&[String::from("minimize")]).unwrap_err(),
            ConfigError::UnknownCase(String::from("minimize"))
        );
    }

    #[test]
    fn optimize_input_mixes_weights_and_epsilon() {
        let input = optimize_input().unwrap();
        assert!(input.has_epsilon());
        assert_eq!(
            input.to_att(),
            "0\t1\t97\t97\t0\n0\t3\t97\t97\t0\n0\t5\t0\t0\t0\n\
             1\t2\t98\t98\t0\n3\t4\t98\t98\t0\n5\t6\t98\t98\t0\n\
             2\t1\n4\t2\n6\t0\n"
        );
    }
}
