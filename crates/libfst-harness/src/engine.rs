//! Reference algebra engine interface and its process binding.
//!
//! The harness never implements FST algorithms. Every operation is delegated
//! to an engine; results come back as AT&T text and are re-encoded by the
//! harness's own canonical encoder before anything is persisted.

use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use libfst_automaton::{AutomatonDescriptor, AutomatonError, from_att};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("reference engine unavailable: {0}")]
    Unavailable(String),
    #[error("engine op '{op}' exited with {status}: {stderr}")]
    Failed {
        op: &'static str,
        status: ExitStatus,
        stderr: String,
    },
    #[error("engine op '{op}' returned a malformed automaton: {source}")]
    Malformed {
        op: &'static str,
        #[source]
        source: AutomatonError,
    },
    #[error("engine op '{op}' is not supported: {reason}")]
    Unsupported { op: &'static str, reason: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Kleene closure variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosureKind {
    /// Zero or more.
    Star,
    /// One or more.
    Plus,
    /// Zero or one.
    Ques,
}

/// Tape kept by projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectSide {
    Input,
    Output,
}

/// An algebra engine able to realize every catalogued operation.
///
/// Results are descriptors; numbering of states is the engine's, ordering of
/// lines is re-derived by the harness.
pub trait ReferenceAlgebraEngine {
    fn compose(
        &mut self,
        a: &AutomatonDescriptor,
        b: &AutomatonDescriptor,
    ) -> Result<AutomatonDescriptor, EngineError>;

    fn determinize(&mut self, a: &AutomatonDescriptor) -> Result<AutomatonDescriptor, EngineError>;

    fn union(
        &mut self,
        a: &AutomatonDescriptor,
        b: &AutomatonDescriptor,
    ) -> Result<AutomatonDescriptor, EngineError>;

    fn concat(
        &mut self,
        a: &AutomatonDescriptor,
        b: &AutomatonDescriptor,
    ) -> Result<AutomatonDescriptor, EngineError>;

    fn closure(
        &mut self,
        a: &AutomatonDescriptor,
        kind: ClosureKind,
    ) -> Result<AutomatonDescriptor, EngineError>;

    /// Swap input and output tapes.
    fn invert(&mut self, a: &AutomatonDescriptor) -> Result<AutomatonDescriptor, EngineError>;

    fn project(
        &mut self,
        a: &AutomatonDescriptor,
        side: ProjectSide,
    ) -> Result<AutomatonDescriptor, EngineError>;

    /// Context-dependent rewrite `tau / lambda _ rho` over `sigma_star`.
    fn context_rewrite(
        &mut self,
        tau: &AutomatonDescriptor,
        lambda: &AutomatonDescriptor,
        rho: &AutomatonDescriptor,
        sigma_star: &AutomatonDescriptor,
    ) -> Result<AutomatonDescriptor, EngineError>;

    /// The `n` lowest-weight paths.
    fn shortest_path(
        &mut self,
        a: &AutomatonDescriptor,
        n: u32,
    ) -> Result<AutomatonDescriptor, EngineError>;

    fn difference(
        &mut self,
        a: &AutomatonDescriptor,
        b: &AutomatonDescriptor,
    ) -> Result<AutomatonDescriptor, EngineError>;

    /// Epsilon removal, determinization and minimization.
    fn optimize(&mut self, a: &AutomatonDescriptor) -> Result<AutomatonDescriptor, EngineError>;
}

/// Wire request written to the engine process's stdin.
#[derive(Debug, Serialize)]
struct EngineRequest<'a> {
    op: &'static str,
    inputs: Vec<String>,
    params: &'a EngineParams,
}

#[derive(Debug, Default, Serialize)]
struct EngineParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    side: Option<ProjectSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    closure: Option<ClosureKind>,
}

/// Engine reached by spawning one process per operation.
///
/// Protocol: a JSON request `{"op", "inputs", "params"}` on stdin, AT&T text
/// of the result on stdout, exit status 0 on success.
#[derive(Debug, Clone)]
pub struct ProcessAlgebraEngine {
    program: String,
    args: Vec<String>,
}

impl ProcessAlgebraEngine {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The bundled pynini driver run by `python`.
    #[must_use]
    pub fn pynini(python: &str, script: &Path) -> Self {
        Self::new(python, vec![script.to_string_lossy().into_owned()])
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Check the engine and its library are importable before any work runs.
    pub fn probe(&self) -> Result<(), EngineError> {
        let output = self.exchange("probe", &[], &EngineParams::default())?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Unavailable(format!(
                "'{}' probe exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn exchange(
        &self,
        op: &'static str,
        inputs: &[&AutomatonDescriptor],
        params: &EngineParams,
    ) -> Result<std::process::Output, EngineError> {
        let request = EngineRequest {
            op,
            inputs: inputs.iter().map(|fst| fst.to_att()).collect(),
            params,
        };
        let payload = serde_json::to_vec(&request)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                EngineError::Unavailable(format!("failed to launch '{}': {e}", self.program))
            })?;

        // An engine that exits before reading (missing library) closes the pipe
        // early; its exit status carries the real failure.
        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(&payload)
            && e.kind() != ErrorKind::BrokenPipe
        {
            return Err(e.into());
        }
        Ok(child.wait_with_output()?)
    }

    fn call(
        &self,
        op: &'static str,
        inputs: &[&AutomatonDescriptor],
        params: EngineParams,
    ) -> Result<AutomatonDescriptor, EngineError> {
        let output = self.exchange(op, inputs, &params)?;
        if !output.status.success() {
            return Err(EngineError::Failed {
                op,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let text = String::from_utf8_lossy(&output.stdout);
        from_att(&text).map_err(|source| EngineError::Malformed { op, source })
    }
}

impl ReferenceAlgebraEngine for ProcessAlgebraEngine {
    fn compose(
        &mut self,
        a: &AutomatonDescriptor,
        b: &AutomatonDescriptor,
    ) -> Result<AutomatonDescriptor, EngineError> {
        self.call("compose", &[a, b], EngineParams::default())
    }

    fn determinize(&mut self, a: &AutomatonDescriptor) -> Result<AutomatonDescriptor, EngineError> {
        self.call("determinize", &[a], EngineParams::default())
    }

    fn union(
        &mut self,
        a: &AutomatonDescriptor,
        b: &AutomatonDescriptor,
    ) -> Result<AutomatonDescriptor, EngineError> {
        self.call("union", &[a, b], EngineParams::default())
    }

    fn concat(
        &mut self,
        a: &AutomatonDescriptor,
        b: &AutomatonDescriptor,
    ) -> Result<AutomatonDescriptor, EngineError> {
        self.call("concat", &[a, b], EngineParams::default())
    }

    fn closure(
        &mut self,
        a: &AutomatonDescriptor,
        kind: ClosureKind,
    ) -> Result<AutomatonDescriptor, EngineError> {
        let params = EngineParams {
            closure: Some(kind),
            ..EngineParams::default()
        };
        self.call("closure", &[a], params)
    }

    fn invert(&mut self, a: &AutomatonDescriptor) -> Result<AutomatonDescriptor, EngineError> {
        self.call("invert", &[a], EngineParams::default())
    }

    fn project(
        &mut self,
        a: &AutomatonDescriptor,
        side: ProjectSide,
    ) -> Result<AutomatonDescriptor, EngineError> {
        let params = EngineParams {
            side: Some(side),
            ..EngineParams::default()
        };
        self.call("project", &[a], params)
    }

    fn context_rewrite(
        &mut self,
        tau: &AutomatonDescriptor,
        lambda: &AutomatonDescriptor,
        rho: &AutomatonDescriptor,
        sigma_star: &AutomatonDescriptor,
    ) -> Result<AutomatonDescriptor, EngineError> {
        self.call(
            "cdrewrite",
            &[tau, lambda, rho, sigma_star],
            EngineParams::default(),
        )
    }

    fn shortest_path(
        &mut self,
        a: &AutomatonDescriptor,
        n: u32,
    ) -> Result<AutomatonDescriptor, EngineError> {
        if n == 0 {
            return Err(EngineError::Unsupported {
                op: "shortestpath",
                reason: String::from("n must be at least 1"),
            });
        }
        let params = EngineParams {
            n: Some(n),
            ..EngineParams::default()
        };
        self.call("shortestpath", &[a], params)
    }

    fn difference(
        &mut self,
        a: &AutomatonDescriptor,
        b: &AutomatonDescriptor,
    ) -> Result<AutomatonDescriptor, EngineError> {
        self.call("difference", &[a, b], EngineParams::default())
    }

    fn optimize(&mut self, a: &AutomatonDescriptor) -> Result<AutomatonDescriptor, EngineError> {
        self.call("optimize", &[a], EngineParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libfst_automaton::construct::cross;

    #[test]
    fn request_carries_canonical_inputs_and_sparse_params() {
        let a = cross("a", "b", 0.0).unwrap();
        let params = EngineParams {
            side: Some(ProjectSide::Output),
            ..EngineParams::default()
        };
        let request = EngineRequest {
            op: "project",
            inputs: vec![a.to_att()],
            params: &params,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"op":"project","inputs":["0\t1\t97\t98\t0\n1\t0\n"],"params":{"side":"output"}}"#
        );
    }

    #[test]
    fn closure_kinds_use_driver_names() {
        assert_eq!(serde_json::to_string(&ClosureKind::Star).unwrap(), r#""star""#);
        assert_eq!(serde_json::to_string(&ClosureKind::Ques).unwrap(), r#""ques""#);
    }

    #[test]
    fn missing_program_is_unavailable() {
        let engine = ProcessAlgebraEngine::new("/nonexistent/libfst-engine", Vec::new());
        assert!(matches!(engine.probe(), Err(EngineError::Unavailable(_))));
    }

    #[cfg(unix)]
    #[test]
    fn engine_without_its_library_is_unavailable() {
        let engine = ProcessAlgebraEngine::new(
            "sh",
            vec![
                String::from("-c"),
                String::from("cat >/dev/null; echo 'pynini not importable' >&2; exit 3"),
            ],
        );
        match engine.probe() {
            Err(EngineError::Unavailable(message)) => {
                assert!(message.contains("pynini not importable"), "{message}");
            }
            other => panic!("expected unavailable engine, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn process_engine_reencodes_output() {
        // Interleaved finals, omitted and padded weights, state 2 before state 1.
        let script = "cat >/dev/null; printf '0\\t2\\t97\\t97\\n2\\t0.000\\n2\\t1\\t98\\t98\\n0\\t1\\t99\\t99\\t1.50\\n1\\n'";
        let mut engine =
            ProcessAlgebraEngine::new("sh", vec![String::from("-c"), String::from(script)]);
        let a = cross("a", "a", 0.0).unwrap();
        let out = engine.optimize(&a).unwrap();
        assert_eq!(
            out.to_att(),
            "0\t2\t97\t97\t0\n0\t1\t99\t99\t1.5\n2\t1\t98\t98\t0\n1\t0\n2\t0\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn process_engine_failure_keeps_stderr() {
        let script = "cat >/dev/null; echo 'composition failed' >&2; exit 1";
        let mut engine =
            ProcessAlgebraEngine::new("sh", vec![String::from("-c"), String::from(script)]);
        let a = cross("a", "a", 0.0).unwrap();
        match engine.compose(&a, &a) {
            Err(EngineError::Failed { op, stderr, .. }) => {
                assert_eq!(op, "compose");
                assert_eq!(stderr, "composition failed");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
