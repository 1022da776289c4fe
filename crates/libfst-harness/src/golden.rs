//! Golden cases and their on-disk corpus form.
//!
//! A case persists as `{case}.input.att` (one input) or `{case}.input{N}.att`
//! (N from 1), plus `{case}.golden.att`. Writes always replace prior files.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use libfst_automaton::{AutomatonDescriptor, AutomatonError};
use serde::{Deserialize, Serialize};
use sha2::Digest;
use thiserror::Error;

use crate::diff::{FileChange, classify_change, render_diff};
use crate::engine::EngineError;

/// Manifest file written next to the corpus.
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum GoldenError {
    #[error("engine: {0}")]
    Engine(#[from] EngineError),
    #[error("automaton: {0}")]
    Automaton(#[from] AutomatonError),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("case builder panicked: {0}")]
    Panicked(String),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("structured log: {0}")]
    Log(#[source] std::io::Error),
}

impl GoldenError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Input descriptors and the engine's result for one algebra law.
#[derive(Debug, Clone, PartialEq)]
pub struct GoldenCase {
    name: String,
    inputs: Vec<AutomatonDescriptor>,
    golden: AutomatonDescriptor,
}

impl GoldenCase {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<AutomatonDescriptor>,
        golden: AutomatonDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            inputs,
            golden,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn inputs(&self) -> &[AutomatonDescriptor] {
        &self.inputs
    }

    #[must_use]
    pub fn golden(&self) -> &AutomatonDescriptor {
        &self.golden
    }

    /// File names of the inputs, in input order.
    #[must_use]
    pub fn input_file_names(&self) -> Vec<String> {
        (0..self.inputs.len())
            .map(|i| input_file_name(&self.name, i, self.inputs.len()))
            .collect()
    }

    #[must_use]
    pub fn golden_file_name(&self) -> String {
        format!("{}.golden.att", self.name)
    }

    /// Write every input and the golden file into `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<CorpusFile>, GoldenError> {
        let mut written = Vec::with_capacity(self.inputs.len() + 1);
        for (file_name, input) in self.input_file_names().into_iter().zip(&self.inputs) {
            written.push(self.write_one(dir, file_name, FileKind::Input, input)?);
        }
        written.push(self.write_one(dir, self.golden_file_name(), FileKind::Golden, &self.golden)?);
        Ok(written)
    }

    fn write_one(
        &self,
        dir: &Path,
        file_name: String,
        kind: FileKind,
        fst: &AutomatonDescriptor,
    ) -> Result<CorpusFile, GoldenError> {
        let path = dir.join(&file_name);
        let text = fst.to_att();
        let previous = match std::fs::read_to_string(&path) {
            Ok(previous) => Some(previous),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(GoldenError::io(&path, e)),
        };
        let change = classify_change(previous.as_deref(), &text);
        let diff = match (&previous, change) {
            (Some(prev), FileChange::Changed) => Some(render_diff(prev, &text)),
            _ => None,
        };
        std::fs::write(&path, &text).map_err(|e| GoldenError::io(&path, e))?;
        Ok(CorpusFile {
            path: file_name,
            kind,
            sha256: sha256_hex(text.as_bytes()),
            case: self.name.clone(),
            change,
            diff,
        })
    }
}

/// `{case}.input.att` when `count == 1`, else `{case}.input{index+1}.att`.
#[must_use]
pub fn input_file_name(case: &str, index: usize, count: usize) -> String {
    if count == 1 {
        format!("{case}.input.att")
    } else {
        format!("{case}.input{}.att", index + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Input,
    Golden,
}

/// One written corpus file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusFile {
    /// File name relative to the corpus directory.
    pub path: String,
    pub kind: FileKind,
    pub sha256: String,
    pub case: String,
    /// Relation to the file this write replaced.
    pub change: FileChange,
    /// Line diff against the replaced file, when it changed.
    #[serde(skip)]
    pub diff: Option<String>,
}

/// Corpus index consumed by downstream diff testers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenManifest {
    pub schema_version: String,
    pub generated_at: String,
    pub files: Vec<CorpusFile>,
    pub failed_cases: Vec<String>,
}

impl GoldenManifest {
    #[must_use]
    pub fn new(generated_at: String, files: Vec<CorpusFile>, failed_cases: Vec<String>) -> Self {
        Self {
            schema_version: String::from("v1"),
            generated_at,
            files,
            failed_cases,
        }
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, GoldenError> {
        let path = dir.join(MANIFEST_FILE);
        let mut body = serde_json::to_string_pretty(self)?;
        body.push('\n');
        std::fs::write(&path, body).map_err(|e| GoldenError::io(&path, e))?;
        Ok(path)
    }

    pub fn read_from(dir: &Path) -> Result<Self, GoldenError> {
        let path = dir.join(MANIFEST_FILE);
        let body = std::fs::read_to_string(&path).map_err(|e| GoldenError::io(&path, e))?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        write!(out, "{b:02x}").ok();
    }
    out
}
