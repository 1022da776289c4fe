//! Verification and performance-regression harness for libfst.
//!
//! This crate provides:
//! - Golden oracles: catalogue of algebra laws realized by a reference engine
//!   and persisted as canonical AT&T corpus files
//! - Benchmark matrix: scenario x length expansion, sequential all-or-nothing
//!   execution against the engine's bench entry point
//! - Reports: microsecond table plus ASCII-safe JSONL echo
//! - Batch conversion of OpenFst files through an external converter
//! - Structured JSONL logs for every workflow

#![forbid(unsafe_code)]

pub mod bench;
pub mod catalogue;
pub mod config;
pub mod convert;
pub mod diff;
pub mod engine;
pub mod golden;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod structured_log;

pub use bench::{BenchError, BenchmarkEntryPoint, ProcessEntryPoint, run_matrix};
pub use catalogue::{CATALOGUE, CatalogueEntry};
pub use config::{BenchConfig, BenchPreset, ConfigError, EngineInvocation, GoldenConfig};
pub use engine::{
    ClosureKind, EngineError, ProcessAlgebraEngine, ProjectSide, ReferenceAlgebraEngine,
};
pub use golden::{GoldenCase, GoldenError, GoldenManifest};
pub use report::{BenchmarkResult, render_report};
pub use runner::{GoldenBatchReport, GoldenRunner};
pub use scenario::{BenchParams, ScenarioRequest, build_matrix};
