//! Run configuration: presets, comma-list parsing, validation.
//!
//! Everything here is resolved and checked before any external process runs.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::catalogue::{self, CatalogueEntry};
use crate::scenario::BenchParams;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be a positive integer, got {value}")]
    NotPositive { field: &'static str, value: u64 },
    #[error("{field}: invalid integer '{item}'")]
    InvalidInteger { field: &'static str, item: String },
    #[error("unknown preset '{0}', expected basic|profile")]
    UnknownPreset(String),
    #[error("unknown golden case '{0}'")]
    UnknownCase(String),
}

/// Named benchmark matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchPreset {
    /// Frozen-compose baseline: two scenarios over short inputs.
    Basic,
    /// Epsilon-dense and ambiguous scenarios over long inputs.
    Profile,
}

impl BenchPreset {
    pub fn from_str_loose(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "profile" => Ok(Self::Profile),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }

    #[must_use]
    pub fn scenarios(self) -> &'static [&'static str] {
        match self {
            Self::Basic => &[
                "compose_frozen_transducer",
                "compose_frozen_shortest_path",
            ],
            Self::Profile => &[
                "compose_frozen_transducer",
                "compose_frozen_epsilon_dense",
                "compose_frozen_ambiguous_chain",
                "compose_frozen_shortest_path_ambiguous",
                "compose_frozen_lazy_shortest_path_ambiguous",
                "compose_frozen_shortest_path_epsilon_dense",
                "compose_frozen_lazy_shortest_path_epsilon_dense",
            ],
        }
    }

    #[must_use]
    pub fn lengths(self) -> &'static [u64] {
        match self {
            Self::Basic => &[5, 10, 20, 30, 40, 50],
            Self::Profile => &[11, 19, 33, 64, 96, 128, 160, 192, 224, 251],
        }
    }

    #[must_use]
    pub fn params(self) -> BenchParams {
        match self {
            Self::Basic => BenchParams {
                transducer_len: 2048,
                branches: 6,
                iters: 50,
                warmup: 10,
            },
            Self::Profile => BenchParams {
                transducer_len: 4096,
                branches: 12,
                iters: 120,
                warmup: 20,
            },
        }
    }
}

/// How the external benchmark entry point is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    pub program: String,
    /// Forwarded as `-Doptimize=<mode>`.
    pub optimize: String,
    /// Working directory for the engine build.
    pub engine_dir: PathBuf,
    /// Per-invocation wall-clock limit; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for EngineInvocation {
    fn default() -> Self {
        Self {
            program: String::from("zig"),
            optimize: String::from("ReleaseFast"),
            engine_dir: PathBuf::from("."),
            timeout: None,
        }
    }
}

/// Raw (unvalidated) overrides, usually straight from the CLI.
#[derive(Debug, Clone, Default)]
pub struct BenchOverrides {
    pub scenarios: Option<String>,
    pub lengths: Option<String>,
    pub transducer_len: Option<u64>,
    pub branches: Option<u64>,
    pub iters: Option<u64>,
    pub warmup: Option<u64>,
}

/// Fully resolved benchmark run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub scenarios: Vec<String>,
    pub lengths: Vec<u64>,
    pub params: BenchParams,
    pub invocation: EngineInvocation,
}

impl BenchConfig {
    /// Start from `preset`, apply `overrides`, validate.
    pub fn resolve(
        preset: BenchPreset,
        overrides: &BenchOverrides,
        invocation: EngineInvocation,
    ) -> Result<Self, ConfigError> {
        let scenarios = match &overrides.scenarios {
            Some(raw) => parse_name_list(raw),
            None => preset.scenarios().iter().map(|s| s.to_string()).collect(),
        };
        let lengths = match &overrides.lengths {
            Some(raw) => parse_positive_list("lengths", raw)?,
            None => preset.lengths().to_vec(),
        };
        let defaults = preset.params();
        let params = BenchParams {
            transducer_len: positive(
                "transducer-len",
                overrides.transducer_len.unwrap_or(defaults.transducer_len),
            )?,
            branches: positive("branches", overrides.branches.unwrap_or(defaults.branches))?,
            iters: positive("iters", overrides.iters.unwrap_or(defaults.iters))?,
            // Zero warmup is allowed.
            warmup: overrides.warmup.unwrap_or(defaults.warmup),
        };
        Ok(Self {
            scenarios,
            lengths,
            params,
            invocation,
        })
    }
}

/// Resolved golden generation configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldenConfig {
    pub corpus_dir: PathBuf,
    /// Interpreter that runs `engine_script`.
    pub engine_program: String,
    pub engine_script: PathBuf,
    /// Requested case names; empty selects the whole catalogue.
    pub cases: Vec<String>,
}

impl GoldenConfig {
    /// Parse the case list and check every name against the catalogue.
    pub fn resolve(
        corpus_dir: PathBuf,
        engine_program: String,
        engine_script: PathBuf,
        cases: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let cases = cases.map(parse_name_list).unwrap_or_default();
        catalogue::select(&cases)?;
        Ok(Self {
            corpus_dir,
            engine_program,
            engine_script,
            cases,
        })
    }

    /// Catalogue entries to run, in requested order.
    pub fn entries(&self) -> Result<Vec<&'static CatalogueEntry>, ConfigError> {
        catalogue::select(&self.cases)
    }
}

/// Split a comma list, trimming items and dropping empty ones.
#[must_use]
pub fn parse_name_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a comma list of positive integers; empty items are skipped.
pub fn parse_positive_list(field: &'static str, raw: &str) -> Result<Vec<u64>, ConfigError> {
    parse_name_list(raw)
        .into_iter()
        .map(|item| {
            let value = item
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidInteger {
                    field,
                    item: item.clone(),
                })?;
            positive(field, value)
        })
        .collect()
}

fn positive(field: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_preset_matches_baseline_matrix() {
        let cfg = BenchConfig::resolve(
            BenchPreset::Basic,
            &BenchOverrides::default(),
            EngineInvocation::default(),
        )
        .unwrap();
        assert_eq!(cfg.scenarios.len(), 2);
        assert_eq!(cfg.lengths, vec![5, 10, 20, 30, 40, 50]);
        assert_eq!(cfg.params.transducer_len, 2048);
        assert_eq!(cfg.params.branches, 6);
        assert_eq!(cfg.invocation.optimize, "ReleaseFast");
    }

    #[test]
    fn overrides_replace_preset_values() {
        let overrides = BenchOverrides {
            scenarios: Some(String::from(" x , ,y")),
            lengths: Some(String::from("3,,7")),
            warmup: Some(0),
            ..BenchOverrides::default()
        };
        let cfg =
            BenchConfig::resolve(BenchPreset::Profile, &overrides, EngineInvocation::default())
                .unwrap();
        assert_eq!(cfg.scenarios, vec!["x", "y"]);
        assert_eq!(cfg.lengths, vec![3, 7]);
        assert_eq!(cfg.params.warmup, 0);
        assert_eq!(cfg.params.iters, 120);
    }

    #[test]
    fn zero_and_garbage_are_rejected() {
        assert_eq!(
            parse_positive_list("lengths", "5,0"),
            Err(ConfigError::NotPositive {
                field: "lengths",
                value: 0
            })
        );
        assert!(matches!(
            parse_positive_list("lengths", "5,ten"),
            Err(ConfigError::InvalidInteger { .. })
        ));
        let overrides = BenchOverrides {
            iters: Some(0),
            ..BenchOverrides::default()
        };
        assert!(
            BenchConfig::resolve(BenchPreset::Basic, &overrides, EngineInvocation::default())
                .is_err()
        );
    }

    #[test]
    fn golden_cases_are_checked_against_catalogue() {
        let cfg = GoldenConfig::resolve(
            PathBuf::from("tests/corpus"),
            String::from("python3"),
            PathBuf::from("tools/pynini_engine.py"),
            Some("invert, compose"),
        )
        .unwrap();
        let names: Vec<&str> = cfg.entries().unwrap().iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["invert", "compose"]);

        let all = GoldenConfig::resolve(PathBuf::new(), String::new(), PathBuf::new(), None)
            .unwrap();
        assert_eq!(all.entries().unwrap().len(), catalogue::CATALOGUE.len());

        assert_eq!(
            GoldenConfig::resolve(PathBuf::new(), String::new(), PathBuf::new(), Some("fold")),
            Err(ConfigError::UnknownCase(String::from("fold")))
        );
    }

    #[test]
    fn preset_names_are_case_insensitive() {
        assert_eq!(BenchPreset::from_str_loose("Profile"), Ok(BenchPreset::Profile));
        assert!(BenchPreset::from_str_loose("fast").is_err());
    }
}
