//! Golden batch execution.
//!
//! Cases run sequentially and independently. A case that errors or panics is
//! recorded by name and the batch moves on; nothing is retried.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::catalogue::CatalogueEntry;
use crate::diff::FileChange;
use crate::engine::ReferenceAlgebraEngine;
use crate::golden::{CorpusFile, FileKind, GoldenError, GoldenManifest};
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome, now_utc};

/// Result of one catalogue entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub name: String,
    pub passed: bool,
    /// Files written, inputs first then golden. Empty on failure.
    pub files: Vec<CorpusFile>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Aggregate of a golden batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenBatchReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub outcomes: Vec<CaseOutcome>,
}

impl GoldenBatchReport {
    #[must_use]
    pub fn from_outcomes(outcomes: Vec<CaseOutcome>) -> Self {
        let total = outcomes.len();
        let passed = outcomes.iter().filter(|o| o.passed).count();
        Self {
            total,
            passed,
            failed: total - passed,
            outcomes,
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Names of failed cases, in catalogue order.
    #[must_use]
    pub fn failed_cases(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed)
            .map(|o| o.name.as_str())
            .collect()
    }

    /// Golden files whose content differs from what they replaced.
    pub fn changed_goldens(&self) -> impl Iterator<Item = &CorpusFile> {
        self.outcomes
            .iter()
            .flat_map(|o| &o.files)
            .filter(|f| f.kind == FileKind::Golden && f.change == FileChange::Changed)
    }

    /// One line per failure plus a totals line.
    #[must_use]
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        for outcome in self.outcomes.iter().filter(|o| !o.passed) {
            out.push_str(&format!(
                "FAIL {}: {}\n",
                outcome.name,
                outcome.error.as_deref().unwrap_or("unknown error")
            ));
        }
        out.push_str(&format!(
            "{} cases: {} passed, {} failed\n",
            self.total, self.passed, self.failed
        ));
        out
    }
}

/// Runs catalogue entries against an engine into one corpus directory.
pub struct GoldenRunner {
    corpus_dir: PathBuf,
}

impl GoldenRunner {
    #[must_use]
    pub fn new(corpus_dir: impl Into<PathBuf>) -> Self {
        Self {
            corpus_dir: corpus_dir.into(),
        }
    }

    #[must_use]
    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    /// Build and persist a single case. Panics in the builder become errors.
    pub fn run_case(
        &self,
        entry: &CatalogueEntry,
        engine: &mut dyn ReferenceAlgebraEngine,
    ) -> Result<Vec<CorpusFile>, GoldenError> {
        let built = catch_unwind(AssertUnwindSafe(|| (entry.build)(&mut *engine)))
            .map_err(|payload| GoldenError::Panicked(panic_message(payload.as_ref())))?;
        let case = built?;
        case.write_to(&self.corpus_dir)
    }

    /// Run every entry, then write the manifest.
    ///
    /// Only batch-level failures (corpus directory, manifest, log) are errors;
    /// per-case failures land in the report.
    pub fn run(
        &self,
        entries: &[&CatalogueEntry],
        engine: &mut dyn ReferenceAlgebraEngine,
        log: &mut LogEmitter,
    ) -> Result<GoldenBatchReport, GoldenError> {
        std::fs::create_dir_all(&self.corpus_dir)
            .map_err(|e| GoldenError::io(&self.corpus_dir, e))?;
        log.emit_entry(
            LogEntry::new("", LogLevel::Info, "golden_start").with_details(serde_json::json!({
                "corpus_dir": self.corpus_dir.display().to_string(),
                "cases": entries.len(),
            })),
        )
        .map_err(GoldenError::Log)?;

        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            let started = Instant::now();
            let result = self.run_case(entry, engine);
            let duration_ms = started.elapsed().as_millis() as u64;

            let outcome = match result {
                Ok(files) => {
                    eprintln!("  ok   {}", entry.name);
                    CaseOutcome {
                        name: entry.name.to_string(),
                        passed: true,
                        files,
                        error: None,
                        duration_ms,
                    }
                }
                Err(err) => {
                    eprintln!("  FAIL {}: {err}", entry.name);
                    CaseOutcome {
                        name: entry.name.to_string(),
                        passed: false,
                        files: Vec::new(),
                        error: Some(err.to_string()),
                        duration_ms,
                    }
                }
            };
            log.emit_entry(case_log_entry(&outcome))
                .map_err(GoldenError::Log)?;
            outcomes.push(outcome);
        }

        let report = GoldenBatchReport::from_outcomes(outcomes);
        let manifest = GoldenManifest::new(
            now_utc(),
            report
                .outcomes
                .iter()
                .flat_map(|o| o.files.iter().cloned())
                .collect(),
            report.failed_cases().into_iter().map(String::from).collect(),
        );
        let manifest_path = manifest.write_to(&self.corpus_dir)?;

        log.emit_entry(
            LogEntry::new("", LogLevel::Info, "golden_complete")
                .with_outcome(if report.all_passed() {
                    Outcome::Pass
                } else {
                    Outcome::Fail
                })
                .with_artifacts(vec![manifest_path.display().to_string()])
                .with_details(serde_json::json!({
                    "total": report.total,
                    "passed": report.passed,
                    "failed": report.failed,
                })),
        )
        .map_err(GoldenError::Log)?;
        log.flush().map_err(GoldenError::Log)?;
        Ok(report)
    }
}

fn case_log_entry(outcome: &CaseOutcome) -> LogEntry {
    let mut entry = LogEntry::new(
        "",
        if outcome.passed {
            LogLevel::Info
        } else {
            LogLevel::Error
        },
        "case_complete",
    )
    .with_case(&outcome.name)
    .with_outcome(if outcome.passed {
        Outcome::Pass
    } else {
        Outcome::Fail
    })
    .with_duration_ms(outcome.duration_ms)
    .with_artifacts(outcome.files.iter().map(|f| f.path.clone()).collect());
    if let Some(error) = &outcome.error {
        entry = entry.with_details(serde_json::json!({ "error": error }));
    }
    entry
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("non-string panic payload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, passed: bool) -> CaseOutcome {
        CaseOutcome {
            name: name.to_string(),
            passed,
            files: Vec::new(),
            error: (!passed).then(|| String::from("engine: boom")),
            duration_ms: 1,
        }
    }

    #[test]
    fn report_counts_and_names_failures() {
        let report = GoldenBatchReport::from_outcomes(vec![
            outcome("compose", true),
            outcome("difference", false),
            outcome("union", true),
        ]);
        assert_eq!((report.total, report.passed, report.failed), (3, 2, 1));
        assert!(!report.all_passed());
        assert_eq!(report.failed_cases(), vec!["difference"]);
        assert_eq!(
            report.render_summary(),
            "FAIL difference: engine: boom\n3 cases: 2 passed, 1 failed\n"
        );
    }

    #[test]
    fn panic_payloads_are_readable() {
        let payload = catch_unwind(|| panic!("bad builder {}", 7)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "bad builder 7");
        let payload = catch_unwind(|| std::panic::panic_any(42_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
