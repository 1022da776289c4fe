//! Batch conversion of OpenFst `.fst` files through an external converter.
//!
//! The harness only plans and sequences conversions; the converter itself is
//! an external executable called as `<converter> <src> <dst>`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use thiserror::Error;

use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};

pub const DEFAULT_SUFFIX: &str = ".libfst.fst";
pub const DEFAULT_INCLUDE: [&str; 2] = ["*_tagger.fst", "*_verbalizer.fst"];
pub const DEFAULT_CONVERTER: &str = "tools/convert_wetext_fst.sh";

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("input dir not found: {0}")]
    MissingInputDir(PathBuf),
    #[error("converter not found: {0}")]
    MissingConverter(PathBuf),
    #[error("invalid include pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("converting {src} failed with {status}")]
    Failed { src: PathBuf, status: ExitStatus },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("structured log: {0}")]
    Log(#[source] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Appended after stripping one trailing `.fst`.
    pub suffix: String,
    /// Glob patterns matched against file names in `input_dir`.
    pub include: Vec<String>,
    pub dry_run: bool,
    pub converter: PathBuf,
}

impl ConvertOptions {
    #[must_use]
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            suffix: String::from(DEFAULT_SUFFIX),
            include: DEFAULT_INCLUDE.iter().map(|p| p.to_string()).collect(),
            dry_run: false,
            converter: PathBuf::from(DEFAULT_CONVERTER),
        }
    }
}

/// One planned `src -> dst` conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub src: PathBuf,
    pub dst: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    pub planned: Vec<Conversion>,
    /// Converter invocations that completed; zero in a dry run.
    pub converted: usize,
}

/// Runs the external converter.
pub trait ConverterInvoker {
    fn convert(&mut self, converter: &Path, src: &Path, dst: &Path) -> Result<(), ConvertError>;
}

/// Invokes the converter as a child process and waits for it.
#[derive(Debug, Default)]
pub struct ProcessConverter;

impl ConverterInvoker for ProcessConverter {
    fn convert(&mut self, converter: &Path, src: &Path, dst: &Path) -> Result<(), ConvertError> {
        let status = Command::new(converter)
            .arg(src)
            .arg(dst)
            .status()
            .map_err(|source| ConvertError::Io {
                path: converter.to_path_buf(),
                source,
            })?;
        if !status.success() {
            return Err(ConvertError::Failed {
                src: src.to_path_buf(),
                status,
            });
        }
        Ok(())
    }
}

/// Regular files directly in `dir` whose name matches any pattern, sorted.
pub fn collect_inputs(dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, ConvertError> {
    let compiled = patterns
        .iter()
        .map(|pattern| {
            glob::Pattern::new(pattern).map_err(|source| ConvertError::Pattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let io_err = |source| ConvertError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut found = BTreeSet::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if compiled.iter().any(|p| p.matches(name)) {
            found.insert(path);
        }
    }
    Ok(found.into_iter().collect())
}

/// `output_dir/<name minus one .fst><suffix>`.
#[must_use]
pub fn output_path(src: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
    let name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".fst").unwrap_or(&name);
    output_dir.join(format!("{stem}{suffix}"))
}

/// Check prerequisites, plan, and (unless dry-running) convert in order.
///
/// The first converter failure aborts the batch.
pub fn run_batch(
    opts: &ConvertOptions,
    invoker: &mut dyn ConverterInvoker,
    log: &mut LogEmitter,
) -> Result<ConvertSummary, ConvertError> {
    if !opts.input_dir.is_dir() {
        return Err(ConvertError::MissingInputDir(opts.input_dir.clone()));
    }
    if !opts.converter.is_file() {
        return Err(ConvertError::MissingConverter(opts.converter.clone()));
    }

    let candidates = collect_inputs(&opts.input_dir, &opts.include)?;
    if candidates.is_empty() {
        println!("no matching files in {}", opts.input_dir.display());
        log.emit_entry(
            LogEntry::new("", LogLevel::Info, "convert_complete")
                .with_outcome(Outcome::Skip)
                .with_details(serde_json::json!({ "candidates": 0 })),
        )
        .map_err(ConvertError::Log)?;
        return Ok(ConvertSummary {
            planned: Vec::new(),
            converted: 0,
        });
    }

    if !opts.dry_run {
        std::fs::create_dir_all(&opts.output_dir).map_err(|source| ConvertError::Io {
            path: opts.output_dir.clone(),
            source,
        })?;
    }
    println!("found {} file(s)", candidates.len());

    let mut planned = Vec::with_capacity(candidates.len());
    let mut converted = 0;
    for src in candidates {
        let dst = output_path(&src, &opts.output_dir, &opts.suffix);
        println!("{} -> {}", src.display(), dst.display());
        if !opts.dry_run {
            if let Err(err) = invoker.convert(&opts.converter, &src, &dst) {
                log.emit_entry(
                    LogEntry::new("", LogLevel::Fatal, "conversion_failed")
                        .with_outcome(Outcome::Error)
                        .with_details(serde_json::json!({
                            "src": src.display().to_string(),
                            "error": err.to_string(),
                        })),
                )
                .map_err(ConvertError::Log)?;
                log.flush().map_err(ConvertError::Log)?;
                return Err(err);
            }
            converted += 1;
            log.emit_entry(
                LogEntry::new("", LogLevel::Info, "conversion_complete")
                    .with_outcome(Outcome::Pass)
                    .with_artifacts(vec![dst.display().to_string()]),
            )
            .map_err(ConvertError::Log)?;
        }
        planned.push(Conversion { src, dst });
    }

    println!("done");
    log.emit_entry(
        LogEntry::new("", LogLevel::Info, "convert_complete")
            .with_outcome(Outcome::Pass)
            .with_details(serde_json::json!({
                "candidates": planned.len(),
                "converted": converted,
                "dry_run": opts.dry_run,
            })),
    )
    .map_err(ConvertError::Log)?;
    log.flush().map_err(ConvertError::Log)?;
    Ok(ConvertSummary { planned, converted })
}
