//! CLI entrypoint for the libfst oracle and benchmark harness.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use libfst_harness::bench::{ProcessEntryPoint, run_matrix};
use libfst_harness::catalogue;
use libfst_harness::config::{
    BenchConfig, BenchOverrides, BenchPreset, EngineInvocation, GoldenConfig,
};
use libfst_harness::convert::{self, ConvertOptions, ProcessConverter};
use libfst_harness::engine::ProcessAlgebraEngine;
use libfst_harness::report::render_report;
use libfst_harness::runner::GoldenRunner;
use libfst_harness::scenario::build_matrix;
use libfst_harness::structured_log::{
    LogEmitter, StreamKind, default_run_id, validate_log_file,
};

const LOG_DIR: &str = "target/libfst-harness";

/// Golden oracles and benchmark regressions for libfst.
#[derive(Debug, Parser)]
#[command(name = "libfst-harness")]
#[command(about = "Golden oracle generation and benchmark regression harness for libfst")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a benchmark matrix against the engine and print the report.
    Bench {
        /// Matrix preset (basic or profile).
        #[arg(long, default_value = "basic")]
        preset: String,
        /// Comma-separated scenario names (overrides the preset).
        #[arg(long)]
        scenarios: Option<String>,
        /// Comma-separated input lengths (overrides the preset).
        #[arg(long)]
        lengths: Option<String>,
        #[arg(long)]
        transducer_len: Option<u64>,
        #[arg(long)]
        branches: Option<u64>,
        /// Timed iterations per row.
        #[arg(long)]
        iters: Option<u64>,
        /// Untimed warmup iterations per row (may be 0).
        #[arg(long)]
        warmup: Option<u64>,
        /// Build mode forwarded as -Doptimize=<mode>.
        #[arg(long, default_value = "ReleaseFast")]
        optimize: String,
        /// Engine build tool.
        #[arg(long, default_value = "zig")]
        engine_program: String,
        /// Engine source directory (working directory of the build tool).
        #[arg(long, default_value = ".")]
        engine_dir: PathBuf,
        /// Per-row wall-clock limit; a timeout aborts the run.
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Write the report here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Regenerate the golden corpus through the reference engine.
    Golden {
        /// Corpus output directory.
        #[arg(long, default_value = "tests/corpus")]
        corpus_dir: PathBuf,
        /// Interpreter for the engine driver.
        #[arg(long, default_value = "python3")]
        python: String,
        /// Reference engine driver script.
        #[arg(long, default_value = "tools/pynini_engine.py")]
        engine_script: PathBuf,
        /// Comma-separated case names (default: whole catalogue).
        #[arg(long)]
        cases: Option<String>,
        /// Exit non-zero if any case fails.
        #[arg(long)]
        strict: bool,
        /// Print diffs of golden files that changed.
        #[arg(long)]
        show_diff: bool,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// List the golden catalogue.
    Cases,
    /// Batch-convert OpenFst .fst files to libfst format.
    Convert {
        /// Directory containing OpenFst .fst files.
        #[arg(long)]
        input_dir: PathBuf,
        /// Directory to write converted files.
        #[arg(long)]
        output_dir: PathBuf,
        /// Output suffix appended after stripping .fst.
        #[arg(long, default_value = convert::DEFAULT_SUFFIX)]
        suffix: String,
        /// Glob patterns to include (default: *_tagger.fst *_verbalizer.fst).
        #[arg(long, num_args = 1..)]
        include: Vec<String>,
        /// Print planned conversions without executing.
        #[arg(long)]
        dry_run: bool,
        /// Converter executable, called as <converter> <src> <dst>.
        #[arg(long, default_value = convert::DEFAULT_CONVERTER)]
        converter: PathBuf,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Validate a structured JSONL log against the log schema.
    ValidateLog {
        #[arg(long)]
        log: PathBuf,
    },
}

fn open_log(
    path: Option<PathBuf>,
    stream: StreamKind,
) -> Result<LogEmitter, Box<dyn std::error::Error>> {
    let path = path.unwrap_or_else(|| {
        Path::new(LOG_DIR).join(format!("{}.log.jsonl", stream.as_str()))
    });
    let emitter = LogEmitter::to_file(&path, stream, &default_run_id())
        .map_err(|e| format!("cannot open log {}: {e}", path.display()))?;
    Ok(emitter)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Bench {
            preset,
            scenarios,
            lengths,
            transducer_len,
            branches,
            iters,
            warmup,
            optimize,
            engine_program,
            engine_dir,
            timeout_secs,
            output,
            log,
        } => {
            let preset = BenchPreset::from_str_loose(&preset)?;
            let overrides = BenchOverrides {
                scenarios,
                lengths,
                transducer_len,
                branches,
                iters,
                warmup,
            };
            let invocation = EngineInvocation {
                program: engine_program,
                optimize,
                engine_dir,
                timeout: timeout_secs.map(Duration::from_secs),
            };
            let config = BenchConfig::resolve(preset, &overrides, invocation)?;
            let requests = build_matrix(&config.scenarios, &config.lengths, config.params);
            eprintln!(
                "Running {} benchmark row(s) ({} scenario(s) x {} length(s))",
                requests.len(),
                config.scenarios.len(),
                config.lengths.len()
            );

            let mut log = open_log(log, StreamKind::Bench)?;
            let mut entry = ProcessEntryPoint::zig_build(config.invocation);
            let results = run_matrix(&mut entry, requests, &mut log)?;
            let report = render_report(&results);
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent()
                        && !parent.as_os_str().is_empty()
                    {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, report)?;
                    eprintln!("Wrote report to {}", path.display());
                }
                None => print!("{report}"),
            }
        }
        Command::Golden {
            corpus_dir,
            python,
            engine_script,
            cases,
            strict,
            show_diff,
            log,
        } => {
            let config =
                GoldenConfig::resolve(corpus_dir, python, engine_script, cases.as_deref())?;
            let entries = config.entries()?;
            if !config.engine_script.is_file() {
                return Err(format!(
                    "reference engine driver not found: {}",
                    config.engine_script.display()
                )
                .into());
            }
            let mut engine =
                ProcessAlgebraEngine::pynini(&config.engine_program, &config.engine_script);
            engine.probe()?;

            eprintln!(
                "Generating {} golden case(s) in {}/",
                entries.len(),
                config.corpus_dir.display()
            );
            let mut log = open_log(log, StreamKind::Golden)?;
            let report =
                GoldenRunner::new(&config.corpus_dir).run(&entries, &mut engine, &mut log)?;
            if show_diff {
                for file in report.changed_goldens() {
                    if let Some(diff) = &file.diff {
                        eprintln!("{}:\n{diff}", file.path);
                    }
                }
            }
            eprint!("{}", report.render_summary());
            if strict && !report.all_passed() {
                return Err(format!("{} golden case(s) failed", report.failed).into());
            }
        }
        Command::Cases => {
            for entry in catalogue::CATALOGUE {
                println!("{:<18} {}", entry.name, entry.law);
            }
        }
        Command::Convert {
            input_dir,
            output_dir,
            suffix,
            include,
            dry_run,
            converter,
            log,
        } => {
            let mut opts = ConvertOptions::new(input_dir, output_dir);
            opts.suffix = suffix;
            if !include.is_empty() {
                opts.include = include;
            }
            opts.dry_run = dry_run;
            opts.converter = converter;

            let mut log = open_log(log, StreamKind::Convert)?;
            let summary = convert::run_batch(&opts, &mut ProcessConverter, &mut log)?;
            if dry_run && !summary.planned.is_empty() {
                eprintln!("dry run: {} conversion(s) planned", summary.planned.len());
            }
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = validate_log_file(&log)?;
            for err in &errors {
                eprintln!("{err}");
            }
            if !errors.is_empty() {
                return Err(format!(
                    "{} schema violation(s) in {} line(s) of {}",
                    errors.len(),
                    lines,
                    log.display()
                )
                .into());
            }
            eprintln!("{}: {lines} valid line(s)", log.display());
        }
    }

    Ok(())
}
