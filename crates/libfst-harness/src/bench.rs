//! Benchmark execution against the external engine.
//!
//! Each request is one blocking engine invocation; requests never overlap.
//! Any failure (launch, non-zero exit, timeout, malformed record) aborts the
//! whole run and no partial result list is returned. Nothing is retried.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::EngineInvocation;
use crate::report::{BenchmarkResult, RecordError};
use crate::scenario::ScenarioRequest;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{scenario} len={len}: engine exited with {status}: {stderr}")]
    Exit {
        scenario: String,
        len: u64,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{scenario} len={len}: engine timed out after {timeout:?}")]
    Timeout {
        scenario: String,
        len: u64,
        timeout: Duration,
    },
    #[error("{scenario} len={len}: malformed engine output: {source}")]
    Malformed {
        scenario: String,
        len: u64,
        #[source]
        source: RecordError,
    },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Exit code of the failed engine process, when there was one.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exit { status, .. } => status.code(),
            _ => None,
        }
    }
}

/// The engine's benchmark entry point.
pub trait BenchmarkEntryPoint {
    /// Run one request to completion and return its parsed record.
    fn run(&mut self, request: &ScenarioRequest) -> Result<BenchmarkResult, BenchError>;
}

/// Entry point reached by spawning a process per request.
#[derive(Debug, Clone)]
pub struct ProcessEntryPoint {
    invocation: EngineInvocation,
    base_args: Vec<String>,
}

impl ProcessEntryPoint {
    /// `zig build bench -Doptimize=<mode> -- <request args> --format json`.
    #[must_use]
    pub fn zig_build(invocation: EngineInvocation) -> Self {
        let base_args = vec![
            String::from("build"),
            String::from("bench"),
            format!("-Doptimize={}", invocation.optimize),
            String::from("--"),
        ];
        Self {
            invocation,
            base_args,
        }
    }

    /// Arbitrary program with a fixed argument prefix.
    #[must_use]
    pub fn with_args(invocation: EngineInvocation, base_args: Vec<String>) -> Self {
        Self {
            invocation,
            base_args,
        }
    }

    /// The full command for `request`.
    #[must_use]
    pub fn command_for(&self, request: &ScenarioRequest) -> Command {
        let mut cmd = Command::new(&self.invocation.program);
        cmd.args(&self.base_args)
            .args(request.to_args())
            .arg("--format")
            .arg("json")
            .current_dir(&self.invocation.engine_dir);
        cmd
    }
}

impl BenchmarkEntryPoint for ProcessEntryPoint {
    fn run(&mut self, request: &ScenarioRequest) -> Result<BenchmarkResult, BenchError> {
        let child = self
            .command_for(request)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BenchError::Spawn {
                program: self.invocation.program.clone(),
                source,
            })?;

        let output = match self.invocation.timeout {
            None => child.wait_with_output()?,
            Some(timeout) => wait_with_deadline(child, timeout)?.ok_or_else(|| {
                BenchError::Timeout {
                    scenario: request.scenario.clone(),
                    len: request.len,
                    timeout,
                }
            })?,
        };

        if !output.status.success() {
            return Err(BenchError::Exit {
                scenario: request.scenario.clone(),
                len: request.len,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        BenchmarkResult::parse(&stdout).map_err(|source| BenchError::Malformed {
            scenario: request.scenario.clone(),
            len: request.len,
            source,
        })
    }
}

/// Wait for `child` up to `timeout`; on expiry kill it and return `None`.
fn wait_with_deadline(mut child: Child, timeout: Duration) -> std::io::Result<Option<Output>> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_reader = std::thread::spawn(move || drain(stdout));
    let stderr_reader = std::thread::spawn(move || drain(stderr));

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            child.kill().ok();
            child.wait()?;
            // Readers may stay blocked on pipes inherited by grandchildren; leave them detached.
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    Ok(Some(Output {
        status,
        stdout: stdout_reader.join().unwrap_or_default(),
        stderr: stderr_reader.join().unwrap_or_default(),
    }))
}

fn drain(pipe: Option<impl Read>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).ok();
    }
    buf
}

/// Execute `requests` in order, one at a time, all-or-nothing.
pub fn run_matrix(
    entry: &mut dyn BenchmarkEntryPoint,
    requests: Vec<ScenarioRequest>,
    log: &mut LogEmitter,
) -> Result<Vec<BenchmarkResult>, BenchError> {
    let total = requests.len();
    let mut results = Vec::with_capacity(total);
    log.emit_entry(
        LogEntry::new("", LogLevel::Info, "bench_start")
            .with_details(serde_json::json!({ "requests": total })),
    )?;

    for (idx, request) in requests.into_iter().enumerate() {
        eprintln!(
            "[{}/{total}] {} len={}",
            idx + 1,
            request.scenario,
            request.len
        );
        let started = Instant::now();
        let outcome = entry.run(&request);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                log.emit_entry(
                    LogEntry::new("", LogLevel::Info, "scenario_complete")
                        .with_scenario(&request.scenario)
                        .with_outcome(Outcome::Pass)
                        .with_duration_ms(elapsed_ms)
                        .with_details(serde_json::json!({
                            "len": request.len,
                            "avg_ns": result.avg_ns,
                        })),
                )?;
                results.push(result);
            }
            Err(err) => {
                let outcome = match err {
                    BenchError::Timeout { .. } => Outcome::Timeout,
                    _ => Outcome::Error,
                };
                let mut failure = LogEntry::new("", LogLevel::Fatal, "scenario_failed")
                    .with_scenario(&request.scenario)
                    .with_outcome(outcome)
                    .with_duration_ms(elapsed_ms)
                    .with_details(serde_json::json!({
                        "len": request.len,
                        "error": err.to_string(),
                    }));
                if let Some(code) = err.exit_code() {
                    failure = failure.with_exit_code(code);
                }
                log.emit_entry(failure)?;
                log.flush()?;
                return Err(err);
            }
        }
    }

    log.emit(LogLevel::Info, "bench_complete")?;
    log.flush()?;
    Ok(results)
}
