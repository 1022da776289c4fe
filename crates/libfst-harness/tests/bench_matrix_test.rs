//! Integration test: benchmark matrix execution through real child processes.
//!
//! A `sh -c` script stands in for `zig build bench`; it receives the exact
//! request flags and prints one JSON record.
//!
//! Run: cargo test -p libfst-harness --test bench_matrix_test
#![cfg(unix)]

use std::path::Path;
use std::time::Duration;

use libfst_harness::bench::{BenchError, ProcessEntryPoint, run_matrix};
use libfst_harness::config::EngineInvocation;
use libfst_harness::report::{parse_jsonl, render_jsonl, render_report};
use libfst_harness::scenario::{BenchParams, build_matrix};
use libfst_harness::structured_log::{LogEmitter, StreamKind, validate_log_line};

const PARAMS: BenchParams = BenchParams {
    transducer_len: 2048,
    branches: 6,
    iters: 50,
    warmup: 0,
};

/// Positional layout seen by the script: $1 --scenario $2 name $3 --len $4 len
/// ... ${13} --format ${14} json.
const RECORD: &str = r#"[ "${13}" = "--format" ] && [ "${14}" = "json" ] || exit 9
printf '{"scenario":"%s","len":%s,"transducer_len":%s,"branches":%s,"iters":%s,"avg_ns":%s500,"min_ns":1000,"max_ns":2500,"avg_states":7}\n' "$2" "$4" "$6" "$8" "${10}" "$4""#;

fn fake_engine(script: &str, timeout: Option<Duration>) -> ProcessEntryPoint {
    let invocation = EngineInvocation {
        program: String::from("sh"),
        timeout,
        ..EngineInvocation::default()
    };
    ProcessEntryPoint::with_args(
        invocation,
        vec![
            String::from("-c"),
            script.to_string(),
            String::from("fake-engine"),
        ],
    )
}

fn recording(calls: &Path, body: &str) -> String {
    format!("echo \"$4\" >> '{}'\n{body}", calls.display())
}

fn recorded_lengths(calls: &Path) -> Vec<String> {
    std::fs::read_to_string(calls)
        .unwrap_or_default()
        .lines()
        .map(String::from)
        .collect()
}

#[test]
fn rows_run_in_matrix_order_and_render() {
    let dir = tempfile::tempdir().unwrap();
    let calls = dir.path().join("calls.txt");
    let mut engine = fake_engine(&recording(&calls, RECORD), None);
    let (mut log, buf) = LogEmitter::to_buffer(StreamKind::Bench, "bench-test");

    let requests = build_matrix(&["compose_frozen_transducer", "compose_frozen_shortest_path"], &[5, 10], PARAMS);
    let results = run_matrix(&mut engine, requests, &mut log).unwrap();

    assert_eq!(recorded_lengths(&calls), vec!["5", "10", "5", "10"]);
    let keys: Vec<(&str, u64)> = results.iter().map(|r| (r.scenario.as_str(), r.len)).collect();
    assert_eq!(
        keys,
        vec![
            ("compose_frozen_transducer", 5),
            ("compose_frozen_transducer", 10),
            ("compose_frozen_shortest_path", 5),
            ("compose_frozen_shortest_path", 10),
        ]
    );
    assert_eq!(results[1].avg_ns, 10500.0);
    assert_eq!(results[0].record()["iters"], 50);

    let report = render_report(&results);
    assert!(report.contains("| compose_frozen_transducer    |  10 |           2048 |        6 | 10.500 |  1.000 |  2.500 |          7 |"), "{report}");
    assert!(report.contains("\n\n# jsonl\n"));

    let echoed = parse_jsonl(&render_jsonl(&results)).unwrap();
    assert_eq!(echoed, results);

    for (i, line) in buf.contents().lines().enumerate() {
        validate_log_line(line, i + 1).unwrap_or_else(|errs| panic!("{errs:?}"));
    }
}

#[test]
fn non_zero_exit_aborts_without_further_rows() {
    let dir = tempfile::tempdir().unwrap();
    let calls = dir.path().join("calls.txt");
    let body = format!("if [ \"$4\" = 20 ]; then echo 'engine crashed' >&2; exit 4; fi\n{RECORD}");
    let mut engine = fake_engine(&recording(&calls, &body), None);
    let (mut log, buf) = LogEmitter::to_buffer(StreamKind::Bench, "bench-test");

    let requests = build_matrix(&["s"], &[5, 10, 20, 30, 40], PARAMS);
    let err = run_matrix(&mut engine, requests, &mut log).unwrap_err();

    match &err {
        BenchError::Exit { len, stderr, .. } => {
            assert_eq!(*len, 20);
            assert_eq!(stderr, "engine crashed");
        }
        other => panic!("expected exit failure, got {other:?}"),
    }
    assert_eq!(err.exit_code(), Some(4));
    assert_eq!(recorded_lengths(&calls), vec!["5", "10", "20"]);
    assert!(buf.contents().contains(r#""exit_code":4"#));
}

#[test]
fn malformed_output_is_fatal() {
    let requests = || build_matrix(&["s"], &[1], PARAMS);
    let (mut log, _buf) = LogEmitter::to_buffer(StreamKind::Bench, "bench-test");

    let mut not_json = fake_engine("echo 'avg 1234ns'", None);
    assert!(matches!(
        run_matrix(&mut not_json, requests(), &mut log),
        Err(BenchError::Malformed { .. })
    ));

    let mut two_records = fake_engine(&format!("{RECORD}\n{RECORD}"), None);
    assert!(matches!(
        run_matrix(&mut two_records, requests(), &mut log),
        Err(BenchError::Malformed { .. })
    ));

    let mut missing_field = fake_engine(r#"echo '{"scenario":"s","len":1}'"#, None);
    assert!(matches!(
        run_matrix(&mut missing_field, requests(), &mut log),
        Err(BenchError::Malformed { .. })
    ));
}

#[test]
fn timeout_kills_the_row_and_aborts() {
    let mut engine = fake_engine("exec sleep 30", Some(Duration::from_millis(200)));
    let (mut log, buf) = LogEmitter::to_buffer(StreamKind::Bench, "bench-test");
    let started = std::time::Instant::now();
    let err = run_matrix(&mut engine, build_matrix(&["s"], &[1, 2], PARAMS), &mut log).unwrap_err();
    assert!(matches!(err, BenchError::Timeout { len: 1, .. }), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(buf.contents().contains(r#""outcome":"timeout""#));
}

#[test]
fn missing_engine_program_fails_to_launch() {
    let invocation = EngineInvocation {
        program: String::from("/nonexistent/zig"),
        ..EngineInvocation::default()
    };
    let mut engine = ProcessEntryPoint::zig_build(invocation);
    let (mut log, _buf) = LogEmitter::to_buffer(StreamKind::Bench, "bench-test");
    let err = run_matrix(&mut engine, build_matrix(&["s"], &[1], PARAMS), &mut log).unwrap_err();
    assert!(matches!(err, BenchError::Spawn { .. }));
}

#[test]
fn empty_matrix_runs_nothing() {
    let mut engine = fake_engine("exit 1", None);
    let (mut log, _buf) = LogEmitter::to_buffer(StreamKind::Bench, "bench-test");
    let results = run_matrix(&mut engine, build_matrix(&["s"], &[], PARAMS), &mut log).unwrap();
    assert!(results.is_empty());
}
