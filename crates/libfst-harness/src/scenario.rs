//! Scenario matrix construction.
//!
//! The matrix is `scenarios x lengths`, outer loop by scenario, inner loop by
//! length, so every length of one scenario is contiguous. Reports rely on that
//! grouping to read per-scenario growth trends.

/// Benchmark parameters shared by every row of one matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchParams {
    pub transducer_len: u64,
    pub branches: u64,
    pub iters: u64,
    pub warmup: u64,
}

/// One benchmark invocation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioRequest {
    pub scenario: String,
    pub len: u64,
    pub transducer_len: u64,
    pub branches: u64,
    pub iters: u64,
    pub warmup: u64,
}

impl ScenarioRequest {
    /// Engine CLI arguments for this request, without the output-format selector.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        vec![
            String::from("--scenario"),
            self.scenario.clone(),
            String::from("--len"),
            self.len.to_string(),
            String::from("--transducer-len"),
            self.transducer_len.to_string(),
            String::from("--branches"),
            self.branches.to_string(),
            String::from("--iters"),
            self.iters.to_string(),
            String::from("--warmup"),
            self.warmup.to_string(),
        ]
    }
}

/// Expand `scenarios x lengths` into an ordered request list.
///
/// Empty `scenarios` or `lengths` yield an empty matrix.
#[must_use]
pub fn build_matrix<S: AsRef<str>>(
    scenarios: &[S],
    lengths: &[u64],
    params: BenchParams,
) -> Vec<ScenarioRequest> {
    scenarios
        .iter()
        .flat_map(|scenario| {
            lengths.iter().map(move |&len| ScenarioRequest {
                scenario: scenario.as_ref().to_string(),
                len,
                transducer_len: params.transducer_len,
                branches: params.branches,
                iters: params.iters,
                warmup: params.warmup,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: BenchParams = BenchParams {
        transducer_len: 2048,
        branches: 6,
        iters: 50,
        warmup: 10,
    };

    #[test]
    fn matrix_is_grouped_by_scenario_then_length() {
        let rows = build_matrix(&["a", "b"], &[5, 10, 20], PARAMS);
        let keys: Vec<(&str, u64)> = rows.iter().map(|r| (r.scenario.as_str(), r.len)).collect();
        assert_eq!(
            keys,
            vec![("a", 5), ("a", 10), ("a", 20), ("b", 5), ("b", 10), ("b", 20)]
        );
        assert!(rows.iter().all(|r| r.transducer_len == 2048 && r.warmup == 10));
    }

    #[test]
    fn given_order_is_kept_not_sorted() {
        let rows = build_matrix(&["z", "a"], &[50, 5], PARAMS);
        assert_eq!(rows[0].scenario, "z");
        assert_eq!(rows[0].len, 50);
        assert_eq!(rows[1].len, 5);
        assert_eq!(rows[2].scenario, "a");
    }

    #[test]
    fn degenerate_inputs_yield_empty_matrix() {
        assert!(build_matrix::<&str>(&[], &[1, 2], PARAMS).is_empty());
        assert!(build_matrix(&["a"], &[], PARAMS).is_empty());
    }

    #[test]
    fn request_args_follow_engine_flag_order() {
        let req = &build_matrix(&["s"], &[11], PARAMS)[0];
        assert_eq!(
            req.to_args(),
            vec![
                "--scenario", "s", "--len", "11", "--transducer-len", "2048", "--branches", "6",
                "--iters", "50", "--warmup", "10"
            ]
        );
    }
}
