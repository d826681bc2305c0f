//! Tunable budgets for simulation and differential testing.

use crate::types::{MAX_PDA_STEPS, MAX_TM_STEPS};
use serde::{Deserialize, Serialize};

/// The default number of random strings drawn by the harness.
pub const DEFAULT_MAX_TESTS: usize = 100;
/// The default maximum length of a random string.
pub const DEFAULT_MAX_LEN: usize = 15;
/// The default number of counterexamples after which sampling stops.
pub const DEFAULT_MAX_FAILURES: usize = 5;

/// Budgets applied to a single simulation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Configurations a pushdown automaton may expand before rejecting.
    pub pda_max_steps: usize,
    /// Steps (or configurations, when nondeterministic) a Turing machine may take.
    pub tm_max_steps: usize,
    /// Whether simulators record a step-by-step trace.
    pub record_trace: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            pda_max_steps: MAX_PDA_STEPS,
            tm_max_steps: MAX_TM_STEPS,
            record_trace: true,
        }
    }
}

impl Limits {
    /// The same budgets with tracing switched off.
    pub fn quiet(&self) -> Self {
        Self {
            record_trace: false,
            ..self.clone()
        }
    }
}

/// Parameters of one differential testing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Number of strings to check, the empty string included.
    pub max_tests: usize,
    /// Longest random string drawn.
    pub max_len: usize,
    /// Counterexamples after which sampling stops. Zero checks nothing.
    pub max_failures: usize,
    /// Fixed seed for reproducible runs; entropy is used when absent.
    pub seed: Option<u64>,
    /// Budgets for every simulation the harness performs.
    pub limits: Limits,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            max_tests: DEFAULT_MAX_TESTS,
            max_len: DEFAULT_MAX_LEN,
            max_failures: DEFAULT_MAX_FAILURES,
            seed: None,
            limits: Limits::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: HarnessConfig = serde_json::from_str(r#"{"max_tests": 7}"#).unwrap();

        assert_eq!(config.max_tests, 7);
        assert_eq!(config.max_len, DEFAULT_MAX_LEN);
        assert_eq!(config.limits, Limits::default());
    }

    #[test]
    fn test_quiet_keeps_budgets() {
        let limits = Limits {
            pda_max_steps: 10,
            ..Limits::default()
        };
        let quiet = limits.quiet();

        assert!(!quiet.record_trace);
        assert_eq!(quiet.pda_max_steps, 10);
    }
}
