//! Differential testing: random strings are fed to an automaton and to an
//! [`Oracle`], and every disagreement is reported as a counterexample.
//!
//! This samples the language; a clean report is evidence, not proof, that the
//! automaton is correct.

use crate::automaton::{Automaton, Simulate};
use crate::config::{HarnessConfig, Limits};
use crate::oracle::{Oracle, RuleSpec};
use crate::types::{display_input, Verdict};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

/// Inputs shown when an automaton is run without rules.
pub const SAMPLE_INPUTS: [&str; 8] = ["", "a", "aa", "ab", "aba", "aaa", "bbb", "aabb"];

/// Alphabet used when neither the automaton nor the rules name any symbol.
pub const FALLBACK_ALPHABET: [char; 2] = ['a', 'b'];

/// An input on which the automaton and the oracle disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterexample {
    pub input: String,
    /// The oracle's verdict.
    pub expected: bool,
    /// The automaton's verdict.
    pub actual: bool,
    /// Execution trace of the automaton on `input`, when tracing is enabled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
}

/// The outcome of a differential testing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Number of strings checked.
    pub tested: usize,
    pub counterexamples: Vec<Counterexample>,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.counterexamples.is_empty()
    }
}

/// A string of uniformly random length in `0..=max_len`, each symbol drawn
/// uniformly from `alphabet`. An empty alphabet only yields `""`.
pub fn random_string<R: Rng + ?Sized>(rng: &mut R, alphabet: &[char], max_len: usize) -> String {
    if alphabet.is_empty() {
        return String::new();
    }

    let len = rng.gen_range(0..=max_len);
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
        .collect()
}

/// Compares `automaton` against `oracle` on up to `config.max_tests` strings.
///
/// The empty string is always checked first. Sampling stops once
/// `config.max_failures` distinct counterexamples have been found.
///
/// # Arguments
///
/// * `automaton` - The implementation under test.
/// * `oracle` - The reference verdicts.
/// * `alphabet` - Symbols random strings are drawn from.
/// * `config` - Test budget, string length, failure cap, seed and simulation limits.
///
/// # Returns
///
/// A `Report` with the number of strings checked and the counterexamples in the
/// order they were found.
pub fn run<S: Simulate + ?Sized>(
    automaton: &S,
    oracle: &Oracle,
    alphabet: &[char],
    config: &HarnessConfig,
) -> Report {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let quiet = config.limits.quiet();
    let mut report = Report::default();
    let mut failing = HashSet::new();

    info!(
        max_tests = config.max_tests,
        max_len = config.max_len,
        alphabet = %alphabet.iter().collect::<String>(),
        "differential testing started"
    );

    while report.tested < config.max_tests
        && report.counterexamples.len() < config.max_failures
    {
        let input = if report.tested == 0 {
            String::new()
        } else {
            random_string(&mut rng, alphabet, config.max_len)
        };
        report.tested += 1;

        let expected = oracle.evaluate(&input);
        let actual = automaton.accepts(&input, &quiet);
        if expected == actual || !failing.insert(input.clone()) {
            continue;
        }

        warn!(input = %display_input(&input), expected, actual, "counterexample");
        let trace = if config.limits.record_trace {
            automaton.simulate(&input, &config.limits).trace
        } else {
            Vec::new()
        };
        report.counterexamples.push(Counterexample {
            input,
            expected,
            actual,
            trace,
        });
    }

    info!(
        tested = report.tested,
        failures = report.counterexamples.len(),
        "differential testing finished"
    );
    report
}

/// Symbols to test with: the automaton's alphabet joined with the symbols the
/// rules mention, or [`FALLBACK_ALPHABET`] when both are empty.
pub fn test_alphabet(automaton: &Automaton, rules: &RuleSpec) -> Vec<char> {
    let mut alphabet = automaton.alphabet();
    alphabet.extend(rules.alphabet());

    if alphabet.is_empty() {
        FALLBACK_ALPHABET.to_vec()
    } else {
        alphabet.into_iter().collect()
    }
}

/// Builds the oracle and the alphabet from `rules` and runs [`run`].
pub fn check(automaton: &Automaton, rules: &RuleSpec, config: &HarnessConfig) -> Report {
    let oracle = Oracle::build(rules);
    run(automaton, &oracle, &test_alphabet(automaton, rules), config)
}

/// Simulates each input and returns the verdicts in order.
pub fn sample<S: Simulate + ?Sized>(
    automaton: &S,
    inputs: &[&str],
    limits: &Limits,
) -> Vec<(String, Verdict)> {
    inputs
        .iter()
        .map(|input| (input.to_string(), automaton.simulate(input, limits)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfa::Dfa;
    use crate::oracle::{CountOperator, CountSubject, Predicate, Rule};

    fn config(seed: u64) -> HarnessConfig {
        HarnessConfig {
            seed: Some(seed),
            ..HarnessConfig::default()
        }
    }

    /// Accepts every non-empty string over {a, b}.
    fn non_empty() -> Automaton {
        let mut dfa = Dfa::new("q0");
        dfa.add_transition("q0", 'a', "q1")
            .add_transition("q0", 'b', "q1")
            .add_transition("q1", 'a', "q1")
            .add_transition("q1", 'b', "q1")
            .add_final("q1");
        Automaton::from(dfa)
    }

    fn accept_all() -> RuleSpec {
        RuleSpec::all_of(vec![Rule::new(Predicate::AcceptAll)])
    }

    #[test]
    fn test_finds_the_empty_string() {
        let report = check(
            &non_empty(),
            &accept_all(),
            &HarnessConfig {
                max_tests: 300,
                ..config(7)
            },
        );

        assert_eq!(report.tested, 300);
        assert_eq!(report.counterexamples.len(), 1);

        let counterexample = &report.counterexamples[0];
        assert_eq!(counterexample.input, "");
        assert!(counterexample.expected);
        assert!(!counterexample.actual);
        assert!(counterexample.trace[0].starts_with("DFA start"));
    }

    #[test]
    fn test_agreeing_automaton_passes() {
        let mut dfa = Dfa::new("even");
        dfa.add_transition("even", 'a', "odd")
            .add_transition("odd", 'a', "even")
            .add_transition("even", 'b', "even")
            .add_transition("odd", 'b', "odd")
            .add_final("even");
        let rules = RuleSpec::all_of(vec![Rule::new(Predicate::Count {
            subject: CountSubject::Char { symbol: 'a' },
            operator: CountOperator::Even,
            n: 0,
            m: 0,
        })]);

        let report = check(&Automaton::from(dfa), &rules, &config(1));
        assert!(report.passed());
        assert_eq!(report.tested, 100);
    }

    #[test]
    fn test_stops_after_max_failures() {
        let rejects_everything = Automaton::from(Dfa::new("q0"));
        let oracle = Oracle::build(&accept_all());

        let report = run(&rejects_everything, &oracle, &['a', 'b'], &config(3));
        assert_eq!(report.counterexamples.len(), 5);
        assert!(report.tested < 100);

        let inputs: HashSet<&str> = report
            .counterexamples
            .iter()
            .map(|c| c.input.as_str())
            .collect();
        assert_eq!(inputs.len(), 5);
    }

    #[test]
    fn test_zero_failure_cap_tests_nothing() {
        let rejects_everything = Automaton::from(Dfa::new("q0"));
        let oracle = Oracle::build(&accept_all());
        let config = HarnessConfig {
            max_failures: 0,
            ..config(3)
        };

        let report = run(&rejects_everything, &oracle, &['a'], &config);
        assert!(report.passed());
        assert_eq!(report.tested, 0);
    }

    #[test]
    fn test_seed_makes_runs_reproducible() {
        let rejects_everything = Automaton::from(Dfa::new("q0"));
        let oracle = Oracle::build(&accept_all());
        let quiet = HarnessConfig {
            limits: Limits::default().quiet(),
            ..config(42)
        };

        let first = run(&rejects_everything, &oracle, &['x', 'y', 'z'], &quiet);
        let second = run(&rejects_everything, &oracle, &['x', 'y', 'z'], &quiet);
        assert_eq!(first, second);
        assert!(first.counterexamples.iter().all(|c| c.trace.is_empty()));
    }

    #[test]
    fn test_random_string_bounds() {
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..200 {
            let s = random_string(&mut rng, &['0', '1'], 4);
            assert!(s.chars().count() <= 4);
            assert!(s.chars().all(|c| c == '0' || c == '1'));
        }
        assert_eq!(random_string(&mut rng, &[], 10), "");
    }

    #[test]
    fn test_alphabet_union_and_fallback() {
        let rules = RuleSpec::all_of(vec![Rule::new(Predicate::Contains {
            value: "c".to_string(),
        })]);
        assert_eq!(test_alphabet(&non_empty(), &rules), vec!['a', 'b', 'c']);

        let bare = Automaton::from(Dfa::new("q0"));
        assert_eq!(
            test_alphabet(&bare, &RuleSpec::default()),
            FALLBACK_ALPHABET.to_vec()
        );
    }

    #[test]
    fn test_sample_inputs() {
        let verdicts = sample(&non_empty(), &SAMPLE_INPUTS, &Limits::default());

        assert_eq!(verdicts.len(), SAMPLE_INPUTS.len());
        assert!(!verdicts[0].1.accepted);
        assert!(verdicts[1..].iter().all(|(_, verdict)| verdict.accepted));
    }
}
