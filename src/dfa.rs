//! Deterministic finite automata.

use crate::types::{display_input, Outcome, TraceLog, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, trace};

/// A deterministic finite automaton: exactly one target per (state, symbol).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dfa {
    /// All states, including those only named by transitions.
    pub states: HashSet<String>,
    pub start: String,
    /// Accepting states.
    pub finals: HashSet<String>,
    /// `transitions[state][symbol]` is the unique successor.
    #[serde(default)]
    pub transitions: HashMap<String, HashMap<char, String>>,
}

impl Dfa {
    /// Creates a DFA with a single, non-accepting start state and no transitions.
    pub fn new(start: &str) -> Self {
        Self {
            states: HashSet::from([start.to_string()]),
            start: start.to_string(),
            finals: HashSet::new(),
            transitions: HashMap::new(),
        }
    }

    /// Adds `from --symbol--> to`, replacing any previous target for the pair.
    pub fn add_transition(&mut self, from: &str, symbol: char, to: &str) -> &mut Self {
        self.states.insert(from.to_string());
        self.states.insert(to.to_string());
        self.transitions
            .entry(from.to_string())
            .or_default()
            .insert(symbol, to.to_string());
        self
    }

    /// Marks `state` as accepting, declaring it if needed.
    pub fn add_final(&mut self, state: &str) -> &mut Self {
        self.states.insert(state.to_string());
        self.finals.insert(state.to_string());
        self
    }

    /// The successor of `state` on `symbol`, if defined.
    pub fn next(&self, state: &str, symbol: char) -> Option<&str> {
        self.transitions
            .get(state)
            .and_then(|row| row.get(&symbol))
            .map(String::as_str)
    }

    /// Symbols appearing on any transition.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.transitions
            .values()
            .flat_map(|row| row.keys().copied())
            .collect()
    }

    /// Walks the input symbol by symbol. A missing transition rejects at once,
    /// regardless of the remaining input.
    pub fn simulate(&self, input: &str, record_trace: bool) -> Verdict {
        let mut log = TraceLog::new(record_trace);
        let mut state = self.start.as_str();

        log.push(|| format!("DFA start in {state}, input {}", display_input(input)));

        for (i, symbol) in input.chars().enumerate() {
            match self.next(state, symbol) {
                Some(next) => {
                    trace!(step = i, from = state, %symbol, to = next, "dfa step");
                    log.push(|| format!("step {i}: ({state}, {symbol}) -> {next}"));
                    state = next;
                }
                None => {
                    debug!(step = i, state, %symbol, "dfa has no transition");
                    log.push(|| format!("step {i}: no transition for ({state}, {symbol})"));
                    return log.finish(Outcome::NoTransition, i);
                }
            }
        }

        let outcome = if self.finals.contains(state) {
            Outcome::Accepted
        } else {
            Outcome::NotAccepting
        };
        log.push(|| format!("halted in {state}"));
        log.finish(outcome, input.chars().count())
    }

    /// Every accepted word of length at most `max_len`, shortest first and
    /// alphabetically within a length.
    pub fn accepted_words(&self, max_len: usize) -> Vec<String> {
        let alphabet: Vec<char> = self.alphabet().into_iter().collect();
        let mut words = Vec::new();

        for len in 0..=max_len {
            let mut prefix = String::new();
            self.collect_words(&self.start, len, &alphabet, &mut prefix, &mut words);
        }

        words
    }

    fn collect_words(
        &self,
        state: &str,
        remaining: usize,
        alphabet: &[char],
        prefix: &mut String,
        words: &mut Vec<String>,
    ) {
        if remaining == 0 {
            if self.finals.contains(state) {
                words.push(prefix.clone());
            }
            return;
        }

        for &symbol in alphabet {
            if let Some(next) = self.next(state, symbol) {
                prefix.push(symbol);
                self.collect_words(next, remaining - 1, alphabet, prefix, words);
                prefix.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts strings over {a, b} with an even number of a's.
    fn even_as() -> Dfa {
        let mut dfa = Dfa::new("q0");
        dfa.add_transition("q0", 'a', "q1")
            .add_transition("q0", 'b', "q0")
            .add_transition("q1", 'a', "q0")
            .add_transition("q1", 'b', "q1")
            .add_final("q0");
        dfa
    }

    #[test]
    fn test_accepts_and_rejects() {
        let dfa = even_as();

        assert!(dfa.simulate("", false).accepted);
        assert!(dfa.simulate("abab", false).accepted);
        assert!(!dfa.simulate("ab", false).accepted);
        assert_eq!(dfa.simulate("ab", false).outcome, Outcome::NotAccepting);
    }

    #[test]
    fn test_missing_transition_rejects_immediately() {
        let mut dfa = Dfa::new("q0");
        dfa.add_transition("q0", 'a', "q0").add_final("q0");

        let verdict = dfa.simulate("abaaaa", true);
        assert!(!verdict.accepted);
        assert_eq!(verdict.outcome, Outcome::NoTransition);
        assert_eq!(verdict.steps, 1);
        assert!(verdict.trace.iter().any(|l| l.contains("no transition for (q0, b)")));
    }

    #[test]
    fn test_accepted_words() {
        let words = even_as().accepted_words(2);

        assert_eq!(words, vec!["", "b", "aa", "bb"]);
    }

    #[test]
    fn test_alphabet() {
        assert_eq!(even_as().alphabet(), BTreeSet::from(['a', 'b']));
    }
}
