//! Nondeterministic finite automata with ε-moves.

use crate::types::{display_input, Outcome, TraceLog, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, trace};

pub type StateSet = BTreeSet<String>;

/// A nondeterministic finite automaton. ε-edges live in their own relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nfa {
    pub states: HashSet<String>,
    pub start: String,
    pub finals: HashSet<String>,
    /// `transitions[state][symbol]` is the set of successors.
    #[serde(default)]
    pub transitions: HashMap<String, HashMap<char, StateSet>>,
    /// `epsilon[state]` is the set of states reachable without reading input.
    #[serde(default)]
    pub epsilon: HashMap<String, StateSet>,
}

impl Nfa {
    pub fn new(start: &str) -> Self {
        Self {
            states: HashSet::from([start.to_string()]),
            start: start.to_string(),
            ..Self::default()
        }
    }

    pub fn add_state(&mut self, state: &str) -> &mut Self {
        self.states.insert(state.to_string());
        self
    }

    pub fn add_transition(&mut self, from: &str, symbol: char, to: &str) -> &mut Self {
        self.add_state(from).add_state(to);
        self.transitions
            .entry(from.to_string())
            .or_default()
            .entry(symbol)
            .or_default()
            .insert(to.to_string());
        self
    }

    pub fn add_epsilon(&mut self, from: &str, to: &str) -> &mut Self {
        self.add_state(from).add_state(to);
        self.epsilon
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        self
    }

    pub fn add_final(&mut self, state: &str) -> &mut Self {
        self.add_state(state);
        self.finals.insert(state.to_string());
        self
    }

    /// True when some (state, symbol) pair has several targets or any ε-edge exists.
    pub fn is_nondeterministic(&self) -> bool {
        self.epsilon.values().any(|targets| !targets.is_empty())
            || self
                .transitions
                .values()
                .flat_map(HashMap::values)
                .any(|targets| targets.len() > 1)
    }

    /// Symbols appearing on any non-ε transition.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.transitions
            .values()
            .flat_map(|row| row.keys().copied())
            .collect()
    }

    /// States reachable from `states` through ε-edges only, `states` included.
    pub fn epsilon_closure<'a>(&self, states: impl IntoIterator<Item = &'a String>) -> StateSet {
        let mut closure: StateSet = StateSet::new();
        let mut stack: Vec<&str> = Vec::new();

        for state in states {
            if closure.insert(state.clone()) {
                stack.push(state);
            }
        }

        while let Some(state) = stack.pop() {
            if let Some(targets) = self.epsilon.get(state) {
                for target in targets {
                    if closure.insert(target.clone()) {
                        stack.push(target);
                    }
                }
            }
        }

        closure
    }

    /// States reachable from any state of `current` by reading `symbol`.
    pub fn step(&self, current: &StateSet, symbol: char) -> StateSet {
        current
            .iter()
            .filter_map(|state| self.transitions.get(state))
            .filter_map(|row| row.get(&symbol))
            .flatten()
            .cloned()
            .collect()
    }

    /// Tracks the ε-closed set of active states through the input.
    pub fn simulate(&self, input: &str, record_trace: bool) -> Verdict {
        let mut log = TraceLog::new(record_trace);
        let mut current = self.epsilon_closure([&self.start]);

        log.push(|| format!("NFA start in {}, input {}", self.start, display_input(input)));
        log.push(|| format!("initial ε-closure: {}", format_set(&current)));

        for (i, symbol) in input.chars().enumerate() {
            let moved = self.step(&current, symbol);
            let next = self.epsilon_closure(&moved);

            trace!(step = i, %symbol, active = next.len(), "nfa step");
            log.push(|| {
                format!(
                    "step {i}: read {symbol} in {} -> {} (ε-closure {})",
                    format_set(&current),
                    format_set(&moved),
                    format_set(&next)
                )
            });

            if next.is_empty() {
                debug!(step = i, %symbol, "nfa state set became empty");
                return log.finish(Outcome::EmptyStateSet, i + 1);
            }
            current = next;
        }

        let reached: Vec<&String> = current.iter().filter(|s| self.finals.contains(*s)).collect();
        let outcome = if reached.is_empty() {
            Outcome::NotAccepting
        } else {
            Outcome::Accepted
        };
        log.push(|| format!("final states reached: {reached:?}"));
        log.finish(outcome, input.chars().count())
    }
}

fn format_set(states: &StateSet) -> String {
    let names: Vec<&str> = states.iter().map(String::as_str).collect();
    format!("{{{}}}", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Strings over {a, b} ending in "ab", plus an ε-edge to exercise closures.
    fn ends_with_ab() -> Nfa {
        let mut nfa = Nfa::new("s");
        nfa.add_epsilon("s", "q0")
            .add_transition("q0", 'a', "q0")
            .add_transition("q0", 'b', "q0")
            .add_transition("q0", 'a', "q1")
            .add_transition("q1", 'b', "q2")
            .add_final("q2");
        nfa
    }

    #[test]
    fn test_simulate() {
        let nfa = ends_with_ab();

        assert!(nfa.simulate("ab", false).accepted);
        assert!(nfa.simulate("bbaab", false).accepted);
        assert!(!nfa.simulate("aba", false).accepted);
        assert!(!nfa.simulate("", false).accepted);
    }

    #[test]
    fn test_empty_state_set_rejects() {
        let mut nfa = Nfa::new("q0");
        nfa.add_transition("q0", 'a', "q1").add_final("q1");

        let verdict = nfa.simulate("ab", true);
        assert_eq!(verdict.outcome, Outcome::EmptyStateSet);
        assert_eq!(verdict.steps, 2);
    }

    #[test]
    fn test_epsilon_closure_follows_chains() {
        let mut nfa = Nfa::new("a");
        nfa.add_epsilon("a", "b").add_epsilon("b", "c").add_epsilon("c", "a");

        let closure = nfa.epsilon_closure([&"a".to_string()]);
        assert_eq!(closure.len(), 3);
        assert_eq!(nfa.epsilon_closure(&closure), closure);
    }

    #[test]
    fn test_nondeterminism_detection() {
        assert!(ends_with_ab().is_nondeterministic());

        let mut nfa = Nfa::new("q0");
        nfa.add_transition("q0", 'a', "q0");
        assert!(!nfa.is_nondeterministic());

        nfa.add_transition("q0", 'a', "q1");
        assert!(nfa.is_nondeterministic());
    }

    #[test]
    fn test_epsilon_start_can_accept_empty() {
        let mut nfa = Nfa::new("q0");
        nfa.add_epsilon("q0", "q1").add_final("q1");

        assert!(nfa.simulate("", false).accepted);
    }
}
