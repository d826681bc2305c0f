//! This module checks automaton definitions for structural errors before they are
//! simulated: the start state and every referenced state must exist, Turing machine
//! rules must match the tape count, and so on. It also reports unreachable states,
//! which are suspicious but legal.

use crate::automaton::Automaton;
use crate::machine::Program;
use crate::pda::Acceptance;
use crate::types::AutomatonError;
use std::collections::{HashMap, HashSet};

/// Represents the problems found while analyzing a definition.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The start state is not part of the state set.
    InvalidStartState(String),
    /// Final, accept or reject states that are not part of the state set.
    UnknownStates(Vec<String>),
    /// Transitions that mention states outside the state set.
    UndefinedTransitionStates(Vec<String>),
    /// Structural problems (tape counts, missing final states, ...).
    StructuralError(String),
}

impl From<AnalysisError> for AutomatonError {
    /// Converts an `AnalysisError` into an `AutomatonError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::InvalidStartState(state) => AutomatonError::InvalidState(state),
            AnalysisError::UnknownStates(states) => AutomatonError::ValidationError(format!(
                "Designated states are missing from the state set: {:?}",
                states
            )),
            AnalysisError::UndefinedTransitionStates(transitions) => {
                AutomatonError::ValidationError(format!(
                    "Transitions reference undefined states: {:?}",
                    transitions
                ))
            }
            AnalysisError::StructuralError(msg) => AutomatonError::ValidationError(msg),
        }
    }
}

/// The state graph of an automaton, independent of its class.
struct StateGraph<'a> {
    states: &'a HashSet<String>,
    start: &'a str,
    designated: Vec<&'a String>,
    edges: Vec<(&'a str, &'a str)>,
}

impl<'a> StateGraph<'a> {
    fn of(automaton: &'a Automaton) -> Self {
        match automaton {
            Automaton::Dfa(dfa) => StateGraph {
                states: &dfa.states,
                start: &dfa.start,
                designated: dfa.finals.iter().collect(),
                edges: dfa
                    .transitions
                    .iter()
                    .flat_map(|(from, row)| row.values().map(move |to| (from.as_str(), to.as_str())))
                    .collect(),
            },
            Automaton::Nfa(nfa) => StateGraph {
                states: &nfa.states,
                start: &nfa.start,
                designated: nfa.finals.iter().collect(),
                edges: nfa
                    .transitions
                    .iter()
                    .flat_map(|(from, row)| {
                        row.values()
                            .flatten()
                            .map(move |to| (from.as_str(), to.as_str()))
                    })
                    .chain(nfa.epsilon.iter().flat_map(|(from, targets)| {
                        targets.iter().map(move |to| (from.as_str(), to.as_str()))
                    }))
                    .collect(),
            },
            Automaton::Pda(pda) => StateGraph {
                states: &pda.states,
                start: &pda.start,
                designated: pda.finals.iter().collect(),
                edges: pda
                    .transitions
                    .iter()
                    .map(|t| (t.from.as_str(), t.to.as_str()))
                    .collect(),
            },
            Automaton::Tm(program) | Automaton::MultiTm(program) => StateGraph {
                states: &program.states,
                start: &program.initial_state,
                designated: vec![&program.accept_state, &program.reject_state],
                edges: program
                    .rules
                    .iter()
                    .flat_map(|(from, transitions)| {
                        transitions
                            .iter()
                            .map(move |t| (from.as_str(), t.next_state.as_str()))
                    })
                    .collect(),
            },
        }
    }
}

/// Analyzes an automaton for structural errors.
///
/// The checks run in order and the first failure is returned.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(AutomatonError)` describing the first violated rule.
pub fn analyze(automaton: &Automaton) -> Result<(), AutomatonError> {
    let graph = StateGraph::of(automaton);

    let checks: [&dyn Fn() -> Result<(), AnalysisError>; 4] = [
        &|| check_start_state(&graph),
        &|| check_designated_states(&graph),
        &|| check_transition_states(&graph),
        &|| check_structure(automaton),
    ];

    checks
        .iter()
        .find_map(|check| check().err())
        .map_or(Ok(()), |error| Err(error.into()))
}

/// Checks that the start state is part of the state set.
fn check_start_state(graph: &StateGraph) -> Result<(), AnalysisError> {
    if !graph.states.contains(graph.start) {
        return Err(AnalysisError::InvalidStartState(graph.start.to_string()));
    }

    Ok(())
}

/// Checks that final / accept / reject states are part of the state set.
fn check_designated_states(graph: &StateGraph) -> Result<(), AnalysisError> {
    let mut unknown: Vec<String> = graph
        .designated
        .iter()
        .filter(|state| !graph.states.contains(state.as_str()))
        .map(|state| state.to_string())
        .collect();

    if !unknown.is_empty() {
        unknown.sort();
        unknown.dedup();
        return Err(AnalysisError::UnknownStates(unknown));
    }

    Ok(())
}

/// Checks that every transition starts and ends in a declared state.
fn check_transition_states(graph: &StateGraph) -> Result<(), AnalysisError> {
    let mut undefined: Vec<String> = graph
        .edges
        .iter()
        .filter(|(from, to)| !graph.states.contains(*from) || !graph.states.contains(*to))
        .map(|(from, to)| format!("{} -> {}", from, to))
        .collect();

    if !undefined.is_empty() {
        undefined.sort();
        return Err(AnalysisError::UndefinedTransitionStates(undefined));
    }

    Ok(())
}

/// Checks class-specific structure.
fn check_structure(automaton: &Automaton) -> Result<(), AnalysisError> {
    match automaton {
        Automaton::Pda(pda) => {
            if pda.acceptance != Acceptance::EmptyStack && pda.finals.is_empty() {
                return Err(AnalysisError::StructuralError(
                    "Final-state acceptance requires at least one final state".to_string(),
                ));
            }
            Ok(())
        }
        Automaton::Tm(program) if !program.is_single_tape() => {
            Err(AnalysisError::StructuralError(format!(
                "A 'tm' machine has exactly one tape, found {}; use 'multi_tm'",
                program.tapes
            )))
        }
        Automaton::Tm(program) | Automaton::MultiTm(program) => check_tapes(program),
        Automaton::Dfa(_) | Automaton::Nfa(_) => Ok(()),
    }
}

/// Checks tape counts and the accept/reject pair of a Turing machine.
fn check_tapes(program: &Program) -> Result<(), AnalysisError> {
    if program.tapes == 0 {
        return Err(AnalysisError::StructuralError(
            "No tapes defined".to_string(),
        ));
    }

    if program.accept_state == program.reject_state {
        return Err(AnalysisError::StructuralError(format!(
            "Accept and reject state are both '{}'",
            program.accept_state
        )));
    }

    for (state, transitions) in &program.rules {
        for transition in transitions {
            if transition.read.len() != program.tapes
                || transition.write.len() != program.tapes
                || transition.directions.len() != program.tapes
            {
                return Err(AnalysisError::StructuralError(format!(
                    "Transition in state '{}' has inconsistent tape counts",
                    state
                )));
            }
        }
    }

    Ok(())
}

/// Returns the states that cannot be reached from the start state, sorted.
///
/// Reachability is a depth-first traversal over the transition graph,
/// ignoring symbols.
pub fn unreachable_states(automaton: &Automaton) -> Vec<String> {
    let graph = StateGraph::of(automaton);

    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for &(from, to) in &graph.edges {
        adjacency.entry(from).or_default().push(to);
    }

    let mut visited = HashSet::new();
    let mut stack = vec![graph.start];

    while let Some(state) = stack.pop() {
        if !visited.insert(state) {
            continue;
        }

        if let Some(targets) = adjacency.get(state) {
            stack.extend(targets.iter().filter(|t| !visited.contains(*t)));
        }
    }

    let mut unreachable: Vec<String> = graph
        .states
        .iter()
        .filter(|state| !visited.contains(state.as_str()))
        .cloned()
        .collect();
    unreachable.sort(); // Sort for deterministic output
    unreachable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfa::Dfa;
    use crate::nfa::Nfa;
    use crate::pda::Pda;
    use crate::types::Direction;

    #[test]
    fn test_valid_dfa() {
        let mut dfa = Dfa::new("q0");
        dfa.add_transition("q0", 'a', "q1").add_final("q1");

        assert!(analyze(&Automaton::Dfa(dfa)).is_ok());
    }

    #[test]
    fn test_start_state_missing() {
        let mut dfa = Dfa::new("q0");
        dfa.states.remove("q0");

        let result = analyze(&Automaton::Dfa(dfa));
        assert_eq!(result, Err(AutomatonError::InvalidState("q0".to_string())));
    }

    #[test]
    fn test_unknown_final_state() {
        let mut nfa = Nfa::new("q0");
        nfa.finals.insert("ghost".to_string());

        let result = analyze(&Automaton::Nfa(nfa));
        assert!(matches!(result, Err(AutomatonError::ValidationError(msg)) if msg.contains("ghost")));
    }

    #[test]
    fn test_transition_to_undeclared_state() {
        let mut nfa = Nfa::new("q0");
        nfa.add_epsilon("q0", "q1");
        nfa.states.remove("q1");

        let result = analyze(&Automaton::Nfa(nfa));
        assert!(matches!(result, Err(AutomatonError::ValidationError(msg)) if msg.contains("q0 -> q1")));
    }

    #[test]
    fn test_pda_without_finals() {
        let pda = Pda::new("q0", Acceptance::FinalState);
        assert!(analyze(&Automaton::Pda(pda)).is_err());

        let pda = Pda::new("q0", Acceptance::EmptyStack);
        assert!(analyze(&Automaton::Pda(pda)).is_ok());
    }

    #[test]
    fn test_inconsistent_tape_counts() {
        let mut program = Program::new("q0", "qa", "qr", 2);
        program.add_rule("q0", 'a', "qa", 'a', Direction::Right);

        let result = analyze(&Automaton::MultiTm(program));
        assert!(matches!(result, Err(AutomatonError::ValidationError(msg)) if msg.contains("inconsistent")));
    }

    #[test]
    fn test_tm_with_several_tapes() {
        let mut program = Program::new("q0", "qa", "qr", 2);
        program
            .add_multi_rule("q0", &['a', '_'], "qa", &['a', '_'], &[Direction::Stay; 2])
            .add_multi_rule("q0", &['*', '_'], "qr", &['*', '_'], &[Direction::Stay; 2]);

        let result = analyze(&Automaton::Tm(program.clone()));
        assert!(matches!(result, Err(AutomatonError::ValidationError(msg)) if msg.contains("multi_tm")));
        assert!(analyze(&Automaton::MultiTm(program)).is_ok());
    }

    #[test]
    fn test_accept_equals_reject() {
        let program = Program::new("q0", "qh", "qh", 1);
        assert!(analyze(&Automaton::Tm(program)).is_err());
    }

    #[test]
    fn test_unreachable_states() {
        let mut dfa = Dfa::new("q0");
        dfa.add_transition("q0", 'a', "q1")
            .add_transition("q2", 'a', "q3")
            .add_final("q1");

        assert_eq!(
            unreachable_states(&Automaton::Dfa(dfa)),
            vec!["q2".to_string(), "q3".to_string()]
        );
    }
}
