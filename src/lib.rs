//! This crate provides interpreters for formal-language models: finite automata (with
//! ε-moves), pushdown automata, single- and multi-tape Turing machines (deterministic
//! and nondeterministic), and regular grammars, which convert to NFAs.
//! It also includes a rule-based oracle and a differential tester that compares an
//! automaton against the oracle on random strings.

pub mod analyzer;
pub mod automaton;
pub mod config;
pub mod describe;
pub mod dfa;
pub mod expr;
pub mod grammar;
pub mod harness;
pub mod loader;
pub mod machine;
pub mod nfa;
pub mod ntm;
pub mod oracle;
pub mod pda;
pub mod types;

/// Re-exports the `analyze` and `unreachable_states` functions and the `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, unreachable_states, AnalysisError};
/// Re-exports the `Automaton` enum and the `Simulate` trait from the automaton module.
pub use automaton::{Automaton, Simulate};
/// Re-exports the budget and harness settings from the config module.
pub use config::{HarnessConfig, Limits};
/// Re-exports the description heuristics from the describe module.
pub use describe::rules_from_description;
/// Re-exports the `Dfa` struct from the dfa module.
pub use dfa::Dfa;
/// Re-exports the grammar model and the grammar-to-NFA conversion.
pub use grammar::{convert, Grammar, Linearity};
/// Re-exports the differential tester and its report types from the harness module.
pub use harness::{check, run, sample, test_alphabet, Counterexample, Report, SAMPLE_INPUTS};
/// Re-exports the `DefinitionLoader` struct from the loader module.
pub use loader::DefinitionLoader;
/// Re-exports the Turing machine definition and runner from the machine module.
pub use machine::{Program, Transition, TuringMachine};
/// Re-exports the `Nfa` struct from the nfa module.
pub use nfa::Nfa;
/// Re-exports the pushdown automaton types from the pda module.
pub use pda::{Acceptance, Pda, PdaTransition};
/// Re-exports the rule specification and the `Oracle` from the oracle module.
pub use oracle::{Oracle, Predicate, Rule, RuleGroup, RuleSpec};
/// Re-exports various shared types and constants from the types module.
pub use types::{AutomatonError, Direction, Outcome, Verdict, MAX_PDA_STEPS, MAX_TM_STEPS};
