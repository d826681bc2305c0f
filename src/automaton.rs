//! The automaton variant set and the common simulation entry point.

use crate::config::Limits;
use crate::dfa::Dfa;
use crate::machine::Program;
use crate::nfa::Nfa;
use crate::ntm;
use crate::pda::Pda;
use crate::types::Verdict;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Anything that classifies input strings as accepted or rejected.
pub trait Simulate {
    fn simulate(&self, input: &str, limits: &Limits) -> Verdict;

    /// Shorthand for the boolean verdict without a trace.
    fn accepts(&self, input: &str, limits: &Limits) -> bool {
        self.simulate(input, &limits.quiet()).accepted
    }
}

/// One automaton of any supported class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Automaton {
    Dfa(Dfa),
    Nfa(Nfa),
    Pda(Pda),
    /// Single-tape Turing machine, deterministic or not.
    Tm(Program),
    MultiTm(Program),
}

impl Automaton {
    /// Human readable class name.
    pub fn kind(&self) -> &'static str {
        match self {
            Automaton::Dfa(_) => "DFA",
            Automaton::Nfa(_) => "NFA",
            Automaton::Pda(_) => "PDA",
            Automaton::Tm(_) => "TM",
            Automaton::MultiTm(_) => "multi-tape TM",
        }
    }

    pub fn start_state(&self) -> &str {
        match self {
            Automaton::Dfa(dfa) => &dfa.start,
            Automaton::Nfa(nfa) => &nfa.start,
            Automaton::Pda(pda) => &pda.start,
            Automaton::Tm(program) | Automaton::MultiTm(program) => &program.initial_state,
        }
    }

    /// Whether simulation has to explore several branches.
    pub fn is_nondeterministic(&self) -> bool {
        match self {
            Automaton::Dfa(_) | Automaton::MultiTm(_) => false,
            Automaton::Nfa(nfa) => nfa.is_nondeterministic(),
            Automaton::Pda(pda) => pda.is_nondeterministic(),
            Automaton::Tm(program) => program.is_nondeterministic(),
        }
    }

    /// Input symbols appearing on transitions.
    pub fn alphabet(&self) -> BTreeSet<char> {
        match self {
            Automaton::Dfa(dfa) => dfa.alphabet(),
            Automaton::Nfa(nfa) => nfa.alphabet(),
            Automaton::Pda(pda) => pda.alphabet(),
            Automaton::Tm(program) | Automaton::MultiTm(program) => program.alphabet(),
        }
    }
}

impl Simulate for Automaton {
    fn simulate(&self, input: &str, limits: &Limits) -> Verdict {
        let record = limits.record_trace;
        match self {
            Automaton::Dfa(dfa) => dfa.simulate(input, record),
            Automaton::Nfa(nfa) => nfa.simulate(input, record),
            Automaton::Pda(pda) => pda.simulate(input, limits.pda_max_steps, record),
            Automaton::Tm(program) if program.is_single_tape() && program.is_nondeterministic() => {
                ntm::simulate(program, input, limits.tm_max_steps, record)
            }
            Automaton::Tm(program) | Automaton::MultiTm(program) => {
                program.simulate(input, limits.tm_max_steps, record)
            }
        }
    }
}

impl From<Dfa> for Automaton {
    fn from(dfa: Dfa) -> Self {
        Automaton::Dfa(dfa)
    }
}

impl From<Nfa> for Automaton {
    fn from(nfa: Nfa) -> Self {
        Automaton::Nfa(nfa)
    }
}

impl From<Pda> for Automaton {
    fn from(pda: Pda) -> Self {
        Automaton::Pda(pda)
    }
}

impl From<Program> for Automaton {
    /// Single-tape programs become `Tm`, the rest `MultiTm`.
    fn from(program: Program) -> Self {
        if program.is_single_tape() {
            Automaton::Tm(program)
        } else {
            Automaton::MultiTm(program)
        }
    }
}
