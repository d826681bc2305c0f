//! This module defines the Turing machine `Program` (single- or multi-tape) and the
//! `TuringMachine` struct that runs it deterministically. It handles the machine's
//! state, tape operations, head movements, and execution of transition rules.

use crate::types::{
    display_input, render_tape, Direction, Outcome, TraceLog, Verdict, DEFAULT_BLANK_SYMBOL,
    WILDCARD_SYMBOL,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, trace};

/// A Turing machine definition with one or more tapes.
///
/// The input is written on tape 0 starting at cell 0; every other tape starts blank.
/// Tapes are infinite to the right only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// All states, including the initial, accept and reject states.
    pub states: HashSet<String>,
    /// The state the machine starts in.
    pub initial_state: String,
    /// Entering this state halts and accepts.
    pub accept_state: String,
    /// Entering this state halts and rejects.
    pub reject_state: String,
    /// The symbol filling unused cells, `_` by default.
    #[serde(default = "default_blank")]
    pub blank: char,
    /// Number of tapes; every transition carries vectors of this length.
    #[serde(default = "default_tapes")]
    pub tapes: usize,
    /// Transitions keyed by source state, tried in declaration order.
    #[serde(default)]
    pub rules: HashMap<String, Vec<Transition>>,
}

fn default_blank() -> char {
    DEFAULT_BLANK_SYMBOL
}

fn default_tapes() -> usize {
    1
}

/// Represents a single transition rule for a Turing Machine.
///
/// `*` in `read` matches any symbol; `*` in `write` leaves the cell unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// A vector of characters to be read from each tape.
    pub read: Vec<char>,
    /// A vector of characters to be written to each tape.
    pub write: Vec<char>,
    /// A vector of directions for each tape's head to move after the transition.
    pub directions: Vec<Direction>,
    /// The next state the machine transitions to.
    pub next_state: String,
}

impl Transition {
    /// Checks whether this transition applies to the symbols under the heads.
    pub fn matches(&self, symbols: &[char]) -> bool {
        self.read.len() == symbols.len()
            && self
                .read
                .iter()
                .zip(symbols)
                .all(|(&read, &symbol)| read == WILDCARD_SYMBOL || read == symbol)
    }

    pub fn describe(&self, state: &str) -> String {
        let join = |chars: &[char]| chars.iter().map(char::to_string).collect::<Vec<_>>().join(",");
        let dirs = self
            .directions
            .iter()
            .map(Direction::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "({state}, [{}]) -> ({}, [{}], [{}])",
            join(&self.read),
            self.next_state,
            join(&self.write),
            dirs
        )
    }
}

impl Program {
    /// Creates a program without rules.
    ///
    /// # Arguments
    ///
    /// * `initial` - The initial state.
    /// * `accept` - The accepting halt state.
    /// * `reject` - The rejecting halt state.
    /// * `tapes` - The number of tapes.
    pub fn new(initial: &str, accept: &str, reject: &str, tapes: usize) -> Self {
        Self {
            states: HashSet::from([initial.to_string(), accept.to_string(), reject.to_string()]),
            initial_state: initial.to_string(),
            accept_state: accept.to_string(),
            reject_state: reject.to_string(),
            blank: DEFAULT_BLANK_SYMBOL,
            tapes,
            rules: HashMap::new(),
        }
    }

    /// Adds a single-tape rule `(from, read) -> (to, write, direction)`.
    pub fn add_rule(
        &mut self,
        from: &str,
        read: char,
        to: &str,
        write: char,
        direction: Direction,
    ) -> &mut Self {
        self.add_multi_rule(from, &[read], to, &[write], &[direction])
    }

    /// Adds a rule with one read/write/direction entry per tape.
    pub fn add_multi_rule(
        &mut self,
        from: &str,
        read: &[char],
        to: &str,
        write: &[char],
        directions: &[Direction],
    ) -> &mut Self {
        self.states.insert(from.to_string());
        self.states.insert(to.to_string());
        self.rules.entry(from.to_string()).or_default().push(Transition {
            read: read.to_vec(),
            write: write.to_vec(),
            directions: directions.to_vec(),
            next_state: to.to_string(),
        });
        self
    }

    /// Checks if the program is configured for a single-tape Turing Machine.
    pub fn is_single_tape(&self) -> bool {
        self.tapes == 1
    }

    /// True when some state has two rules whose read symbols can both match.
    pub fn is_nondeterministic(&self) -> bool {
        self.rules.values().any(|transitions| {
            transitions.iter().enumerate().any(|(i, a)| {
                transitions[i + 1..].iter().any(|b| {
                    a.read.len() == b.read.len()
                        && a.read.iter().zip(&b.read).all(|(&x, &y)| {
                            x == y || x == WILDCARD_SYMBOL || y == WILDCARD_SYMBOL
                        })
                })
            })
        })
    }

    /// Input symbols: tape-0 symbols read by any rule, minus blank and wildcard.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.rules
            .values()
            .flatten()
            .filter_map(|t| t.read.first().copied())
            .filter(|&c| c != self.blank && c != WILDCARD_SYMBOL)
            .collect()
    }

    /// The initial tapes for `input`: the input on tape 0, blanks elsewhere.
    pub fn initial_tapes(&self, input: &str) -> Vec<Vec<char>> {
        (0..self.tapes.max(1))
            .map(|i| {
                let tape: Vec<char> = if i == 0 { input.chars().collect() } else { Vec::new() };
                if tape.is_empty() {
                    vec![self.blank]
                } else {
                    tape
                }
            })
            .collect()
    }

    /// Runs the program deterministically on `input`.
    ///
    /// # Arguments
    ///
    /// * `input` - The string written on tape 0.
    /// * `max_steps` - The number of transitions applied before giving up.
    /// * `record_trace` - Whether to record one trace line per step.
    ///
    /// # Returns
    ///
    /// A `Verdict` whose outcome is `Accepted` or `RejectState` when a halt state is
    /// entered, `NoTransition`, `HeadUnderflow` or `StepLimit` otherwise.
    pub fn simulate(&self, input: &str, max_steps: usize, record_trace: bool) -> Verdict {
        let mut machine = TuringMachine::new(self, input);
        let mut log = TraceLog::new(record_trace);

        log.push(|| {
            format!(
                "TM start in {} with {} tape(s), input {}",
                self.initial_state,
                self.tapes,
                display_input(input)
            )
        });

        let outcome = loop {
            if let Some(outcome) = machine.halted() {
                break outcome;
            }
            if machine.step_count() >= max_steps {
                break Outcome::StepLimit;
            }

            log.push(|| machine.describe());
            match machine.step() {
                Step::Continue(t) => {
                    log.push(|| format!("  -> {}", t.describe(machine.previous_state())));
                }
                Step::Halt(outcome) => break outcome,
            }
        };

        debug!(steps = machine.step_count(), %outcome, "tm halted");
        log.finish(outcome, machine.step_count())
    }
}

/// Represents the outcome of a Turing Machine execution step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<'a> {
    /// The machine applied the transition and continues execution.
    Continue(&'a Transition),
    /// The machine has halted with the given outcome.
    Halt(Outcome),
}

/// A running deterministic Turing machine.
///
/// This struct encapsulates the current state of the Turing Machine, including its
/// current state, the contents of its tapes and the positions of its read/write heads.
pub struct TuringMachine<'a> {
    program: &'a Program,
    state: &'a str,
    previous: &'a str,
    tapes: Vec<Vec<char>>,
    heads: Vec<usize>,
    step_count: usize,
}

impl<'a> TuringMachine<'a> {
    /// Creates a new `TuringMachine` with `input` written on the first tape.
    pub fn new(program: &'a Program, input: &str) -> Self {
        let tapes = program.initial_tapes(input);
        Self {
            program,
            state: &program.initial_state,
            previous: &program.initial_state,
            heads: vec![0; tapes.len()],
            tapes,
            step_count: 0,
        }
    }

    /// Executes a single step of the Turing Machine's computation.
    ///
    /// The first rule (in declaration order) matching the symbols under the heads is
    /// applied: symbols are written, then each head moves independently.
    pub fn step(&mut self) -> Step<'a> {
        if let Some(outcome) = self.halted() {
            return Step::Halt(outcome);
        }

        // Ensure all tapes are large enough
        for (tape, &head) in self.tapes.iter_mut().zip(&self.heads) {
            if head >= tape.len() {
                tape.resize(head + 1, self.program.blank);
            }
        }

        let Some(transition) = self.transition() else {
            trace!(state = self.state, symbols = ?self.symbols(), "no transition");
            return Step::Halt(Outcome::NoTransition);
        };

        // Nothing is written when any head would leave the tape.
        let underflow = self.heads.iter().enumerate().any(|(i, &head)| {
            head == 0 && transition.directions.get(i) == Some(&Direction::Left)
        });
        if underflow {
            trace!(state = self.state, "head moved left of cell 0");
            return Step::Halt(Outcome::HeadUnderflow);
        }

        for (i, tape) in self.tapes.iter_mut().enumerate() {
            let head = self.heads[i];
            match transition.write.get(i) {
                Some(&WILDCARD_SYMBOL) | None => {}
                Some(&symbol) => tape[head] = symbol,
            }

            match transition.directions.get(i) {
                Some(Direction::Left) => self.heads[i] -= 1,
                Some(Direction::Right) => self.heads[i] += 1,
                Some(Direction::Stay) | None => {}
            }
        }

        self.previous = self.state;
        self.state = &transition.next_state;
        self.step_count += 1;

        Step::Continue(transition)
    }

    /// The outcome if the machine sits in its accept or reject state.
    pub fn halted(&self) -> Option<Outcome> {
        if self.state == self.program.accept_state {
            Some(Outcome::Accepted)
        } else if self.state == self.program.reject_state {
            Some(Outcome::RejectState)
        } else {
            None
        }
    }

    /// Finds the first rule of the current state whose read symbols match.
    pub fn transition(&self) -> Option<&'a Transition> {
        let symbols = self.symbols();
        self.program
            .rules
            .get(self.state)?
            .iter()
            .find(|t| t.matches(&symbols))
    }

    /// Returns a vector of symbols currently under each tape's head.
    /// If a head is beyond its tape's current length, the blank symbol is returned for that tape.
    pub fn symbols(&self) -> Vec<char> {
        self.heads
            .iter()
            .zip(&self.tapes)
            .map(|(&pos, tape)| tape.get(pos).copied().unwrap_or(self.program.blank))
            .collect()
    }

    pub fn state(&self) -> &str {
        self.state
    }

    /// The state the last applied transition started from.
    pub fn previous_state(&self) -> &str {
        self.previous
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn tapes(&self) -> &[Vec<char>] {
        &self.tapes
    }

    pub fn heads(&self) -> &[usize] {
        &self.heads
    }

    /// One trace line: state plus every tape with its head bracketed.
    pub fn describe(&self) -> String {
        let tapes = self
            .tapes
            .iter()
            .zip(&self.heads)
            .enumerate()
            .map(|(i, (tape, &head))| format!("T{}: {}", i + 1, render_tape(tape, head)))
            .collect::<Vec<_>>()
            .join(" | ");
        format!("step {}: state {} | {}", self.step_count, self.state, tapes)
    }
}
