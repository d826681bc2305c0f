//! This module defines the data structures shared by every simulator in the crate:
//! the symbols with special meaning, head directions, simulation verdicts and the
//! error type used for malformed definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The default blank symbol written on unused tape cells.
pub const DEFAULT_BLANK_SYMBOL: char = '_';
/// Matches any symbol when read, and leaves the cell untouched when written.
pub const WILDCARD_SYMBOL: char = '*';
/// Printable name of the empty string, used in traces.
pub const EPSILON: &str = "ε";
/// The maximum number of configurations a pushdown automaton may expand.
pub const MAX_PDA_STEPS: usize = 5000;
/// The maximum number of steps (or expanded configurations) of a Turing machine.
pub const MAX_TM_STEPS: usize = 2000;

/// Represents the possible directions a Turing Machine head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    #[serde(alias = "L")]
    Left,
    /// Move the head one position to the right.
    #[serde(alias = "R")]
    Right,
    /// Keep the head in the same position.
    #[serde(alias = "N", alias = "S")]
    Stay,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::Stay => 'N',
        };
        write!(f, "{c}")
    }
}

/// Why a simulation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// An accepting condition was reached.
    Accepted,
    /// All input was consumed but the reached state is not accepting.
    NotAccepting,
    /// No transition applies to the current state and symbol(s).
    NoTransition,
    /// The set of active NFA states became empty.
    EmptyStateSet,
    /// The machine entered its designated reject state.
    RejectState,
    /// A head tried to move left of the first tape cell.
    HeadUnderflow,
    /// The step budget ran out before the machine halted.
    StepLimit,
    /// Every reachable configuration was explored without acceptance.
    Exhausted,
}

impl Outcome {
    pub fn is_accepted(self) -> bool {
        self == Outcome::Accepted
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Outcome::Accepted => "accepted",
            Outcome::NotAccepting => "rejected: halted in a non-accepting state",
            Outcome::NoTransition => "rejected: no transition applies",
            Outcome::EmptyStateSet => "rejected: no state is reachable",
            Outcome::RejectState => "rejected: reached the reject state",
            Outcome::HeadUnderflow => "rejected: head moved left of cell 0",
            Outcome::StepLimit => "rejected: step budget exhausted",
            Outcome::Exhausted => "rejected: no accepting configuration is reachable",
        };
        f.write_str(msg)
    }
}

/// The result of simulating one input string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the input belongs to the automaton's language.
    pub accepted: bool,
    /// The reason the simulation stopped.
    pub outcome: Outcome,
    /// Steps taken (deterministic machines) or configurations expanded (searches).
    pub steps: usize,
    /// Human readable execution log. Empty when tracing is disabled.
    pub trace: Vec<String>,
}

impl Verdict {
    pub fn new(outcome: Outcome, steps: usize, trace: Vec<String>) -> Self {
        Self {
            accepted: outcome.is_accepted(),
            outcome,
            steps,
            trace,
        }
    }
}

/// Collects trace lines only when tracing was requested.
#[derive(Debug, Default)]
pub(crate) struct TraceLog {
    enabled: bool,
    lines: Vec<String>,
}

impl TraceLog {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            lines: Vec::new(),
        }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.enabled
    }

    /// Records a line built lazily, so disabled traces cost nothing.
    pub(crate) fn push(&mut self, line: impl FnOnce() -> String) {
        if self.enabled {
            self.lines.push(line());
        }
    }

    pub(crate) fn extend(&mut self, lines: impl IntoIterator<Item = String>) {
        if self.enabled {
            self.lines.extend(lines);
        }
    }

    pub(crate) fn finish(mut self, outcome: Outcome, steps: usize) -> Verdict {
        self.push(|| format!("END: {outcome}"));
        Verdict::new(outcome, steps, self.lines)
    }
}

/// Formats an input string for display, naming the empty string explicitly.
pub fn display_input(input: &str) -> String {
    if input.is_empty() {
        EPSILON.to_string()
    } else {
        format!("\"{input}\"")
    }
}

/// Renders a tape with the cell under the head bracketed, e.g. `a[b]c`.
pub fn render_tape(tape: &[char], head: usize) -> String {
    tape.iter()
        .enumerate()
        .map(|(i, c)| {
            if i == head {
                format!("[{c}]")
            } else {
                c.to_string()
            }
        })
        .collect()
}

/// Represents the errors raised while loading or validating definitions.
///
/// Simulation itself never fails: anomalies at run time are reported as an
/// [`Outcome`] inside the [`Verdict`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AutomatonError {
    /// Indicates a reference to a state that is not part of the state set.
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// Indicates a structural problem with a definition.
    #[error("Definition validation error: {0}")]
    ValidationError(String),
    /// Indicates a grammar whose productions are not right- or left-linear.
    #[error("Grammar is not regular: {0}")]
    NonRegularGrammar(String),
    /// Indicates a definition that could not be decoded.
    #[error("Definition parsing error: {0}")]
    ParseError(String),
    /// Indicates a definition file or directory that could not be read.
    #[error("File error: {0}")]
    FileError(String),
}

impl From<serde_json::Error> for AutomatonError {
    fn from(error: serde_json::Error) -> Self {
        AutomatonError::ParseError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        assert_eq!(left_json, "\"Left\"");

        let short: Direction = serde_json::from_str("\"R\"").unwrap();
        assert_eq!(short, Direction::Right);

        let stay: Direction = serde_json::from_str("\"N\"").unwrap();
        assert_eq!(stay, Direction::Stay);
    }

    #[test]
    fn test_trace_disabled_records_nothing() {
        let mut log = TraceLog::new(false);
        log.push(|| "never built".to_string());

        let verdict = log.finish(Outcome::Accepted, 3);
        assert!(verdict.accepted);
        assert_eq!(verdict.steps, 3);
        assert!(verdict.trace.is_empty());
    }

    #[test]
    fn test_trace_finish_appends_outcome() {
        let mut log = TraceLog::new(true);
        log.push(|| "step".to_string());

        let verdict = log.finish(Outcome::StepLimit, 10);
        assert!(!verdict.accepted);
        assert_eq!(verdict.trace.len(), 2);
        assert!(verdict.trace[1].contains("step budget"));
    }

    #[test]
    fn test_render_tape() {
        assert_eq!(render_tape(&['a', 'b', 'c'], 1), "a[b]c");
        assert_eq!(display_input(""), EPSILON);
    }

    #[test]
    fn test_error_display() {
        let error = AutomatonError::InvalidState("q9".to_string());

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Invalid state"));
        assert!(error_msg.contains("q9"));
    }
}
