//! Breadth-first simulation of nondeterministic single-tape Turing machines.
//!
//! Every transition matching the current (state, symbol) spawns its own branch.
//! The first branch to enter the accept state wins; the machine rejects only once
//! the reachable configurations (bounded by the visited set and the step budget)
//! are exhausted.

use crate::machine::{Program, Transition};
use crate::types::{display_input, render_tape, Direction, Outcome, TraceLog, Verdict, WILDCARD_SYMBOL};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, trace};

/// A snapshot of one branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Configuration {
    state: String,
    head: usize,
    tape: Vec<char>,
}

impl Configuration {
    /// The visited-set key: trailing blanks are implicit, so they are dropped.
    fn canonical(&self, blank: char) -> Configuration {
        let mut tape = self.tape.clone();
        while tape.last() == Some(&blank) {
            tape.pop();
        }
        Configuration {
            state: self.state.clone(),
            head: self.head,
            tape,
        }
    }
}

struct Node<'a> {
    config: Configuration,
    parent: Option<usize>,
    via: Option<&'a Transition>,
}

/// Applies `transition` to `config`, or returns `None` if the head would move
/// left of cell 0.
fn apply(config: &Configuration, transition: &Transition, blank: char) -> Option<Configuration> {
    let mut tape = config.tape.clone();
    if let Some(&symbol) = transition.write.first() {
        if symbol != WILDCARD_SYMBOL {
            tape[config.head] = symbol;
        }
    }

    let head = match transition.directions.first() {
        Some(Direction::Left) => config.head.checked_sub(1)?,
        Some(Direction::Right) => config.head + 1,
        Some(Direction::Stay) | None => config.head,
    };
    if head >= tape.len() {
        tape.resize(head + 1, blank);
    }

    Some(Configuration {
        state: transition.next_state.clone(),
        head,
        tape,
    })
}

/// Explores every branch of `program` on `input` breadth-first.
///
/// `max_steps` bounds the number of configurations expanded.
pub fn simulate(program: &Program, input: &str, max_steps: usize, record_trace: bool) -> Verdict {
    let mut log = TraceLog::new(record_trace);
    let blank = program.blank;

    log.push(|| {
        format!(
            "NTM start in {}, input {}",
            program.initial_state,
            display_input(input)
        )
    });

    let initial = Configuration {
        state: program.initial_state.clone(),
        head: 0,
        tape: program.initial_tapes(input).swap_remove(0),
    };

    let mut visited = HashSet::from([initial.canonical(blank)]);
    let mut arena = vec![Node {
        config: initial,
        parent: None,
        via: None,
    }];
    let mut queue = VecDeque::from([0usize]);
    let mut steps = 0;
    let mut dead_branches = 0;

    while let Some(index) = queue.pop_front() {
        let config = &arena[index].config;

        if config.state == program.accept_state {
            debug!(steps, visited = visited.len(), "ntm accepted");
            if log.enabled() {
                log.extend(path(&arena, index));
            }
            return log.finish(Outcome::Accepted, steps);
        }
        if config.state == program.reject_state {
            continue;
        }

        if steps >= max_steps {
            debug!(steps, "ntm step budget exhausted");
            log.push(|| format!("explored {} configurations", visited.len()));
            return log.finish(Outcome::StepLimit, steps);
        }
        steps += 1;

        let symbol = config.tape[config.head];
        let branches: Vec<(Configuration, &Transition)> = program
            .rules
            .get(&config.state)
            .into_iter()
            .flatten()
            .filter(|t| t.matches(&[symbol]))
            .filter_map(|t| match apply(config, t, blank) {
                Some(next) => Some((next, t)),
                None => {
                    dead_branches += 1;
                    None
                }
            })
            .collect();

        if branches.len() > 1 {
            trace!(state = %config.state, %symbol, branches = branches.len(), "ntm branching");
        }

        for (next, transition) in branches {
            if !visited.insert(next.canonical(blank)) {
                continue;
            }
            arena.push(Node {
                config: next,
                parent: Some(index),
                via: Some(transition),
            });
            queue.push_back(arena.len() - 1);
        }
    }

    debug!(steps, visited = visited.len(), dead_branches, "ntm search exhausted");
    log.push(|| {
        format!(
            "explored {} configurations, {} branch(es) moved left of cell 0",
            visited.len(),
            dead_branches
        )
    });
    log.finish(Outcome::Exhausted, steps)
}

/// Rebuilds the accepting branch, oldest step first.
fn path(arena: &[Node<'_>], mut index: usize) -> Vec<String> {
    let mut lines = Vec::new();

    loop {
        let node = &arena[index];
        let line = format!(
            "state {} | {}",
            node.config.state,
            render_tape(&node.config.tape, node.config.head)
        );
        lines.push(line);

        match (node.parent, node.via) {
            (Some(parent), Some(via)) => {
                lines.push(format!("  <- {}", via.describe(&arena[parent].config.state)));
                index = parent;
            }
            _ => break,
        }
    }

    lines.reverse();
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use Direction::{Right, Stay};

    #[test]
    fn test_one_branch_loops_other_accepts() {
        let mut program = Program::new("q0", "qa", "qr", 1);
        program
            .add_rule("q0", 'a', "loop", 'a', Right)
            .add_rule("q0", 'a', "qa", 'a', Stay)
            .add_rule("loop", '*', "loop", '*', Right);

        assert!(program.is_nondeterministic());
        let verdict = simulate(&program, "a", 2000, true);
        assert!(verdict.accepted);
        assert_eq!(verdict.outcome, Outcome::Accepted);
        assert!(verdict.steps <= 3);
        assert!(verdict.trace.iter().any(|l| l.contains("state qa")));
    }

    #[test]
    fn test_looping_branches_hit_budget() {
        let mut program = Program::new("q0", "qa", "qr", 1);
        program
            .add_rule("q0", '*', "q0", 'x', Right)
            .add_rule("q0", '*', "q0", 'y', Right);

        let verdict = simulate(&program, "", 200, false);
        assert_eq!(verdict.outcome, Outcome::StepLimit);
        assert_eq!(verdict.steps, 200);
    }

    #[test]
    fn test_stay_cycle_is_exhausted() {
        let mut program = Program::new("q0", "qa", "qr", 1);
        program
            .add_rule("q0", 'a', "q1", 'a', Stay)
            .add_rule("q1", 'a', "q0", 'a', Stay);

        let verdict = simulate(&program, "a", 2000, false);
        assert_eq!(verdict.outcome, Outcome::Exhausted);
        assert_eq!(verdict.steps, 2);
    }

    #[test]
    fn test_guesses_a_split_point() {
        // Accepts strings containing "bb" by guessing where it starts.
        let mut program = Program::new("scan", "yes", "no", 1);
        program
            .add_rule("scan", 'a', "scan", 'a', Right)
            .add_rule("scan", 'b', "scan", 'b', Right)
            .add_rule("scan", 'b', "one", 'b', Right)
            .add_rule("one", 'b', "yes", 'b', Stay);

        assert!(simulate(&program, "abba", 2000, false).accepted);
        assert!(!simulate(&program, "abab", 2000, false).accepted);
    }

    #[test]
    fn test_left_of_cell_zero_kills_only_that_branch() {
        let mut program = Program::new("q0", "qa", "qr", 1);
        program
            .add_rule("q0", 'a', "q1", 'a', Direction::Left)
            .add_rule("q0", 'a', "qa", 'a', Right);

        assert!(simulate(&program, "a", 100, false).accepted);
    }
}
