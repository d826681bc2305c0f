//! Pushdown automata, simulated by breadth-first search over configurations.

use crate::types::{display_input, Outcome, TraceLog, Verdict, EPSILON};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;
use tracing::{debug, trace};

/// When a pushdown automaton accepts, once the input is fully consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acceptance {
    /// The current state is final.
    #[default]
    FinalState,
    /// The stack is empty.
    EmptyStack,
    /// The state is final and the stack is empty.
    Both,
}

/// `(from, input, stack top) -> (to, push)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdaTransition {
    pub from: String,
    /// Symbol consumed, or `None` for an ε-move.
    pub input: Option<char>,
    /// Symbol that must be on top and is popped, or `None` to match any stack
    /// (including the empty one) without popping.
    pub pop: Option<char>,
    pub to: String,
    /// Pushed so that its first symbol ends on top. Empty pushes nothing.
    #[serde(default)]
    pub push: String,
}

impl fmt::Display for PdaTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |c: Option<char>| c.map_or(EPSILON.to_string(), String::from);
        let push = if self.push.is_empty() {
            EPSILON
        } else {
            self.push.as_str()
        };
        write!(
            f,
            "({}, {}, {}) -> ({}, {})",
            self.from,
            show(self.input),
            show(self.pop),
            self.to,
            push
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pda {
    pub states: HashSet<String>,
    pub start: String,
    #[serde(default)]
    pub finals: HashSet<String>,
    /// Symbol on the stack before the first move, if any.
    #[serde(default)]
    pub initial_stack: Option<char>,
    #[serde(default)]
    pub acceptance: Acceptance,
    #[serde(default)]
    pub transitions: Vec<PdaTransition>,
}

/// One branch of the search: state, input cursor and stack (top is last).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Configuration {
    state: String,
    position: usize,
    stack: Vec<char>,
}

/// A configuration in the search arena, linked to the one it came from.
struct Node {
    config: Configuration,
    parent: Option<usize>,
    via: Option<usize>,
}

impl Pda {
    /// Creates a PDA with an empty initial stack and no transitions.
    ///
    /// # Arguments
    ///
    /// * `start` - The start state.
    /// * `acceptance` - Whether final states, an empty stack or both accept.
    pub fn new(start: &str, acceptance: Acceptance) -> Self {
        Self {
            states: HashSet::from([start.to_string()]),
            start: start.to_string(),
            finals: HashSet::new(),
            initial_stack: None,
            acceptance,
            transitions: Vec::new(),
        }
    }

    /// Places `symbol` on the stack before the first move.
    pub fn with_initial_stack(mut self, symbol: char) -> Self {
        self.initial_stack = Some(symbol);
        self
    }

    /// Adds a transition.
    ///
    /// # Arguments
    ///
    /// * `from` - The source state.
    /// * `input` - The symbol consumed, or `None` for an ε-move.
    /// * `pop` - The symbol that must be on top of the stack and is popped, or `None`.
    /// * `to` - The target state.
    /// * `push` - Symbols pushed; the first character ends up on top.
    pub fn add_transition(
        &mut self,
        from: &str,
        input: Option<char>,
        pop: Option<char>,
        to: &str,
        push: &str,
    ) -> &mut Self {
        self.states.insert(from.to_string());
        self.states.insert(to.to_string());
        self.transitions.push(PdaTransition {
            from: from.to_string(),
            input,
            pop,
            to: to.to_string(),
            push: push.to_string(),
        });
        self
    }

    pub fn add_final(&mut self, state: &str) -> &mut Self {
        self.states.insert(state.to_string());
        self.finals.insert(state.to_string());
        self
    }

    /// True when two transitions share (from, input, stack top) or any ε-move exists.
    pub fn is_nondeterministic(&self) -> bool {
        let mut seen = HashSet::new();
        self.transitions
            .iter()
            .any(|t| t.input.is_none() || !seen.insert((&t.from, t.input, t.pop)))
    }

    /// Input symbols consumed by any transition.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.transitions.iter().filter_map(|t| t.input).collect()
    }

    fn is_accepting(&self, config: &Configuration, input_len: usize) -> bool {
        if config.position < input_len {
            return false;
        }

        let in_final = self.finals.contains(&config.state);
        let empty = config.stack.is_empty();
        match self.acceptance {
            Acceptance::FinalState => in_final,
            Acceptance::EmptyStack => empty,
            Acceptance::Both => in_final && empty,
        }
    }

    /// Applies `transition` to `config` if it matches, consuming input when it
    /// reads a symbol.
    fn apply(
        transition: &PdaTransition,
        config: &Configuration,
        input: &[char],
    ) -> Option<Configuration> {
        if transition.from != config.state {
            return None;
        }

        let position = match transition.input {
            Some(symbol) if input.get(config.position) == Some(&symbol) => config.position + 1,
            Some(_) => return None,
            None => config.position,
        };

        let mut stack = config.stack.clone();
        if let Some(top) = transition.pop {
            if stack.last() != Some(&top) {
                return None;
            }
            stack.pop();
        }
        stack.extend(transition.push.chars().rev());

        Some(Configuration {
            state: transition.to.clone(),
            position,
            stack,
        })
    }

    /// Explores configurations breadth-first. The first accepting configuration
    /// wins; exhausting the queue or `max_steps` expansions rejects.
    pub fn simulate(&self, input: &str, max_steps: usize, record_trace: bool) -> Verdict {
        let symbols: Vec<char> = input.chars().collect();
        let mut log = TraceLog::new(record_trace);

        log.push(|| {
            format!(
                "PDA start in {}, input {}, acceptance {:?}",
                self.start,
                display_input(input),
                self.acceptance
            )
        });

        let initial = Configuration {
            state: self.start.clone(),
            position: 0,
            stack: self.initial_stack.into_iter().collect(),
        };

        let mut arena = vec![Node {
            config: initial.clone(),
            parent: None,
            via: None,
        }];
        let mut visited = HashSet::from([initial]);
        let mut queue = VecDeque::from([0usize]);
        let mut steps = 0;

        while let Some(index) = queue.pop_front() {
            if self.is_accepting(&arena[index].config, symbols.len()) {
                debug!(steps, visited = visited.len(), "pda accepted");
                if log.enabled() {
                    log.extend(self.path(&arena, index));
                }
                return log.finish(Outcome::Accepted, steps);
            }

            if steps >= max_steps {
                debug!(steps, "pda step budget exhausted");
                return log.finish(Outcome::StepLimit, steps);
            }
            steps += 1;

            for (t, transition) in self.transitions.iter().enumerate() {
                let Some(next) = Self::apply(transition, &arena[index].config, &symbols) else {
                    continue;
                };

                if !visited.insert(next.clone()) {
                    continue;
                }

                trace!(from = %transition.from, to = %transition.to, position = next.position, "pda branch");
                arena.push(Node {
                    config: next,
                    parent: Some(index),
                    via: Some(t),
                });
                queue.push_back(arena.len() - 1);
            }
        }

        debug!(steps, visited = visited.len(), "pda search exhausted");
        log.push(|| format!("explored {} configurations", visited.len()));
        log.finish(Outcome::Exhausted, steps)
    }

    /// Rebuilds the transitions leading to `index`, oldest first.
    fn path(&self, arena: &[Node], mut index: usize) -> Vec<String> {
        let mut lines = Vec::new();

        loop {
            let node = &arena[index];
            let config = &node.config;
            let stack: String = config.stack.iter().rev().collect();
            let via = node
                .via
                .map(|t| format!(" via {}", self.transitions[t]))
                .unwrap_or_default();

            lines.push(format!(
                "state {}, read {} symbol(s), stack [{}]{}",
                config.state, config.position, stack, via
            ));

            match node.parent {
                Some(parent) => index = parent,
                None => break,
            }
        }

        lines.reverse();
        lines
    }
}
