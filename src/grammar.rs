//! Regular grammars and their conversion into NFAs.
//!
//! Right-hand sides are stored as plain strings (`"aS"`, `"b"`, `"ε"`) and split
//! into terminals and variables against the declared variable names, longest
//! name first.

use crate::nfa::Nfa;
use crate::types::{AutomatonError, EPSILON};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Name of the synthetic accepting state used by productions without a variable.
const FINAL_STATE: &str = "qF";
/// Name of the fresh start state of a left-linear conversion.
const LEFT_START_STATE: &str = "qI";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrammarSymbol {
    Terminal(char),
    Variable(String),
}

/// Where the single variable of a production sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linearity {
    /// `A -> wB`
    Right,
    /// `A -> Bw`
    Left,
}

/// A regular grammar: variables, a start variable and productions per variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grammar {
    pub start: String,
    pub variables: BTreeSet<String>,
    /// Right-hand sides per variable. `""` and `"ε"` both denote the empty string.
    pub productions: BTreeMap<String, Vec<String>>,
}

/// A right-hand side split around its (at most one) variable.
struct Production<'a> {
    prefix: Vec<char>,
    variable: Option<&'a str>,
    suffix: Vec<char>,
}

impl Grammar {
    pub fn new(start: &str) -> Self {
        Self {
            start: start.to_string(),
            variables: BTreeSet::from([start.to_string()]),
            productions: BTreeMap::new(),
        }
    }

    /// Adds `variable -> rhs`, declaring `variable` if needed.
    ///
    /// Variables used inside `rhs` must be declared before the production is
    /// split, either with [`Grammar::add_variable`] or as the left side of another
    /// production.
    pub fn add_production(&mut self, variable: &str, rhs: &str) -> &mut Self {
        self.variables.insert(variable.to_string());
        self.productions
            .entry(variable.to_string())
            .or_default()
            .push(rhs.to_string());
        self
    }

    pub fn add_variable(&mut self, variable: &str) -> &mut Self {
        self.variables.insert(variable.to_string());
        self
    }

    /// Splits a right-hand side into symbols, matching the longest declared
    /// variable name at each position.
    pub fn symbols(&self, rhs: &str) -> Vec<GrammarSymbol> {
        if rhs == EPSILON {
            return Vec::new();
        }

        let mut symbols = Vec::new();
        let mut rest = rhs;

        while let Some(c) = rest.chars().next() {
            let variable = self
                .variables
                .iter()
                .filter(|v| !v.is_empty() && rest.starts_with(v.as_str()))
                .max_by_key(|v| v.len());

            match variable {
                Some(name) => {
                    symbols.push(GrammarSymbol::Variable(name.clone()));
                    rest = &rest[name.len()..];
                }
                None => {
                    symbols.push(GrammarSymbol::Terminal(c));
                    rest = &rest[c.len_utf8()..];
                }
            }
        }

        symbols
    }

    /// Terminal symbols used by any production.
    pub fn terminals(&self) -> BTreeSet<char> {
        self.productions
            .values()
            .flatten()
            .flat_map(|rhs| self.symbols(rhs))
            .filter_map(|symbol| match symbol {
                GrammarSymbol::Terminal(c) => Some(c),
                GrammarSymbol::Variable(_) => None,
            })
            .collect()
    }

    fn split<'a>(&'a self, variable: &str, rhs: &str) -> Result<Production<'a>, AutomatonError> {
        let mut prefix = Vec::new();
        let mut suffix = Vec::new();
        let mut found: Option<&'a str> = None;

        for symbol in self.symbols(rhs) {
            match symbol {
                GrammarSymbol::Terminal(c) if found.is_none() => prefix.push(c),
                GrammarSymbol::Terminal(c) => suffix.push(c),
                GrammarSymbol::Variable(name) => {
                    if found.is_some() {
                        return Err(AutomatonError::NonRegularGrammar(format!(
                            "{} -> {} has more than one variable",
                            variable, rhs
                        )));
                    }
                    found = self.variables.get(&name).map(String::as_str);
                }
            }
        }

        if found.is_some() && !prefix.is_empty() && !suffix.is_empty() {
            return Err(AutomatonError::NonRegularGrammar(format!(
                "{} -> {} has a variable between terminals",
                variable, rhs
            )));
        }

        Ok(Production {
            prefix,
            variable: found,
            suffix,
        })
    }

    fn check_variables(&self) -> Result<(), AutomatonError> {
        if !self.variables.contains(&self.start) {
            return Err(AutomatonError::InvalidState(self.start.clone()));
        }

        match self.productions.keys().find(|v| !self.variables.contains(*v)) {
            Some(undeclared) => Err(AutomatonError::InvalidState(undeclared.clone())),
            None => Ok(()),
        }
    }

    /// Detects whether the grammar is right- or left-linear.
    ///
    /// Productions made only of terminals, and unit productions `A -> B`, fit
    /// both; a grammar made only of those is right-linear. A grammar mixing
    /// both forms is not regular.
    pub fn classify(&self) -> Result<Linearity, AutomatonError> {
        self.check_variables()?;

        let mut right = None;
        let mut left = None;

        for (variable, rhs_list) in &self.productions {
            for rhs in rhs_list {
                let production = self.split(variable, rhs)?;
                if production.variable.is_none() {
                    continue;
                }
                if !production.prefix.is_empty() {
                    right.get_or_insert(format!("{} -> {}", variable, rhs));
                }
                if !production.suffix.is_empty() {
                    left.get_or_insert(format!("{} -> {}", variable, rhs));
                }
            }
        }

        match (right, left) {
            (Some(r), Some(l)) => Err(AutomatonError::NonRegularGrammar(format!(
                "mixes right-linear ({}) and left-linear ({}) productions",
                r, l
            ))),
            (None, Some(_)) => Ok(Linearity::Left),
            _ => Ok(Linearity::Right),
        }
    }
}

/// Hands out state names that clash neither with variables nor with each other.
struct StateNames {
    taken: HashSet<String>,
    next: usize,
}

impl StateNames {
    fn new(grammar: &Grammar) -> Self {
        Self {
            taken: grammar.variables.iter().cloned().collect(),
            next: 0,
        }
    }

    /// `base`, primed until unused.
    fn reserve(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        while self.taken.contains(&name) {
            name.push('\'');
        }
        self.taken.insert(name.clone());
        name
    }

    fn fresh(&mut self) -> String {
        loop {
            let name = format!("t{}", self.next);
            self.next += 1;
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
    }
}

/// Adds a path `from -w-> to`, one symbol per edge, through fresh intermediate
/// states. An empty `word` becomes an ε-edge.
fn add_run(nfa: &mut Nfa, names: &mut StateNames, from: &str, word: &[char], to: &str) {
    let Some((&last, init)) = word.split_last() else {
        nfa.add_epsilon(from, to);
        return;
    };

    let mut current = from.to_string();
    for &symbol in init {
        let next = names.fresh();
        nfa.add_transition(&current, symbol, &next);
        current = next;
    }
    nfa.add_transition(&current, last, to);
}

/// Converts a regular grammar into an equivalent NFA.
///
/// Right-linear: one state per variable, `A -> wB` becomes a path from A to B,
/// `A -> w` a path into a synthetic final state (only created when used), and
/// `A -> ε` makes A final.
///
/// Left-linear: a fresh start state; `A -> w` becomes a path from it to A,
/// `A -> Bw` a path from B to A, `A -> ε` an ε-edge from it to A. The start
/// variable is the only final state.
pub fn convert(grammar: &Grammar) -> Result<Nfa, AutomatonError> {
    let linearity = grammar.classify()?;
    let mut names = StateNames::new(grammar);

    let mut nfa = match linearity {
        Linearity::Right => Nfa::new(&grammar.start),
        Linearity::Left => Nfa::new(&names.reserve(LEFT_START_STATE)),
    };
    for variable in &grammar.variables {
        nfa.add_state(variable);
    }

    match linearity {
        Linearity::Right => {
            let final_state = names.reserve(FINAL_STATE);
            for (variable, rhs_list) in &grammar.productions {
                for rhs in rhs_list {
                    let production = grammar.split(variable, rhs)?;
                    match production.variable {
                        Some(target) => {
                            add_run(&mut nfa, &mut names, variable, &production.prefix, target)
                        }
                        None if production.prefix.is_empty() => {
                            nfa.add_final(variable);
                        }
                        None => {
                            add_run(&mut nfa, &mut names, variable, &production.prefix, &final_state);
                            nfa.add_final(&final_state);
                        }
                    }
                }
            }
        }
        Linearity::Left => {
            let start = nfa.start.clone();
            for (variable, rhs_list) in &grammar.productions {
                for rhs in rhs_list {
                    let production = grammar.split(variable, rhs)?;
                    let word = match production.variable {
                        Some(_) => &production.suffix,
                        None => &production.prefix,
                    };
                    let source = production.variable.unwrap_or(start.as_str());
                    add_run(&mut nfa, &mut names, source, word, variable);
                }
            }
            nfa.add_final(&grammar.start);
        }
    }

    debug!(
        ?linearity,
        states = nfa.states.len(),
        finals = nfa.finals.len(),
        "grammar converted"
    );
    Ok(nfa)
}
