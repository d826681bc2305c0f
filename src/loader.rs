//! This module provides the `DefinitionLoader` struct, responsible for loading automata,
//! grammars, rule specifications and harness settings from JSON files, readers and strings.
//!
//! Automata are validated with [`analyze`] after decoding, so a loaded automaton is
//! always structurally sound.

use crate::analyzer::{analyze, unreachable_states};
use crate::automaton::Automaton;
use crate::config::HarnessConfig;
use crate::grammar::Grammar;
use crate::oracle::RuleSpec;
use crate::types::AutomatonError;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;

/// `DefinitionLoader` is a utility struct for loading definitions.
/// It provides methods to load automata from individual files, readers or string content,
/// and to discover and load all `.json` automata within a specified directory.
pub struct DefinitionLoader;

impl DefinitionLoader {
    /// Loads a single automaton from the specified file path.
    ///
    /// # Arguments
    ///
    /// * `path` - A reference to the `Path` of the `.json` file to load.
    ///
    /// # Returns
    ///
    /// * `Ok(Automaton)` if the file is read, decoded and passes validation.
    /// * `Err(AutomatonError::FileError)` if the file cannot be read.
    /// * `Err(AutomatonError::ParseError)` if the content is not a valid definition.
    pub fn load_automaton(path: &Path) -> Result<Automaton, AutomatonError> {
        Self::load_automaton_from_str(&read(path)?)
    }

    /// Loads an automaton from any reader, e.g. an open file or standard input.
    pub fn load_automaton_from_reader<R: Read>(mut reader: R) -> Result<Automaton, AutomatonError> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| AutomatonError::FileError(format!("Failed to read definition: {}", e)))?;

        Self::load_automaton_from_str(&content)
    }

    /// Decodes and validates an automaton from its JSON text.
    ///
    /// Unreachable states are legal but logged as a warning.
    pub fn load_automaton_from_str(content: &str) -> Result<Automaton, AutomatonError> {
        let automaton: Automaton = serde_json::from_str(content)?;
        analyze(&automaton)?;

        let unreachable = unreachable_states(&automaton);
        if !unreachable.is_empty() {
            warn!(kind = automaton.kind(), ?unreachable, "automaton has unreachable states");
        }

        Ok(automaton)
    }

    /// Decodes a grammar and checks that it is right- or left-linear.
    pub fn load_grammar_from_str(content: &str) -> Result<Grammar, AutomatonError> {
        let grammar: Grammar = serde_json::from_str(content)?;
        grammar.classify()?;
        Ok(grammar)
    }

    /// Loads a grammar from a `.json` file and checks its linearity.
    ///
    /// # Arguments
    ///
    /// * `path` - A reference to the `Path` of the file to load.
    ///
    /// # Returns
    ///
    /// * `Ok(Grammar)` for a right- or left-linear grammar.
    /// * `Err(AutomatonError::NonRegularGrammar)` when the productions are not regular.
    pub fn load_grammar(path: &Path) -> Result<Grammar, AutomatonError> {
        Self::load_grammar_from_str(&read(path)?)
    }

    /// Decodes a rule specification: a list of groups, each with a list of rules.
    pub fn load_rules_from_str(content: &str) -> Result<RuleSpec, AutomatonError> {
        decode(content)
    }

    /// Loads a rule specification from a `.json` file.
    pub fn load_rules(path: &Path) -> Result<RuleSpec, AutomatonError> {
        decode(&read(path)?)
    }

    /// Decodes harness settings; absent fields keep their defaults.
    pub fn load_harness_config_from_str(content: &str) -> Result<HarnessConfig, AutomatonError> {
        decode(content)
    }

    /// Loads all valid automaton files (`.json` extension) from a given directory.
    ///
    /// Directories and non-`.json` files are skipped.
    ///
    /// # Arguments
    ///
    /// * `directory` - A reference to the `Path` of the directory to scan.
    ///
    /// # Returns
    ///
    /// One element per `.json` file: the path and the loaded automaton, or the error
    /// that prevented loading it. A missing or unreadable directory yields a single
    /// `FileError`.
    pub fn load_automata(directory: &Path) -> Vec<Result<(PathBuf, Automaton), AutomatonError>> {
        if !directory.exists() {
            return vec![Err(AutomatonError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(AutomatonError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        entries
            .filter_map(|entry| {
                let path = match entry {
                    Ok(entry) => entry.path(),
                    Err(e) => {
                        return Some(Err(AutomatonError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                if path.is_dir() || path.extension().is_none_or(|ext| ext != "json") {
                    return None;
                }

                Some(Self::load_automaton(&path).map(|automaton| (path, automaton)))
            })
            .collect()
    }
}

fn read(path: &Path) -> Result<String, AutomatonError> {
    fs::read_to_string(path).map_err(|e| {
        AutomatonError::FileError(format!("Failed to read file {}: {}", path.display(), e))
    })
}

fn decode<T: DeserializeOwned>(content: &str) -> Result<T, AutomatonError> {
    Ok(serde_json::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Simulate;
    use crate::config::Limits;
    use std::fs::File;
    use std::io::{Seek, SeekFrom, Write};
    use tempfile::{tempdir, tempfile};

    const EVEN_AS: &str = r#"{
        "type": "dfa",
        "states": ["even", "odd"],
        "start": "even",
        "finals": ["even"],
        "transitions": {
            "even": {"a": "odd", "b": "even"},
            "odd": {"a": "even", "b": "odd"}
        }
    }"#;

    #[test]
    fn test_load_valid_automaton() {
        let automaton = DefinitionLoader::load_automaton_from_str(EVEN_AS).unwrap();

        assert_eq!(automaton.kind(), "DFA");
        assert!(automaton.accepts("abab", &Limits::default()));
        assert!(!automaton.accepts("ab", &Limits::default()));
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let result = DefinitionLoader::load_automaton_from_str("{\"type\": \"dfa\"");
        assert!(matches!(result, Err(AutomatonError::ParseError(_))));
    }

    #[test]
    fn test_load_runs_analysis() {
        let content = r#"{
            "type": "nfa",
            "states": ["q0"],
            "start": "q1",
            "finals": []
        }"#;

        let result = DefinitionLoader::load_automaton_from_str(content);
        assert_eq!(result, Err(AutomatonError::InvalidState("q1".to_string())));
    }

    #[test]
    fn test_load_pda_and_tm() {
        let pda = r#"{
            "type": "pda",
            "states": ["q"],
            "start": "q",
            "initial_stack": "Z",
            "acceptance": "empty_stack",
            "transitions": [
                {"from": "q", "input": "(", "pop": null, "to": "q", "push": "X"},
                {"from": "q", "input": ")", "pop": "X", "to": "q"},
                {"from": "q", "input": null, "pop": "Z", "to": "q"}
            ]
        }"#;
        let pda = DefinitionLoader::load_automaton_from_str(pda).unwrap();
        assert!(pda.accepts("(())", &Limits::default()));
        assert!(!pda.accepts("(()", &Limits::default()));

        let tm = r#"{
            "type": "tm",
            "states": ["q0", "qa", "qr"],
            "initial_state": "q0",
            "accept_state": "qa",
            "reject_state": "qr",
            "rules": {
                "q0": [
                    {"read": ["a"], "write": ["a"], "directions": ["R"], "next_state": "q0"},
                    {"read": ["_"], "write": ["_"], "directions": ["N"], "next_state": "qa"}
                ]
            }
        }"#;
        let tm = DefinitionLoader::load_automaton_from_str(tm).unwrap();
        assert!(tm.accepts("aaa", &Limits::default()));
        assert!(!tm.accepts("ab", &Limits::default()));
    }

    #[test]
    fn test_load_rejects_tm_with_several_tapes() {
        let content = r#"{
            "type": "tm",
            "states": ["q0", "qa", "qr"],
            "initial_state": "q0",
            "accept_state": "qa",
            "reject_state": "qr",
            "tapes": 2,
            "rules": {
                "q0": [
                    {"read": ["a", "_"], "write": ["a", "_"], "directions": ["N", "N"], "next_state": "qa"},
                    {"read": ["*", "_"], "write": ["*", "_"], "directions": ["N", "N"], "next_state": "qr"}
                ]
            }
        }"#;

        let result = DefinitionLoader::load_automaton_from_str(content);
        assert!(matches!(result, Err(AutomatonError::ValidationError(_))));

        let multi = content.replace("\"tm\"", "\"multi_tm\"");
        let automaton = DefinitionLoader::load_automaton_from_str(&multi).unwrap();
        assert!(automaton.accepts("a", &Limits::default()));
    }

    #[test]
    fn test_load_from_reader() {
        let mut file = tempfile().unwrap();
        file.write_all(EVEN_AS.as_bytes()).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();

        let automaton = DefinitionLoader::load_automaton_from_reader(file).unwrap();
        assert_eq!(automaton.start_state(), "even");
    }

    #[test]
    fn test_load_grammar_and_rules() {
        let grammar = DefinitionLoader::load_grammar_from_str(
            r#"{"start": "S", "variables": ["S"], "productions": {"S": ["aS", "b"]}}"#,
        )
        .unwrap();
        assert_eq!(grammar.productions["S"].len(), 2);

        let mixed = DefinitionLoader::load_grammar_from_str(
            r#"{"start": "S", "variables": ["S", "A"], "productions": {"S": ["aA"], "A": ["Sb"]}}"#,
        );
        assert!(matches!(mixed, Err(AutomatonError::NonRegularGrammar(_))));

        let rules = DefinitionLoader::load_rules_from_str(
            r#"[{"rules": [{"type": "endsWith", "value": "b", "negated": true}]}]"#,
        )
        .unwrap();
        assert!(rules.groups[0].rules[0].negated);

        let config =
            DefinitionLoader::load_harness_config_from_str(r#"{"seed": 9, "max_len": 4}"#).unwrap();
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.max_len, 4);
    }

    #[test]
    fn test_load_automata_from_directory() {
        let dir = tempdir().unwrap();

        let mut valid = File::create(dir.path().join("even.json")).unwrap();
        valid.write_all(EVEN_AS.as_bytes()).unwrap();

        let mut invalid = File::create(dir.path().join("broken.json")).unwrap();
        invalid.write_all(b"not json").unwrap();

        let mut ignored = File::create(dir.path().join("notes.txt")).unwrap();
        ignored.write_all(b"ignored").unwrap();

        let results = DefinitionLoader::load_automata(dir.path());
        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = DefinitionLoader::load_automaton(&dir.path().join("missing.json"));

        assert!(matches!(result, Err(AutomatonError::FileError(_))));
    }
}
