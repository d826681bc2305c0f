//! Reference implementations of languages, written as rules instead of automata.
//!
//! A [`RuleSpec`] is a disjunction of groups, each group a conjunction of
//! (possibly negated) predicates. [`Oracle::build`] compiles it once; regexes and
//! conditions that fail to compile make their predicate false.

use crate::expr::Expr;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Run names bound by structured-language conditions, in pattern order.
const RUN_NAMES: [&str; 8] = ["i", "j", "k", "l", "m", "n", "o", "p"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    fn holds(self, count: usize) -> bool {
        match self {
            Parity::Even => count % 2 == 0,
            Parity::Odd => count % 2 == 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PalindromeKind {
    #[default]
    Any,
    Even,
    Odd,
}

/// What a `count` predicate counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CountSubject {
    /// The length of the string.
    #[serde(alias = "total")]
    Length,
    /// Occurrences of one symbol.
    Char {
        #[serde(rename = "char")]
        symbol: char,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountOperator {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = "<=")]
    AtMost,
    #[serde(rename = "even")]
    Even,
    #[serde(rename = "odd")]
    Odd,
    /// `count % n == m`
    #[serde(rename = "%")]
    Modulo,
}

fn default_consecutive() -> usize {
    2
}

fn default_separator() -> char {
    'c'
}

fn default_sum_pattern() -> String {
    "abcd".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PatternText {
    Text(String),
    Symbols(Vec<String>),
}

/// Accepts `"abc"` as well as `["a", "b", "c"]`.
fn pattern_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match PatternText::deserialize(deserializer)? {
        PatternText::Text(text) => text,
        PatternText::Symbols(symbols) => symbols.concat(),
    })
}

/// The catalog of predicate kinds. Serialized with a `type` tag next to the
/// kind's parameters, e.g. `{"type": "startsWith", "value": "ab"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Predicate {
    /// The string starts with `value`.
    StartsWith {
        value: String,
    },
    /// The string ends with `value`.
    EndsWith {
        value: String,
    },
    /// `value` occurs anywhere in the string.
    Contains {
        value: String,
    },
    /// The whole string matches the pattern.
    Regex {
        #[serde(alias = "pattern")]
        value: String,
    },
    /// Compares the length, or the occurrences of one symbol, with `n`.
    Count {
        subject: CountSubject,
        operator: CountOperator,
        /// The bound for `==`, `>=` and `<=`, the modulus for `%`.
        #[serde(default, alias = "N")]
        n: usize,
        /// The required remainder for `%`.
        #[serde(default, alias = "M")]
        m: usize,
    },
    /// Parity of the (overlapping) occurrences of `sub`.
    #[serde(alias = "substringCountParity")]
    SubstringCount {
        sub: String,
        parity: Parity,
    },
    /// The string factors into runs of each pattern symbol in order; the run
    /// lengths, bound to `i`, `j`, `k`, ..., must satisfy `condition`. An empty
    /// condition leaves the factoring alone to decide.
    StructuredLanguage {
        /// The run symbols, as a string or as a `symbols` array.
        #[serde(alias = "symbols", deserialize_with = "pattern_text")]
        pattern: String,
        #[serde(default)]
        condition: String,
    },
    /// Like [`Predicate::StructuredLanguage`], but an empty condition matches nothing.
    MatchingPowers {
        #[serde(deserialize_with = "pattern_text")]
        pattern: String,
        #[serde(default)]
        condition: String,
    },
    Palindrome {
        #[serde(default, alias = "palindromeType")]
        kind: PalindromeKind,
    },
    /// Every listed symbol occurs equally often.
    EqualCount {
        chars: Vec<char>,
    },
    /// Parity of the occurrences of one symbol.
    Parity {
        #[serde(rename = "char")]
        symbol: char,
        parity: Parity,
    },
    /// Non-empty, and the first symbol equals the last (a single symbol counts).
    SameFirstLast,
    FirstEqualsLast,
    /// At least `min` consecutive copies of the symbol.
    HasConsecutive {
        #[serde(rename = "char")]
        symbol: char,
        #[serde(default = "default_consecutive")]
        min: usize,
    },
    /// The occurrences of `symbol` are a multiple of `n`. Zero never divides.
    DivisibleBy {
        #[serde(rename = "char")]
        symbol: char,
        n: usize,
    },
    /// The string read as a binary number is a multiple of `n`. `""` is 0.
    BinaryDivisibleBy {
        n: u64,
    },
    /// Parity of the total occurrences of the listed symbols.
    SumParity {
        chars: Vec<char>,
        parity: Parity,
    },
    /// Same as `regex`: the whole string matches `pattern`.
    ExactPattern {
        pattern: String,
    },
    /// Ends with any of the suffixes.
    HasSuffix {
        suffixes: Vec<String>,
    },
    /// At least `min` overlapping occurrences of `sub`.
    MinSubstringOccurrences {
        sub: String,
        min: usize,
    },
    /// Exactly `count` overlapping occurrences of `sub`.
    ExactSubstringOccurrences {
        sub: String,
        count: usize,
    },
    /// Contains `xx` for some listed symbol `x`.
    HasConsecutivePair {
        chars: Vec<char>,
    },
    /// Every listed substring occurs.
    HasBothSubstrings {
        subs: Vec<String>,
    },
    MinLength {
        min: usize,
    },
    /// `symbol` occurs at least `count` times.
    #[serde(alias = "atLeastN")]
    MinCount {
        #[serde(rename = "char")]
        symbol: char,
        #[serde(alias = "n")]
        count: usize,
    },
    /// `symbol` occurs at most `count` times.
    MaxCount {
        #[serde(rename = "char")]
        symbol: char,
        count: usize,
    },
    AcceptAll,
    LengthParity {
        parity: Parity,
    },
    /// The sum of per-symbol weights is a multiple of `divisor`.
    WeightedSumDivisible {
        weights: BTreeMap<char, i64>,
        divisor: i64,
    },
    /// The last symbol occurs at least twice, with no greater symbol between its
    /// last two occurrences.
    LastSymbolRepeated,
    /// A condition over `len` and `n_<symbol>` (occurrences of each symbol).
    Custom {
        expression: String,
    },
    /// Matches nothing.
    EmptyLanguage,
    /// Matches only `""`.
    EmptyStringOnly,
    /// `w separator reverse(w)`, with `w` drawn from `alphabet` when given.
    WcwReverse {
        #[serde(default = "default_separator")]
        separator: char,
        #[serde(default)]
        alphabet: Option<Vec<char>>,
    },
    /// Bracket pairs nest properly; other symbols are ignored.
    BalancedParentheses {
        /// Several bracket kinds. Takes precedence over `open`/`close`.
        #[serde(default)]
        pairs: Vec<(char, char)>,
        /// A single bracket kind, `(` when absent.
        #[serde(default)]
        open: Option<char>,
        /// Closes `open`, `)` when absent.
        #[serde(default)]
        close: Option<char>,
    },
    /// a^n b^n c^m d^m
    Anbncmdn,
    /// i + j == k + l over the runs of `pattern`.
    SumEquality {
        #[serde(default = "default_sum_pattern")]
        pattern: String,
    },
    /// a^n b^n or b^n a^n with n >= 1.
    AnbnOrBnan,
    /// `symbol` occurs an odd number of times.
    OddCount {
        #[serde(rename = "char")]
        symbol: char,
    },
}

/// A predicate and whether its result is inverted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(flatten)]
    pub predicate: Predicate,
    #[serde(default)]
    pub negated: bool,
}

impl Rule {
    /// A rule that holds when `predicate` does.
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            negated: false,
        }
    }

    /// A rule that holds when `predicate` does not.
    pub fn negated(predicate: Predicate) -> Self {
        Self {
            predicate,
            negated: true,
        }
    }
}

/// A conjunction of rules. An empty group accepts nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleGroup {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// A disjunction of rule groups. An empty specification accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSpec {
    pub groups: Vec<RuleGroup>,
}

impl RuleSpec {
    pub fn new(groups: Vec<RuleGroup>) -> Self {
        Self { groups }
    }

    /// A specification with a single group.
    pub fn all_of(rules: Vec<Rule>) -> Self {
        Self {
            groups: vec![RuleGroup { rules }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Symbols mentioned by the predicates' parameters.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.groups
            .iter()
            .flat_map(|group| &group.rules)
            .flat_map(|rule| rule.predicate.symbols())
            .collect()
    }
}

impl Predicate {
    /// Input symbols named by the parameters.
    fn symbols(&self) -> Vec<char> {
        use Predicate::*;

        match self {
            StartsWith { value } | EndsWith { value } | Contains { value } => value.chars().collect(),
            Predicate::Regex { value: pattern } | ExactPattern { pattern } => {
                pattern.chars().filter(|c| c.is_alphanumeric()).collect()
            }
            Count { subject, .. } => match subject {
                CountSubject::Char { symbol } => vec![*symbol],
                CountSubject::Length => Vec::new(),
            },
            SubstringCount { sub, .. }
            | MinSubstringOccurrences { sub, .. }
            | ExactSubstringOccurrences { sub, .. } => sub.chars().collect(),
            StructuredLanguage { pattern, .. }
            | MatchingPowers { pattern, .. }
            | SumEquality { pattern } => pattern.chars().collect(),
            EqualCount { chars } | SumParity { chars, .. } | HasConsecutivePair { chars } => {
                chars.clone()
            }
            Predicate::Parity { symbol, .. }
            | HasConsecutive { symbol, .. }
            | DivisibleBy { symbol, .. }
            | MinCount { symbol, .. }
            | MaxCount { symbol, .. }
            | OddCount { symbol } => vec![*symbol],
            BinaryDivisibleBy { .. } => vec!['0', '1'],
            HasSuffix { suffixes: words } | HasBothSubstrings { subs: words } => {
                words.iter().flat_map(|w| w.chars()).collect()
            }
            WeightedSumDivisible { weights, .. } => weights.keys().copied().collect(),
            WcwReverse {
                separator,
                alphabet,
            } => alphabet
                .iter()
                .flatten()
                .copied()
                .chain([*separator])
                .collect(),
            BalancedParentheses { pairs, open, close } => bracket_pairs(pairs, *open, *close)
                .into_iter()
                .flat_map(|(o, c)| [o, c])
                .collect(),
            Anbncmdn => vec!['a', 'b', 'c', 'd'],
            AnbnOrBnan => vec!['a', 'b'],
            Palindrome { .. }
            | SameFirstLast
            | FirstEqualsLast
            | MinLength { .. }
            | AcceptAll
            | LengthParity { .. }
            | LastSymbolRepeated
            | Custom { .. }
            | EmptyLanguage
            | EmptyStringOnly => Vec::new(),
        }
    }
}

/// A rule with its regex or condition compiled.
#[derive(Debug, Clone)]
struct CompiledRule {
    predicate: Predicate,
    negated: bool,
    regex: Option<Regex>,
    condition: Option<Expr>,
}

impl CompiledRule {
    fn compile(rule: &Rule) -> Self {
        let mut regex = None;
        let mut condition = None;

        match &rule.predicate {
            Predicate::Regex { value: pattern } | Predicate::ExactPattern { pattern } => {
                match Regex::new(&format!("^(?:{pattern})$")) {
                    Ok(compiled) => regex = Some(compiled),
                    Err(error) => warn!(%pattern, %error, "invalid pattern, predicate is always false"),
                }
            }
            Predicate::StructuredLanguage { condition: source, .. } if source.trim().is_empty() => {
                condition = Some(Expr::Bool(true));
            }
            Predicate::MatchingPowers { condition: source, .. } if source.trim().is_empty() => {}
            Predicate::StructuredLanguage { condition: source, .. }
            | Predicate::MatchingPowers { condition: source, .. }
            | Predicate::Custom { expression: source } => match Expr::parse(source) {
                Ok(expr) => condition = Some(expr),
                Err(error) => warn!(%source, %error, "invalid condition, predicate is always false"),
            },
            _ => {}
        }

        Self {
            predicate: rule.predicate.clone(),
            negated: rule.negated,
            regex,
            condition,
        }
    }

    fn evaluate(&self, input: &str) -> bool {
        self.matches(input) != self.negated
    }

    fn matches(&self, input: &str) -> bool {
        use Predicate::*;

        match &self.predicate {
            StartsWith { value } => input.starts_with(value.as_str()),
            EndsWith { value } => input.ends_with(value.as_str()),
            Contains { value } => input.contains(value.as_str()),
            Predicate::Regex { .. } | ExactPattern { .. } => {
                self.regex.as_ref().is_some_and(|re| re.is_match(input))
            }
            Count {
                subject,
                operator,
                n,
                m,
            } => {
                let count = match subject {
                    CountSubject::Length => input.chars().count(),
                    CountSubject::Char { symbol } => count_char(input, *symbol),
                };
                match operator {
                    CountOperator::Equal => count == *n,
                    CountOperator::AtLeast => count >= *n,
                    CountOperator::AtMost => count <= *n,
                    CountOperator::Even => count % 2 == 0,
                    CountOperator::Odd => count % 2 == 1,
                    CountOperator::Modulo => count.checked_rem(*n) == Some(*m),
                }
            }
            SubstringCount { sub, parity } => {
                sub.is_empty() || parity.holds(occurrences(input, sub))
            }
            StructuredLanguage { pattern, .. } | MatchingPowers { pattern, .. } => {
                let Some(runs) = runs(input, pattern) else {
                    return false;
                };
                let len = input.chars().count();
                self.condition.as_ref().is_some_and(|expr| {
                    expr.holds(&|name| match name {
                        "len" => to_i64(len),
                        _ => RUN_NAMES
                            .iter()
                            .position(|run| *run == name)
                            .and_then(|index| runs.get(index))
                            .and_then(|&count| to_i64(count)),
                    })
                })
            }
            Palindrome { kind } => {
                let chars: Vec<char> = input.chars().collect();
                let palindrome = chars.iter().eq(chars.iter().rev());
                match kind {
                    PalindromeKind::Any => palindrome,
                    PalindromeKind::Even => palindrome && chars.len() % 2 == 0,
                    PalindromeKind::Odd => palindrome && chars.len() % 2 == 1,
                }
            }
            EqualCount { chars } => match chars.split_first() {
                Some((first, rest)) => {
                    let expected = count_char(input, *first);
                    rest.iter().all(|c| count_char(input, *c) == expected)
                }
                None => true,
            },
            Predicate::Parity { symbol, parity } => parity.holds(count_char(input, *symbol)),
            SameFirstLast | FirstEqualsLast => {
                let mut chars = input.chars();
                match (chars.next(), chars.next_back()) {
                    (Some(first), Some(last)) => first == last,
                    (Some(_), None) => true,
                    _ => false,
                }
            }
            HasConsecutive { symbol, min } => longest_run(input, *symbol) >= (*min).max(1),
            DivisibleBy { symbol, n } => count_char(input, *symbol).checked_rem(*n) == Some(0),
            BinaryDivisibleBy { n } => binary_remainder(input, *n) == Some(0),
            SumParity { chars, parity } => {
                let sum = chars.iter().map(|c| count_char(input, *c)).sum();
                parity.holds(sum)
            }
            HasSuffix { suffixes } => suffixes.iter().any(|s| input.ends_with(s.as_str())),
            MinSubstringOccurrences { sub, min } => {
                sub.is_empty() || occurrences(input, sub) >= *min
            }
            ExactSubstringOccurrences { sub, count } => {
                sub.is_empty() || occurrences(input, sub) == *count
            }
            HasConsecutivePair { chars } => chars.iter().any(|c| longest_run(input, *c) >= 2),
            HasBothSubstrings { subs } => subs.iter().all(|s| input.contains(s.as_str())),
            MinLength { min } => input.chars().count() >= *min,
            MinCount { symbol, count } => count_char(input, *symbol) >= *count,
            MaxCount { symbol, count } => count_char(input, *symbol) <= *count,
            AcceptAll => true,
            LengthParity { parity } => parity.holds(input.chars().count()),
            WeightedSumDivisible { weights, divisor } => input
                .chars()
                .try_fold(0i64, |sum, c| sum.checked_add(weights.get(&c).copied().unwrap_or(0)))
                .and_then(|sum| sum.checked_rem(*divisor))
                == Some(0),
            LastSymbolRepeated => last_symbol_repeated(input),
            Custom { .. } => self.condition.as_ref().is_some_and(|expr| {
                expr.holds(&|name| match name {
                    "len" => to_i64(input.chars().count()),
                    _ => {
                        let mut symbol = name.strip_prefix("n_")?.chars();
                        match (symbol.next(), symbol.next()) {
                            (Some(c), None) => to_i64(count_char(input, c)),
                            _ => None,
                        }
                    }
                })
            }),
            EmptyLanguage => false,
            EmptyStringOnly => input.is_empty(),
            WcwReverse {
                separator,
                alphabet,
            } => wcw_reverse(input, *separator, alphabet.as_deref()),
            BalancedParentheses { pairs, open, close } => {
                balanced(input, &bracket_pairs(pairs, *open, *close))
            }
            Anbncmdn => {
                matches!(runs(input, "abcd").as_deref(), Some([a, b, c, d]) if a == b && c == d)
            }
            SumEquality { pattern } => match runs(input, pattern).as_deref() {
                Some([i, j, k, l, ..]) => i + j == k + l,
                _ => false,
            },
            AnbnOrBnan => ["ab", "ba"].iter().any(|pattern| {
                matches!(runs(input, pattern).as_deref(), Some([x, y]) if x == y && *x > 0)
            }),
            OddCount { symbol } => count_char(input, *symbol) % 2 == 1,
        }
    }
}

fn to_i64(n: usize) -> Option<i64> {
    i64::try_from(n).ok()
}

fn count_char(input: &str, symbol: char) -> usize {
    input.chars().filter(|c| *c == symbol).count()
}

/// Occurrences of `sub`, overlapping ones included.
fn occurrences(input: &str, sub: &str) -> usize {
    if sub.is_empty() {
        return 0;
    }
    (0..input.len())
        .filter(|&i| input.is_char_boundary(i) && input[i..].starts_with(sub))
        .count()
}

fn longest_run(input: &str, symbol: char) -> usize {
    input
        .chars()
        .fold((0, 0), |(best, current), c| {
            let current = if c == symbol { current + 1 } else { 0 };
            (best.max(current), current)
        })
        .0
}

/// Lengths of the maximal runs of each pattern symbol, in order, when they cover
/// the whole input. Runs may be empty.
fn runs(input: &str, pattern: &str) -> Option<Vec<usize>> {
    let mut chars = input.chars().peekable();
    let mut lengths = Vec::new();

    for symbol in pattern.chars() {
        let mut length = 0;
        while chars.next_if_eq(&symbol).is_some() {
            length += 1;
        }
        lengths.push(length);
    }

    chars.peek().is_none().then_some(lengths)
}

fn binary_remainder(input: &str, n: u64) -> Option<u64> {
    if n == 0 {
        return None;
    }
    input.chars().try_fold(0u64, |acc, c| {
        let bit = c.to_digit(2)?;
        Some(acc.checked_mul(2)?.checked_add(u64::from(bit))? % n)
    })
}

fn last_symbol_repeated(input: &str) -> bool {
    let chars: Vec<char> = input.chars().collect();
    let Some((&last, init)) = chars.split_last() else {
        return false;
    };

    match init.iter().rposition(|c| *c == last) {
        Some(previous) => init[previous + 1..].iter().all(|c| *c <= last),
        None => false,
    }
}

fn wcw_reverse(input: &str, separator: char, alphabet: Option<&[char]>) -> bool {
    let Some((w, rest)) = input.split_once(separator) else {
        return false;
    };
    if rest.contains(separator) {
        return false;
    }
    if let Some(alphabet) = alphabet {
        if !w.chars().all(|c| alphabet.contains(&c)) {
            return false;
        }
    }
    w.chars().eq(rest.chars().rev())
}

fn bracket_pairs(pairs: &[(char, char)], open: Option<char>, close: Option<char>) -> Vec<(char, char)> {
    if pairs.is_empty() {
        vec![(open.unwrap_or('('), close.unwrap_or(')'))]
    } else {
        pairs.to_vec()
    }
}

fn balanced(input: &str, pairs: &[(char, char)]) -> bool {
    let mut stack = Vec::new();

    for c in input.chars() {
        if let Some(open) = pairs.iter().position(|&(o, _)| o == c) {
            stack.push(open);
        } else if let Some(close) = pairs.iter().position(|&(_, cl)| cl == c) {
            if stack.pop() != Some(close) {
                return false;
            }
        }
    }

    stack.is_empty()
}

/// A compiled rule specification.
#[derive(Debug, Clone, Default)]
pub struct Oracle {
    groups: Vec<Vec<CompiledRule>>,
}

impl Oracle {
    /// Compiles every rule of `spec` once.
    ///
    /// # Arguments
    ///
    /// * `spec` - Groups of rules; a group holds when all its rules hold.
    ///
    /// # Returns
    ///
    /// An `Oracle`. Patterns and conditions that fail to compile are logged and make
    /// their rule false.
    pub fn build(spec: &RuleSpec) -> Self {
        Self {
            groups: spec
                .groups
                .iter()
                .map(|group| group.rules.iter().map(CompiledRule::compile).collect())
                .collect(),
        }
    }

    /// Whether `input` belongs to the specified language.
    pub fn evaluate(&self, input: &str) -> bool {
        if self.groups.is_empty() {
            return true;
        }

        self.groups
            .iter()
            .any(|rules| !rules.is_empty() && rules.iter().all(|rule| rule.evaluate(input)))
    }
}

impl From<&RuleSpec> for Oracle {
    fn from(spec: &RuleSpec) -> Self {
        Oracle::build(spec)
    }
}
