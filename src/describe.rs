//! Turns short natural-language descriptions ("w começa com ab", "a^n b^n",
//! "at least 2 a") into rule specifications. Portuguese and English phrasings
//! are recognised.

use crate::oracle::{
    CountOperator, CountSubject, PalindromeKind, Predicate, Rule, RuleSpec,
};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// Structured languages, most specific first. The first match wins.
    static ref STRUCTURED: Vec<(Option<Regex>, &'static str, &'static str)> = vec![
        (compile(r"a\^?n\s*b\^?n\s*c\^?n"), "abc", "i == j && j == k"),
        (compile(r"a\^?n\s*b\^?n"), "ab", "i == j"),
        (compile(r"n\s*=\s*2\s*\*?\s*m"), "ab", "i == 2 * j"),
        (
            compile(r"a\^?n\s*b\^?\(?2\s*\*?\s*n\)?\s*c\^?\(?\s*n\s*-\s*1\)?"),
            "abc",
            "j == 2 * i && k == i - 1 && i >= 1",
        ),
        (compile(r"b\^?\(?2\s*\*?\s*n\)?"), "ab", "j == 2 * i"),
        (compile(r"1\^?n\s*0\^?\(?\s*n\s*\+\s*3\)?"), "10", "j == i + 3"),
        (compile(r"j\s*=\s*max\s*\(\s*i\s*,\s*k\s*\)"), "aba", "j == max(i, k)"),
        (compile(r"i\s*=\s*j\s+(?:ou|or)\s+j\s*=\s*k"), "aba", "i == j || j == k"),
        (
            compile(r"mesma\s+quantidade.*a.*b|igual.*n[uú]mero.*a.*b|same\s+number\s+of\s+a.*b"),
            "ab",
            "i == j",
        ),
    ];
    static ref EVEN_PALINDROME: Option<Regex> =
        compile(r"ww\^?r|pal[ií]ndromo\s+par|even(?:-length)?\s+palindrome");
    static ref PALINDROME: Option<Regex> = compile(r"pal[ií]ndromo|palindrome");
    static ref STARTS_WITH: Option<Regex> =
        compile(r#"(?:come[çc]a\s+com|starts?\s+with)\s+['"]?(\w+)"#);
    static ref ENDS_WITH: Option<Regex> =
        compile(r#"(?:termina\s+com|ends?\s+with)\s+['"]?(\w+)"#);
    static ref CONTAINS: Option<Regex> = compile(r#"(?:cont[eé]m|contains)\s+['"]?(\w+)"#);
    static ref NOT_CONTAINS: Option<Regex> =
        compile(r#"(?:n[ãa]o\s+cont[eé]m|does\s+not\s+contain|doesn't\s+contain)\s+['"]?(\w+)"#);
    static ref AT_LEAST: Option<Regex> =
        compile(r#"(?:pelo\s+menos|at\s+least)\s+(\d+)\s+['"]?(\w)"#);
    static ref EXACTLY: Option<Regex> = compile(r#"(?:exatamente|exactly)\s+(\d+)\s+['"]?(\w)"#);
    static ref EVEN_LENGTH: Option<Regex> = compile(r"comprimento\s+par|even\s+length");
    static ref ODD_LENGTH: Option<Regex> = compile(r"comprimento\s+[ií]mpar|odd\s+length");
}

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern).ok()
}

fn captures<'t>(regex: &Option<Regex>, text: &'t str) -> Option<Captures<'t>> {
    regex.as_ref()?.captures(text)
}

fn is_match(regex: &Option<Regex>, text: &str) -> bool {
    regex.as_ref().is_some_and(|re| re.is_match(text))
}

fn word(regex: &Option<Regex>, text: &str) -> Option<String> {
    Some(captures(regex, text)?.get(1)?.as_str().to_string())
}

/// `(n, symbol)` from a "<quantifier> N x" phrase.
fn quantity(regex: &Option<Regex>, text: &str) -> Option<(usize, char)> {
    let caps = captures(regex, text)?;
    let n = caps.get(1)?.as_str().parse().ok()?;
    let symbol = caps.get(2)?.as_str().chars().next()?;
    Some((n, symbol))
}

fn structured(text: &str) -> Option<Predicate> {
    STRUCTURED
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != 1 || !text.contains("c^"))
        .find(|(_, (regex, _, _))| is_match(regex, text))
        .map(|(_, (_, pattern, condition))| Predicate::StructuredLanguage {
            pattern: pattern.to_string(),
            condition: condition.to_string(),
        })
}

fn palindrome(text: &str) -> Option<Predicate> {
    let kind = if is_match(&EVEN_PALINDROME, text) {
        PalindromeKind::Even
    } else if is_match(&PALINDROME, text) {
        PalindromeKind::Any
    } else {
        return None;
    };
    Some(Predicate::Palindrome { kind })
}

fn count(symbol: char, operator: CountOperator, n: usize) -> Predicate {
    Predicate::Count {
        subject: CountSubject::Char { symbol },
        operator,
        n,
        m: 0,
    }
}

fn length(operator: CountOperator) -> Predicate {
    Predicate::Count {
        subject: CountSubject::Length,
        operator,
        n: 0,
        m: 0,
    }
}

/// Builds a single-group rule specification from a description, or `None`
/// when nothing in it is recognised.
pub fn rules_from_description(description: &str) -> Option<RuleSpec> {
    let text = description.to_lowercase();
    let mut rules = Vec::new();

    if let Some(predicate) = structured(&text).or_else(|| palindrome(&text)) {
        rules.push(Rule::new(predicate));
    }

    if let Some(value) = word(&STARTS_WITH, &text) {
        rules.push(Rule::new(Predicate::StartsWith { value }));
    }
    if let Some(value) = word(&ENDS_WITH, &text) {
        rules.push(Rule::new(Predicate::EndsWith { value }));
    }
    match word(&NOT_CONTAINS, &text) {
        Some(value) => rules.push(Rule::negated(Predicate::Contains { value })),
        None => {
            if let Some(value) = word(&CONTAINS, &text) {
                rules.push(Rule::new(Predicate::Contains { value }));
            }
        }
    }

    if let Some((n, symbol)) = quantity(&AT_LEAST, &text) {
        rules.push(Rule::new(count(symbol, CountOperator::AtLeast, n)));
    }
    if let Some((n, symbol)) = quantity(&EXACTLY, &text) {
        rules.push(Rule::new(count(symbol, CountOperator::Equal, n)));
    }
    if is_match(&EVEN_LENGTH, &text) {
        rules.push(Rule::new(length(CountOperator::Even)));
    }
    if is_match(&ODD_LENGTH, &text) {
        rules.push(Rule::new(length(CountOperator::Odd)));
    }

    if rules.is_empty() {
        None
    } else {
        Some(RuleSpec::all_of(rules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::Oracle;

    fn oracle(description: &str) -> Oracle {
        Oracle::build(&rules_from_description(description).unwrap())
    }

    #[test]
    fn test_patterns_compile() {
        assert!(STRUCTURED.iter().all(|(regex, _, _)| regex.is_some()));
        for regex in [
            &*EVEN_PALINDROME,
            &*PALINDROME,
            &*STARTS_WITH,
            &*ENDS_WITH,
            &*CONTAINS,
            &*NOT_CONTAINS,
            &*AT_LEAST,
            &*EXACTLY,
            &*EVEN_LENGTH,
            &*ODD_LENGTH,
        ] {
            assert!(regex.is_some());
        }
    }

    #[test]
    fn test_structured_descriptions() {
        let anbn = oracle("L = { a^n b^n | n >= 0 }");
        assert!(anbn.evaluate("aabb"));
        assert!(!anbn.evaluate("aab"));

        let anbncn = oracle("a^n b^n c^n");
        assert!(anbncn.evaluate("abc"));
        assert!(!anbncn.evaluate("abbc"));

        let chain = oracle("a^n b^(2n) c^(n-1), n > 0");
        assert!(chain.evaluate("abb"));
        assert!(chain.evaluate("aabbbbc"));
        assert!(!chain.evaluate(""));

        let max = oracle("a^i b^j a^k onde j = max(i, k)");
        assert!(max.evaluate("abbaa"));
        assert!(max.evaluate("aba"));
        assert!(!max.evaluate("abaa"));

        let ones = oracle("1^n 0^(n+3)");
        assert!(ones.evaluate("10000"));
        assert!(!ones.evaluate("1000"));
    }

    #[test]
    fn test_palindromes() {
        let even = rules_from_description("palíndromo par sobre {a,b}").unwrap();
        assert_eq!(
            even.groups[0].rules[0].predicate,
            Predicate::Palindrome {
                kind: PalindromeKind::Even
            }
        );

        let any = oracle("palindromes over {a, b}");
        assert!(any.evaluate("aba"));
        assert!(!any.evaluate("ab"));
    }

    #[test]
    fn test_simple_phrases_combine() {
        let oracle = oracle("w começa com ab e termina com b, comprimento par");
        assert!(oracle.evaluate("abab"));
        assert!(!oracle.evaluate("abb"));
        assert!(!oracle.evaluate("baab"));
    }

    #[test]
    fn test_negated_contains() {
        let oracle = oracle("w não contém aa");
        assert!(oracle.evaluate("abab"));
        assert!(!oracle.evaluate("baab"));

        let english = rules_from_description("does not contain bb").unwrap();
        assert!(english.groups[0].rules[0].negated);
    }

    #[test]
    fn test_counts() {
        let oracle = oracle("at least 2 a, exactly 1 b");
        assert!(oracle.evaluate("aab"));
        assert!(!oracle.evaluate("ab"));
        assert!(!oracle.evaluate("aabb"));
    }

    #[test]
    fn test_unrecognised_description() {
        assert_eq!(rules_from_description("anything goes"), None);
    }
}
