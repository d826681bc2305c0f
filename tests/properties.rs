use langcheck::oracle::{CountOperator, CountSubject};
use langcheck::{
    check, convert, ntm, Automaton, Dfa, Direction, Grammar, HarnessConfig, Limits, Nfa, Oracle,
    Predicate, Program, Rule, RuleSpec, Simulate,
};
use proptest::prelude::*;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn word(max_len: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just('a'), Just('b')], 0..=max_len)
        .prop_map(|chars| chars.into_iter().collect())
}

/// An NFA over states `s0..s{n}` built from arbitrary edge lists.
fn random_nfa(
    symbol_edges: &[(usize, bool, usize)],
    epsilon_edges: &[(usize, usize)],
    finals: &[usize],
) -> Nfa {
    let name = |i: usize| format!("s{}", i);
    let mut nfa = Nfa::new("s0");
    for &(from, is_a, to) in symbol_edges {
        nfa.add_transition(&name(from), if is_a { 'a' } else { 'b' }, &name(to));
    }
    for &(from, to) in epsilon_edges {
        nfa.add_epsilon(&name(from), &name(to));
    }
    for &state in finals {
        nfa.add_final(&name(state));
    }
    nfa
}

/// Accepts strings with an even number of 'a'.
fn even_as() -> Dfa {
    let mut dfa = Dfa::new("even");
    dfa.add_transition("even", 'a', "odd")
        .add_transition("odd", 'a', "even")
        .add_transition("even", 'b', "even")
        .add_transition("odd", 'b', "odd")
        .add_final("even");
    dfa
}

/// Scans right over a* and accepts at the first blank; rejects on 'b'.
fn only_as() -> Program {
    let mut program = Program::new("q0", "qa", "qr", 1);
    program
        .add_rule("q0", 'a', "q0", 'a', Direction::Right)
        .add_rule("q0", 'b', "qr", 'b', Direction::Stay)
        .add_rule("q0", '_', "qa", '_', Direction::Stay);
    program
}

proptest! {
    #[test]
    fn epsilon_closure_is_idempotent(
        symbol_edges in proptest::collection::vec((0usize..6, any::<bool>(), 0usize..6), 0..12),
        epsilon_edges in proptest::collection::vec((0usize..6, 0usize..6), 0..10),
        seeds in proptest::collection::btree_set(0usize..6, 1..4),
    ) {
        let nfa = random_nfa(&symbol_edges, &epsilon_edges, &[]);
        let seeds: Vec<String> = seeds.into_iter().map(|i| format!("s{}", i)).collect();

        let once = nfa.epsilon_closure(&seeds);
        let twice = nfa.epsilon_closure(&once);
        prop_assert_eq!(&once, &twice, "closure of a closure must not grow");
        prop_assert!(seeds.iter().all(|s| once.contains(s)), "closure must contain its seeds");
    }

    #[test]
    fn nfa_runs_are_deterministic(
        symbol_edges in proptest::collection::vec((0usize..5, any::<bool>(), 0usize..5), 0..12),
        epsilon_edges in proptest::collection::vec((0usize..5, 0usize..5), 0..6),
        finals in proptest::collection::vec(0usize..5, 0..3),
        input in word(8),
    ) {
        let nfa = random_nfa(&symbol_edges, &epsilon_edges, &finals);

        let first = nfa.simulate(&input, false);
        let second = nfa.simulate(&input, true);
        prop_assert_eq!(first.accepted, second.accepted);
        prop_assert_eq!(first.outcome, second.outcome);
    }

    #[test]
    fn negated_rule_is_the_complement(value in word(3), input in word(10)) {
        let plain = Oracle::build(&RuleSpec::all_of(vec![Rule::new(Predicate::Contains {
            value: value.clone(),
        })]));
        let negated = Oracle::build(&RuleSpec::all_of(vec![Rule::negated(Predicate::Contains {
            value,
        })]));

        prop_assert_ne!(plain.evaluate(&input), negated.evaluate(&input));
    }

    #[test]
    fn dfa_agrees_with_count_rule(input in word(12)) {
        let oracle = Oracle::build(&RuleSpec::all_of(vec![Rule::new(Predicate::Count {
            subject: CountSubject::Char { symbol: 'a' },
            operator: CountOperator::Even,
            n: 0,
            m: 0,
        })]));

        let automaton = Automaton::from(even_as());
        prop_assert_eq!(automaton.accepts(&input, &Limits::default()), oracle.evaluate(&input));
    }

    #[test]
    fn right_linear_grammar_matches_its_regex(input in word(10)) {
        let mut grammar = Grammar::new("S");
        grammar.add_production("S", "aS").add_production("S", "b");
        let nfa = convert(&grammar).unwrap();

        let oracle = Oracle::build(&RuleSpec::all_of(vec![Rule::new(Predicate::Regex {
            value: "a*b".to_string(),
        })]));

        prop_assert_eq!(nfa.simulate(&input, false).accepted, oracle.evaluate(&input));
    }

    #[test]
    fn nondeterministic_search_agrees_on_deterministic_programs(input in word(10)) {
        let program = only_as();

        let direct = program.simulate(&input, 200, false);
        let search = ntm::simulate(&program, &input, 200, false);
        prop_assert_eq!(direct.accepted, search.accepted);
        prop_assert_eq!(direct.accepted, input.chars().all(|c| c == 'a'));
    }
}

#[test]
fn harness_reports_no_counterexamples_for_a_correct_dfa() {
    init_tracing();

    let rules = RuleSpec::all_of(vec![Rule::new(Predicate::Count {
        subject: CountSubject::Char { symbol: 'a' },
        operator: CountOperator::Even,
        n: 0,
        m: 0,
    })]);
    let config = HarnessConfig {
        max_tests: 500,
        seed: Some(2024),
        ..HarnessConfig::default()
    };

    let report = check(&Automaton::from(even_as()), &rules, &config);
    assert!(report.passed());
    assert_eq!(report.tested, 500);
}

#[test]
fn harness_reports_extra_accepted_words() {
    init_tracing();

    // Accepts a*b plus every non-empty run of a.
    let mut nfa = Nfa::new("q0");
    nfa.add_transition("q0", 'a', "q0")
        .add_transition("q0", 'b', "qf")
        .add_transition("q0", 'a', "qx")
        .add_final("qf")
        .add_final("qx");
    let rules = RuleSpec::all_of(vec![Rule::new(Predicate::Regex {
        value: "a*b".to_string(),
    })]);
    let config = HarnessConfig {
        max_tests: 400,
        seed: Some(5),
        ..HarnessConfig::default()
    };

    let report = check(&Automaton::from(nfa), &rules, &config);
    assert!(!report.passed());
    assert!(report
        .counterexamples
        .iter()
        .all(|c| c.input.ends_with('a') && !c.expected && c.actual));
}
