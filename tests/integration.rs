// SPDX-License-Identifier: PMPL-1.0-or-later

//! Forward chaining and querying through the public API

mod common;

use common::*;
use forward_kb::kanren::entity::Justification;
use forward_kb::{KbError, NodeId, Term};

#[test]
fn test_duplicate_assertion_is_idempotent() {
    let mut kb = quiet_kb();
    kb.assert(rule(&[stmt("p", &["?x"])], stmt("q", &["?x"])));
    kb.assert(stmt("p", &["a"]));
    let facts = kb.fact_count();
    let rules = kb.rule_count();
    let q = kb.find_fact(&stmt("q", &["a"])).unwrap();

    kb.assert(stmt("p", &["a"]));

    assert_eq!(kb.fact_count(), facts);
    assert_eq!(kb.rule_count(), rules);
    let p = kb.find_fact(&stmt("p", &["a"])).unwrap();
    assert!(kb.fact(p).unwrap().asserted());
    assert_eq!(kb.fact(q).unwrap().supported_by().len(), 1);
}

#[test]
fn test_single_antecedent_fact_first() {
    let mut kb = quiet_kb();
    let NodeId::Fact(p) = kb.assert(stmt("p", &["a"])) else {
        panic!("expected fact id");
    };
    let NodeId::Rule(r) = kb.assert(rule(&[stmt("p", &["?x"])], stmt("q", &["?x"]))) else {
        panic!("expected rule id");
    };

    let q = kb.find_fact(&stmt("q", &["a"])).expect("q(a) derived");
    let derived = kb.fact(q).unwrap();
    assert!(!derived.asserted());
    assert_eq!(derived.supported_by(), &[Justification::new(p, r)]);
    assert!(kb.fact(p).unwrap().supports_facts().contains(&q));
    assert!(kb.rule(r).unwrap().supports_facts().contains(&q));
}

#[test]
fn test_single_antecedent_rule_first() {
    let mut kb = quiet_kb();
    let NodeId::Rule(r) = kb.assert(rule(&[stmt("p", &["?x"])], stmt("q", &["?x"]))) else {
        panic!("expected rule id");
    };
    let NodeId::Fact(p) = kb.assert(stmt("p", &["a"])) else {
        panic!("expected fact id");
    };

    let q = kb.find_fact(&stmt("q", &["a"])).expect("q(a) derived");
    assert_eq!(
        kb.fact(q).unwrap().supported_by(),
        &[Justification::new(p, r)]
    );
}

#[test]
fn test_multi_antecedent_residual_rule() {
    let mut kb = quiet_kb();
    kb.assert(rule(
        &[stmt("p", &["?x"]), stmt("r", &["?x"])],
        stmt("s", &["?x"]),
    ));
    kb.assert(stmt("p", &["a"]));

    let residual = kb
        .find_rule(&[stmt("r", &["a"])], &stmt("s", &["a"]))
        .expect("residual rule ((r a) -> (s a))");
    assert!(!kb.rule(residual).unwrap().asserted());
    assert!(!kb.contains_fact(&stmt("s", &["a"])));

    kb.assert(stmt("r", &["a"]));
    let s = kb.find_fact(&stmt("s", &["a"])).expect("s(a) derived");
    let r = kb.find_fact(&stmt("r", &["a"])).unwrap();
    assert_eq!(
        kb.fact(s).unwrap().supported_by(),
        &[Justification::new(r, residual)]
    );
}

#[test]
fn test_chained_derivation_reaches_fixed_point() {
    let mut kb = quiet_kb();
    kb.assert(rule(
        &[stmt("parent", &["?x", "?y"]), stmt("parent", &["?y", "?z"])],
        stmt("grandparent", &["?x", "?z"]),
    ));
    kb.assert(rule(
        &[stmt("grandparent", &["?x", "?z"])],
        stmt("ancestor", &["?x", "?z"]),
    ));
    kb.assert(stmt("parent", &["tom", "bob"]));
    kb.assert(stmt("parent", &["bob", "ann"]));
    kb.assert(stmt("parent", &["ann", "joe"]));

    assert!(kb.contains_fact(&stmt("grandparent", &["tom", "ann"])));
    assert!(kb.contains_fact(&stmt("grandparent", &["bob", "joe"])));
    assert!(kb.contains_fact(&stmt("ancestor", &["tom", "ann"])));
    assert!(!kb.contains_fact(&stmt("grandparent", &["tom", "joe"])));
    assert_saturated(&kb);

    // Re-adding what is already there derives nothing new
    let facts = kb.fact_count();
    let rules = kb.rule_count();
    let statements: Vec<_> = kb.facts().map(|(_, f)| f.statement().clone()).collect();
    for statement in statements {
        kb.assert(statement);
    }
    assert_eq!(kb.fact_count(), facts);
    assert_eq!(kb.rule_count(), rules);
}

#[test]
fn test_ask_returns_binding_per_fact() {
    let mut kb = quiet_kb();
    kb.assert(stmt("p", &["a"]));
    kb.assert(stmt("p", &["b"]));
    kb.assert(stmt("q", &["c"]));

    let answers = kb.ask(&stmt("p", &["?x"])).unwrap();
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0].bindings.lookup("x"), Some(Term::atom("a")));
    assert_eq!(answers[1].bindings.lookup("x"), Some(Term::atom("b")));
    assert_eq!(kb.find_fact(&stmt("p", &["a"])), Some(answers[0].fact));
    assert_eq!(kb.find_fact(&stmt("p", &["b"])), Some(answers[1].fact));
}

#[test]
fn test_ask_without_matches_is_empty() {
    let mut kb = quiet_kb();
    kb.assert(stmt("p", &["a"]));
    assert!(kb.ask(&stmt("p", &["z"])).unwrap().is_empty());

    let ground = kb.ask(&stmt("p", &["a"])).unwrap();
    assert_eq!(ground.len(), 1);
    assert!(ground[0].bindings.is_empty());
}

#[test]
fn test_ask_rejects_non_fact_query() {
    let mut kb = quiet_kb();
    kb.assert(stmt("p", &["a"]));
    let err = kb.ask(&stmt("?rel", &["a"])).unwrap_err();
    assert_eq!(
        err,
        KbError::NotAskable {
            statement: "(?rel a)".into()
        }
    );
    assert_eq!(kb.fact_count(), 1);
}

#[test]
fn test_ask_sees_derived_facts() {
    let mut kb = quiet_kb();
    kb.assert(stmt("isa", &["cube1", "block"]));
    kb.assert(stmt("isa", &["pyramid1", "block"]));
    kb.assert(rule(
        &[stmt("isa", &["?x", "block"])],
        stmt("isa", &["?x", "thing"]),
    ));

    let answers = kb.ask(&stmt("isa", &["?y", "thing"])).unwrap();
    let names: Vec<String> = answers
        .iter()
        .map(|a| a.bindings.lookup("y").unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["cube1", "pyramid1"]);
}
