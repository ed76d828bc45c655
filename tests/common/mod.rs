// SPDX-License-Identifier: PMPL-1.0-or-later

//! Helpers shared by the integration tests

#![allow(dead_code)]

use forward_kb::kanren::entity::Justification;
use forward_kb::kanren::{instantiate, match_statements, KnowledgeBase, Rule, Statement};
use forward_kb::EngineConfig;

pub fn stmt(predicate: &str, args: &[&str]) -> Statement {
    Statement::parse(predicate, args)
}

pub fn rule(lhs: &[Statement], rhs: Statement) -> Rule {
    Rule::new(lhs.to_vec(), rhs).expect("rule with antecedents")
}

pub fn quiet_kb() -> KnowledgeBase {
    KnowledgeBase::new(EngineConfig::quiet())
}

/// Every live (fact, rule) pair that unifies must have left its derivation
/// in the store, justified by exactly that pair.
pub fn assert_saturated(kb: &KnowledgeBase) {
    for (fact_id, fact) in kb.facts() {
        for (rule_id, rule) in kb.rules() {
            let Some(bindings) = match_statements(fact.statement(), &rule.lhs()[0]) else {
                continue;
            };
            let justification = Justification::new(fact_id, rule_id);
            let rhs = instantiate(rule.rhs(), &bindings);
            if rule.lhs().len() == 1 {
                let Some(derived) = kb.find_fact(&rhs) else {
                    panic!("{} and {} did not derive {}", fact, rule, rhs);
                };
                let supported = kb.fact(derived).unwrap().supported_by();
                assert!(
                    supported.contains(&justification),
                    "{} lacks justification from {} and {}",
                    rhs,
                    fact,
                    rule
                );
            } else {
                let rest = &rule.lhs()[1..];
                let lhs: Vec<Statement> = rest.iter().map(|s| instantiate(s, &bindings)).collect();
                let Some(derived) = kb.find_rule(&lhs, &rhs) else {
                    panic!("{} and {} left no residual rule", fact, rule);
                };
                let supported = kb.rule(derived).unwrap().supported_by();
                assert!(supported.contains(&justification));
            }
        }
    }
}
