// SPDX-License-Identifier: PMPL-1.0-or-later

//! Forward-chaining inference step

use crate::kanren::core::{instantiate, match_statements};
use crate::kanren::entity::{Fact, FactId, Item, Justification, Rule, RuleId};
use crate::kanren::store::{Agenda, KnowledgeBase};
use crate::types::Verbosity;
use tracing::debug;

/// Applies one rule to one fact. Holds no state; the knowledge base calls
/// it for every fresh (fact, rule) pairing.
#[derive(Debug, Default, Clone, Copy)]
pub struct InferenceEngine;

impl InferenceEngine {
    /// Try to discharge the first antecedent of `rule` with `fact`.
    ///
    /// On a match the rule either yields its instantiated consequent (last
    /// antecedent) or a residual rule over the remaining antecedents. The
    /// result goes back through the store and is linked to both supporters.
    pub(crate) fn fire(
        &self,
        fact_id: FactId,
        rule_id: RuleId,
        kb: &mut KnowledgeBase,
        agenda: &mut Agenda,
    ) {
        let (Some(fact), Some(rule)) = (kb.fact(fact_id), kb.rule(rule_id)) else {
            return;
        };
        if kb.shows(Verbosity::Detailed) {
            debug!("Attempting to infer from {} and {}", fact.statement(), rule);
        }

        let Some(bindings) = rule
            .lhs()
            .first()
            .and_then(|first| match_statements(fact.statement(), first))
        else {
            return;
        };

        let justification = Justification::new(fact_id, rule_id);
        let derived = match rule.lhs() {
            [_] => Item::Fact(Fact::derived(instantiate(rule.rhs(), &bindings), justification)),
            [_, rest @ ..] => Item::Rule(Rule::derived(
                rest.iter().map(|s| instantiate(s, &bindings)).collect(),
                instantiate(rule.rhs(), &bindings),
                justification,
            )),
            [] => return,
        };

        let node = kb.admit(derived, agenda);
        kb.register_support(justification, node);
    }
}
