// SPDX-License-Identifier: PMPL-1.0-or-later

//! The knowledge base: fact and rule storage, saturation and retraction
//!
//! Entities live in two arenas of slots addressed by [`FactId`] and
//! [`RuleId`]. Ids are never reused; retraction empties a slot. Iterating the
//! live slots therefore yields entities in insertion order.
//!
//! Every fresh insertion goes onto a FIFO agenda. Draining the agenda fires
//! the new entity against each counterpart that already existed when it was
//! inserted, and every derivation re-enters through the same insertion path,
//! so the store ends up closed under its rules without recursing.

use crate::error::{InvariantViolation, KbError, KbResult};
use crate::kanren::core::{match_statements, Statement, Substitution};
use crate::kanren::entity::{
    Fact, FactId, Item, Justification, NodeId, Rule, RuleId, RuleKey, Support,
};
use crate::kanren::inference::InferenceEngine;
use crate::types::{EngineConfig, Verbosity};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tracing::{debug, info, warn};

/// One answer to [`KnowledgeBase::ask`]
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub bindings: Substitution,
    /// The stored fact the query matched
    pub fact: FactId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetractOutcome {
    /// Nothing structurally equal was stored
    Absent,
    /// Still justified by inference; only the asserted flag was cleared
    Withdrawn,
    /// Removed along with everything that depended solely on it
    Removed,
}

/// What a call to [`KnowledgeBase::retract`] did
#[derive(Debug, Clone, PartialEq)]
pub struct Retraction {
    pub outcome: RetractOutcome,
    /// Removed facts, in removal order
    pub removed_facts: Vec<Fact>,
    /// Removed rules, in removal order
    pub removed_rules: Vec<Rule>,
}

impl Retraction {
    fn new(outcome: RetractOutcome) -> Self {
        Self {
            outcome,
            removed_facts: Vec::new(),
            removed_rules: Vec::new(),
        }
    }

    pub fn removed_count(&self) -> usize {
        self.removed_facts.len() + self.removed_rules.len()
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    node: NodeId,
    /// Slot count of the opposite arena when `node` was inserted. Only
    /// counterparts below it are fired here; later ones fire on their own turn.
    horizon: usize,
}

/// Work queue of freshly inserted entities awaiting inference
#[derive(Debug, Default)]
pub(crate) struct Agenda {
    queue: VecDeque<Pending>,
}

impl Agenda {
    fn push(&mut self, node: NodeId, horizon: usize) {
        self.queue.push_back(Pending { node, horizon });
    }

    fn pop(&mut self) -> Option<Pending> {
        self.queue.pop_front()
    }
}

enum Removed {
    Fact(Fact),
    Rule(Rule),
}

#[derive(Debug, Default)]
pub struct KnowledgeBase {
    config: EngineConfig,
    facts: Vec<Option<Fact>>,
    rules: Vec<Option<Rule>>,
    fact_index: HashMap<Statement, FactId>,
    rule_index: HashMap<RuleKey, RuleId>,
    engine: InferenceEngine,
}

impl KnowledgeBase {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn shows(&self, level: Verbosity) -> bool {
        self.config.verbosity.shows(level)
    }

    /// Assert a fact or rule on behalf of a caller.
    ///
    /// Provenance on the argument is ignored: the stored entity ends up
    /// asserted whether it was new or already present.
    pub fn assert(&mut self, item: impl Into<Item>) -> NodeId {
        let item = item.into().into_assertion();
        if self.shows(Verbosity::Normal) {
            info!("Asserting {}", item);
        }
        let node = self.add(item);
        self.debug_verify();
        node
    }

    /// Insert or merge `item`, then saturate
    pub(crate) fn add(&mut self, item: Item) -> NodeId {
        let mut agenda = Agenda::default();
        let node = self.admit(item, &mut agenda);
        self.saturate(&mut agenda);
        node
    }

    /// Insert `item` if it is new, queueing it for inference; otherwise merge
    /// its provenance into the stored twin. Returns the canonical id.
    pub(crate) fn admit(&mut self, item: Item, agenda: &mut Agenda) -> NodeId {
        if self.shows(Verbosity::Detailed) {
            debug!("Adding {}", item);
        }
        match item {
            Item::Fact(fact) => NodeId::Fact(self.admit_fact(fact, agenda)),
            Item::Rule(rule) => NodeId::Rule(self.admit_rule(rule, agenda)),
        }
    }

    fn admit_fact(&mut self, fact: Fact, agenda: &mut Agenda) -> FactId {
        if let Some(&id) = self.fact_index.get(fact.statement()) {
            if let Some(existing) = self.support_mut(NodeId::Fact(id)) {
                merge(existing, fact.support);
            }
            return id;
        }
        let id = FactId(self.facts.len());
        self.fact_index.insert(fact.statement().clone(), id);
        self.facts.push(Some(fact));
        agenda.push(NodeId::Fact(id), self.rules.len());
        id
    }

    fn admit_rule(&mut self, rule: Rule, agenda: &mut Agenda) -> RuleId {
        let key = rule.key();
        if let Some(&id) = self.rule_index.get(&key) {
            if let Some(existing) = self.support_mut(NodeId::Rule(id)) {
                merge(existing, rule.support);
            }
            return id;
        }
        let id = RuleId(self.rules.len());
        self.rule_index.insert(key, id);
        self.rules.push(Some(rule));
        agenda.push(NodeId::Rule(id), self.facts.len());
        id
    }

    fn saturate(&mut self, agenda: &mut Agenda) {
        let engine = self.engine;
        while let Some(pending) = agenda.pop() {
            match pending.node {
                NodeId::Fact(fact) => {
                    let rules: Vec<RuleId> = self
                        .rules()
                        .map(|(id, _)| id)
                        .take_while(|id| id.0 < pending.horizon)
                        .collect();
                    for rule in rules {
                        engine.fire(fact, rule, self, agenda);
                    }
                }
                NodeId::Rule(rule) => {
                    let facts: Vec<FactId> = self
                        .facts()
                        .map(|(id, _)| id)
                        .take_while(|id| id.0 < pending.horizon)
                        .collect();
                    for fact in facts {
                        engine.fire(fact, rule, self, agenda);
                    }
                }
            }
        }
    }

    /// Record that `node` exists because of `justification`
    pub(crate) fn register_support(&mut self, justification: Justification, node: NodeId) {
        for supporter in [
            NodeId::Fact(justification.fact),
            NodeId::Rule(justification.rule),
        ] {
            if let Some(support) = self.support_mut(supporter) {
                link(support, node);
            }
        }
    }

    /// Query the stored facts with a pattern.
    ///
    /// Each stored fact unifying with `query` yields one answer, in storage
    /// order. An empty result means nothing matched.
    pub fn ask(&self, query: &Statement) -> KbResult<Vec<Answer>> {
        if self.shows(Verbosity::Normal) {
            info!("Asking {}", query);
        }
        if !query.is_fact_query() {
            if self.shows(Verbosity::Normal) {
                warn!("Invalid ask: {}", query);
            }
            return Err(KbError::NotAskable {
                statement: query.to_string(),
            });
        }

        Ok(self
            .facts()
            .filter_map(|(fact, stored)| {
                let bindings = match_statements(query, stored.statement())?;
                Some(Answer { bindings, fact })
            })
            .collect())
    }

    /// Retract a fact or rule.
    ///
    /// Only an entity without justifications is removed; removal cascades to
    /// every dependent left without justification that was not itself
    /// asserted. A still-justified entity just stops counting as asserted.
    ///
    /// Justifications forming a cycle keep each other alive. With
    /// `p(?x) -> p(?x)`, or `p(?x) -> q(?x)` together with `q(?x) -> p(?x)`,
    /// retracting `p(a)` returns [`RetractOutcome::Withdrawn`] and `p(a)`
    /// still answers [`ask`](Self::ask). Retracting one of the rules in the
    /// cycle removes the facts.
    pub fn retract(&mut self, item: impl Into<Item>) -> Retraction {
        let item = item.into();
        if self.shows(Verbosity::Normal) {
            info!("Retracting {}", item);
        }
        let target = match &item {
            Item::Fact(fact) => self.find_fact(fact.statement()).map(NodeId::Fact),
            Item::Rule(rule) => self.find_rule(rule.lhs(), rule.rhs()).map(NodeId::Rule),
        };
        let Some(target) = target else {
            return Retraction::new(RetractOutcome::Absent);
        };

        let justified = self
            .support(target)
            .is_some_and(|support| !support.supported_by.is_empty());
        let retraction = if justified {
            if let Some(support) = self.support_mut(target) {
                support.asserted = false;
            }
            Retraction::new(RetractOutcome::Withdrawn)
        } else {
            self.cascade(target)
        };
        self.debug_verify();
        retraction
    }

    fn cascade(&mut self, target: NodeId) -> Retraction {
        let mut retraction = Retraction::new(RetractOutcome::Removed);
        let mut worklist = VecDeque::from([target]);

        while let Some(node) = worklist.pop_front() {
            let removable = match self.support(node) {
                Some(support) => {
                    support.supported_by.is_empty() && (node == target || !support.asserted)
                }
                None => false,
            };
            if !removable {
                continue;
            }
            let Some(removed) = self.take(node) else {
                continue;
            };
            let support = match &removed {
                Removed::Fact(fact) => &fact.support,
                Removed::Rule(rule) => &rule.support,
            };

            for justification in &support.supported_by {
                self.unlink(NodeId::Fact(justification.fact), node);
                self.unlink(NodeId::Rule(justification.rule), node);
            }

            let dependents = support
                .supports_facts
                .iter()
                .map(|&id| NodeId::Fact(id))
                .chain(support.supports_rules.iter().map(|&id| NodeId::Rule(id)));
            for dependent in dependents {
                for partner in self.drop_justifications(dependent, node) {
                    self.unlink(partner, dependent);
                }
                worklist.push_back(dependent);
            }

            if self.shows(Verbosity::Detailed) {
                match &removed {
                    Removed::Fact(fact) => debug!("Removed fact {}", fact),
                    Removed::Rule(rule) => debug!("Removed rule {}", rule),
                }
            }
            match removed {
                Removed::Fact(fact) => retraction.removed_facts.push(fact),
                Removed::Rule(rule) => retraction.removed_rules.push(rule),
            }
        }

        retraction
    }

    /// Strip every justification of `dependent` that mentions `removed`.
    /// Returns the other supporters of the stripped pairs that `dependent`
    /// no longer references at all.
    fn drop_justifications(&mut self, dependent: NodeId, removed: NodeId) -> Vec<NodeId> {
        let Some(support) = self.support_mut(dependent) else {
            return Vec::new();
        };
        let mentions = |j: &Justification| match removed {
            NodeId::Fact(id) => j.fact == id,
            NodeId::Rule(id) => j.rule == id,
        };
        let (dropped, kept): (Vec<Justification>, Vec<Justification>) =
            support.supported_by.iter().copied().partition(mentions);
        support.supported_by = kept;

        let mut partners = Vec::new();
        for justification in dropped {
            let partner = match removed {
                NodeId::Fact(_) if !support.mentions_rule(justification.rule) => {
                    NodeId::Rule(justification.rule)
                }
                NodeId::Rule(_) if !support.mentions_fact(justification.fact) => {
                    NodeId::Fact(justification.fact)
                }
                _ => continue,
            };
            if !partners.contains(&partner) {
                partners.push(partner);
            }
        }
        partners
    }

    fn unlink(&mut self, supporter: NodeId, dependent: NodeId) {
        if let Some(support) = self.support_mut(supporter) {
            match dependent {
                NodeId::Fact(id) => support.supports_facts.remove(&id),
                NodeId::Rule(id) => support.supports_rules.remove(&id),
            };
        }
    }

    fn take(&mut self, node: NodeId) -> Option<Removed> {
        match node {
            NodeId::Fact(id) => {
                let fact = self.facts.get_mut(id.0)?.take()?;
                self.fact_index.remove(fact.statement());
                Some(Removed::Fact(fact))
            }
            NodeId::Rule(id) => {
                let rule = self.rules.get_mut(id.0)?.take()?;
                self.rule_index.remove(&rule.key());
                Some(Removed::Rule(rule))
            }
        }
    }

    fn support(&self, node: NodeId) -> Option<&Support> {
        match node {
            NodeId::Fact(id) => self.fact(id).map(|fact| &fact.support),
            NodeId::Rule(id) => self.rule(id).map(|rule| &rule.support),
        }
    }

    fn support_mut(&mut self, node: NodeId) -> Option<&mut Support> {
        match node {
            NodeId::Fact(id) => self
                .facts
                .get_mut(id.0)?
                .as_mut()
                .map(|fact| &mut fact.support),
            NodeId::Rule(id) => self
                .rules
                .get_mut(id.0)?
                .as_mut()
                .map(|rule| &mut rule.support),
        }
    }

    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(id.0)?.as_ref()
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.0)?.as_ref()
    }

    /// Live facts in insertion order
    pub fn facts(&self) -> impl Iterator<Item = (FactId, &Fact)> + '_ {
        self.facts
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|fact| (FactId(i), fact)))
    }

    /// Live rules in insertion order
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> + '_ {
        self.rules
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|rule| (RuleId(i), rule)))
    }

    pub fn find_fact(&self, statement: &Statement) -> Option<FactId> {
        self.fact_index.get(statement).copied()
    }

    pub fn find_rule(&self, lhs: &[Statement], rhs: &Statement) -> Option<RuleId> {
        self.rule_index.get(&(lhs.to_vec(), rhs.clone())).copied()
    }

    pub fn contains_fact(&self, statement: &Statement) -> bool {
        self.fact_index.contains_key(statement)
    }

    pub fn fact_count(&self) -> usize {
        self.fact_index.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rule_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fact_count() == 0 && self.rule_count() == 0
    }

    /// Human-readable name of a live entity
    pub fn describe(&self, node: NodeId) -> String {
        match node {
            NodeId::Fact(id) => self
                .fact(id)
                .map(|fact| fact.to_string())
                .unwrap_or_else(|| format!("<retracted {}>", id)),
            NodeId::Rule(id) => self
                .rule(id)
                .map(|rule| rule.to_string())
                .unwrap_or_else(|| format!("<retracted {}>", id)),
        }
    }

    /// Check the structural invariants of the store
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        for (id, fact) in self.facts() {
            match self.fact_index.get(fact.statement()) {
                Some(&indexed) if indexed == id => {}
                Some(_) => return Err(InvariantViolation::DuplicateFact(fact.to_string())),
                None => return Err(InvariantViolation::IndexMismatch(fact.to_string())),
            }
        }
        for (id, rule) in self.rules() {
            match self.rule_index.get(&rule.key()) {
                Some(&indexed) if indexed == id => {}
                Some(_) => return Err(InvariantViolation::DuplicateRule(rule.to_string())),
                None => return Err(InvariantViolation::IndexMismatch(rule.to_string())),
            }
        }
        if self.fact_index.len() != self.facts().count() {
            return Err(InvariantViolation::IndexMismatch("fact index".into()));
        }
        if self.rule_index.len() != self.rules().count() {
            return Err(InvariantViolation::IndexMismatch("rule index".into()));
        }

        let nodes = self
            .facts()
            .map(|(id, _)| NodeId::Fact(id))
            .chain(self.rules().map(|(id, _)| NodeId::Rule(id)));
        for node in nodes {
            if let Some(support) = self.support(node) {
                self.check_justifications(node, support)?;
                self.check_dependents(node, support)?;
            }
        }
        Ok(())
    }

    fn check_justifications(
        &self,
        node: NodeId,
        support: &Support,
    ) -> Result<(), InvariantViolation> {
        if !support.is_grounded() {
            return Err(InvariantViolation::Unsupported(self.describe(node)));
        }
        for justification in &support.supported_by {
            for supporter in [
                NodeId::Fact(justification.fact),
                NodeId::Rule(justification.rule),
            ] {
                let Some(supporter_support) = self.support(supporter) else {
                    return Err(InvariantViolation::DanglingJustification {
                        entity: self.describe(node),
                    });
                };
                let listed = match node {
                    NodeId::Fact(id) => supporter_support.supports_facts.contains(&id),
                    NodeId::Rule(id) => supporter_support.supports_rules.contains(&id),
                };
                if !listed {
                    return Err(InvariantViolation::MissingBackReference {
                        supporter: self.describe(supporter),
                        entity: self.describe(node),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_dependents(&self, node: NodeId, support: &Support) -> Result<(), InvariantViolation> {
        let dependents = support
            .supports_facts
            .iter()
            .map(|&id| NodeId::Fact(id))
            .chain(support.supports_rules.iter().map(|&id| NodeId::Rule(id)));
        for dependent in dependents {
            let justified = self.support(dependent).is_some_and(|dep| match node {
                NodeId::Fact(id) => dep.mentions_fact(id),
                NodeId::Rule(id) => dep.mentions_rule(id),
            });
            if !justified {
                return Err(InvariantViolation::DanglingBackReference {
                    supporter: self.describe(node),
                    entity: self.describe(dependent),
                });
            }
        }
        Ok(())
    }

    fn debug_verify(&self) {
        if cfg!(debug_assertions) {
            if let Err(violation) = self.verify() {
                panic!("{}", violation);
            }
        }
    }
}

fn merge(existing: &mut Support, incoming: Support) {
    if incoming.supported_by.is_empty() {
        existing.asserted = true;
    } else {
        for justification in incoming.supported_by {
            existing.justify(justification);
        }
    }
}

fn link(support: &mut Support, dependent: NodeId) {
    match dependent {
        NodeId::Fact(id) => support.supports_facts.insert(id),
        NodeId::Rule(id) => support.supports_rules.insert(id),
    };
}

impl fmt::Display for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Knowledge Base:")?;
        for (_, fact) in self.facts() {
            writeln!(f, "{}", fact)?;
        }
        for (_, rule) in self.rules() {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}
