// SPDX-License-Identifier: PMPL-1.0-or-later

//! Facts, rules and the justifications linking them
//!
//! Entities live in the knowledge base arena and refer to each other by
//! [`FactId`] / [`RuleId`]. Provenance fields are readable by anyone but
//! only the store mutates them.

use crate::error::{KbError, KbResult};
use crate::kanren::core::Statement;
use std::collections::BTreeSet;
use std::fmt;

/// Stable handle of a fact slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactId(pub(crate) usize);

/// Stable handle of a rule slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) usize);

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Either kind of handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Fact(FactId),
    Rule(RuleId),
}

/// One derivation: `fact` matched the first antecedent of `rule`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Justification {
    pub fact: FactId,
    pub rule: RuleId,
}

impl Justification {
    pub fn new(fact: FactId, rule: RuleId) -> Self {
        Self { fact, rule }
    }
}

/// Provenance shared by facts and rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Support {
    pub(crate) asserted: bool,
    pub(crate) supported_by: Vec<Justification>,
    pub(crate) supports_facts: BTreeSet<FactId>,
    pub(crate) supports_rules: BTreeSet<RuleId>,
}

impl Support {
    fn asserted() -> Self {
        Self {
            asserted: true,
            ..Self::default()
        }
    }

    fn derived(justification: Justification) -> Self {
        Self {
            asserted: false,
            supported_by: vec![justification],
            ..Self::default()
        }
    }

    /// Whether the entity has a reason to exist
    pub(crate) fn is_grounded(&self) -> bool {
        self.asserted || !self.supported_by.is_empty()
    }

    /// Record a justification unless the same pair is already present
    pub(crate) fn justify(&mut self, justification: Justification) {
        if !self.supported_by.contains(&justification) {
            self.supported_by.push(justification);
        }
    }

    pub(crate) fn mentions_fact(&self, fact: FactId) -> bool {
        self.supported_by.iter().any(|j| j.fact == fact)
    }

    pub(crate) fn mentions_rule(&self, rule: RuleId) -> bool {
        self.supported_by.iter().any(|j| j.rule == rule)
    }
}

/// A statement held in the knowledge base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    statement: Statement,
    pub(crate) support: Support,
}

impl Fact {
    /// A caller-supplied fact
    pub fn new(statement: Statement) -> Self {
        Self {
            statement,
            support: Support::asserted(),
        }
    }

    pub(crate) fn derived(statement: Statement, justification: Justification) -> Self {
        Self {
            statement,
            support: Support::derived(justification),
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn asserted(&self) -> bool {
        self.support.asserted
    }

    pub fn supported_by(&self) -> &[Justification] {
        &self.support.supported_by
    }

    pub fn supports_facts(&self) -> &BTreeSet<FactId> {
        &self.support.supports_facts
    }

    pub fn supports_rules(&self) -> &BTreeSet<RuleId> {
        &self.support.supports_rules
    }
}

impl From<Statement> for Fact {
    fn from(statement: Statement) -> Self {
        Fact::new(statement)
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.statement)
    }
}

/// An if-then rule: when every `lhs` statement holds, `rhs` holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    lhs: Vec<Statement>,
    rhs: Statement,
    pub(crate) support: Support,
}

impl Rule {
    /// A caller-supplied rule; `lhs` must not be empty
    pub fn new(lhs: Vec<Statement>, rhs: Statement) -> KbResult<Self> {
        if lhs.is_empty() {
            return Err(KbError::EmptyAntecedent {
                rhs: rhs.to_string(),
            });
        }
        Ok(Self {
            lhs,
            rhs,
            support: Support::asserted(),
        })
    }

    /// Residual rule produced by inference. Callers guarantee a non-empty `lhs`.
    pub(crate) fn derived(
        lhs: Vec<Statement>,
        rhs: Statement,
        justification: Justification,
    ) -> Self {
        debug_assert!(!lhs.is_empty(), "residual rule without antecedents");
        Self {
            lhs,
            rhs,
            support: Support::derived(justification),
        }
    }

    pub fn lhs(&self) -> &[Statement] {
        &self.lhs
    }

    pub fn rhs(&self) -> &Statement {
        &self.rhs
    }

    pub fn asserted(&self) -> bool {
        self.support.asserted
    }

    pub fn supported_by(&self) -> &[Justification] {
        &self.support.supported_by
    }

    pub fn supports_facts(&self) -> &BTreeSet<FactId> {
        &self.support.supports_facts
    }

    pub fn supports_rules(&self) -> &BTreeSet<RuleId> {
        &self.support.supports_rules
    }

    /// Structural identity of the rule, ignoring provenance
    pub(crate) fn key(&self) -> RuleKey {
        (self.lhs.clone(), self.rhs.clone())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for stmt in &self.lhs {
            write!(f, "{} ", stmt)?;
        }
        write!(f, "-> {})", self.rhs)
    }
}

pub(crate) type RuleKey = (Vec<Statement>, Statement);

/// A fact or a rule, as handed to `assert` and `retract`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Fact(Fact),
    Rule(Rule),
}

impl Item {
    /// Drop any provenance so the item reads as a fresh caller assertion
    pub(crate) fn into_assertion(self) -> Self {
        match self {
            Item::Fact(fact) => Item::Fact(Fact::new(fact.statement)),
            Item::Rule(rule) => Item::Rule(Rule {
                lhs: rule.lhs,
                rhs: rule.rhs,
                support: Support::asserted(),
            }),
        }
    }
}

impl From<Fact> for Item {
    fn from(fact: Fact) -> Self {
        Item::Fact(fact)
    }
}

impl From<Rule> for Item {
    fn from(rule: Rule) -> Self {
        Item::Rule(rule)
    }
}

impl From<Statement> for Item {
    fn from(statement: Statement) -> Self {
        Item::Fact(Fact::new(statement))
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Fact(fact) => write!(f, "fact {}", fact),
            Item::Rule(rule) => write!(f, "rule {}", rule),
        }
    }
}
