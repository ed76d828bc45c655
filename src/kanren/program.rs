// SPDX-License-Identifier: PMPL-1.0-or-later

//! Declarative program loader
//!
//! A program lists initial facts and rules plus an ordered script of
//! assert / ask / retract steps. Documents are JSON, or YAML when the file
//! extension says so. Terms are written either as shorthand strings
//! (`"?x"` is a variable, anything else an atom), bare integers, or tagged
//! objects such as `{"type": "compound", "functor": "f", "args": [...]}`.

use crate::error::KbError;
use crate::kanren::core::{Statement, Term};
use crate::kanren::entity::{Fact, Item, Rule};
use crate::kanren::store::{Answer, KnowledgeBase, Retraction};
use crate::types::EngineConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct TermSpec {
    pub functor: String,
    #[serde(default)]
    pub args: Vec<TermArg>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TermArg {
    Int(i64),
    Symbol(String),
    Tagged(TaggedArg),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TaggedArg {
    Atom {
        value: String,
    },
    Var {
        name: String,
    },
    Int {
        value: i64,
    },
    Compound {
        functor: String,
        #[serde(default)]
        args: Vec<TermArg>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub lhs: Vec<TermSpec>,
    pub rhs: TermSpec,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSpec {
    Fact(TermSpec),
    Rule(RuleSpec),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Assert(ItemSpec),
    Ask(TermSpec),
    Retract(ItemSpec),
}

impl TermSpec {
    pub fn to_statement(&self) -> Result<Statement, KbError> {
        if self.functor.is_empty() {
            return Err(KbError::InvalidStatement("empty functor".into()));
        }
        let args = self
            .args
            .iter()
            .map(TermArg::to_term)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Statement::new(&self.functor, args))
    }
}

impl TermArg {
    fn to_term(&self) -> Result<Term, KbError> {
        match self {
            TermArg::Int(value) => Ok(Term::Int(*value)),
            TermArg::Symbol(symbol) => {
                if symbol.is_empty() || symbol == "?" {
                    return Err(KbError::InvalidStatement(format!(
                        "invalid symbol {:?}",
                        symbol
                    )));
                }
                Ok(Term::parse_symbol(symbol))
            }
            TermArg::Tagged(TaggedArg::Atom { value }) => Ok(Term::atom(value)),
            TermArg::Tagged(TaggedArg::Var { name }) => {
                if name.trim_start_matches('?').is_empty() {
                    return Err(KbError::InvalidStatement("unnamed variable".into()));
                }
                Ok(Term::var(name))
            }
            TermArg::Tagged(TaggedArg::Int { value }) => Ok(Term::Int(*value)),
            TermArg::Tagged(TaggedArg::Compound { functor, args }) => {
                if functor.is_empty() {
                    return Err(KbError::InvalidStatement("compound without functor".into()));
                }
                let args = args
                    .iter()
                    .map(TermArg::to_term)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Term::compound(functor, args))
            }
        }
    }
}

impl RuleSpec {
    pub fn to_rule(&self) -> Result<Rule, KbError> {
        let lhs = self
            .lhs
            .iter()
            .map(TermSpec::to_statement)
            .collect::<Result<Vec<_>, _>>()?;
        Rule::new(lhs, self.rhs.to_statement()?)
    }

    fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("#{}", index + 1))
    }
}

impl ItemSpec {
    pub fn to_item(&self) -> Result<Item, KbError> {
        match self {
            ItemSpec::Fact(spec) => Ok(Item::Fact(Fact::new(spec.to_statement()?))),
            ItemSpec::Rule(spec) => Ok(Item::Rule(spec.to_rule()?)),
        }
    }
}

/// A step with its statements already converted
#[derive(Debug, Clone)]
enum Action {
    Assert(Item),
    Ask(Statement),
    Retract(Item),
}

/// Result of executing one program step
#[derive(Debug, Clone)]
pub enum StepOutcome {
    Asserted {
        item: Item,
    },
    Answered {
        query: Statement,
        answers: Result<Vec<Answer>, KbError>,
    },
    Retracted {
        item: Item,
        retraction: Retraction,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub config: Option<EngineConfig>,
    #[serde(default)]
    pub facts: Vec<TermSpec>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    /// Steps are single-key maps (`ask: {...}`) in YAML as well as JSON
    #[serde(
        default,
        deserialize_with = "serde_yaml::with::singleton_map_recursive::deserialize"
    )]
    pub steps: Vec<Step>,
}

impl Program {
    /// Load a program from disk; `.yaml` / `.yml` files are parsed as YAML,
    /// everything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading program {}", path.display()))?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);
        let program = if is_yaml {
            Self::from_yaml_str(&data)
        } else {
            Self::from_json_str(&data)
        };
        program.with_context(|| format!("loading program {}", path.display()))
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        serde_json::from_str(data).context("parsing program JSON")
    }

    pub fn from_yaml_str(data: &str) -> Result<Self> {
        serde_yaml::from_str(data).context("parsing program YAML")
    }

    pub fn engine_config(&self) -> EngineConfig {
        self.config.unwrap_or_default()
    }

    pub fn build_facts(&self) -> Result<Vec<Fact>> {
        self.facts
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                spec.to_statement()
                    .map(Fact::new)
                    .with_context(|| format!("fact #{}", i + 1))
            })
            .collect()
    }

    pub fn build_rules(&self) -> Result<Vec<Rule>> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                spec.to_rule()
                    .with_context(|| format!("rule {}", spec.label(i)))
            })
            .collect()
    }

    fn build_steps(&self) -> Result<Vec<Action>> {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let action = match step {
                    Step::Assert(spec) => spec.to_item().map(Action::Assert),
                    Step::Ask(spec) => spec.to_statement().map(Action::Ask),
                    Step::Retract(spec) => spec.to_item().map(Action::Retract),
                };
                action.with_context(|| format!("step #{}", i + 1))
            })
            .collect()
    }

    /// Convert every statement without touching a knowledge base
    pub fn validate(&self) -> Result<()> {
        self.build_facts()?;
        self.build_rules()?;
        self.build_steps()?;
        Ok(())
    }

    /// Assert the initial facts, then the initial rules
    pub fn apply_to_kb(&self, kb: &mut KnowledgeBase) -> Result<()> {
        let facts = self.build_facts()?;
        let rules = self.build_rules()?;
        for fact in facts {
            kb.assert(fact);
        }
        for rule in rules {
            kb.assert(rule);
        }
        Ok(())
    }

    /// Apply the program and execute its steps in order.
    ///
    /// Everything is converted up front, so an invalid program leaves the
    /// knowledge base untouched.
    pub fn run(&self, kb: &mut KnowledgeBase) -> Result<Vec<StepOutcome>> {
        let actions = self.build_steps()?;
        self.apply_to_kb(kb)?;

        let outcomes = actions
            .into_iter()
            .map(|action| match action {
                Action::Assert(item) => {
                    kb.assert(item.clone());
                    StepOutcome::Asserted { item }
                }
                Action::Ask(query) => {
                    let answers = kb.ask(&query);
                    StepOutcome::Answered { query, answers }
                }
                Action::Retract(item) => {
                    let retraction = kb.retract(item.clone());
                    StepOutcome::Retracted { item, retraction }
                }
            })
            .collect();
        kb.verify()
            .map_err(KbError::from)
            .context("knowledge base left inconsistent")?;
        Ok(outcomes)
    }
}
