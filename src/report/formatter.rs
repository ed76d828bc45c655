// SPDX-License-Identifier: PMPL-1.0-or-later

//! Console formatting for knowledge bases and program runs

use crate::error::KbError;
use crate::kanren::core::Statement;
use crate::kanren::entity::{Justification, NodeId};
use crate::kanren::program::StepOutcome;
use crate::kanren::store::{Answer, KnowledgeBase, RetractOutcome, Retraction};
use colored::*;

pub struct KbFormatter;

impl KbFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn print(&self, kb: &KnowledgeBase) {
        println!("\n{}", "=== KNOWLEDGE BASE ===".bold().cyan());
        println!();

        println!("{} ({})", "FACTS".bold().yellow(), kb.fact_count());
        for (_, fact) in kb.facts() {
            let marker = if fact.asserted() {
                "asserted".green()
            } else {
                "derived".blue()
            };
            println!("  {} [{}]", fact.statement().to_string().bold(), marker);
            self.print_justifications(kb, fact.supported_by());
        }
        println!();

        println!("{} ({})", "RULES".bold().yellow(), kb.rule_count());
        for (_, rule) in kb.rules() {
            let marker = if rule.asserted() {
                "asserted".green()
            } else {
                "residual".blue()
            };
            println!("  {} [{}]", rule.to_string().bold(), marker);
            self.print_justifications(kb, rule.supported_by());
        }
    }

    fn print_justifications(&self, kb: &KnowledgeBase, justifications: &[Justification]) {
        for j in justifications {
            println!(
                "    {} {} {} {}",
                "from".dimmed(),
                kb.describe(NodeId::Fact(j.fact)),
                "via".dimmed(),
                kb.describe(NodeId::Rule(j.rule))
            );
        }
    }

    pub fn print_outcome(&self, kb: &KnowledgeBase, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Asserted { item } => {
                println!("{} {}", "Asserted".green().bold(), item);
            }
            StepOutcome::Answered { query, answers } => self.print_answers(kb, query, answers),
            StepOutcome::Retracted { item, retraction } => {
                self.print_retraction(item.to_string().as_str(), retraction)
            }
        }
    }

    pub fn print_answers(
        &self,
        kb: &KnowledgeBase,
        query: &Statement,
        answers: &Result<Vec<Answer>, KbError>,
    ) {
        println!("{} {}", "Asking".cyan().bold(), query);
        match answers {
            Err(err) => println!("  {}", err.to_string().red()),
            Ok(answers) if answers.is_empty() => println!("  {}", "no".yellow()),
            Ok(answers) => {
                for answer in answers {
                    let bindings = if answer.bindings.is_empty() {
                        "yes".to_string()
                    } else {
                        answer.bindings.to_string()
                    };
                    println!(
                        "  {}  {} {}",
                        bindings.bold(),
                        "from".dimmed(),
                        kb.describe(NodeId::Fact(answer.fact))
                    );
                }
            }
        }
    }

    pub fn print_retraction(&self, item: &str, retraction: &Retraction) {
        let status = match retraction.outcome {
            RetractOutcome::Absent => "not present".yellow(),
            RetractOutcome::Withdrawn => "still supported, assertion withdrawn".blue(),
            RetractOutcome::Removed => format!("removed {}", retraction.removed_count()).red(),
        };
        println!("{} {}: {}", "Retracted".red().bold(), item, status);
        for fact in &retraction.removed_facts {
            println!("    - {}", fact.to_string().dimmed());
        }
        for rule in &retraction.removed_rules {
            println!("    - {}", rule.to_string().dimmed());
        }
    }
}

impl Default for KbFormatter {
    fn default() -> Self {
        Self::new()
    }
}
