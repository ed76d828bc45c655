// SPDX-License-Identifier: PMPL-1.0-or-later

//! Serializable knowledge base snapshots

use crate::kanren::entity::{Justification, NodeId};
use crate::kanren::store::KnowledgeBase;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SnapshotFormat {
    Json,
    Yaml,
    Nickel,
}

impl SnapshotFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Some(SnapshotFormat::Json),
            "yaml" | "yml" => Some(SnapshotFormat::Yaml),
            "nickel" | "ncl" => Some(SnapshotFormat::Nickel),
            _ => None,
        }
    }

    /// Guess the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
            .unwrap_or(SnapshotFormat::Json)
    }

    pub fn serialize(&self, snapshot: &KbSnapshot) -> Result<String> {
        match self {
            SnapshotFormat::Json => Ok(serde_json::to_string_pretty(snapshot)?),
            SnapshotFormat::Yaml => Ok(serde_yaml::to_string(snapshot)?),
            SnapshotFormat::Nickel => Ok(format_snapshot_as_nickel(snapshot)),
        }
    }
}

/// A justification with both supporters rendered as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JustificationRecord {
    pub fact: String,
    pub rule: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactRecord {
    pub statement: String,
    pub asserted: bool,
    pub supported_by: Vec<JustificationRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleRecord {
    pub lhs: Vec<String>,
    pub rhs: String,
    pub asserted: bool,
    pub supported_by: Vec<JustificationRecord>,
}

/// Text projection of a knowledge base, in storage order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KbSnapshot {
    pub facts: Vec<FactRecord>,
    pub rules: Vec<RuleRecord>,
}

impl KbSnapshot {
    pub fn capture(kb: &KnowledgeBase) -> Self {
        let facts = kb
            .facts()
            .map(|(_, fact)| FactRecord {
                statement: fact.statement().to_string(),
                asserted: fact.asserted(),
                supported_by: records(kb, fact.supported_by()),
            })
            .collect();
        let rules = kb
            .rules()
            .map(|(_, rule)| RuleRecord {
                lhs: rule.lhs().iter().map(ToString::to_string).collect(),
                rhs: rule.rhs().to_string(),
                asserted: rule.asserted(),
                supported_by: records(kb, rule.supported_by()),
            })
            .collect();
        Self { facts, rules }
    }
}

fn records(kb: &KnowledgeBase, justifications: &[Justification]) -> Vec<JustificationRecord> {
    justifications
        .iter()
        .map(|j| JustificationRecord {
            fact: kb.describe(NodeId::Fact(j.fact)),
            rule: kb.describe(NodeId::Rule(j.rule)),
        })
        .collect()
}

/// Write a snapshot of `kb` to `path`
pub fn save_snapshot(kb: &KnowledgeBase, path: &Path, format: SnapshotFormat) -> Result<()> {
    let content = format.serialize(&KbSnapshot::capture(kb))?;
    fs::write(path, content).with_context(|| format!("writing snapshot {}", path.display()))
}

fn nickel_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('"');
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped.push('"');
    escaped
}

fn format_snapshot_as_nickel(snapshot: &KbSnapshot) -> String {
    let mut lines = Vec::new();
    lines.push("let knowledge_base = {".to_string());

    let facts: Vec<String> = snapshot
        .facts
        .iter()
        .map(|fact| {
            format!(
                "{{ statement = {}, asserted = {}, justifications = {} }}",
                nickel_string(&fact.statement),
                fact.asserted,
                fact.supported_by.len()
            )
        })
        .collect();
    lines.push(format!("  facts = [{}],", facts.join(", ")));

    let rules: Vec<String> = snapshot
        .rules
        .iter()
        .map(|rule| {
            let lhs: Vec<String> = rule.lhs.iter().map(|s| nickel_string(s)).collect();
            format!(
                "{{ lhs = [{}], rhs = {}, asserted = {}, justifications = {} }}",
                lhs.join(", "),
                nickel_string(&rule.rhs),
                rule.asserted,
                rule.supported_by.len()
            )
        })
        .collect();
    lines.push(format!("  rules = [{}],", rules.join(", ")));

    lines.push("}".to_string());
    lines.push("in knowledge_base".to_string());
    lines.join("\n")
}
