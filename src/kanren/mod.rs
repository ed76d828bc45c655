// SPDX-License-Identifier: PMPL-1.0-or-later

//! miniKanren-style forward-chaining knowledge base
//!
//! Provides:
//! - **Terms and unification** over statements with logic variables
//! - **Knowledge store** of facts and rules with structural deduplication
//! - **Forward chaining** that saturates the store on every insertion
//! - **Truth maintenance** so retraction removes what only it supported
//! - **Program loading** from JSON or YAML documents

pub mod core;
pub mod entity;
pub mod inference;
pub mod program;
pub mod store;

pub use self::core::{instantiate, match_statements, Statement, Substitution, Term};
pub use entity::{Fact, FactId, Item, Justification, NodeId, Rule, RuleId};
pub use inference::InferenceEngine;
pub use program::{Program, StepOutcome};
pub use store::{Answer, KnowledgeBase, RetractOutcome, Retraction};
