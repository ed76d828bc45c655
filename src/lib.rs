// SPDX-License-Identifier: PMPL-1.0-or-later

//! forward-kb: a forward-chaining knowledge base with truth maintenance.
//!
//! Facts and if-then rules are asserted into a [`KnowledgeBase`], which
//! saturates itself after every insertion and records, for each derived
//! fact or residual rule, the (fact, rule) pairs that produced it. Those
//! justifications drive retraction: removing a root entity also removes
//! everything that depended solely on it.
//!
//! ```
//! use forward_kb::{KnowledgeBase, Rule, Statement};
//!
//! let mut kb = KnowledgeBase::default();
//! kb.assert(Statement::parse("isa", &["cube1", "block"]));
//! kb.assert(Rule::new(
//!     vec![Statement::parse("isa", &["?x", "block"])],
//!     Statement::parse("isa", &["?x", "thing"]),
//! ).unwrap());
//!
//! let answers = kb.ask(&Statement::parse("isa", &["?y", "thing"])).unwrap();
//! assert_eq!(answers.len(), 1);
//! ```

pub mod error;
pub mod kanren;
pub mod report;
pub mod types;

pub use error::{InvariantViolation, KbError};
pub use kanren::{
    Answer, Fact, FactId, Item, KnowledgeBase, NodeId, Program, RetractOutcome, Retraction, Rule,
    RuleId, Statement, Substitution, Term,
};
pub use types::{EngineConfig, Verbosity};
