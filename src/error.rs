// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the knowledge base

use thiserror::Error;

/// Errors reported to callers of the knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KbError {
    #[error("not askable: {statement} is not a fact query")]
    NotAskable { statement: String },

    #[error("rule with consequent {rhs} has no antecedents")]
    EmptyAntecedent { rhs: String },

    #[error("invalid statement: {0}")]
    InvalidStatement(String),

    #[error("knowledge base invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// A broken structural invariant of the store. These indicate a defect in
/// the store itself rather than bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("fact {0} is stored more than once")]
    DuplicateFact(String),

    #[error("rule {0} is stored more than once")]
    DuplicateRule(String),

    #[error("index entry for {0} does not point at its slot")]
    IndexMismatch(String),

    #[error("{entity} is justified by a retracted entity")]
    DanglingJustification { entity: String },

    #[error("{supporter} does not list {entity} among the entities it supports")]
    MissingBackReference { supporter: String, entity: String },

    #[error("{supporter} lists {entity} as a dependent without a matching justification")]
    DanglingBackReference { supporter: String, entity: String },

    #[error("{0} is neither asserted nor justified")]
    Unsupported(String),
}

pub type KbResult<T> = Result<T, KbError>;
