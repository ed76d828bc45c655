// SPDX-License-Identifier: PMPL-1.0-or-later

//! Shared configuration types for forward-kb

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much the engine reports about its own work.
///
/// `Normal` covers caller-facing operations (assert, retract, ask);
/// `Detailed` adds every insertion and inference attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Detailed,
}

impl Verbosity {
    /// Map a `-v` repeat count onto a level
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Verbosity::Normal,
            _ => Verbosity::Detailed,
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "quiet" | "silent" | "off" => Some(Verbosity::Quiet),
            "normal" | "info" => Some(Verbosity::Normal),
            "detailed" | "verbose" | "debug" => Some(Verbosity::Detailed),
            _ => None,
        }
    }

    /// Whether messages at `level` should be emitted
    pub fn shows(&self, level: Verbosity) -> bool {
        level != Verbosity::Quiet && level <= *self
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verbosity::Quiet => write!(f, "quiet"),
            Verbosity::Normal => write!(f, "normal"),
            Verbosity::Detailed => write!(f, "detailed"),
        }
    }
}

/// Engine configuration, passed to `KnowledgeBase::new`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub verbosity: Verbosity,
}

impl EngineConfig {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn quiet() -> Self {
        Self::new(Verbosity::Quiet)
    }
}
