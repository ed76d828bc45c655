// SPDX-License-Identifier: PMPL-1.0-or-later

//! Printing and exporting knowledge bases

pub mod formatter;
pub mod output;

use crate::kanren::store::KnowledgeBase;
use anyhow::Result;
use std::path::Path;

pub use formatter::KbFormatter;
pub use output::{save_snapshot, KbSnapshot, SnapshotFormat};

/// Print a knowledge base to the console
pub fn print_kb(kb: &KnowledgeBase) {
    let formatter = KbFormatter::new();
    formatter.print(kb);
}

/// Save a snapshot, picking the format from the file extension
pub fn save_kb<P: AsRef<Path>>(kb: &KnowledgeBase, path: P) -> Result<()> {
    let path = path.as_ref();
    save_snapshot(kb, path, SnapshotFormat::from_path(path))
}
