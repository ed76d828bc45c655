// SPDX-License-Identifier: PMPL-1.0-or-later

//! Loading programs from disk and exporting snapshots

mod common;

use common::*;
use forward_kb::kanren::{Program, StepOutcome};
use forward_kb::report::{self, KbSnapshot, SnapshotFormat};
use forward_kb::{RetractOutcome, Verbosity};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const FAMILY_JSON: &str = r#"{
    "config": {"verbosity": "quiet"},
    "facts": [
        {"functor": "parent", "args": ["tom", "bob"]},
        {"functor": "parent", "args": ["bob", "ann"]}
    ],
    "rules": [
        {"name": "grandparent",
         "lhs": [{"functor": "parent", "args": ["?x", "?y"]},
                 {"functor": "parent", "args": ["?y", "?z"]}],
         "rhs": {"functor": "grandparent", "args": ["?x", "?z"]}}
    ],
    "steps": [
        {"ask": {"functor": "grandparent", "args": ["?who", "ann"]}},
        {"retract": {"fact": {"functor": "parent", "args": ["bob", "ann"]}}},
        {"ask": {"functor": "grandparent", "args": ["?who", "ann"]}}
    ]
}"#;

const FAMILY_YAML: &str = r#"
config:
  verbosity: quiet
facts:
  - functor: parent
    args: [tom, bob]
  - functor: parent
    args: [bob, ann]
rules:
  - name: grandparent
    lhs:
      - functor: parent
        args: ["?x", "?y"]
      - functor: parent
        args: ["?y", "?z"]
    rhs:
      functor: grandparent
      args: ["?x", "?z"]
steps:
  - ask:
      functor: grandparent
      args: ["?who", ann]
"#;

fn answer_count(outcome: &StepOutcome) -> usize {
    match outcome {
        StepOutcome::Answered { answers, .. } => answers.as_ref().map(Vec::len).unwrap_or(0),
        other => panic!("expected an answer, got {:?}", other),
    }
}

#[test]
fn test_load_and_run_json_program() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("family.json");
    fs::write(&path, FAMILY_JSON).unwrap();

    let program = Program::load(&path).unwrap();
    assert_eq!(program.engine_config().verbosity, Verbosity::Quiet);

    let mut kb = forward_kb::KnowledgeBase::new(program.engine_config());
    let outcomes = program.run(&mut kb).unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(answer_count(&outcomes[0]), 1);
    match &outcomes[1] {
        StepOutcome::Retracted { retraction, .. } => {
            assert_eq!(retraction.outcome, RetractOutcome::Removed);
            assert_eq!(retraction.removed_facts.len(), 2);
        }
        other => panic!("expected a retraction, got {:?}", other),
    }
    assert_eq!(answer_count(&outcomes[2]), 0);
    assert!(kb.verify().is_ok());
}

#[test]
fn test_load_yaml_program_by_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("family.yml");
    fs::write(&path, FAMILY_YAML).unwrap();

    let program = Program::load(&path).unwrap();
    let mut kb = quiet_kb();
    let outcomes = program.run(&mut kb).unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(answer_count(&outcomes[0]), 1);
    assert!(kb.contains_fact(&stmt("grandparent", &["tom", "ann"])));
}

#[test]
fn test_load_reports_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = Program::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(format!("{:#}", err).contains("absent.json"));
}

#[test]
fn test_load_rejects_malformed_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"facts\": [").unwrap();

    let err = Program::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("broken.json"));
}

#[test]
fn test_validate_flags_rule_without_antecedents() {
    let program = Program::from_json_str(
        r#"{"rules": [{"name": "empty", "lhs": [],
                       "rhs": {"functor": "q", "args": ["a"]}}]}"#,
    )
    .unwrap();

    let err = program.validate().unwrap_err();
    assert!(format!("{:#}", err).contains("empty"));

    let mut kb = quiet_kb();
    assert!(program.run(&mut kb).is_err());
    assert!(kb.is_empty());
}

#[test]
fn test_save_snapshot_json_and_yaml() {
    let dir = TempDir::new().unwrap();
    let mut kb = quiet_kb();
    kb.assert(stmt("p", &["a"]));
    kb.assert(rule(&[stmt("p", &["?x"])], stmt("q", &["?x"])));

    let json_path = dir.path().join("kb.json");
    report::save_kb(&kb, &json_path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    let facts = json["facts"].as_array().unwrap();
    assert_eq!(facts.len(), 2);
    assert_eq!(facts[0]["statement"], "(p a)");
    assert_eq!(facts[1]["statement"], "(q a)");
    assert_eq!(facts[1]["asserted"], false);
    assert_eq!(facts[1]["supported_by"][0]["fact"], "(p a)");
    assert_eq!(json["rules"][0]["rhs"], "(q ?x)");

    let yaml_path = dir.path().join("kb.yaml");
    report::save_kb(&kb, &yaml_path).unwrap();
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(&yaml_path).unwrap()).unwrap();
    assert_eq!(yaml["facts"].as_sequence().unwrap().len(), 2);
}

#[test]
fn test_save_snapshot_nickel() {
    let dir = TempDir::new().unwrap();
    let mut kb = quiet_kb();
    kb.assert(stmt("p", &["a"]));

    let path = dir.path().join("kb.ncl");
    report::save_snapshot(&kb, &path, SnapshotFormat::from_path(&path)).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("let knowledge_base = {"));
    assert!(content.contains("\"(p a)\""));
    assert!(content.trim_end().ends_with("in knowledge_base"));
}

#[test]
fn test_snapshot_tracks_retraction() {
    let mut kb = quiet_kb();
    kb.assert(stmt("p", &["a"]));
    kb.assert(rule(&[stmt("p", &["?x"])], stmt("q", &["?x"])));
    let before = KbSnapshot::capture(&kb);

    kb.retract(stmt("p", &["a"]));
    let after = KbSnapshot::capture(&kb);

    assert_eq!(before.facts.len(), 2);
    assert!(after.facts.is_empty());
    assert_eq!(before.rules, after.rules);
}

#[test]
fn test_bundled_demos_run() {
    let demos = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");

    let family = Program::load(&demos.join("family.yaml")).unwrap();
    assert_eq!(family.steps.len(), 4);
    let mut kb = quiet_kb();
    let outcomes = family.run(&mut kb).unwrap();
    assert_eq!(answer_count(&outcomes[0]), 1);
    match &outcomes[1] {
        StepOutcome::Retracted { retraction, .. } => {
            assert_eq!(retraction.outcome, RetractOutcome::Removed);
        }
        other => panic!("expected a retraction, got {:?}", other),
    }
    assert_eq!(answer_count(&outcomes[2]), 0);
    assert_eq!(answer_count(&outcomes[3]), 1);

    let blocks = Program::load(&demos.join("blocks.json")).unwrap();
    let mut kb = quiet_kb();
    let outcomes = blocks.run(&mut kb).unwrap();
    assert_eq!(answer_count(&outcomes[0]), 2);
    assert_eq!(answer_count(&outcomes[1]), 1);
    assert_eq!(answer_count(&outcomes[3]), 0);
    assert_eq!(answer_count(&outcomes[5]), 1);
}
