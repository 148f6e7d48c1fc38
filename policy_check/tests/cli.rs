//! Runs the `policy-check` binary against policy files in a scratch directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const POLICY: &str = r#"
version: "2.0"
name: storage
defaultAction: { type: deny }
rules:
  - id: owners-write
    name: Owners may write
    priority: 10
    conditions: "action == write and resource.attributes.owner exists"
    action: { type: allow }
  - id: readers
    name: Anyone may read
    priority: 20
    conditions:
      - field: action
        operator: in
        value: [read, list]
    action: { type: allow }
"#;

const DUPLICATE_IDS: &str = r#"
version: "1"
name: broken
defaultAction: { type: allow }
rules:
  - { id: same, name: A, conditions: "action == read", action: { type: allow } }
  - { id: same, name: B, conditions: "action == write", action: { type: allow } }
"#;

const NO_CONDITIONS: &str = r#"
version: "1"
name: open
defaultAction: { type: deny }
rules:
  - { id: all, name: Everything, action: { type: allow } }
"#;

struct Scratch {
    dir: TempDir,
}

impl Scratch {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn file(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_policy-check"))
            .args(args)
            .current_dir(self.dir.path())
            .env("NO_COLOR", "1")
            .env_remove("POLICY_CHECK_LOG")
            .env_remove("POLICY_CHECK_LOG_PATH")
            .env_remove("POLICY_CHECK_FAIL_ON_WARNINGS")
            .output()
            .unwrap()
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn context(action: &str, owner: Option<&str>) -> String {
    let attributes = owner.map_or(Value::Null, |o| serde_json::json!({ "owner": o }));
    serde_json::json!({
        "actor": { "id": "u-1", "type": "user" },
        "action": action,
        "resource": { "type": "bucket", "attributes": attributes },
    })
    .to_string()
}

#[test]
fn validate_clean_policy() {
    let s = Scratch::new();
    let policy = s.file("policy.yaml", POLICY);
    let out = s.run(&["validate", arg(&policy)]);
    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    assert_eq!(stdout(&out), "ok storage\n");
}

#[test]
fn validate_reports_duplicate_ids() {
    let s = Scratch::new();
    let policy = s.file("broken.yaml", DUPLICATE_IDS);
    let out = s.run(&["validate", arg(&policy)]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).contains("error rules[1].id: Duplicate rule ID: same"));
}

#[test]
fn warnings_fail_only_when_strict() {
    let s = Scratch::new();
    let policy = s.file("open.yaml", NO_CONDITIONS);
    assert_eq!(s.run(&["validate", arg(&policy)]).status.code(), Some(0));
    assert_eq!(
        s.run(&["validate", arg(&policy), "--strict"]).status.code(),
        Some(1)
    );
}

#[test]
fn fail_on_warnings_from_config_file() {
    let s = Scratch::new();
    let policy = s.file("open.yaml", NO_CONDITIONS);
    s.file("policy-check.json", r#"{"fail_on_warnings": true}"#);
    assert_eq!(s.run(&["validate", arg(&policy)]).status.code(), Some(1));
}

#[test]
fn eval_allowed_and_denied() {
    let s = Scratch::new();
    let policy = s.file("policy.yaml", POLICY);

    let ctx = s.file("write.json", &context("write", Some("u-1")));
    let out = s.run(&["eval", arg(&policy), arg(&ctx)]);
    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    let result: Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(result["allowed"], true);
    assert_eq!(result["matchedRuleId"], "owners-write");
    assert_eq!(result["audit"]["evaluatedRules"], 1);
    assert_eq!(result["audit"]["policyVersion"], "2.0");

    let ctx = s.file("delete.json", &context("delete", None));
    let out = s.run(&["eval", arg(&policy), arg(&ctx)]);
    assert_eq!(out.status.code(), Some(2));
    let result: Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(result["allowed"], false);
    assert!(result.get("matchedRuleId").is_none_or(Value::is_null));
    assert!(stderr(&out).contains("No matching rules, using default action"));
}

#[test]
fn eval_records_requested_timestamp() {
    let s = Scratch::new();
    let policy = s.file("policy.yaml", POLICY);
    let ctx = s.file("read.yaml", "actor: {id: a, type: system}\naction: read\nresource: {type: bucket}\n");
    let out = s.run(&["eval", arg(&policy), arg(&ctx), "--at", "2026-03-01T12:00:00Z"]);
    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    let result: Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(result["matchedRuleId"], "readers");
    assert_eq!(result["audit"]["timestamp"], "2026-03-01T12:00:00Z");
}

#[test]
fn eval_refuses_invalid_policy() {
    let s = Scratch::new();
    let policy = s.file("broken.yaml", DUPLICATE_IDS);
    let ctx = s.file("read.json", &context("read", None));
    let out = s.run(&["eval", arg(&policy), arg(&ctx)]);
    // Default action is allow, but an invalid document is never evaluated.
    assert_eq!(out.status.code(), Some(2));
    assert!(stdout(&out).is_empty());
    assert!(stderr(&out).contains("refused:"));
}

#[test]
fn eval_with_unreadable_policy_fails() {
    let s = Scratch::new();
    let ctx = s.file("read.json", &context("read", None));
    let out = s.run(&["eval", "missing.yaml", arg(&ctx)]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).starts_with("error: failed to load policy document"));
}

#[test]
fn parse_prints_conditions() {
    let s = Scratch::new();
    let out = s.run(&["parse", "actor.type == 'user' and resource.id exists"]);
    assert_eq!(out.status.code(), Some(0));
    let parsed: Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(parsed[0]["operator"], "eq");
    assert_eq!(parsed[1]["field"], "resource.id");
    assert_eq!(parsed[1]["operator"], "exists");
}

#[test]
fn parse_expression_tree() {
    let s = Scratch::new();
    let out = s.run(&["parse", "--expr", "a == 1 or not b == 2"]);
    assert_eq!(out.status.code(), Some(0));
    let parsed: Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert!(parsed["or"][1]["not"].is_object());
}

#[test]
fn parse_error_shows_hint() {
    let s = Scratch::new();
    let out = s.run(&["parse", "actor.type = 'user'"]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.starts_with("error: failed to parse conditions"));
    assert!(err.contains("hint:"));
}

#[test]
fn tokens_listing() {
    let s = Scratch::new();
    let out = s.run(&["tokens", "x >= 2"]);
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert_eq!(text.lines().count(), 4);
    assert!(text.lines().last().unwrap().ends_with("end of input"));
}

#[test]
fn new_preset_validates() {
    let s = Scratch::new();
    let out = s.run(&["new", "gate", "--preset", "approval", "--min-approvers", "2"]);
    assert_eq!(out.status.code(), Some(0));
    let policy = s.file("gate.yaml", &stdout(&out));
    assert_eq!(s.run(&["validate", arg(&policy)]).status.code(), Some(0));
}

#[test]
fn missing_config_file_fails() {
    let s = Scratch::new();
    let out = s.run(&["--config", "nope.json", "tokens", "a"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("config file not found"));
}
