use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn dynaform() -> Command {
    let mut cmd = Command::cargo_bin("dynaform").expect("binary is built");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn schema_prints_json_schema() {
    let output = dynaform().arg("schema").output().expect("run schema");
    assert!(output.status.success());
    let schema: Value = serde_json::from_slice(&output.stdout).expect("schema is JSON");
    assert!(schema.get("properties").is_some());
}

#[test]
fn inspect_lists_fields_from_toml() {
    dynaform()
        .args(["inspect", "--config"])
        .arg(fixture("contact.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("form contact - Contact us"))
        .stdout(predicate::str::contains("newsletter"))
        .stdout(predicate::str::contains("required"));
}

#[test]
fn inspect_json_summary() {
    let output = dynaform()
        .args(["inspect", "--json", "--config"])
        .arg(fixture("contact.json"))
        .output()
        .expect("run inspect");
    assert!(output.status.success());
    let summary: Value = serde_json::from_slice(&output.stdout).expect("summary is JSON");
    assert_eq!(summary["id"], "contact");
    assert_eq!(summary["fields"].as_array().map(Vec::len), Some(5));
    assert_eq!(summary["fields"][2]["type"], "slider");
    assert_eq!(summary["fields"][4]["hidden"], true);
}

#[test]
fn render_shows_errors_after_submit() {
    let output = dynaform()
        .args(["render", "--submitted", "--config"])
        .arg(fixture("contact.json"))
        .output()
        .expect("run render");
    assert!(output.status.success());
    let payload: Value = serde_json::from_slice(&output.stdout).expect("payload is JSON");
    let fields = payload["fields"].as_array().expect("fields");
    assert_eq!(fields.len(), 4, "hidden field is not rendered");
    assert_eq!(fields[0]["error"], "Email is required");
    assert_eq!(
        payload["form_error"],
        "Please correct the errors before submitting."
    );
}

#[test]
fn submit_writes_transformed_output() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("nested").join("output.json");

    dynaform()
        .args(["submit", "--transform", "budget=scale:0.01", "--config"])
        .arg(fixture("contact.json"))
        .arg("--data")
        .arg(fixture("contact_data.json"))
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let written: Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("output written")).unwrap();
    assert_eq!(written["email"], "jane@example.com");
    assert_eq!(written["callback"], "2025-05-01T00:00:00.000Z");
    assert_eq!(written["source"], "web");
    let budget = written["budget"].as_f64().expect("budget number");
    assert!((budget - 0.25).abs() < 1e-9);
}

#[test]
fn submit_applies_patch() {
    dynaform()
        .args(["submit", "--config"])
        .arg(fixture("contact.json"))
        .args(["--patch", r#"{"email":"a@b.co","message":"Long enough message"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"email\": \"a@b.co\""));
}

#[test]
fn submit_fails_with_field_errors() {
    dynaform()
        .args(["submit", "--config"])
        .arg(fixture("contact.json"))
        .args(["--patch", r#"{"email":"not-an-email","message":"short"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("email: Enter a valid email"))
        .stderr(predicate::str::contains("message: Tell us a bit more"))
        .stderr(predicate::str::contains("form is invalid"));
}

#[test]
fn unknown_transformer_is_rejected() {
    dynaform()
        .args(["submit", "--transform", "budget=rot13", "--config"])
        .arg(fixture("contact.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown transformer"));
}

#[test]
fn missing_config_file_reports_path() {
    dynaform()
        .args(["inspect", "--config", "does/not/exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does/not/exist.json"));
}
