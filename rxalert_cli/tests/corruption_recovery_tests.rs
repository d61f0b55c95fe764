//! Corruption handling tests for the rxalert binary.
//!
//! A damaged inventory must never be silently replaced, since the next save
//! would wipe the user's data.

mod common;

use common::{prescription, Sandbox};
use predicates::prelude::*;
use serde_json::json;
use std::fs;

#[test]
fn test_corrupted_inventory_is_reported_and_kept() {
    let sandbox = Sandbox::new();
    fs::create_dir_all(sandbox.data_dir()).unwrap();
    fs::write(sandbox.inventory_path(), "[{ invalid json }}}}").unwrap();

    sandbox
        .cli()
        .args(["add", "Aspirin", "--strength", "81mg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("JSON error"));

    let contents = fs::read_to_string(sandbox.inventory_path()).unwrap();
    assert_eq!(contents, "[{ invalid json }}}}");
}

#[test]
fn test_truncated_inventory_is_reported() {
    let sandbox = Sandbox::new();
    sandbox.seed(json!([prescription("rx-1", "Aspirin 81mg", 30, 0)]));

    let full = fs::read_to_string(sandbox.inventory_path()).unwrap();
    fs::write(sandbox.inventory_path(), &full[..full.len() / 2]).unwrap();

    sandbox.cli().arg("list").assert().failure();
}

#[test]
fn test_missing_optional_fields_are_defaulted() {
    let sandbox = Sandbox::new();
    fs::create_dir_all(sandbox.data_dir()).unwrap();
    fs::write(
        sandbox.inventory_path(),
        r#"[{"id":"rx-1","name":"Aspirin 81mg","dosage":"81mg","quantity":30}]"#,
    )
    .unwrap();

    sandbox
        .cli()
        .args(["take", "rx-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Remaining: 29 / 30"));

    let inventory = sandbox.inventory();
    assert_eq!(inventory[0]["taken"], 1);
    assert_eq!(inventory[0]["instructions"], "");
    assert!(inventory[0]["rxcui"].is_null());
}

#[test]
fn test_unwritable_data_dir_reports_unsaved_change() {
    let sandbox = Sandbox::new();
    // A regular file where the data directory should be
    fs::write(sandbox.data_dir(), "not a directory").unwrap();

    sandbox
        .cli()
        .args(["add", "Aspirin", "--strength", "81mg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NOT saved"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let sandbox = Sandbox::new();
    fs::write(
        sandbox.dir.path().join("config.toml"),
        "[search]\ntimeout_secs = 0\n",
    )
    .unwrap();

    sandbox
        .cli()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}
