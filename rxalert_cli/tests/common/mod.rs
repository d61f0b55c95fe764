//! Shared helpers for rxalert CLI tests.

#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Data directory plus a config pointing the search service at a closed port
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::write(
            dir.path().join("config.toml"),
            r#"
[search]
endpoint = "http://127.0.0.1:9/api/rxterms/v3/search"
rxnav_base = "http://127.0.0.1:9/REST"
timeout_secs = 2
"#,
        )
        .expect("Failed to write config");
        Self { dir }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn inventory_path(&self) -> PathBuf {
        self.data_dir().join("prescriptions.json")
    }

    /// CLI command with sandbox data dir and config already applied
    pub fn cli(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rxalert"));
        cmd.arg("--data-dir")
            .arg(self.data_dir())
            .arg("--config")
            .arg(self.dir.path().join("config.toml"));
        cmd
    }

    pub fn seed(&self, prescriptions: Value) {
        fs::create_dir_all(self.data_dir()).unwrap();
        fs::write(
            self.inventory_path(),
            serde_json::to_string_pretty(&prescriptions).unwrap(),
        )
        .unwrap();
    }

    pub fn inventory(&self) -> Vec<Value> {
        read_inventory(&self.inventory_path())
    }
}

pub fn read_inventory(path: &Path) -> Vec<Value> {
    let content = fs::read_to_string(path).expect("Failed to read inventory");
    serde_json::from_str::<Value>(&content)
        .expect("Inventory is not JSON")
        .as_array()
        .cloned()
        .expect("Inventory is not a list")
}

pub fn prescription(id: &str, name: &str, quantity: u32, taken: u32) -> Value {
    json!({
        "id": id,
        "name": name,
        "dosage": "81mg",
        "instructions": "1 tab PO daily",
        "quantity": quantity,
        "taken": taken,
        "rxcui": null
    })
}
