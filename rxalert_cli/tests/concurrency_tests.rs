//! Concurrency tests for the rxalert binary.
//!
//! Saves replace the inventory file atomically, so readers running
//! alongside a writer always see a complete document.

mod common;

use common::{prescription, Sandbox};
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_readers_never_see_partial_writes() {
    let sandbox = Arc::new(Sandbox::new());
    sandbox.seed(json!([prescription("rx-1", "Aspirin 81mg", 100, 0)]));

    let readers: Vec<_> = (0..4)
        .map(|i| {
            let sandbox = Arc::clone(&sandbox);
            thread::spawn(move || {
                for _ in 0..5 {
                    thread::sleep(Duration::from_millis(i * 3));
                    sandbox.cli().arg("list").assert().success();
                }
            })
        })
        .collect();

    for _ in 0..10 {
        sandbox.cli().args(["take", "rx-1"]).assert().success();
    }

    for reader in readers {
        reader.join().expect("reader thread panicked");
    }

    assert_eq!(sandbox.inventory()[0]["taken"], 10);
}

#[test]
fn test_sequential_writers_lose_nothing() {
    let sandbox = Sandbox::new();

    for i in 0..5 {
        thread::sleep(Duration::from_millis(i * 5));
        sandbox
            .cli()
            .args(["add", &format!("Drug{}", i), "--strength", "10 mg"])
            .assert()
            .success();
    }

    let names: Vec<_> = sandbox
        .inventory()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["Drug0 10 mg", "Drug1 10 mg", "Drug2 10 mg", "Drug3 10 mg", "Drug4 10 mg"]
    );
}
