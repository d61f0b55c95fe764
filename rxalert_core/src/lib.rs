#![forbid(unsafe_code)]

//! Core domain model and business logic for the RxAlert medication tracker.
//!
//! This crate provides:
//! - Domain types (prescriptions, search results, low-supply signals)
//! - Drug terminology search and response normalization
//! - Inventory persistence (JSON file, key-value storage)
//! - Inventory operations and the host-facing tracker
//! - Low-supply alert dispatch

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod search;
pub mod store;
pub mod inventory;
pub mod alert;
pub mod tracker;

// Re-export commonly used types
pub use error::{Error, Result, UpstreamError};
pub use types::*;
pub use config::Config;
pub use search::{normalize_rxterms, DrugSearch, RxTermsClient, SearchSequencer};
pub use store::{InventoryStore, JsonFileStore, KeyValueStore, MemoryBackend};
pub use alert::{AlertChannel, ConsoleAlerts, FallbackAlerts, InAppAlerts};
pub use tracker::{Capabilities, DoseRecord, Tracker};
