//! Host-facing tracker.
//!
//! A host builds a [`Capabilities`] bundle once at startup (search, storage,
//! notifications) and drives every change through [`Tracker`]. Each
//! mutation is saved before it is applied in memory, so a failed save
//! leaves the tracker exactly at the last persisted state.

use crate::alert::{self, AlertChannel};
use crate::inventory;
use crate::search::DrugSearch;
use crate::store::InventoryStore;
use crate::{Error, LowSupply, Prescription, Result, SearchResult};

/// Host-specific implementations injected into the tracker
pub struct Capabilities {
    pub search: Box<dyn DrugSearch>,
    pub store: Box<dyn InventoryStore>,
    pub alerts: Box<dyn AlertChannel>,
}

/// Result of a recorded dose, for display
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoseRecord {
    pub name: String,
    pub remaining: i64,
    /// Set when a low-supply alert was raised
    pub alert: Option<LowSupply>,
}

pub struct Tracker {
    search: Box<dyn DrugSearch>,
    store: Box<dyn InventoryStore>,
    alerts: Box<dyn AlertChannel>,
    prescriptions: Vec<Prescription>,
}

impl Tracker {
    /// Load the saved inventory and take ownership of the capabilities.
    pub fn open(capabilities: Capabilities) -> Result<Self> {
        let prescriptions = capabilities.store.load()?;
        tracing::debug!("Tracker opened with {} prescriptions", prescriptions.len());

        Ok(Self {
            search: capabilities.search,
            store: capabilities.store,
            alerts: capabilities.alerts,
            prescriptions,
        })
    }

    pub fn prescriptions(&self) -> &[Prescription] {
        &self.prescriptions
    }

    pub fn get(&self, id: &str) -> Option<&Prescription> {
        inventory::find(&self.prescriptions, id)
    }

    /// Lookup capability for the approximate-match and properties calls
    pub fn lookup(&self) -> &dyn DrugSearch {
        self.search.as_ref()
    }

    /// Search for drugs, degrading to an empty result on upstream failure.
    pub fn search_drugs(&self, term: &str) -> SearchResult {
        match self.search.search(term) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Drug search for {:?} failed: {}", term, e);
                SearchResult::empty()
            }
        }
    }

    /// Re-read the inventory from storage, replacing what is in memory.
    pub fn reload(&mut self) -> Result<&[Prescription]> {
        self.prescriptions = self.store.load()?;
        Ok(&self.prescriptions)
    }

    pub fn add_prescription(&mut self, prescription: Prescription) -> Result<&[Prescription]> {
        let name = prescription.name.clone();
        let next = inventory::add(&self.prescriptions, prescription).map_err(rejected)?;
        self.commit(next)?;
        tracing::info!("Added prescription {}", name);
        Ok(&self.prescriptions)
    }

    /// Remove by id. An unknown id still saves the unchanged list and succeeds.
    pub fn remove_prescription(&mut self, id: &str) -> Result<&[Prescription]> {
        let next = inventory::remove(&self.prescriptions, id);
        if next.len() == self.prescriptions.len() {
            tracing::debug!("Remove: no prescription {}", id);
        }
        self.commit(next)?;
        Ok(&self.prescriptions)
    }

    pub fn refill_prescription(&mut self, id: &str, new_quantity: u32) -> Result<&[Prescription]> {
        let next = inventory::refill(&self.prescriptions, id, new_quantity).map_err(rejected)?;
        self.commit(next)?;
        tracing::info!("Refilled {} to {} pills", id, new_quantity);
        Ok(&self.prescriptions)
    }

    /// Record one dose and raise a low-supply alert when due.
    ///
    /// The alert is dispatched only after the dose is saved; a notification
    /// failure does not fail the dose.
    pub fn record_dose_taken(&mut self, id: &str) -> Result<DoseRecord> {
        let outcome = inventory::record_dose_taken(&self.prescriptions, id).map_err(rejected)?;
        self.commit(outcome.prescriptions)?;

        let name = self
            .get(id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        tracing::info!("Dose recorded for {} ({} remaining)", name, outcome.remaining);

        if let Some(ref low) = outcome.alert {
            alert::dispatch(self.alerts.as_mut(), low);
        }

        Ok(DoseRecord {
            name,
            remaining: outcome.remaining,
            alert: outcome.alert,
        })
    }

    /// Raise an alert directly through the host channel.
    pub fn dispatch_low_supply_alert(&mut self, name: &str, remaining: i64) -> bool {
        let low = LowSupply {
            name: name.to_string(),
            remaining,
        };
        alert::dispatch(self.alerts.as_mut(), &low)
    }

    fn commit(&mut self, next: Vec<Prescription>) -> Result<()> {
        match self.store.save(&next) {
            Ok(()) => {
                self.prescriptions = next;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to save inventory, change discarded: {}", e);
                Err(match e {
                    Error::Store(_) => e,
                    other => Error::Store(format!("change not saved: {}", other)),
                })
            }
        }
    }
}

fn rejected(e: Error) -> Error {
    tracing::warn!("Operation refused: {}", e);
    e
}
