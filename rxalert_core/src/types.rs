//! Core domain types for the RxAlert medication tracker.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Remaining-pill count at or below which a low-supply alert fires.
pub const LOW_SUPPLY_THRESHOLD: i64 = 7;

// ============================================================================
// Prescription
// ============================================================================

/// A tracked medication: one bottle and the doses taken from it.
///
/// This is the only persisted entity. Field names are the on-disk names;
/// changing this shape breaks existing inventories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: String,
    /// Drug name and strength, e.g. "Aspirin (Oral Pill) 81 mg Tab"
    pub name: String,
    /// Strength/form, e.g. "81 mg Tab"
    pub dosage: String,
    #[serde(default)]
    pub instructions: String,
    /// Pill count of the current bottle
    pub quantity: u32,
    /// Doses recorded since the last refill
    #[serde(default)]
    pub taken: u32,
    #[serde(default)]
    pub rxcui: Option<String>,
}

impl Prescription {
    /// Build a new entry with a fresh id and nothing taken.
    ///
    /// The display name is the drug name followed by the strength.
    pub fn new(
        drug_name: &str,
        strength: &str,
        instructions: impl Into<String>,
        quantity: u32,
        rxcui: Option<String>,
    ) -> Result<Self> {
        if quantity == 0 {
            return Err(Error::InvalidQuantity(0));
        }
        let strength = strength.trim();
        let name = if strength.is_empty() {
            drug_name.trim().to_string()
        } else {
            format!("{} {}", drug_name.trim(), strength)
        };

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            dosage: strength.to_string(),
            instructions: instructions.into(),
            quantity,
            taken: 0,
            rxcui,
        })
    }

    /// Build an entry from a search result and the chosen strength index.
    ///
    /// The reference code is looked up at the same index; a missing code
    /// is not an error.
    pub fn from_selection(
        item: &DrugSearchItem,
        strength_index: usize,
        instructions: impl Into<String>,
        quantity: u32,
    ) -> Result<Self> {
        let strength = item.strength(strength_index).ok_or_else(|| {
            Error::InvalidSelection(format!(
                "strength {} out of range for {} ({} available)",
                strength_index,
                item.display_name,
                item.strengths.len()
            ))
        })?;

        Self::new(
            &item.display_name,
            strength,
            instructions,
            quantity,
            item.rxcui(strength_index).map(str::to_string),
        )
    }

    /// Doses left in the current bottle. Never stored.
    pub fn remaining(&self) -> i64 {
        i64::from(self.quantity) - i64::from(self.taken)
    }

    /// Whether the remaining count is at or below the alert threshold.
    pub fn is_low(&self) -> bool {
        self.remaining() <= LOW_SUPPLY_THRESHOLD
    }
}

// ============================================================================
// Drug search
// ============================================================================

/// One drug row from a terminology search.
///
/// `strengths[i]` and `rxcuis_by_index[i]` describe the same strength/form.
/// The upstream service may omit data, so the two lists can differ in length.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugSearchItem {
    pub display_name: String,
    pub strengths: Vec<String>,
    pub rxcuis_by_index: Vec<Option<String>>,
}

impl DrugSearchItem {
    pub fn strength(&self, index: usize) -> Option<&str> {
        self.strengths.get(index).map(String::as_str)
    }

    /// Reference code for a strength index, absent past either list's end.
    pub fn rxcui(&self, index: usize) -> Option<&str> {
        self.rxcuis_by_index
            .get(index)
            .and_then(|code| code.as_deref())
    }
}

/// Normalized search response
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Upstream match count; may exceed `items.len()`
    pub total: u64,
    pub items: Vec<DrugSearchItem>,
}

impl SearchResult {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Candidate from an approximate-term lookup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproxCandidate {
    pub rxcui: String,
    pub name: Option<String>,
    pub score: Option<String>,
    pub rank: Option<String>,
}

/// A single property of an RxNorm concept
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptProperty {
    pub category: String,
    pub name: String,
    pub value: String,
}

// ============================================================================
// Alerts
// ============================================================================

/// Signal emitted when a dose leaves a prescription in the low-supply window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LowSupply {
    pub name: String,
    pub remaining: i64,
}

impl LowSupply {
    pub const TITLE: &'static str = "Low Supply Alert";

    /// Signal for a post-dose remaining count, if it falls in 1..=7.
    pub fn check(name: &str, remaining: i64) -> Option<Self> {
        if remaining > 0 && remaining <= LOW_SUPPLY_THRESHOLD {
            Some(Self {
                name: name.to_string(),
                remaining,
            })
        } else {
            None
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Only {} pill{} left of {}. Please contact your pharmacy or physician to refill.",
            self.remaining,
            if self.remaining == 1 { "" } else { "s" },
            self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> DrugSearchItem {
        DrugSearchItem {
            display_name: "Lisinopril (Oral Pill)".into(),
            strengths: vec!["10 mg Tab".into(), " 20 mg Tab ".into(), "40 mg Tab".into()],
            rxcuis_by_index: vec![Some("314076".into()), None],
        }
    }

    #[test]
    fn test_from_selection_builds_name_and_code() {
        let rx = Prescription::from_selection(&item(), 0, "1 tab PO daily", 30).unwrap();
        assert_eq!(rx.name, "Lisinopril (Oral Pill) 10 mg Tab");
        assert_eq!(rx.dosage, "10 mg Tab");
        assert_eq!(rx.rxcui.as_deref(), Some("314076"));
        assert_eq!(rx.taken, 0);
        assert_eq!(rx.quantity, 30);
        assert!(!rx.id.is_empty());
    }

    #[test]
    fn test_from_selection_trims_strength() {
        let rx = Prescription::from_selection(&item(), 1, "", 30).unwrap();
        assert_eq!(rx.dosage, "20 mg Tab");
        assert_eq!(rx.rxcui, None);
    }

    #[test]
    fn test_rxcui_past_end_is_absent() {
        let rx = Prescription::from_selection(&item(), 2, "", 30).unwrap();
        assert_eq!(rx.rxcui, None);
        assert_eq!(item().rxcui(99), None);
    }

    #[test]
    fn test_from_selection_rejects_bad_index() {
        let err = Prescription::from_selection(&item(), 3, "", 30).unwrap_err();
        assert!(matches!(err, Error::InvalidSelection(_)));
    }

    #[test]
    fn test_new_rejects_zero_quantity() {
        let err = Prescription::new("Aspirin", "81mg", "", 0, None).unwrap_err();
        assert!(matches!(err, Error::InvalidQuantity(0)));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Prescription::new("Aspirin", "81mg", "", 30, None).unwrap();
        let b = Prescription::new("Aspirin", "81mg", "", 30, None).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_remaining_is_derived() {
        let mut rx = Prescription::new("Aspirin", "81mg", "", 30, None).unwrap();
        rx.taken = 23;
        assert_eq!(rx.remaining(), 7);
        assert!(rx.is_low());
        rx.taken = 31;
        assert_eq!(rx.remaining(), -1);
    }

    #[test]
    fn test_low_supply_window() {
        assert!(LowSupply::check("A", 8).is_none());
        assert_eq!(LowSupply::check("A", 7).unwrap().remaining, 7);
        assert!(LowSupply::check("A", 1).is_some());
        assert!(LowSupply::check("A", 0).is_none());
        assert!(LowSupply::check("A", -2).is_none());
    }

    #[test]
    fn test_low_supply_message() {
        let one = LowSupply::check("Aspirin 81mg", 1).unwrap();
        assert_eq!(
            one.message(),
            "Only 1 pill left of Aspirin 81mg. Please contact your pharmacy or physician to refill."
        );
        let many = LowSupply::check("Aspirin 81mg", 5).unwrap();
        assert!(many.message().starts_with("Only 5 pills left"));
    }

    #[test]
    fn test_prescription_json_shape() {
        let json = r#"{"id":"1","name":"Aspirin 81mg","dosage":"81mg","instructions":"","quantity":30,"taken":2,"rxcui":null}"#;
        let rx: Prescription = serde_json::from_str(json).unwrap();
        assert_eq!(rx.remaining(), 28);
        assert_eq!(serde_json::to_string(&rx).unwrap(), json);
    }

    #[test]
    fn test_search_item_uses_camel_case() {
        let json = serde_json::to_value(item()).unwrap();
        assert!(json.get("displayName").is_some());
        assert!(json.get("rxcuisByIndex").is_some());
    }
}
