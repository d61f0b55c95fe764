//! Inventory operations.
//!
//! Each operation takes the current list and returns a new one; the input
//! is never modified. Persistence and alert delivery happen in
//! [`crate::tracker`], not here.

use crate::{Error, LowSupply, Prescription, Result};

/// Outcome of recording one dose
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoseTaken {
    pub prescriptions: Vec<Prescription>,
    /// Remaining pills on the dosed entry after the dose
    pub remaining: i64,
    pub alert: Option<LowSupply>,
}

pub fn find<'a>(prescriptions: &'a [Prescription], id: &str) -> Option<&'a Prescription> {
    prescriptions.iter().find(|p| p.id == id)
}

/// Append a prescription with its dose count reset.
pub fn add(current: &[Prescription], prescription: Prescription) -> Result<Vec<Prescription>> {
    if find(current, &prescription.id).is_some() {
        return Err(Error::DuplicateId(prescription.id));
    }
    if prescription.quantity == 0 {
        return Err(Error::InvalidQuantity(0));
    }

    let mut next = current.to_vec();
    next.push(Prescription {
        taken: 0,
        ..prescription
    });
    Ok(next)
}

/// Drop the entry with this id. Absent ids are a no-op.
pub fn remove(current: &[Prescription], id: &str) -> Vec<Prescription> {
    current.iter().filter(|p| p.id != id).cloned().collect()
}

/// Start a new bottle: replace the quantity and clear the dose count.
pub fn refill(current: &[Prescription], id: &str, new_quantity: u32) -> Result<Vec<Prescription>> {
    if new_quantity == 0 {
        return Err(Error::InvalidQuantity(0));
    }
    if find(current, id).is_none() {
        return Err(Error::NotFound(id.to_string()));
    }

    Ok(current
        .iter()
        .map(|p| {
            if p.id == id {
                Prescription {
                    quantity: new_quantity,
                    taken: 0,
                    ..p.clone()
                }
            } else {
                p.clone()
            }
        })
        .collect())
}

/// Record one dose.
///
/// Refused when nothing remains. The returned alert is set when the
/// post-dose remaining count is in `1..=7`.
pub fn record_dose_taken(current: &[Prescription], id: &str) -> Result<DoseTaken> {
    let target = find(current, id).ok_or_else(|| Error::NotFound(id.to_string()))?;
    if target.remaining() <= 0 {
        return Err(Error::SupplyExhausted(target.name.clone()));
    }

    let dosed = Prescription {
        taken: target.taken.saturating_add(1),
        ..target.clone()
    };
    let remaining = dosed.remaining();
    let alert = LowSupply::check(&dosed.name, remaining);

    let prescriptions = current
        .iter()
        .map(|p| if p.id == id { dosed.clone() } else { p.clone() })
        .collect();

    Ok(DoseTaken {
        prescriptions,
        remaining,
        alert,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rx(id: &str, name: &str, quantity: u32, taken: u32) -> Prescription {
        Prescription {
            id: id.into(),
            name: name.into(),
            dosage: "81mg".into(),
            instructions: String::new(),
            quantity,
            taken,
            rxcui: None,
        }
    }

    #[test]
    fn test_add_appends_with_zero_taken() {
        let start = vec![rx("a", "Aspirin 81mg", 30, 0)];
        let next = add(&start, rx("b", "Metformin 500mg", 60, 9)).unwrap();

        assert_eq!(next.len(), 2);
        assert_eq!(next[1].id, "b");
        assert_eq!(next[1].taken, 0);
        assert_eq!(start.len(), 1);
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let start = vec![rx("a", "Aspirin 81mg", 30, 0)];
        let err = add(&start, rx("a", "Other", 10, 0)).unwrap_err();
        assert!(matches!(err, Error::DuplicateId(ref id) if id == "a"));
    }

    #[test]
    fn test_add_rejects_empty_bottle() {
        let err = add(&[], rx("a", "Aspirin 81mg", 0, 0)).unwrap_err();
        assert!(matches!(err, Error::InvalidQuantity(0)));
    }

    #[test]
    fn test_remove_missing_id_is_noop() {
        let start = vec![rx("a", "Aspirin 81mg", 30, 0), rx("b", "B", 10, 1)];
        assert_eq!(remove(&start, "zzz"), start);
        assert_eq!(remove(&start, "a"), vec![rx("b", "B", 10, 1)]);
    }

    #[test]
    fn test_refill_resets_taken() {
        let start = vec![rx("a", "Aspirin 81mg", 30, 10)];
        let next = refill(&start, "a", 15).unwrap();
        assert_eq!(next[0].quantity, 15);
        assert_eq!(next[0].taken, 0);
    }

    #[test]
    fn test_refill_is_idempotent() {
        let start = vec![rx("a", "Aspirin 81mg", 30, 10), rx("b", "B", 5, 5)];
        let once = refill(&start, "a", 90).unwrap();
        let twice = refill(&once, "a", 90).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_refill_preconditions() {
        let start = vec![rx("a", "Aspirin 81mg", 30, 10)];
        assert!(matches!(refill(&start, "a", 0), Err(Error::InvalidQuantity(0))));
        assert!(matches!(refill(&start, "x", 30), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_dose_increments_by_one() {
        let start = vec![rx("a", "Aspirin 81mg", 30, 0), rx("b", "B", 10, 2)];
        let out = record_dose_taken(&start, "a").unwrap();

        assert_eq!(out.prescriptions[0].taken, 1);
        assert_eq!(out.prescriptions[1], start[1]);
        assert_eq!(out.remaining, 29);
        assert!(out.alert.is_none());
    }

    #[test]
    fn test_alert_fires_at_seven() {
        let mut list = vec![rx("a", "Aspirin 81mg", 30, 0)];
        let mut last = None;
        for _ in 0..23 {
            let out = record_dose_taken(&list, "a").unwrap();
            list = out.prescriptions;
            last = Some((out.remaining, out.alert));
        }

        let (remaining, alert) = last.unwrap();
        assert_eq!(remaining, 7);
        assert_eq!(
            alert,
            Some(LowSupply {
                name: "Aspirin 81mg".into(),
                remaining: 7
            })
        );
    }

    #[test]
    fn test_alert_repeats_inside_window() {
        let list = vec![rx("a", "Aspirin 81mg", 30, 24)];
        let out = record_dose_taken(&list, "a").unwrap();
        assert_eq!(out.alert.map(|a| a.remaining), Some(5));
    }

    #[test]
    fn test_no_alert_when_reaching_zero() {
        let list = vec![rx("a", "Aspirin 81mg", 30, 29)];
        let out = record_dose_taken(&list, "a").unwrap();
        assert_eq!(out.remaining, 0);
        assert!(out.alert.is_none());
    }

    #[test]
    fn test_dose_refused_when_exhausted() {
        let list = vec![rx("a", "Aspirin 81mg", 30, 30)];
        let err = record_dose_taken(&list, "a").unwrap_err();
        assert!(matches!(err, Error::SupplyExhausted(_)));
    }

    #[test]
    fn test_dose_on_missing_id() {
        let err = record_dose_taken(&[], "nope").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
