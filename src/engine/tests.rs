#![allow(clippy::unwrap_used)]

use super::*;
use crate::models::CategoryLine;
use crate::store::{Loaded, LEDGER_KEY};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn two_category_catalog() -> BudgetCatalog {
    BudgetCatalog {
        total_budget: dec!(1000),
        items: vec![
            CategoryLine::new("A".into(), dec!(600)),
            CategoryLine::new("B".into(), dec!(400)),
        ],
    }
}

fn engine_with(store: &Store, catalog: BudgetCatalog) -> BudgetAllocationEngine {
    store.save_catalog(&catalog).unwrap();
    BudgetAllocationEngine::load(store).unwrap()
}

// ── Availability reads ────────────────────────────────────────

#[test]
fn test_fresh_engine_availability() {
    let store = Store::open_in_memory().unwrap();
    let engine = engine_with(&store, two_category_catalog());
    assert_eq!(engine.category_available("A"), dec!(600));
    assert_eq!(engine.category_available("B"), dec!(400));
    assert_eq!(engine.total_available(), dec!(1000));
    assert_eq!(engine.raw_available(), dec!(1000));
}

#[test]
fn test_unknown_category_reads_as_zero_cap() {
    let store = Store::open_in_memory().unwrap();
    let engine = engine_with(&store, two_category_catalog());
    assert_eq!(engine.category_available("Nonexistent"), dec!(0));
}

#[test]
fn test_no_catalog_reads() {
    let store = Store::open_in_memory().unwrap();
    let engine = BudgetAllocationEngine::load(&store).unwrap();
    assert!(engine.catalog().is_none());
    assert_eq!(engine.category_available("A"), dec!(0));
    assert_eq!(engine.total_available(), dec!(0));
    assert_eq!(engine.summary().percentage_used, dec!(0));
}

// ── Scenario 1 ────────────────────────────────────────────────

#[test]
fn test_allocate_and_summary() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = engine_with(&store, two_category_catalog());

    assert!(engine
        .allocate(&store, "p1", dec!(500), "A", None)
        .unwrap());
    assert_eq!(engine.category_available("A"), dec!(100));

    let summary = engine.summary();
    assert_eq!(summary.total, dec!(1000));
    assert_eq!(summary.allocated, dec!(500));
    assert_eq!(summary.available, dec!(500));
    assert_eq!(summary.percentage_used, dec!(50));
}

// ── Scenario 2: self-update exemption ─────────────────────────

#[test]
fn test_project_can_raise_its_own_allocation() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = engine_with(&store, two_category_catalog());
    assert!(engine
        .allocate(&store, "p1", dec!(500), "A", None)
        .unwrap());
    // Naive room in A is only 100 now.
    assert_eq!(engine.category_available("A"), dec!(100));

    // Raising to the full 600 cap fits once p1's own 500 is treated as
    // released; without the exemption this would be refused.
    assert!(engine
        .allocate(&store, "p1", dec!(600), "A", None)
        .unwrap());
    assert_eq!(engine.get_allocation("p1").unwrap().allocated_amount, dec!(600));
    assert_eq!(engine.category_available("A"), dec!(0));

    // The exemption never stretches the cap itself.
    assert!(!engine
        .allocate(&store, "p1", dec!(700), "A", None)
        .unwrap());
    assert_eq!(engine.get_allocation("p1").unwrap().allocated_amount, dec!(600));
}

#[test]
fn test_self_update_still_capped() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = engine_with(&store, two_category_catalog());
    assert!(engine
        .allocate(&store, "p1", dec!(500), "A", None)
        .unwrap());

    // 800 exceeds the 600 cap even with p1's 500 released.
    assert!(!engine
        .allocate(&store, "p1", dec!(800), "A", None)
        .unwrap());
    // Failed call left the prior allocation untouched.
    assert_eq!(engine.get_allocation("p1").unwrap().allocated_amount, dec!(500));
    assert_eq!(
        store.load_ledger().unwrap().into_option().unwrap().len(),
        1
    );
}

#[test]
fn test_self_update_across_categories() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = engine_with(&store, two_category_catalog());
    assert!(engine
        .allocate(&store, "p1", dec!(300), "A", None)
        .unwrap());

    // Moving to B: old category regains 300, B checked fresh.
    assert!(engine
        .allocate(&store, "p1", dec!(400), "B", None)
        .unwrap());
    assert_eq!(engine.category_available("A"), dec!(600));
    assert_eq!(engine.category_available("B"), dec!(0));
    // Replace, not add: exactly one allocation for p1.
    let for_p1: Vec<_> = engine
        .allocations()
        .iter()
        .filter(|a| a.project_id == "p1")
        .collect();
    assert_eq!(for_p1.len(), 1);
    assert_eq!(for_p1[0].category, "B");
}

// ── Scenario 3: rejection message ─────────────────────────────

#[test]
fn test_over_cap_rejected_with_named_category() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = engine_with(&store, two_category_catalog());

    assert!(!engine
        .allocate(&store, "p2", dec!(450), "B", None)
        .unwrap());
    assert!(engine.get_allocation("p2").is_none());

    let err = engine.validate(dec!(450), "B", Some("p2")).unwrap_err();
    assert_eq!(
        err,
        AllocationError::InsufficientCategory {
            category: "B".into(),
            available: dec!(400),
            requested: dec!(450),
        }
    );
    let msg = err.to_string();
    assert!(msg.contains('B'));
    assert!(msg.contains("400"));
}

// ── Validation preconditions ──────────────────────────────────

#[test]
fn test_zero_and_negative_amounts_invalid() {
    let store = Store::open_in_memory().unwrap();
    let engine = engine_with(&store, two_category_catalog());
    assert_eq!(
        engine.validate(dec!(0), "A", None),
        Err(AllocationError::NonPositiveAmount)
    );
    assert_eq!(
        engine.validate(dec!(-10), "A", None),
        Err(AllocationError::NonPositiveAmount)
    );
}

#[test]
fn test_no_catalog_is_configuration_error() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = BudgetAllocationEngine::load(&store).unwrap();
    assert_eq!(
        engine.validate(dec!(10), "A", None),
        Err(AllocationError::NoCatalog)
    );
    assert!(!engine.allocate(&store, "p1", dec!(10), "A", None).unwrap());
}

#[test]
fn test_unknown_category_never_validates() {
    let store = Store::open_in_memory().unwrap();
    let engine = engine_with(&store, two_category_catalog());
    assert!(matches!(
        engine.validate(dec!(1), "Nonexistent", None),
        Err(AllocationError::InsufficientCategory { .. })
    ));
}

// ── No-overcommit invariant over call sequences ───────────────

#[test]
fn test_no_overcommit_across_many_allocations() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = engine_with(&store, two_category_catalog());

    let attempts = [
        ("p1", dec!(200), "A"),
        ("p2", dec!(300), "A"),
        ("p3", dec!(200), "A"), // would exceed 600
        ("p4", dec!(100), "A"),
        ("p5", dec!(400), "B"),
        ("p6", dec!(0.01), "B"), // B full
    ];
    for (project, amount, category) in attempts {
        let before = engine.allocations().to_vec();
        let ok = engine
            .allocate(&store, project, amount, category, None)
            .unwrap();
        if ok {
            for item in &engine.catalog().unwrap().items.clone() {
                let committed: Decimal = engine
                    .allocations()
                    .iter()
                    .filter(|a| a.category == item.category)
                    .map(|a| a.allocated_amount)
                    .sum();
                assert!(committed <= item.amount, "overcommit in {}", item.category);
            }
        } else {
            assert_eq!(engine.allocations(), before.as_slice(), "rejected call mutated ledger");
        }
    }
    assert_eq!(engine.total_allocated(), dec!(1000));
    assert!(engine.summary().allocated <= engine.summary().total);
}

// ── Removal ───────────────────────────────────────────────────

#[test]
fn test_remove_allocation_idempotent() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = engine_with(&store, two_category_catalog());
    engine.allocate(&store, "p1", dec!(100), "A", None).unwrap();

    engine.remove_allocation(&store, "p1").unwrap();
    assert!(engine.get_allocation("p1").is_none());
    let after_first = store.load_ledger().unwrap();

    engine.remove_allocation(&store, "p1").unwrap();
    assert_eq!(store.load_ledger().unwrap(), after_first);
}

#[test]
fn test_remove_nonexistent_is_not_an_error() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = engine_with(&store, two_category_catalog());
    engine.remove_allocation(&store, "nonexistent").unwrap();
    assert!(engine.allocations().is_empty());
    // Nothing was ever persisted for the ledger.
    assert_eq!(store.load_ledger().unwrap(), Loaded::Absent);
}

// ── Persistence behavior ──────────────────────────────────────

#[test]
fn test_allocations_survive_reload() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = engine_with(&store, two_category_catalog());
    engine
        .allocate(&store, "p1", dec!(250), "A", Some("court repair".into()))
        .unwrap();

    let reloaded = BudgetAllocationEngine::load(&store).unwrap();
    let alloc = reloaded.get_allocation("p1").unwrap();
    assert_eq!(alloc.allocated_amount, dec!(250));
    assert_eq!(alloc.description.as_deref(), Some("court repair"));
}

#[test]
fn test_corrupt_ledger_recovers_to_empty() {
    let store = Store::open_in_memory().unwrap();
    store.save_catalog(&two_category_catalog()).unwrap();
    store.put(LEDGER_KEY, "{{{").unwrap();

    let engine = BudgetAllocationEngine::load(&store).unwrap();
    assert!(engine.allocations().is_empty());
    assert!(engine.recovered_from_corruption());

    // A legitimately empty store is not "recovered".
    let fresh = Store::open_in_memory().unwrap();
    let engine = BudgetAllocationEngine::load(&fresh).unwrap();
    assert!(!engine.recovered_from_corruption());
}

// ── Summary and status ────────────────────────────────────────

#[test]
fn test_percentage_guard_when_total_zero() {
    let store = Store::open_in_memory().unwrap();
    let engine = BudgetAllocationEngine::load(&store).unwrap();
    let summary = engine.summary();
    assert_eq!(summary.total, dec!(0));
    assert_eq!(summary.percentage_used, dec!(0));
}

#[test]
fn test_status_thresholds() {
    assert_eq!(BudgetStatus::from_percentage(dec!(0)), BudgetStatus::Ok);
    assert_eq!(BudgetStatus::from_percentage(dec!(49.99)), BudgetStatus::Ok);
    assert_eq!(
        BudgetStatus::from_percentage(dec!(50)),
        BudgetStatus::Warning
    );
    assert_eq!(
        BudgetStatus::from_percentage(dec!(79.99)),
        BudgetStatus::Warning
    );
    assert_eq!(
        BudgetStatus::from_percentage(dec!(80)),
        BudgetStatus::Critical
    );
    assert_eq!(
        BudgetStatus::from_percentage(dec!(150)),
        BudgetStatus::Critical
    );
}

#[test]
fn test_category_and_overall_status_agree() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = engine_with(
        &store,
        BudgetCatalog {
            total_budget: dec!(100),
            items: vec![CategoryLine::new("A".into(), dec!(100))],
        },
    );
    engine.allocate(&store, "p1", dec!(80), "A", None).unwrap();
    assert_eq!(engine.category_status("A"), BudgetStatus::Critical);
    assert_eq!(engine.overall_status(), BudgetStatus::Critical);
}

#[test]
fn test_category_status_zero_cap() {
    let store = Store::open_in_memory().unwrap();
    let engine = engine_with(&store, two_category_catalog());
    assert_eq!(engine.category_status("Nonexistent"), BudgetStatus::Ok);
}

#[test]
fn test_category_breakdown_rows() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = engine_with(&store, two_category_catalog());
    engine.allocate(&store, "p1", dec!(300), "A", None).unwrap();

    let rows = engine.category_breakdown();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].category, "A");
    assert_eq!(rows[0].allocated, dec!(300));
    assert_eq!(rows[0].available, dec!(300));
    assert_eq!(rows[0].status, BudgetStatus::Warning);
    assert_eq!(rows[1].allocated, dec!(0));
    assert_eq!(rows[1].status, BudgetStatus::Ok);
}

// ── Catalog replacement ───────────────────────────────────────

#[test]
fn test_replace_catalog_reports_overcommit() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = engine_with(&store, two_category_catalog());
    engine.allocate(&store, "p1", dec!(500), "A", None).unwrap();
    engine.allocate(&store, "p2", dec!(400), "B", None).unwrap();

    // Re-import a smaller budget: A shrinks, B disappears.
    let report = engine
        .replace_catalog(
            &store,
            BudgetCatalog {
                total_budget: dec!(300),
                items: vec![CategoryLine::new("A".into(), dec!(300))],
            },
        )
        .unwrap();

    assert_eq!(report.len(), 2);
    let a = report.iter().find(|r| r.category == "A").unwrap();
    assert_eq!(a.cap, dec!(300));
    assert_eq!(a.allocated, dec!(500));
    assert_eq!(a.excess, dec!(200));
    let b = report.iter().find(|r| r.category == "B").unwrap();
    assert_eq!(b.cap, dec!(0));
    assert_eq!(b.excess, dec!(400));

    // Display stays clamped; raw value shows the deficit.
    assert_eq!(engine.total_available(), dec!(0));
    assert_eq!(engine.raw_available(), dec!(-600));
}

#[test]
fn test_replace_catalog_clean_when_nothing_overcommitted() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = engine_with(&store, two_category_catalog());
    engine.allocate(&store, "p1", dec!(100), "A", None).unwrap();

    let report = engine
        .replace_catalog(&store, two_category_catalog())
        .unwrap();
    assert!(report.is_empty());
    // Replacement persisted.
    assert_eq!(
        store.load_catalog().unwrap().into_option().unwrap(),
        two_category_catalog()
    );
}

#[test]
fn test_exact_fill_allowed() {
    let store = Store::open_in_memory().unwrap();
    let mut engine = engine_with(&store, two_category_catalog());
    assert!(engine
        .allocate(&store, "p1", dec!(600), "A", None)
        .unwrap());
    assert_eq!(engine.category_available("A"), dec!(0));
    // One centavo more is refused.
    assert!(!engine
        .allocate(&store, "p2", dec!(0.01), "A", None)
        .unwrap());
}
