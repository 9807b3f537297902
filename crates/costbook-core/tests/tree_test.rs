//! Structural edits: cycle rejection, reparenting, and deletion semantics.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use costbook_core::EngineError;
use costbook_core::input::{CategoryInput, ContributorInput};
use costbook_db::models::{CategoryRole, ContributorKind, OwnerCost, Procurement};
use costbook_db::queries;
use costbook_test_utils::{memory_engine, seed_category, seed_project, seed_references};

fn owner_cost(category: &str, hours: Decimal) -> ContributorInput {
    ContributorInput::OwnerCost(OwnerCost {
        id: 0,
        category_id: category.into(),
        name: "Inspeccion".into(),
        total_hours: hours,
        hourly_cost: dec!(2),
        total_cost: Decimal::ZERO,
    })
}

#[test]
fn reparenting_into_own_subtree_is_rejected() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "a", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "b", "p1", Some("a"), CategoryRole::Ordinary);

    let err = engine
        .save_category(&CategoryInput {
            id: "a".into(),
            name: "Partida a".into(),
            project_id: "p1".into(),
            parent_id: Some("b".into()),
            related_category: None,
            is_final: true,
            role: Some(CategoryRole::Ordinary),
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::CyclicParent(id) if id == "a"));

    // The rejected write left nothing behind.
    let a = engine.category("a").expect("get").expect("some");
    assert_eq!(a.parent_id, None);
}

#[test]
fn parent_in_another_project_is_rejected() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_project(&mut engine, "p2", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "a", "p1", None, CategoryRole::Ordinary);

    let err = engine
        .save_category(&CategoryInput {
            id: "b".into(),
            name: "Partida b".into(),
            project_id: "p2".into(),
            parent_id: Some("a".into()),
            related_category: None,
            is_final: true,
            role: Some(CategoryRole::Ordinary),
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::ProjectMismatch { .. }));
}

#[test]
fn reparenting_moves_the_subtree_weight() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "r1", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "r2", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "a", "p1", Some("r1"), CategoryRole::Ordinary);
    engine.save_contributor(&owner_cost("a", dec!(50))).expect("owner");

    assert_eq!(engine.category_total("r1").expect("r1"), dec!(100.00));
    assert_eq!(engine.category_total("r2").expect("r2"), dec!(0.00));

    engine
        .save_category(&CategoryInput {
            id: "a".into(),
            name: "Partida a".into(),
            project_id: "p1".into(),
            parent_id: Some("r2".into()),
            related_category: None,
            is_final: true,
            role: Some(CategoryRole::Ordinary),
        })
        .expect("reparent");

    assert_eq!(engine.category_total("r1").expect("r1"), dec!(0.00));
    assert_eq!(engine.category_total("r2").expect("r2"), dec!(100.00));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(100.00));
}

#[test]
fn deleting_a_category_rebalances_ancestors() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "root", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "a", "p1", Some("root"), CategoryRole::Ordinary);
    seed_category(&mut engine, "b", "p1", Some("root"), CategoryRole::Ordinary);
    engine.save_contributor(&owner_cost("a", dec!(50))).expect("a");
    engine.save_contributor(&owner_cost("b", dec!(25))).expect("b");
    assert_eq!(engine.project_total("p1").expect("project"), dec!(150.00));

    engine.delete_category("a").expect("delete");

    assert!(engine.category("a").expect("get").is_none());
    assert_eq!(engine.category_total("root").expect("root"), dec!(50.00));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(50.00));
}

#[test]
fn deleting_a_root_refreshes_the_project() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "a", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "b", "p1", None, CategoryRole::Ordinary);
    engine.save_contributor(&owner_cost("a", dec!(50))).expect("a");
    engine.save_contributor(&owner_cost("b", dec!(25))).expect("b");

    engine.delete_category("a").expect("delete");
    assert_eq!(engine.project_total("p1").expect("project"), dec!(50.00));
}

#[test]
fn category_deletion_detaches_procurement_but_drops_owner_costs() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "c1", "p1", None, CategoryRole::Ordinary);
    seed_references(&mut engine, "c1");

    let procurement = engine
        .save_contributor(&ContributorInput::Procurement(Procurement {
            id: 0,
            category_id: Some("c1".into()),
            origin_type: "NAC".into(),
            category_type: "equipos".into(),
            unit_cost: dec!(2),
            growth_pct: Decimal::ZERO,
            total: Decimal::ZERO,
            freight: Decimal::ZERO,
            total_with_freight: Decimal::ZERO,
        }))
        .expect("procurement");
    let owner = engine.save_contributor(&owner_cost("c1", dec!(50))).expect("owner");

    engine.delete_category("c1").expect("delete");

    // Procurement survives detached; the owner cost went with the category.
    let detached = queries::contributors::category_id(
        engine.connection(),
        ContributorKind::Procurement,
        procurement.id,
    )
    .expect("query")
    .expect("row exists");
    assert_eq!(detached, None);

    let gone =
        queries::contributors::category_id(engine.connection(), ContributorKind::OwnerCost, owner.id)
            .expect("query");
    assert!(gone.is_none());

    assert_eq!(engine.project_total("p1").expect("project"), dec!(0.00));
}

#[test]
fn deleting_a_detached_record_needs_no_propagation() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "c1", "p1", None, CategoryRole::Ordinary);
    seed_references(&mut engine, "c1");
    let saved = engine
        .save_contributor(&ContributorInput::Procurement(Procurement {
            id: 0,
            category_id: Some("c1".into()),
            origin_type: "NAC".into(),
            category_type: "equipos".into(),
            unit_cost: dec!(2),
            growth_pct: Decimal::ZERO,
            total: Decimal::ZERO,
            freight: Decimal::ZERO,
            total_with_freight: Decimal::ZERO,
        }))
        .expect("procurement");
    engine.delete_category("c1").expect("delete category");

    engine
        .delete_contributor(ContributorKind::Procurement, saved.id)
        .expect("delete detached");
    let err = engine
        .delete_contributor(ContributorKind::Procurement, saved.id)
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[test]
fn unknown_category_is_reported() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);

    let err = engine.save_contributor(&owner_cost("nope", dec!(1))).unwrap_err();
    assert!(matches!(err, EngineError::MissingCategory(id) if id == "nope"));
}

#[test]
fn detachable_record_without_category_is_rejected() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "c1", "p1", None, CategoryRole::Ordinary);

    let err = engine
        .save_contributor(&ContributorInput::Procurement(Procurement {
            id: 0,
            category_id: None,
            origin_type: "NAC".into(),
            category_type: "equipos".into(),
            unit_cost: dec!(2),
            growth_pct: Decimal::ZERO,
            total: Decimal::ZERO,
            freight: Decimal::ZERO,
            total_with_freight: Decimal::ZERO,
        }))
        .unwrap_err();
    assert!(matches!(err, EngineError::MissingCategory(id) if id.is_empty()));
}
