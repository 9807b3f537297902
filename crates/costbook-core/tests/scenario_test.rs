//! End-to-end flow: references feed valuation, valuation feeds category
//! totals, totals propagate to the project.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use costbook_core::input::ContributorInput;
use costbook_db::models::{CategoryRole, OwnerCost, Procurement, Quantity, Staff};
use costbook_test_utils::{memory_engine, seed_category, seed_project, seed_references};

fn procurement(category: &str, unit_cost: Decimal) -> ContributorInput {
    ContributorInput::Procurement(Procurement {
        id: 0,
        category_id: Some(category.into()),
        origin_type: "NAC".into(),
        category_type: "equipos".into(),
        unit_cost,
        growth_pct: Decimal::ZERO,
        total: Decimal::ZERO,
        freight: Decimal::ZERO,
        total_with_freight: Decimal::ZERO,
    })
}

#[test]
fn procurement_flows_into_project_total() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "c1", "p1", None, CategoryRole::Ordinary);
    seed_references(&mut engine, "c1");

    let saved = engine.save_contributor(&procurement("c1", dec!(2))).expect("save");
    assert!(saved.id > 0);

    // 110 final units at 2, plus 5% freight.
    assert_eq!(engine.category_total("c1").expect("category"), dec!(231.00));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(231.00));
}

#[test]
fn resaving_a_record_does_not_double_count() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "c1", "p1", None, CategoryRole::Ordinary);
    seed_references(&mut engine, "c1");

    let saved = engine.save_contributor(&procurement("c1", dec!(2))).expect("save");

    let mut again = Procurement {
        id: saved.id,
        category_id: Some("c1".into()),
        origin_type: "NAC".into(),
        category_type: "equipos".into(),
        unit_cost: dec!(2),
        growth_pct: Decimal::ZERO,
        total: Decimal::ZERO,
        freight: Decimal::ZERO,
        total_with_freight: Decimal::ZERO,
    };
    let resaved = engine
        .save_contributor(&ContributorInput::Procurement(again.clone()))
        .expect("resave");
    assert_eq!(resaved.id, saved.id);
    assert_eq!(engine.project_total("p1").expect("project"), dec!(231.00));

    // Changing the unit cost replaces the old contribution.
    again.unit_cost = dec!(4);
    engine
        .save_contributor(&ContributorInput::Procurement(again))
        .expect("update");
    assert_eq!(engine.project_total("p1").expect("project"), dec!(462.00));
}

#[test]
fn quantity_change_revalues_dependent_records() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "c1", "p1", None, CategoryRole::Ordinary);
    seed_references(&mut engine, "c1");
    engine.save_contributor(&procurement("c1", dec!(2))).expect("save");

    let q = engine
        .save_quantity(&Quantity {
            id: 0,
            category_id: "c1".into(),
            unit: "m3".into(),
            quantity: dec!(200),
            growth_factor: dec!(10),
            final_quantity: Decimal::ZERO,
        })
        .expect("second quantity");
    // First-match semantics: the original quantity still governs.
    assert_eq!(engine.category_total("c1").expect("category"), dec!(231.00));
    engine.delete_quantity(q.id).expect("delete extra");

    // Replacing the governing quantity doubles the priced volume.
    let first = costbook_db::queries::references::first_quantity(engine.connection(), "c1")
        .expect("query")
        .expect("some");
    engine
        .save_quantity(&Quantity {
            quantity: dec!(200),
            final_quantity: Decimal::ZERO,
            ..first
        })
        .expect("update quantity");
    assert_eq!(engine.category_total("c1").expect("category"), dec!(462.00));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(462.00));
}

#[test]
fn parent_totals_are_sum_of_children() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "root", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "a", "p1", Some("root"), CategoryRole::Ordinary);
    seed_category(&mut engine, "b", "p1", Some("root"), CategoryRole::Ordinary);

    engine
        .save_contributor(&ContributorInput::Staff(Staff {
            id: 0,
            category_id: "a".into(),
            name: "Supervisor".into(),
            monthly_rate: dec!(1),
            headcount: 1,
            duration_months: 1,
            utilization_factor: dec!(1),
            total_man_hours: Decimal::ZERO,
            total_cost: Decimal::ZERO,
        }))
        .expect("staff");
    engine
        .save_contributor(&ContributorInput::OwnerCost(OwnerCost {
            id: 0,
            category_id: "b".into(),
            name: "Inspeccion".into(),
            total_hours: dec!(10),
            hourly_cost: dec!(2),
            total_cost: Decimal::ZERO,
        }))
        .expect("owner cost");

    assert_eq!(engine.category_total("a").expect("a"), dec!(180.00));
    assert_eq!(engine.category_total("b").expect("b"), dec!(20.00));
    assert_eq!(engine.category_total("root").expect("root"), dec!(200.00));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(200.00));

    let root = engine.category("root").expect("get").expect("some");
    assert_eq!(root.level, 1);
    let a = engine.category("a").expect("get").expect("some");
    assert_eq!(a.level, 2);
}

#[test]
fn deleting_a_record_rebalances_upward() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "root", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "a", "p1", Some("root"), CategoryRole::Ordinary);

    let saved = engine
        .save_contributor(&ContributorInput::OwnerCost(OwnerCost {
            id: 0,
            category_id: "a".into(),
            name: "Inspeccion".into(),
            total_hours: dec!(50),
            hourly_cost: dec!(2),
            total_cost: Decimal::ZERO,
        }))
        .expect("owner cost");
    assert_eq!(engine.project_total("p1").expect("project"), dec!(100.00));

    engine.delete_contributor(saved.kind, saved.id).expect("delete");
    assert_eq!(engine.category_total("a").expect("a"), dec!(0.00));
    assert_eq!(engine.category_total("root").expect("root"), dec!(0.00));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(0.00));
}
