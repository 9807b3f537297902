//! Bulk import: one transaction, out-of-order categories, totals rebuilt.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use costbook_core::EngineError;
use costbook_core::input::{Batch, CategoryInput, ContributorInput, ProjectInput};
use costbook_db::models::{CategoryRole, PriceReference, Procurement, Quantity};
use costbook_test_utils::memory_engine;

fn category(id: &str, parent: Option<&str>, role: Option<CategoryRole>) -> CategoryInput {
    CategoryInput {
        id: id.into(),
        name: format!("Partida {id}"),
        project_id: "p1".into(),
        parent_id: parent.map(str::to_owned),
        related_category: None,
        is_final: parent.is_some(),
        role,
    }
}

fn sample_batch() -> Batch {
    Batch {
        projects: vec![ProjectInput {
            id: "p1".into(),
            name: "Planta Norte".into(),
            related_project: None,
            contingency_pct: dec!(10),
            profit_pct: Decimal::ZERO,
        }],
        exchange_rates: vec![],
        // Child listed before its parent on purpose.
        categories: vec![
            category("a", Some("root"), Some(CategoryRole::Ordinary)),
            category("root", None, Some(CategoryRole::Ordinary)),
            category("ctg", None, Some(CategoryRole::Contingency)),
        ],
        quantities: vec![Quantity {
            id: 0,
            category_id: "a".into(),
            unit: "m3".into(),
            quantity: dec!(100),
            growth_factor: dec!(10),
            final_quantity: Decimal::ZERO,
        }],
        price_references: vec![PriceReference {
            id: 0,
            category_id: "a".into(),
            supply_type: "NAC".into(),
            currency: "USD".into(),
            reference_date: NaiveDate::from_ymd_opt(2024, 1, 15).expect("date"),
            applied_rate: Decimal::ONE,
            unit_freight_pct: dec!(5),
            exchange_rate: Decimal::ONE,
        }],
        contributors: vec![ContributorInput::Procurement(Procurement {
            id: 0,
            category_id: Some("a".into()),
            origin_type: "NAC".into(),
            category_type: "equipos".into(),
            unit_cost: dec!(2),
            growth_pct: Decimal::ZERO,
            total: Decimal::ZERO,
            freight: Decimal::ZERO,
            total_with_freight: Decimal::ZERO,
        })],
    }
}

#[test]
fn import_rebuilds_totals_bottom_up() {
    let mut engine = memory_engine();
    let summary = engine.import(&sample_batch()).expect("import");
    assert_eq!(summary.projects, 1);
    assert_eq!(summary.categories, 3);
    assert_eq!(summary.contributors, 1);

    assert_eq!(engine.category_total("a").expect("a"), dec!(231.00));
    assert_eq!(engine.category_total("root").expect("root"), dec!(231.00));
    assert_eq!(engine.category_total("ctg").expect("ctg"), dec!(23.10));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(254.10));

    let a = engine.category("a").expect("get").expect("some");
    assert_eq!(a.level, 2);
}

#[test]
fn import_rejects_unknown_parents() {
    let mut engine = memory_engine();
    let mut batch = sample_batch();
    batch.categories.push(category("orphan", Some("ghost"), None));

    let err = engine.import(&batch).unwrap_err();
    assert!(matches!(err, EngineError::MissingCategory(id) if id == "ghost"));
    // The failed import committed nothing.
    assert!(engine.project("p1").expect("get").is_none());
}

#[test]
fn import_is_repeatable() {
    let mut engine = memory_engine();
    engine.import(&sample_batch()).expect("first import");
    engine.import(&sample_batch()).expect("second import");

    // Upserted rows plus fresh contributor records: the procurement carries
    // id 0 and inserts again, doubling the category's spend.
    assert_eq!(engine.category_total("a").expect("a"), dec!(462.00));
}
