//! Shared test utilities for costbook integration tests.
//!
//! Every test gets its own in-memory engine; the seed helpers build the
//! common fixture of one project with a handful of categories so tests only
//! spell out the records they actually exercise.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use costbook_core::Engine;
use costbook_core::input::{CategoryInput, ProjectInput};
use costbook_db::models::{CategoryRole, PriceReference, Quantity};

/// A fresh in-memory engine with the schema applied.
pub fn memory_engine() -> Engine {
    Engine::in_memory().expect("in-memory engine")
}

/// Create a project with the given percentage knobs.
pub fn seed_project(engine: &mut Engine, id: &str, contingency_pct: Decimal, profit_pct: Decimal) {
    engine
        .save_project(&ProjectInput {
            id: id.into(),
            name: format!("Proyecto {id}"),
            related_project: None,
            contingency_pct,
            profit_pct,
        })
        .expect("seed project");
}

/// Create a final (leaf) category with an explicit role.
pub fn seed_category(
    engine: &mut Engine,
    id: &str,
    project_id: &str,
    parent_id: Option<&str>,
    role: CategoryRole,
) {
    engine
        .save_category(&CategoryInput {
            id: id.into(),
            name: format!("Partida {id}"),
            project_id: project_id.into(),
            parent_id: parent_id.map(str::to_owned),
            related_category: None,
            is_final: true,
            role: Some(role),
        })
        .expect("seed category");
}

/// Attach the standard reference pair used across scenario tests: quantity
/// 100 with 10% growth (final 110) and a 5% unit freight reference.
pub fn seed_references(engine: &mut Engine, category_id: &str) {
    engine
        .save_quantity(&Quantity {
            id: 0,
            category_id: category_id.into(),
            unit: "m3".into(),
            quantity: dec!(100),
            growth_factor: dec!(10),
            final_quantity: Decimal::ZERO,
        })
        .expect("seed quantity");
    engine
        .save_price_reference(&PriceReference {
            id: 0,
            category_id: category_id.into(),
            supply_type: "NAC".into(),
            currency: "USD".into(),
            reference_date: NaiveDate::from_ymd_opt(2024, 1, 15).expect("date"),
            applied_rate: Decimal::ONE,
            unit_freight_pct: dec!(5),
            exchange_rate: Decimal::ONE,
        })
        .expect("seed price reference");
}
