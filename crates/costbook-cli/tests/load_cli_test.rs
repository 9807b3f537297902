//! Integration test for the batch JSON format the `costbook load` command
//! accepts, run against a file-backed database.

use costbook_core::Engine;
use costbook_core::input::Batch;
use rust_decimal_macros::dec;

const BATCH: &str = r#"{
  "projects": [
    { "id": "p1", "name": "Planta Norte", "contingency_pct": 0, "profit_pct": 0 }
  ],
  "categories": [
    { "id": "root", "name": "Obras Civiles", "project_id": "p1" },
    { "id": "a", "name": "Hormigones", "project_id": "p1", "parent_id": "root", "is_final": true }
  ],
  "quantities": [
    { "category_id": "a", "unit": "m3", "quantity": 100, "growth_factor": 10 }
  ],
  "price_references": [
    {
      "category_id": "a",
      "supply_type": "NAC",
      "currency": "USD",
      "reference_date": "2024-01-15",
      "applied_rate": 1,
      "unit_freight_pct": 5,
      "exchange_rate": 1
    }
  ],
  "contributors": [
    {
      "kind": "procurement",
      "category_id": "a",
      "origin_type": "NAC",
      "category_type": "equipos",
      "unit_cost": 2,
      "growth_pct": 0
    }
  ]
}"#;

#[test]
fn batch_json_loads_and_persists() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("estimates.db");

    let batch: Batch = serde_json::from_str(BATCH).expect("parse batch");
    let mut engine = Engine::open(&path).expect("open");
    let summary = engine.import(&batch).expect("import");
    assert_eq!(summary.projects, 1);
    assert_eq!(summary.categories, 2);
    assert_eq!(summary.contributors, 1);

    assert_eq!(engine.category_total("a").expect("a"), dec!(231.00));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(231.00));
    drop(engine);

    // Cached totals survive a reopen.
    let engine = Engine::open(&path).expect("reopen");
    assert_eq!(engine.project_total("p1").expect("project"), dec!(231.00));
}
