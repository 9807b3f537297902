//! Integration tests for the query layer against an in-memory store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use costbook_db::models::{
    Category, CategoryRole, ContributorKind, Labor, PriceReference, Procurement, Project, Quantity,
    Staff,
};
use costbook_db::{queries, store};

fn seed_project(conn: &rusqlite::Connection) {
    queries::projects::upsert(
        conn,
        &Project {
            id: "p1".into(),
            name: "Planta Norte".into(),
            related_project: None,
            contingency_pct: dec!(10),
            profit_pct: dec!(5),
            total_cost: Decimal::ZERO,
        },
    )
    .expect("project");
    queries::categories::upsert(
        conn,
        &Category {
            id: "c1".into(),
            name: "Obras Civiles".into(),
            project_id: "p1".into(),
            parent_id: None,
            related_category: None,
            level: 1,
            is_final: true,
            role: CategoryRole::Ordinary,
            total_cost: Decimal::ZERO,
        },
    )
    .expect("category");
}

#[test]
fn project_upsert_preserves_cached_total() {
    let conn = store::open_in_memory().expect("open");
    seed_project(&conn);

    assert!(queries::projects::set_total(&conn, "p1", dec!(123.45)).expect("set"));

    // A metadata update must not clobber the propagated total.
    queries::projects::upsert(
        &conn,
        &Project {
            id: "p1".into(),
            name: "Planta Norte (rev B)".into(),
            related_project: None,
            contingency_pct: dec!(12),
            profit_pct: dec!(5),
            total_cost: Decimal::ZERO,
        },
    )
    .expect("upsert");

    let project = queries::projects::get(&conn, "p1").expect("get").expect("some");
    assert_eq!(project.name, "Planta Norte (rev B)");
    assert_eq!(project.contingency_pct, dec!(12));
    assert_eq!(project.total_cost, dec!(123.45));
}

#[test]
fn quantity_save_assigns_id_and_upserts() {
    let conn = store::open_in_memory().expect("open");
    seed_project(&conn);

    let id = queries::references::save_quantity(
        &conn,
        &Quantity {
            id: 0,
            category_id: "c1".into(),
            unit: "m3".into(),
            quantity: dec!(100),
            growth_factor: dec!(10),
            final_quantity: dec!(110),
        },
    )
    .expect("insert");
    assert!(id > 0);

    queries::references::save_quantity(
        &conn,
        &Quantity {
            id,
            category_id: "c1".into(),
            unit: "m3".into(),
            quantity: dec!(200),
            growth_factor: dec!(10),
            final_quantity: dec!(220),
        },
    )
    .expect("update");

    let q = queries::references::first_quantity(&conn, "c1")
        .expect("query")
        .expect("some");
    assert_eq!(q.id, id);
    assert_eq!(q.final_quantity, dec!(220));
}

#[test]
fn rollup_sums_per_kind_column() {
    let conn = store::open_in_memory().expect("open");
    seed_project(&conn);

    for total in [dec!(231.00), dec!(100.50)] {
        queries::contributors::save_procurement(
            &conn,
            &Procurement {
                id: 0,
                category_id: Some("c1".into()),
                origin_type: "NAC".into(),
                category_type: "equipos".into(),
                unit_cost: dec!(2),
                growth_pct: Decimal::ZERO,
                total: dec!(220),
                freight: dec!(11),
                total_with_freight: total,
            },
        )
        .expect("save");
    }

    let sum = queries::contributors::sum_rollup(&conn, ContributorKind::Procurement, "c1")
        .expect("sum");
    assert_eq!(sum, dec!(331.50));

    // Kinds without a roll-up column sum to zero.
    let none =
        queries::contributors::sum_rollup(&conn, ContributorKind::ProcurementManagement, "c1")
            .expect("sum");
    assert_eq!(none, Decimal::ZERO);
}

#[test]
fn vendor_sum_excludes_own_category() {
    let conn = store::open_in_memory().expect("open");
    seed_project(&conn);
    queries::categories::upsert(
        &conn,
        &Category {
            id: "c2".into(),
            name: "Montaje".into(),
            project_id: "p1".into(),
            parent_id: None,
            related_category: None,
            level: 1,
            is_final: true,
            role: CategoryRole::Ordinary,
            total_cost: Decimal::ZERO,
        },
    )
    .expect("category");

    for (cat, total) in [("c1", dec!(100)), ("c2", dec!(40))] {
        queries::contributors::save_procurement(
            &conn,
            &Procurement {
                id: 0,
                category_id: Some(cat.into()),
                origin_type: "IMP".into(),
                category_type: "equipos".into(),
                unit_cost: dec!(1),
                growth_pct: Decimal::ZERO,
                total,
                freight: Decimal::ZERO,
                total_with_freight: total,
            },
        )
        .expect("save");
    }

    let sum = queries::contributors::sum_procurement_total_excluding(&conn, "p1", "c2")
        .expect("sum");
    assert_eq!(sum, dec!(100));
}

#[test]
fn category_delete_detaches_labor_but_cascades_staff() {
    let conn = store::open_in_memory().expect("open");
    seed_project(&conn);

    let labor_id = queries::contributors::save_labor(
        &conn,
        &Labor {
            id: 0,
            category_id: Some("c1".into()),
            hours_per_unit: dec!(2),
            progress_factor: dec!(1),
            yield_factor: dec!(1),
            mod_rate: Decimal::ZERO,
            equipment_rate: Decimal::ZERO,
            hourly_cost: dec!(30),
            hours_final: dec!(2),
            total_hours: dec!(200),
            man_hours_qty: dec!(200),
            value_mod: Decimal::ZERO,
            value_equipment: Decimal::ZERO,
            total_value: dec!(6000),
        },
    )
    .expect("labor");
    let staff_id = queries::contributors::save_staff(
        &conn,
        &Staff {
            id: 0,
            category_id: "c1".into(),
            name: "Jefe de Terreno".into(),
            monthly_rate: dec!(25),
            headcount: 2,
            duration_months: 6,
            utilization_factor: dec!(1),
            total_man_hours: dec!(2160),
            total_cost: dec!(108000),
        },
    )
    .expect("staff");

    assert!(queries::categories::delete(&conn, "c1").expect("delete"));

    let labor_cat = queries::contributors::category_id(&conn, ContributorKind::Labor, labor_id)
        .expect("query")
        .expect("row exists");
    assert_eq!(labor_cat, None);

    let staff_row = queries::contributors::category_id(&conn, ContributorKind::Staff, staff_id)
        .expect("query");
    assert!(staff_row.is_none());
}

#[test]
fn price_reference_first_match_is_lowest_id() {
    let conn = store::open_in_memory().expect("open");
    seed_project(&conn);

    for rate in [dec!(1.5), dec!(9.9)] {
        queries::references::save_price_reference(
            &conn,
            &PriceReference {
                id: 0,
                category_id: "c1".into(),
                supply_type: "SUB".into(),
                currency: "USD".into(),
                reference_date: NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"),
                applied_rate: rate,
                unit_freight_pct: dec!(5),
                exchange_rate: dec!(1),
            },
        )
        .expect("save");
    }

    let first = queries::references::first_price_reference(&conn, "c1")
        .expect("query")
        .expect("some");
    assert_eq!(first.applied_rate, dec!(1.5));
}
