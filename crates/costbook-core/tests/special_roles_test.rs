//! Special category roles: totals derived from sibling and project-wide
//! aggregates instead of the category's own records.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use costbook_core::input::ContributorInput;
use costbook_db::models::{
    CategoryRole, DetailEngineering, OwnerCost, Procurement, ProcurementManagement,
};
use costbook_test_utils::{memory_engine, seed_category, seed_project, seed_references};

fn owner_cost(category: &str, hours: Decimal, hourly: Decimal) -> ContributorInput {
    ContributorInput::OwnerCost(OwnerCost {
        id: 0,
        category_id: category.into(),
        name: "Costo propietario".into(),
        total_hours: hours,
        hourly_cost: hourly,
        total_cost: Decimal::ZERO,
    })
}

#[test]
fn contingency_is_percentage_of_other_roots() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", dec!(10), Decimal::ZERO);
    seed_category(&mut engine, "c1", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "c2", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "ctg", "p1", None, CategoryRole::Contingency);

    engine.save_contributor(&owner_cost("c1", dec!(50), dec!(2))).expect("c1");
    engine.save_contributor(&owner_cost("c2", dec!(100), dec!(2))).expect("c2");

    assert_eq!(engine.category_total("ctg").expect("ctg"), dec!(30.00));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(330.00));
}

#[test]
fn contingency_excludes_its_own_total_from_the_base() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", dec!(10), Decimal::ZERO);
    seed_category(&mut engine, "c1", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "ctg", "p1", None, CategoryRole::Contingency);

    let saved = engine.save_contributor(&owner_cost("c1", dec!(50), dec!(2))).expect("c1");
    assert_eq!(engine.category_total("ctg").expect("ctg"), dec!(10.00));

    // A no-op resave must not compound the contingency into its own base.
    engine
        .save_contributor(&ContributorInput::OwnerCost(OwnerCost {
            id: saved.id,
            category_id: "c1".into(),
            name: "Costo propietario".into(),
            total_hours: dec!(50),
            hourly_cost: dec!(2),
            total_cost: Decimal::ZERO,
        }))
        .expect("resave");
    assert_eq!(engine.category_total("ctg").expect("ctg"), dec!(10.00));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(110.00));
}

#[test]
fn profit_percentage_tracks_root_totals() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, dec!(5));
    seed_category(&mut engine, "c1", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "uti", "p1", None, CategoryRole::Profit);

    engine.save_contributor(&owner_cost("c1", dec!(150), dec!(2))).expect("c1");

    assert_eq!(engine.category_total("uti").expect("uti"), dec!(15.00));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(315.00));
}

#[test]
fn percentage_change_resettles_without_new_records() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", dec!(10), Decimal::ZERO);
    seed_category(&mut engine, "c1", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "ctg", "p1", None, CategoryRole::Contingency);
    engine.save_contributor(&owner_cost("c1", dec!(150), dec!(2))).expect("c1");
    assert_eq!(engine.category_total("ctg").expect("ctg"), dec!(30.00));

    let project = engine
        .set_project_percentages("p1", dec!(20), Decimal::ZERO)
        .expect("update percentages");
    assert_eq!(project.contingency_pct, dec!(20));

    assert_eq!(engine.category_total("ctg").expect("ctg"), dec!(60.00));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(360.00));
}

#[test]
fn vendor_assistance_follows_project_procurement_spend() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "c1", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "vdr", "p1", None, CategoryRole::VendorAssistance);
    seed_references(&mut engine, "c1");

    engine
        .save_contributor(&ContributorInput::Procurement(Procurement {
            id: 0,
            category_id: Some("c1".into()),
            origin_type: "IMP".into(),
            category_type: "equipos".into(),
            unit_cost: dec!(2),
            growth_pct: Decimal::ZERO,
            total: Decimal::ZERO,
            freight: Decimal::ZERO,
            total_with_freight: Decimal::ZERO,
        }))
        .expect("procurement");

    // 0.5% of the 220 procurement total (freight excluded from the base).
    assert_eq!(engine.category_total("vdr").expect("vdr"), dec!(1.10));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(232.10));
}

#[test]
fn vendor_assistance_ignores_its_own_procurements() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "c1", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "vdr", "p1", None, CategoryRole::VendorAssistance);
    seed_references(&mut engine, "c1");
    seed_references(&mut engine, "vdr");

    for cat in ["c1", "vdr"] {
        engine
            .save_contributor(&ContributorInput::Procurement(Procurement {
                id: 0,
                category_id: Some(cat.into()),
                origin_type: "IMP".into(),
                category_type: "equipos".into(),
                unit_cost: dec!(2),
                growth_pct: Decimal::ZERO,
                total: Decimal::ZERO,
                freight: Decimal::ZERO,
                total_with_freight: Decimal::ZERO,
            }))
            .expect("procurement");
    }

    // Both categories carry a 220 procurement total; only c1's counts.
    assert_eq!(engine.category_total("vdr").expect("vdr"), dec!(1.10));
}

#[test]
fn vendor_assistance_resettles_when_references_change() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "c1", "p1", None, CategoryRole::Ordinary);
    seed_category(&mut engine, "vdr", "p1", None, CategoryRole::VendorAssistance);
    seed_references(&mut engine, "c1");

    engine
        .save_contributor(&ContributorInput::Procurement(Procurement {
            id: 0,
            category_id: Some("c1".into()),
            origin_type: "IMP".into(),
            category_type: "equipos".into(),
            unit_cost: dec!(2),
            growth_pct: Decimal::ZERO,
            total: Decimal::ZERO,
            freight: Decimal::ZERO,
            total_with_freight: Decimal::ZERO,
        }))
        .expect("procurement");
    assert_eq!(engine.category_total("vdr").expect("vdr"), dec!(1.10));

    // Deleting the quantity revalues the procurement to zero; the vendor
    // category tracks the shrunken base without a procurement save.
    let quantity = costbook_db::queries::references::first_quantity(engine.connection(), "c1")
        .expect("query")
        .expect("some");
    engine.delete_quantity(quantity.id).expect("delete quantity");

    assert_eq!(engine.category_total("c1").expect("c1"), dec!(0.00));
    assert_eq!(engine.category_total("vdr").expect("vdr"), dec!(0.00));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(0.00));
}

#[test]
fn detail_engineering_sums_hours_times_rate() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "ing", "p1", None, CategoryRole::DetailEngineering);

    for (hours, rate) in [(dec!(10), dec!(5)), (dec!(3), dec!(10))] {
        engine
            .save_contributor(&ContributorInput::DetailEngineering(DetailEngineering {
                id: 0,
                category_id: "ing".into(),
                professional_hours: hours,
                hourly_rate: rate,
                total_cost: Decimal::ZERO,
            }))
            .expect("detail engineering");
    }

    assert_eq!(engine.category_total("ing").expect("ing"), dec!(80.00));
    assert_eq!(engine.project_total("p1").expect("project"), dec!(80.00));
}

#[test]
fn procurement_management_role_adds_travel() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", Decimal::ZERO, Decimal::ZERO);
    seed_category(&mut engine, "gdc", "p1", None, CategoryRole::ProcurementManagement);

    engine
        .save_contributor(&ContributorInput::ProcurementManagement(
            ProcurementManagement {
                id: 0,
                category_id: "gdc".into(),
                buyers: 1,
                dedication_pct: dec!(100),
                term_months: dec!(1),
                salary: dec!(0.01),
                travel_value: dec!(3.60),
                management_value: Decimal::ZERO,
            },
        ))
        .expect("procurement management");

    // management 1 * 1 * 0.01 * 4 * 160 = 6.40, plus 3.60 travel.
    assert_eq!(engine.category_total("gdc").expect("gdc"), dec!(10.00));
}

#[test]
fn role_is_derived_from_legacy_names_when_omitted() {
    let mut engine = memory_engine();
    seed_project(&mut engine, "p1", dec!(10), Decimal::ZERO);
    seed_category(&mut engine, "c1", "p1", None, CategoryRole::Ordinary);
    engine
        .save_category(&costbook_core::input::CategoryInput {
            id: "ctg".into(),
            name: "Contingencia".into(),
            project_id: "p1".into(),
            parent_id: None,
            related_category: None,
            is_final: false,
            role: None,
        })
        .expect("category");
    engine.save_contributor(&owner_cost("c1", dec!(50), dec!(2))).expect("c1");

    let ctg = engine.category("ctg").expect("get").expect("some");
    assert_eq!(ctg.role, CategoryRole::Contingency);
    assert_eq!(ctg.total_cost, dec!(10.00));
}
