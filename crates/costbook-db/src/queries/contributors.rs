//! Query functions for the seventeen contributor tables.
//!
//! Derived fields arrive precomputed from `costbook-core`; this module only
//! persists and reads them. Kinds whose derived values depend on the
//! category's quantity or price reference expose `list_*_by_category` so the
//! engine can revalue them in dependency order when a reference changes.

use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::models::{
    AdminFinancial, AdminSupervision, CategoryOverhead, ConstructionEquipment, Contract,
    ContributorKind, CounterpartEngineering, DetailEngineering, IndirectPersonnel, Labor,
    OtherAdmin, OtherMaterials, OwnerCost, PermitManagement, Procurement, ProcurementManagement,
    Staff, SupportServices,
};

use super::{dec, sum_decimal};

// ---------------------------------------------------------------------------
// Kind-generic helpers
// ---------------------------------------------------------------------------

/// Delete a contributor record of any kind. Returns false when the id is
/// unknown.
pub fn delete(conn: &Connection, kind: ContributorKind, id: i64) -> rusqlite::Result<bool> {
    let n = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
        params![id],
    )?;
    Ok(n > 0)
}

/// The owning category of a contributor record.
///
/// Outer `None` means the record does not exist; inner `None` means the
/// record was detached from its category.
pub fn category_id(
    conn: &Connection,
    kind: ContributorKind,
    id: i64,
) -> rusqlite::Result<Option<Option<String>>> {
    conn.query_row(
        &format!("SELECT category_id FROM {} WHERE id = ?1", kind.table()),
        params![id],
        |row| row.get(0),
    )
    .optional()
}

/// Sum a kind's roll-up column over one category. Kinds without a roll-up
/// column (procurement management) sum to zero.
pub fn sum_rollup(
    conn: &Connection,
    kind: ContributorKind,
    category_id: &str,
) -> rusqlite::Result<Decimal> {
    let Some(column) = kind.rollup_column() else {
        return Ok(Decimal::ZERO);
    };
    sum_decimal(
        conn,
        &format!(
            "SELECT {column} FROM {} WHERE category_id = ?1",
            kind.table()
        ),
        params![category_id],
    )
}

/// Sum procurement `total` across a whole project, excluding records
/// attached to one category. Feeds the vendor-assistance formula.
pub fn sum_procurement_total_excluding(
    conn: &Connection,
    project_id: &str,
    exclude_category_id: &str,
) -> rusqlite::Result<Decimal> {
    sum_decimal(
        conn,
        "SELECT p.total FROM procurements p \
         JOIN categories c ON c.id = p.category_id \
         WHERE c.project_id = ?1 AND p.category_id <> ?2",
        params![project_id, exclude_category_id],
    )
}

/// Sum `management_value + travel_value` over a category's procurement
/// management records. Feeds the ProcurementManagement role.
pub fn sum_procurement_management(
    conn: &Connection,
    category_id: &str,
) -> rusqlite::Result<Decimal> {
    let mut stmt = conn.prepare(
        "SELECT management_value, travel_value FROM procurement_management \
         WHERE category_id = ?1",
    )?;
    let rows = stmt.query_map(params![category_id], |row| {
        Ok((dec(row, 0)?, dec(row, 1)?))
    })?;
    let mut total = Decimal::ZERO;
    for row in rows {
        let (management, travel) = row?;
        total += management + travel;
    }
    Ok(total)
}

// ---------------------------------------------------------------------------
// Procurement
// ---------------------------------------------------------------------------

fn procurement_from_row(row: &Row<'_>) -> rusqlite::Result<Procurement> {
    Ok(Procurement {
        id: row.get(0)?,
        category_id: row.get(1)?,
        origin_type: row.get(2)?,
        category_type: row.get(3)?,
        unit_cost: dec(row, 4)?,
        growth_pct: dec(row, 5)?,
        total: dec(row, 6)?,
        freight: dec(row, 7)?,
        total_with_freight: dec(row, 8)?,
    })
}

const PROCUREMENT_COLUMNS: &str = "id, category_id, origin_type, category_type, unit_cost, \
                                   growth_pct, total, freight, total_with_freight";

/// Insert (id == 0) or upsert (explicit id) a procurement record.
pub fn save_procurement(conn: &Connection, r: &Procurement) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO procurements \
                 (category_id, origin_type, category_type, unit_cost, growth_pct, \
                  total, freight, total_with_freight) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                r.category_id,
                r.origin_type,
                r.category_type,
                r.unit_cost.to_string(),
                r.growth_pct.to_string(),
                r.total.to_string(),
                r.freight.to_string(),
                r.total_with_freight.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO procurements \
                 (id, category_id, origin_type, category_type, unit_cost, growth_pct, \
                  total, freight, total_with_freight) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 origin_type = excluded.origin_type, \
                 category_type = excluded.category_type, \
                 unit_cost = excluded.unit_cost, \
                 growth_pct = excluded.growth_pct, \
                 total = excluded.total, \
                 freight = excluded.freight, \
                 total_with_freight = excluded.total_with_freight",
            params![
                r.id,
                r.category_id,
                r.origin_type,
                r.category_type,
                r.unit_cost.to_string(),
                r.growth_pct.to_string(),
                r.total.to_string(),
                r.freight.to_string(),
                r.total_with_freight.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

/// List a category's procurement records.
pub fn list_procurement_by_category(
    conn: &Connection,
    category_id: &str,
) -> rusqlite::Result<Vec<Procurement>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROCUREMENT_COLUMNS} FROM procurements WHERE category_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![category_id], procurement_from_row)?;
    rows.collect()
}

// ---------------------------------------------------------------------------
// Other materials
// ---------------------------------------------------------------------------

fn other_materials_from_row(row: &Row<'_>) -> rusqlite::Result<OtherMaterials> {
    Ok(OtherMaterials {
        id: row.get(0)?,
        category_id: row.get(1)?,
        unit_cost: dec(row, 2)?,
        growth_pct: dec(row, 3)?,
        total: dec(row, 4)?,
        freight: dec(row, 5)?,
        site_total: dec(row, 6)?,
    })
}

const OTHER_MATERIALS_COLUMNS: &str =
    "id, category_id, unit_cost, growth_pct, total, freight, site_total";

/// Insert (id == 0) or upsert (explicit id) an other-materials record.
pub fn save_other_materials(conn: &Connection, r: &OtherMaterials) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO other_materials \
                 (category_id, unit_cost, growth_pct, total, freight, site_total) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                r.category_id,
                r.unit_cost.to_string(),
                r.growth_pct.to_string(),
                r.total.to_string(),
                r.freight.to_string(),
                r.site_total.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO other_materials \
                 (id, category_id, unit_cost, growth_pct, total, freight, site_total) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 unit_cost = excluded.unit_cost, \
                 growth_pct = excluded.growth_pct, \
                 total = excluded.total, \
                 freight = excluded.freight, \
                 site_total = excluded.site_total",
            params![
                r.id,
                r.category_id,
                r.unit_cost.to_string(),
                r.growth_pct.to_string(),
                r.total.to_string(),
                r.freight.to_string(),
                r.site_total.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

/// List a category's other-materials records.
pub fn list_other_materials_by_category(
    conn: &Connection,
    category_id: &str,
) -> rusqlite::Result<Vec<OtherMaterials>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {OTHER_MATERIALS_COLUMNS} FROM other_materials \
         WHERE category_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![category_id], other_materials_from_row)?;
    rows.collect()
}

/// The category's other-materials record under first-match semantics.
/// Feeds the contract formula.
pub fn first_other_materials(
    conn: &Connection,
    category_id: &str,
) -> rusqlite::Result<Option<OtherMaterials>> {
    conn.query_row(
        &format!(
            "SELECT {OTHER_MATERIALS_COLUMNS} FROM other_materials \
             WHERE category_id = ?1 ORDER BY id LIMIT 1"
        ),
        params![category_id],
        other_materials_from_row,
    )
    .optional()
}

// ---------------------------------------------------------------------------
// Construction equipment
// ---------------------------------------------------------------------------

fn construction_equipment_from_row(row: &Row<'_>) -> rusqlite::Result<ConstructionEquipment> {
    Ok(ConstructionEquipment {
        id: row.get(0)?,
        category_id: row.get(1)?,
        machine_hours_per_unit: dec(row, 2)?,
        machine_hourly_cost: dec(row, 3)?,
        total_machine_hours: dec(row, 4)?,
        total_value: dec(row, 5)?,
    })
}

const CONSTRUCTION_EQUIPMENT_COLUMNS: &str = "id, category_id, machine_hours_per_unit, \
                                              machine_hourly_cost, total_machine_hours, total_value";

/// Insert (id == 0) or upsert (explicit id) a construction-equipment record.
pub fn save_construction_equipment(
    conn: &Connection,
    r: &ConstructionEquipment,
) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO construction_equipment \
                 (category_id, machine_hours_per_unit, machine_hourly_cost, \
                  total_machine_hours, total_value) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                r.category_id,
                r.machine_hours_per_unit.to_string(),
                r.machine_hourly_cost.to_string(),
                r.total_machine_hours.to_string(),
                r.total_value.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO construction_equipment \
                 (id, category_id, machine_hours_per_unit, machine_hourly_cost, \
                  total_machine_hours, total_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 machine_hours_per_unit = excluded.machine_hours_per_unit, \
                 machine_hourly_cost = excluded.machine_hourly_cost, \
                 total_machine_hours = excluded.total_machine_hours, \
                 total_value = excluded.total_value",
            params![
                r.id,
                r.category_id,
                r.machine_hours_per_unit.to_string(),
                r.machine_hourly_cost.to_string(),
                r.total_machine_hours.to_string(),
                r.total_value.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

/// List a category's construction-equipment records.
pub fn list_construction_equipment_by_category(
    conn: &Connection,
    category_id: &str,
) -> rusqlite::Result<Vec<ConstructionEquipment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONSTRUCTION_EQUIPMENT_COLUMNS} FROM construction_equipment \
         WHERE category_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![category_id], construction_equipment_from_row)?;
    rows.collect()
}

// ---------------------------------------------------------------------------
// Labor
// ---------------------------------------------------------------------------

fn labor_from_row(row: &Row<'_>) -> rusqlite::Result<Labor> {
    Ok(Labor {
        id: row.get(0)?,
        category_id: row.get(1)?,
        hours_per_unit: dec(row, 2)?,
        progress_factor: dec(row, 3)?,
        yield_factor: dec(row, 4)?,
        mod_rate: dec(row, 5)?,
        equipment_rate: dec(row, 6)?,
        hourly_cost: dec(row, 7)?,
        hours_final: dec(row, 8)?,
        total_hours: dec(row, 9)?,
        man_hours_qty: dec(row, 10)?,
        value_mod: dec(row, 11)?,
        value_equipment: dec(row, 12)?,
        total_value: dec(row, 13)?,
    })
}

const LABOR_COLUMNS: &str = "id, category_id, hours_per_unit, progress_factor, yield_factor, \
                             mod_rate, equipment_rate, hourly_cost, hours_final, total_hours, \
                             man_hours_qty, value_mod, value_equipment, total_value";

/// Insert (id == 0) or upsert (explicit id) a labor record.
pub fn save_labor(conn: &Connection, r: &Labor) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO labor \
                 (category_id, hours_per_unit, progress_factor, yield_factor, mod_rate, \
                  equipment_rate, hourly_cost, hours_final, total_hours, man_hours_qty, \
                  value_mod, value_equipment, total_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                r.category_id,
                r.hours_per_unit.to_string(),
                r.progress_factor.to_string(),
                r.yield_factor.to_string(),
                r.mod_rate.to_string(),
                r.equipment_rate.to_string(),
                r.hourly_cost.to_string(),
                r.hours_final.to_string(),
                r.total_hours.to_string(),
                r.man_hours_qty.to_string(),
                r.value_mod.to_string(),
                r.value_equipment.to_string(),
                r.total_value.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO labor \
                 (id, category_id, hours_per_unit, progress_factor, yield_factor, mod_rate, \
                  equipment_rate, hourly_cost, hours_final, total_hours, man_hours_qty, \
                  value_mod, value_equipment, total_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 hours_per_unit = excluded.hours_per_unit, \
                 progress_factor = excluded.progress_factor, \
                 yield_factor = excluded.yield_factor, \
                 mod_rate = excluded.mod_rate, \
                 equipment_rate = excluded.equipment_rate, \
                 hourly_cost = excluded.hourly_cost, \
                 hours_final = excluded.hours_final, \
                 total_hours = excluded.total_hours, \
                 man_hours_qty = excluded.man_hours_qty, \
                 value_mod = excluded.value_mod, \
                 value_equipment = excluded.value_equipment, \
                 total_value = excluded.total_value",
            params![
                r.id,
                r.category_id,
                r.hours_per_unit.to_string(),
                r.progress_factor.to_string(),
                r.yield_factor.to_string(),
                r.mod_rate.to_string(),
                r.equipment_rate.to_string(),
                r.hourly_cost.to_string(),
                r.hours_final.to_string(),
                r.total_hours.to_string(),
                r.man_hours_qty.to_string(),
                r.value_mod.to_string(),
                r.value_equipment.to_string(),
                r.total_value.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

/// List a category's labor records.
pub fn list_labor_by_category(
    conn: &Connection,
    category_id: &str,
) -> rusqlite::Result<Vec<Labor>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LABOR_COLUMNS} FROM labor WHERE category_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![category_id], labor_from_row)?;
    rows.collect()
}

/// The category's labor record under first-match semantics. Feeds the
/// contract formula.
pub fn first_labor(conn: &Connection, category_id: &str) -> rusqlite::Result<Option<Labor>> {
    conn.query_row(
        &format!(
            "SELECT {LABOR_COLUMNS} FROM labor WHERE category_id = ?1 ORDER BY id LIMIT 1"
        ),
        params![category_id],
        labor_from_row,
    )
    .optional()
}

// ---------------------------------------------------------------------------
// Category overhead
// ---------------------------------------------------------------------------

/// Insert (id == 0) or upsert (explicit id) a category-overhead record.
pub fn save_category_overhead(conn: &Connection, r: &CategoryOverhead) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO category_overheads \
                 (category_id, unit, quantity, dedication_pct, duration_months, monthly_cost, total) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                r.category_id,
                r.unit,
                r.quantity.to_string(),
                r.dedication_pct.to_string(),
                r.duration_months.to_string(),
                r.monthly_cost.to_string(),
                r.total.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO category_overheads \
                 (id, category_id, unit, quantity, dedication_pct, duration_months, monthly_cost, total) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 unit = excluded.unit, \
                 quantity = excluded.quantity, \
                 dedication_pct = excluded.dedication_pct, \
                 duration_months = excluded.duration_months, \
                 monthly_cost = excluded.monthly_cost, \
                 total = excluded.total",
            params![
                r.id,
                r.category_id,
                r.unit,
                r.quantity.to_string(),
                r.dedication_pct.to_string(),
                r.duration_months.to_string(),
                r.monthly_cost.to_string(),
                r.total.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

// ---------------------------------------------------------------------------
// Staff
// ---------------------------------------------------------------------------

/// Insert (id == 0) or upsert (explicit id) a staff record.
pub fn save_staff(conn: &Connection, r: &Staff) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO staff \
                 (category_id, name, monthly_rate, headcount, duration_months, \
                  utilization_factor, total_man_hours, total_cost) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                r.category_id,
                r.name,
                r.monthly_rate.to_string(),
                r.headcount,
                r.duration_months,
                r.utilization_factor.to_string(),
                r.total_man_hours.to_string(),
                r.total_cost.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO staff \
                 (id, category_id, name, monthly_rate, headcount, duration_months, \
                  utilization_factor, total_man_hours, total_cost) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 name = excluded.name, \
                 monthly_rate = excluded.monthly_rate, \
                 headcount = excluded.headcount, \
                 duration_months = excluded.duration_months, \
                 utilization_factor = excluded.utilization_factor, \
                 total_man_hours = excluded.total_man_hours, \
                 total_cost = excluded.total_cost",
            params![
                r.id,
                r.category_id,
                r.name,
                r.monthly_rate.to_string(),
                r.headcount,
                r.duration_months,
                r.utilization_factor.to_string(),
                r.total_man_hours.to_string(),
                r.total_cost.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

// ---------------------------------------------------------------------------
// Detail engineering
// ---------------------------------------------------------------------------

/// Insert (id == 0) or upsert (explicit id) a detail-engineering record.
pub fn save_detail_engineering(conn: &Connection, r: &DetailEngineering) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO detail_engineering \
                 (category_id, professional_hours, hourly_rate, total_cost) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                r.category_id,
                r.professional_hours.to_string(),
                r.hourly_rate.to_string(),
                r.total_cost.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO detail_engineering \
                 (id, category_id, professional_hours, hourly_rate, total_cost) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 professional_hours = excluded.professional_hours, \
                 hourly_rate = excluded.hourly_rate, \
                 total_cost = excluded.total_cost",
            params![
                r.id,
                r.category_id,
                r.professional_hours.to_string(),
                r.hourly_rate.to_string(),
                r.total_cost.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

// ---------------------------------------------------------------------------
// Procurement management
// ---------------------------------------------------------------------------

/// Insert (id == 0) or upsert (explicit id) a procurement-management record.
pub fn save_procurement_management(
    conn: &Connection,
    r: &ProcurementManagement,
) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO procurement_management \
                 (category_id, buyers, dedication_pct, term_months, salary, \
                  travel_value, management_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                r.category_id,
                r.buyers,
                r.dedication_pct.to_string(),
                r.term_months.to_string(),
                r.salary.to_string(),
                r.travel_value.to_string(),
                r.management_value.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO procurement_management \
                 (id, category_id, buyers, dedication_pct, term_months, salary, \
                  travel_value, management_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 buyers = excluded.buyers, \
                 dedication_pct = excluded.dedication_pct, \
                 term_months = excluded.term_months, \
                 salary = excluded.salary, \
                 travel_value = excluded.travel_value, \
                 management_value = excluded.management_value",
            params![
                r.id,
                r.category_id,
                r.buyers,
                r.dedication_pct.to_string(),
                r.term_months.to_string(),
                r.salary.to_string(),
                r.travel_value.to_string(),
                r.management_value.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

fn contract_from_row(row: &Row<'_>) -> rusqlite::Result<Contract> {
    Ok(Contract {
        id: row.get(0)?,
        category_id: row.get(1)?,
        indirect_hourly_cost: dec(row, 2)?,
        markup_pct: dec(row, 3)?,
        indirect_value: dec(row, 4)?,
        unit_price: dec(row, 5)?,
        subcontract_total: dec(row, 6)?,
        contract_total: dec(row, 7)?,
        contract_unit_cost: dec(row, 8)?,
    })
}

const CONTRACT_COLUMNS: &str = "id, category_id, indirect_hourly_cost, markup_pct, \
                                indirect_value, unit_price, subcontract_total, contract_total, \
                                contract_unit_cost";

/// Insert (id == 0) or upsert (explicit id) a contract record.
pub fn save_contract(conn: &Connection, r: &Contract) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO contracts \
                 (category_id, indirect_hourly_cost, markup_pct, indirect_value, unit_price, \
                  subcontract_total, contract_total, contract_unit_cost) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                r.category_id,
                r.indirect_hourly_cost.to_string(),
                r.markup_pct.to_string(),
                r.indirect_value.to_string(),
                r.unit_price.to_string(),
                r.subcontract_total.to_string(),
                r.contract_total.to_string(),
                r.contract_unit_cost.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO contracts \
                 (id, category_id, indirect_hourly_cost, markup_pct, indirect_value, unit_price, \
                  subcontract_total, contract_total, contract_unit_cost) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 indirect_hourly_cost = excluded.indirect_hourly_cost, \
                 markup_pct = excluded.markup_pct, \
                 indirect_value = excluded.indirect_value, \
                 unit_price = excluded.unit_price, \
                 subcontract_total = excluded.subcontract_total, \
                 contract_total = excluded.contract_total, \
                 contract_unit_cost = excluded.contract_unit_cost",
            params![
                r.id,
                r.category_id,
                r.indirect_hourly_cost.to_string(),
                r.markup_pct.to_string(),
                r.indirect_value.to_string(),
                r.unit_price.to_string(),
                r.subcontract_total.to_string(),
                r.contract_total.to_string(),
                r.contract_unit_cost.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

/// List a category's contract records. Revalued whenever the category's
/// quantity, price reference, labor, or materials change.
pub fn list_contracts_by_category(
    conn: &Connection,
    category_id: &str,
) -> rusqlite::Result<Vec<Contract>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE category_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![category_id], contract_from_row)?;
    rows.collect()
}

// ---------------------------------------------------------------------------
// Counterpart engineering
// ---------------------------------------------------------------------------

/// Insert (id == 0) or upsert (explicit id) a counterpart-engineering record.
pub fn save_counterpart_engineering(
    conn: &Connection,
    r: &CounterpartEngineering,
) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO counterpart_engineering \
                 (category_id, name, uf_amount, exchange_rate_id, total_value) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                r.category_id,
                r.name,
                r.uf_amount.to_string(),
                r.exchange_rate_id,
                r.total_value.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO counterpart_engineering \
                 (id, category_id, name, uf_amount, exchange_rate_id, total_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 name = excluded.name, \
                 uf_amount = excluded.uf_amount, \
                 exchange_rate_id = excluded.exchange_rate_id, \
                 total_value = excluded.total_value",
            params![
                r.id,
                r.category_id,
                r.name,
                r.uf_amount.to_string(),
                r.exchange_rate_id,
                r.total_value.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

// ---------------------------------------------------------------------------
// Permit management
// ---------------------------------------------------------------------------

/// Insert (id == 0) or upsert (explicit id) a permit-management record.
pub fn save_permit_management(conn: &Connection, r: &PermitManagement) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO permit_management \
                 (category_id, name, dedication_pct, months, headcount, shift, total_clp, \
                  exchange_rate_id, man_hours, total_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                r.category_id,
                r.name,
                r.dedication_pct.to_string(),
                r.months,
                r.headcount,
                r.shift,
                r.total_clp.to_string(),
                r.exchange_rate_id,
                r.man_hours.to_string(),
                r.total_value.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO permit_management \
                 (id, category_id, name, dedication_pct, months, headcount, shift, total_clp, \
                  exchange_rate_id, man_hours, total_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 name = excluded.name, \
                 dedication_pct = excluded.dedication_pct, \
                 months = excluded.months, \
                 headcount = excluded.headcount, \
                 shift = excluded.shift, \
                 total_clp = excluded.total_clp, \
                 exchange_rate_id = excluded.exchange_rate_id, \
                 man_hours = excluded.man_hours, \
                 total_value = excluded.total_value",
            params![
                r.id,
                r.category_id,
                r.name,
                r.dedication_pct.to_string(),
                r.months,
                r.headcount,
                r.shift,
                r.total_clp.to_string(),
                r.exchange_rate_id,
                r.man_hours.to_string(),
                r.total_value.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

// ---------------------------------------------------------------------------
// Owner cost
// ---------------------------------------------------------------------------

/// Insert (id == 0) or upsert (explicit id) an owner-cost record.
pub fn save_owner_cost(conn: &Connection, r: &OwnerCost) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO owner_costs (category_id, name, total_hours, hourly_cost, total_cost) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                r.category_id,
                r.name,
                r.total_hours.to_string(),
                r.hourly_cost.to_string(),
                r.total_cost.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO owner_costs (id, category_id, name, total_hours, hourly_cost, total_cost) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 name = excluded.name, \
                 total_hours = excluded.total_hours, \
                 hourly_cost = excluded.hourly_cost, \
                 total_cost = excluded.total_cost",
            params![
                r.id,
                r.category_id,
                r.name,
                r.total_hours.to_string(),
                r.hourly_cost.to_string(),
                r.total_cost.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

// ---------------------------------------------------------------------------
// Admin supervision
// ---------------------------------------------------------------------------

/// Insert (id == 0) or upsert (explicit id) an admin-supervision record.
pub fn save_admin_supervision(conn: &Connection, r: &AdminSupervision) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO admin_supervision \
                 (category_id, unit, unit_price_clp, unit_total, usage_factor, person_qty, \
                  exchange_rate_id, total_clp, total_usd, total_converted) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                r.category_id,
                r.unit,
                r.unit_price_clp.to_string(),
                r.unit_total.to_string(),
                r.usage_factor.to_string(),
                r.person_qty.to_string(),
                r.exchange_rate_id,
                r.total_clp.to_string(),
                r.total_usd.to_string(),
                r.total_converted.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO admin_supervision \
                 (id, category_id, unit, unit_price_clp, unit_total, usage_factor, person_qty, \
                  exchange_rate_id, total_clp, total_usd, total_converted) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 unit = excluded.unit, \
                 unit_price_clp = excluded.unit_price_clp, \
                 unit_total = excluded.unit_total, \
                 usage_factor = excluded.usage_factor, \
                 person_qty = excluded.person_qty, \
                 exchange_rate_id = excluded.exchange_rate_id, \
                 total_clp = excluded.total_clp, \
                 total_usd = excluded.total_usd, \
                 total_converted = excluded.total_converted",
            params![
                r.id,
                r.category_id,
                r.unit,
                r.unit_price_clp.to_string(),
                r.unit_total.to_string(),
                r.usage_factor.to_string(),
                r.person_qty.to_string(),
                r.exchange_rate_id,
                r.total_clp.to_string(),
                r.total_usd.to_string(),
                r.total_converted.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

// ---------------------------------------------------------------------------
// Indirect personnel
// ---------------------------------------------------------------------------

/// Insert (id == 0) or upsert (explicit id) an indirect-personnel record.
pub fn save_indirect_personnel(conn: &Connection, r: &IndirectPersonnel) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO indirect_personnel \
                 (category_id, shift, unit, hours_per_month, term_months, unit_price_clp, \
                  exchange_rate_id, total_hours, usd_rate, total_clp, total_usd, total_converted) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                r.category_id,
                r.shift,
                r.unit,
                r.hours_per_month.to_string(),
                r.term_months.to_string(),
                r.unit_price_clp.to_string(),
                r.exchange_rate_id,
                r.total_hours.to_string(),
                r.usd_rate.to_string(),
                r.total_clp.to_string(),
                r.total_usd.to_string(),
                r.total_converted.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO indirect_personnel \
                 (id, category_id, shift, unit, hours_per_month, term_months, unit_price_clp, \
                  exchange_rate_id, total_hours, usd_rate, total_clp, total_usd, total_converted) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 shift = excluded.shift, \
                 unit = excluded.unit, \
                 hours_per_month = excluded.hours_per_month, \
                 term_months = excluded.term_months, \
                 unit_price_clp = excluded.unit_price_clp, \
                 exchange_rate_id = excluded.exchange_rate_id, \
                 total_hours = excluded.total_hours, \
                 usd_rate = excluded.usd_rate, \
                 total_clp = excluded.total_clp, \
                 total_usd = excluded.total_usd, \
                 total_converted = excluded.total_converted",
            params![
                r.id,
                r.category_id,
                r.shift,
                r.unit,
                r.hours_per_month.to_string(),
                r.term_months.to_string(),
                r.unit_price_clp.to_string(),
                r.exchange_rate_id,
                r.total_hours.to_string(),
                r.usd_rate.to_string(),
                r.total_clp.to_string(),
                r.total_usd.to_string(),
                r.total_converted.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

// ---------------------------------------------------------------------------
// Support services
// ---------------------------------------------------------------------------

/// Insert (id == 0) or upsert (explicit id) a support-services record.
pub fn save_support_services(conn: &Connection, r: &SupportServices) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO support_services \
                 (category_id, unit, quantity, total_hours, rate_clp, exchange_rate_id, total_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                r.category_id,
                r.unit,
                r.quantity.to_string(),
                r.total_hours.to_string(),
                r.rate_clp.to_string(),
                r.exchange_rate_id,
                r.total_value.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO support_services \
                 (id, category_id, unit, quantity, total_hours, rate_clp, exchange_rate_id, total_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 unit = excluded.unit, \
                 quantity = excluded.quantity, \
                 total_hours = excluded.total_hours, \
                 rate_clp = excluded.rate_clp, \
                 exchange_rate_id = excluded.exchange_rate_id, \
                 total_value = excluded.total_value",
            params![
                r.id,
                r.category_id,
                r.unit,
                r.quantity.to_string(),
                r.total_hours.to_string(),
                r.rate_clp.to_string(),
                r.exchange_rate_id,
                r.total_value.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

// ---------------------------------------------------------------------------
// Other admin
// ---------------------------------------------------------------------------

/// Insert (id == 0) or upsert (explicit id) an other-admin record.
pub fn save_other_admin(conn: &Connection, r: &OtherAdmin) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO other_admin \
                 (category_id, dedication_pct, months, headcount, shift, total_clp, \
                  exchange_rate_id, man_hours, total_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                r.category_id,
                r.dedication_pct.to_string(),
                r.months,
                r.headcount,
                r.shift,
                r.total_clp.to_string(),
                r.exchange_rate_id,
                r.man_hours.to_string(),
                r.total_value.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO other_admin \
                 (id, category_id, dedication_pct, months, headcount, shift, total_clp, \
                  exchange_rate_id, man_hours, total_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 dedication_pct = excluded.dedication_pct, \
                 months = excluded.months, \
                 headcount = excluded.headcount, \
                 shift = excluded.shift, \
                 total_clp = excluded.total_clp, \
                 exchange_rate_id = excluded.exchange_rate_id, \
                 man_hours = excluded.man_hours, \
                 total_value = excluded.total_value",
            params![
                r.id,
                r.category_id,
                r.dedication_pct.to_string(),
                r.months,
                r.headcount,
                r.shift,
                r.total_clp.to_string(),
                r.exchange_rate_id,
                r.man_hours.to_string(),
                r.total_value.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}

// ---------------------------------------------------------------------------
// Admin financial
// ---------------------------------------------------------------------------

/// Insert (id == 0) or upsert (explicit id) an admin-financial record.
pub fn save_admin_financial(conn: &Connection, r: &AdminFinancial) -> rusqlite::Result<i64> {
    if r.id == 0 {
        conn.execute(
            "INSERT INTO admin_financial \
                 (category_id, unit, value, months, over_base_pct, total_cost) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                r.category_id,
                r.unit,
                r.value.to_string(),
                r.months,
                r.over_base_pct.to_string(),
                r.total_cost.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO admin_financial \
                 (id, category_id, unit, value, months, over_base_pct, total_cost) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 unit = excluded.unit, \
                 value = excluded.value, \
                 months = excluded.months, \
                 over_base_pct = excluded.over_base_pct, \
                 total_cost = excluded.total_cost",
            params![
                r.id,
                r.category_id,
                r.unit,
                r.value.to_string(),
                r.months,
                r.over_base_pct.to_string(),
                r.total_cost.to_string(),
            ],
        )?;
        Ok(r.id)
    }
}
