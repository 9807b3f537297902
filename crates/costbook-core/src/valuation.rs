//! Per-kind contributor valuation.
//!
//! Each function recomputes a record's derived fields from its raw inputs
//! plus the category's resolved references. Missing references substitute
//! zero and log a warning; only structurally invalid input (a negative
//! growth percentage) is an error. Monetary results carry two decimal
//! places, the indirect-personnel USD rate six.

use rust_decimal::Decimal;
use tracing::warn;

use costbook_db::models::{
    AdminFinancial, AdminSupervision, CategoryOverhead, ConstructionEquipment, Contract,
    CounterpartEngineering, DetailEngineering, ExchangeRate, IndirectPersonnel, Labor, OtherAdmin,
    OtherMaterials, OwnerCost, PermitManagement, PriceReference, Procurement,
    ProcurementManagement, Quantity, Staff, SupportServices,
};

use crate::error::{EngineError, Result};

/// Man-hours assumed per person-month of dedication.
fn monthly_man_hours() -> Decimal {
    Decimal::from(180)
}

fn pct(p: Decimal) -> Decimal {
    p / Decimal::ONE_HUNDRED
}

fn money(d: Decimal) -> Decimal {
    d.round_dp(2)
}

fn resolved_quantity(quantity: Option<&Quantity>, kind: &str, id: i64) -> Decimal {
    match quantity {
        Some(q) => q.final_quantity,
        None => {
            warn!(kind, id, "no quantity on category, valuing with zero");
            Decimal::ZERO
        }
    }
}

// ---------------------------------------------------------------------------
// Reference-fed kinds
// ---------------------------------------------------------------------------

pub fn value_procurement(
    r: &mut Procurement,
    quantity: Option<&Quantity>,
    price_ref: Option<&PriceReference>,
) -> Result<()> {
    if r.growth_pct < Decimal::ZERO {
        return Err(EngineError::NegativeGrowth(r.growth_pct));
    }
    let q = resolved_quantity(quantity, "procurement", r.id);
    let base = q * r.unit_cost;
    let total = if r.growth_pct > Decimal::ZERO {
        base * (Decimal::ONE + pct(r.growth_pct))
    } else {
        base
    };
    r.total = money(total);

    let freight_pct = match price_ref {
        Some(p) => p.unit_freight_pct,
        None => {
            warn!(id = r.id, "no price reference on category, zero freight");
            Decimal::ZERO
        }
    };
    r.freight = money(r.total * pct(freight_pct));
    r.total_with_freight = money(r.total + r.freight);
    Ok(())
}

pub fn value_other_materials(
    r: &mut OtherMaterials,
    quantity: Option<&Quantity>,
    price_ref: Option<&PriceReference>,
) -> Result<()> {
    if r.growth_pct < Decimal::ZERO {
        return Err(EngineError::NegativeGrowth(r.growth_pct));
    }
    let q = resolved_quantity(quantity, "other_materials", r.id);
    let base = q * r.unit_cost;
    let total = if r.growth_pct > Decimal::ZERO {
        base * (Decimal::ONE + pct(r.growth_pct))
    } else {
        base
    };
    r.total = money(total);

    let freight_pct = match price_ref {
        Some(p) => p.unit_freight_pct,
        None => {
            warn!(id = r.id, "no price reference on category, zero freight");
            Decimal::ZERO
        }
    };
    r.freight = money(r.total * pct(freight_pct));
    r.site_total = money(r.total + r.freight);
    Ok(())
}

/// Final categories cost per machine-hour over the full hour budget;
/// non-final ones price the quantity directly.
pub fn value_construction_equipment(
    r: &mut ConstructionEquipment,
    quantity: Option<&Quantity>,
    is_final: bool,
) {
    let q = resolved_quantity(quantity, "construction_equipment", r.id);
    r.total_machine_hours = r.machine_hours_per_unit * q;
    r.total_value = if is_final {
        money(r.machine_hourly_cost * q * r.machine_hours_per_unit)
    } else {
        money(r.machine_hourly_cost * q)
    };
}

/// Labor splits into a direct-labor and an equipment component when either
/// rate is set; otherwise it falls back to a flat hourly cost.
pub fn value_labor(r: &mut Labor, quantity: Option<&Quantity>) {
    let q = resolved_quantity(quantity, "labor", r.id);
    r.hours_final = r.hours_per_unit * r.progress_factor;
    r.total_hours = q * r.yield_factor * r.progress_factor;
    r.man_hours_qty = r.hours_final * q;
    r.value_mod = money(r.total_hours * r.mod_rate);
    r.value_equipment = money(r.total_hours * r.equipment_rate);
    r.total_value = if r.value_mod != Decimal::ZERO || r.value_equipment != Decimal::ZERO {
        money(r.value_mod + r.value_equipment)
    } else {
        money(q * r.hours_final * r.hourly_cost)
    };
}

/// Contracts combine subcontracted supply with the category's own labor and
/// materials. The unit price only applies to subcontracted supply types.
pub fn value_contract(
    r: &mut Contract,
    quantity: Option<&Quantity>,
    price_ref: Option<&PriceReference>,
    labor: Option<&Labor>,
    materials: Option<&OtherMaterials>,
) {
    let q = resolved_quantity(quantity, "contract", r.id);

    let labor_hours = labor.map(|l| l.total_hours).unwrap_or_default();
    let labor_value = labor.map(|l| l.total_value).unwrap_or_default();
    let site_materials = materials.map(|m| m.site_total).unwrap_or_default();

    r.indirect_value = money(labor_hours * r.indirect_hourly_cost);
    r.unit_price = match price_ref {
        Some(p) if p.supply_type == "SUB" => {
            money(p.applied_rate * (Decimal::ONE + pct(r.markup_pct)))
        }
        _ => Decimal::ZERO,
    };
    r.subcontract_total = money(q * r.unit_price);
    r.contract_total = money(r.subcontract_total + r.indirect_value + site_materials + labor_value);
    let divisor = if q > Decimal::ZERO { q } else { Decimal::ONE };
    r.contract_unit_cost = money(r.contract_total / divisor);
}

// ---------------------------------------------------------------------------
// Self-contained kinds
// ---------------------------------------------------------------------------

pub fn value_category_overhead(r: &mut CategoryOverhead) {
    let base = r.quantity * pct(r.dedication_pct) * r.monthly_cost;
    r.total = if r.duration_months > Decimal::ZERO {
        money(base * r.duration_months)
    } else {
        money(base)
    };
}

pub fn value_staff(r: &mut Staff) {
    r.total_man_hours =
        Decimal::from(r.duration_months) * r.utilization_factor * monthly_man_hours();
    r.total_cost = money(r.monthly_rate * Decimal::from(r.headcount) * r.total_man_hours);
}

pub fn value_detail_engineering(r: &mut DetailEngineering) {
    r.total_cost = money(r.professional_hours * r.hourly_rate);
}

/// Travel value stays as entered; only the management component is derived
/// (buyers at a 4-week month of 160 hours each).
pub fn value_procurement_management(r: &mut ProcurementManagement) {
    r.management_value = money(
        Decimal::from(r.buyers) * r.term_months * r.salary * Decimal::from(4) * Decimal::from(160),
    );
}

pub fn value_owner_cost(r: &mut OwnerCost) {
    r.total_cost = money(r.total_hours * r.hourly_cost);
}

/// The total is entered directly; valuation only normalizes its scale.
pub fn value_admin_financial(r: &mut AdminFinancial) {
    r.total_cost = money(r.total_cost);
}

// ---------------------------------------------------------------------------
// Exchange-rate-fed kinds
// ---------------------------------------------------------------------------

fn rate_or_zero(rate: Option<&ExchangeRate>, kind: &str, id: i64) -> Option<Decimal> {
    match rate {
        Some(r) if r.rate != Decimal::ZERO => Some(r.rate),
        Some(_) => {
            warn!(kind, id, "exchange rate is zero, valuing with zero");
            None
        }
        None => {
            warn!(kind, id, "no exchange rate selected, valuing with zero");
            None
        }
    }
}

pub fn value_counterpart_engineering(r: &mut CounterpartEngineering, rate: Option<&ExchangeRate>) {
    r.total_value = match rate_or_zero(rate, "counterpart_engineering", r.id) {
        Some(fx) => money(r.uf_amount * fx),
        None => Decimal::ZERO,
    };
}

pub fn value_permit_management(r: &mut PermitManagement, rate: Option<&ExchangeRate>) {
    r.man_hours = pct(r.dedication_pct)
        * Decimal::from(r.months)
        * Decimal::from(r.headcount)
        * monthly_man_hours();
    r.total_value = match rate_or_zero(rate, "permit_management", r.id) {
        Some(fx) => money(r.total_clp / fx),
        None => Decimal::ZERO,
    };
}

pub fn value_other_admin(r: &mut OtherAdmin, rate: Option<&ExchangeRate>) {
    r.man_hours = pct(r.dedication_pct)
        * Decimal::from(r.months)
        * Decimal::from(r.headcount)
        * monthly_man_hours();
    r.total_value = match rate_or_zero(rate, "other_admin", r.id) {
        Some(fx) => money(r.total_clp / fx),
        None => Decimal::ZERO,
    };
}

pub fn value_admin_supervision(r: &mut AdminSupervision, rate: Option<&ExchangeRate>) {
    r.total_clp = money(r.unit_price_clp * r.unit_total);
    match rate_or_zero(rate, "admin_supervision", r.id) {
        Some(fx) => {
            let factor = rate.map(|x| x.factor).unwrap_or_default();
            r.total_usd = money(r.total_clp / fx);
            r.total_converted = money(r.total_usd * factor);
        }
        None => {
            r.total_usd = Decimal::ZERO;
            r.total_converted = Decimal::ZERO;
        }
    }
}

pub fn value_indirect_personnel(r: &mut IndirectPersonnel, rate: Option<&ExchangeRate>) {
    r.total_hours = r.term_months * r.hours_per_month;
    r.total_clp = money(r.unit_price_clp * r.term_months * r.hours_per_month);
    match rate_or_zero(rate, "indirect_personnel", r.id) {
        Some(fx) => {
            let factor = rate.map(|x| x.factor).unwrap_or_default();
            r.usd_rate = if factor != Decimal::ZERO {
                (r.unit_price_clp / (fx * factor)).round_dp(6)
            } else {
                Decimal::ZERO
            };
            r.total_usd = money(r.total_clp / fx);
            r.total_converted = money(r.total_usd * factor);
        }
        None => {
            r.usd_rate = Decimal::ZERO;
            r.total_usd = Decimal::ZERO;
            r.total_converted = Decimal::ZERO;
        }
    }
}

pub fn value_support_services(r: &mut SupportServices, rate: Option<&ExchangeRate>) {
    r.total_value = if r.total_hours == Decimal::ZERO {
        Decimal::ZERO
    } else {
        match rate_or_zero(rate, "support_services", r.id) {
            Some(fx) => money(r.rate_clp / fx),
            None => Decimal::ZERO,
        }
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
