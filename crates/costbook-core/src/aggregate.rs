//! Category totals by role.
//!
//! Ordinary categories sum their own contributor roll-ups plus the cached
//! totals of their children. The five special roles derive their total from
//! sibling or project-wide aggregates; their own contributor tables feed the
//! formula instead of being summed directly.

use rusqlite::Connection;
use rust_decimal::Decimal;

use costbook_db::models::{Category, CategoryRole, ContributorKind};
use costbook_db::queries;

use crate::error::{EngineError, Result};

/// Fraction of project-wide procurement spend charged as vendor assistance.
fn vendor_assistance_fraction() -> Decimal {
    Decimal::new(5, 3)
}

/// Compute a category's total from current database state. Does not write.
pub fn category_total(conn: &Connection, category: &Category) -> Result<Decimal> {
    let total = match category.role {
        CategoryRole::Ordinary => ordinary_total(conn, category)?,
        CategoryRole::DetailEngineering => {
            queries::contributors::sum_rollup(conn, ContributorKind::DetailEngineering, &category.id)?
        }
        CategoryRole::ProcurementManagement => {
            queries::contributors::sum_procurement_management(conn, &category.id)?
        }
        CategoryRole::Contingency => {
            let project = require_project(conn, &category.project_id)?;
            let base = queries::categories::sum_root_totals_excluding(
                conn,
                &category.project_id,
                &category.id,
            )?;
            base * project.contingency_pct / Decimal::ONE_HUNDRED
        }
        CategoryRole::Profit => {
            let project = require_project(conn, &category.project_id)?;
            let base = queries::categories::sum_root_totals_excluding(
                conn,
                &category.project_id,
                &category.id,
            )?;
            base * project.profit_pct / Decimal::ONE_HUNDRED
        }
        CategoryRole::VendorAssistance => {
            let base = queries::contributors::sum_procurement_total_excluding(
                conn,
                &category.project_id,
                &category.id,
            )?;
            base * vendor_assistance_fraction()
        }
    };
    Ok(total.round_dp(2))
}

fn ordinary_total(conn: &Connection, category: &Category) -> Result<Decimal> {
    let mut total = Decimal::ZERO;
    for kind in ContributorKind::ALL {
        total += queries::contributors::sum_rollup(conn, kind, &category.id)?;
    }
    total += queries::categories::sum_children_totals(conn, &category.id)?;
    Ok(total)
}

fn require_project(conn: &Connection, id: &str) -> Result<costbook_db::models::Project> {
    queries::projects::get(conn, id)?.ok_or_else(|| EngineError::NotFound {
        what: "project",
        id: id.to_owned(),
    })
}
