//! Upward propagation of category totals.
//!
//! After a mutation touches a category, the category and every ancestor are
//! recomputed bottom-up, then the project total. A normal propagation then
//! settles the percentage-based roles (contingency and profit), whose bases
//! shifted with the root totals, and refreshes the project total once more.
//! Settling runs with [`Origin::Settling`] so it cannot re-enter itself.

use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::debug;

use costbook_db::models::{Category, CategoryRole};
use costbook_db::queries;

use crate::aggregate;
use crate::error::{EngineError, Result};

/// Why a propagation was started. Settling propagations skip the
/// special-role pass to keep the walk finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Normal,
    Settling,
}

/// Recompute one category's total and cache it.
pub fn refresh_category(conn: &Connection, category: &Category) -> Result<Decimal> {
    let total = aggregate::category_total(conn, category)?;
    queries::categories::set_total(conn, &category.id, total)?;
    debug!(category = %category.id, %total, "category total refreshed");
    Ok(total)
}

/// Recompute the cached project total from its root categories.
pub fn refresh_project(conn: &Connection, project_id: &str) -> Result<Decimal> {
    let total = queries::categories::sum_root_totals(conn, project_id)?.round_dp(2);
    queries::projects::set_total(conn, project_id, total)?;
    Ok(total)
}

/// Propagate from a mutated category up through its ancestors and the
/// project total, settling percentage-based roles for normal origins.
pub fn propagate(conn: &Connection, category_id: &str, origin: Origin) -> Result<()> {
    let category = queries::categories::get(conn, category_id)?
        .ok_or_else(|| EngineError::MissingCategory(category_id.to_owned()))?;
    let project_id = category.project_id.clone();

    let mut current = Some(category);
    while let Some(cat) = current {
        refresh_category(conn, &cat)?;
        current = match cat.parent_id {
            Some(parent_id) => Some(queries::categories::get(conn, &parent_id)?.ok_or_else(
                || EngineError::MissingCategory(parent_id.clone()),
            )?),
            None => None,
        };
    }
    refresh_project(conn, &project_id)?;

    if origin == Origin::Normal {
        settle_percentage_roles(conn, &project_id, category_id)?;
        refresh_project(conn, &project_id)?;
    }
    Ok(())
}

/// Recompute the contingency and profit categories after the root totals
/// they are based on moved. The mutated category itself is skipped; its
/// total is already current.
fn settle_percentage_roles(
    conn: &Connection,
    project_id: &str,
    mutated_id: &str,
) -> Result<()> {
    for role in [CategoryRole::Contingency, CategoryRole::Profit] {
        if let Some(special) = queries::categories::find_by_role(conn, project_id, role)? {
            if special.id != mutated_id {
                propagate(conn, &special.id, Origin::Settling)?;
            }
        }
    }
    Ok(())
}

/// Settle a project's percentage-based roles and refresh its total. Used
/// after project-level edits (the percentages may have changed) and after a
/// root category disappears.
pub fn settle_project(conn: &Connection, project_id: &str) -> Result<()> {
    settle_percentage_roles(conn, project_id, "")?;
    refresh_project(conn, project_id)?;
    Ok(())
}

/// Recompute a project's vendor-assistance category, if present, excluding
/// `mutated_category` from the settlement. Called after procurement
/// mutations, whose project-wide sum is the vendor base.
pub fn settle_vendor_assistance(
    conn: &Connection,
    project_id: &str,
    mutated_category: &str,
) -> Result<()> {
    if let Some(vendor) =
        queries::categories::find_by_role(conn, project_id, CategoryRole::VendorAssistance)?
    {
        if vendor.id != mutated_category {
            propagate(conn, &vendor.id, Origin::Settling)?;
        }
    }
    Ok(())
}

/// Rebuild every cached total of a project from scratch, bottom-up by
/// level. Used by the loader after a bulk import.
pub fn rebuild_project(conn: &Connection, project_id: &str) -> Result<Decimal> {
    let mut categories = queries::categories::list_for_project(conn, project_id)?;
    // Deepest levels first so parents see fresh child totals; percentage
    // roles last so their bases are settled.
    categories.sort_by_key(|c| (std::cmp::Reverse(c.level), c.id.clone()));
    for pass in [false, true] {
        for cat in &categories {
            let is_percentage =
                matches!(cat.role, CategoryRole::Contingency | CategoryRole::Profit);
            if is_percentage == pass {
                refresh_category(conn, cat)?;
            }
        }
        refresh_project(conn, project_id)?;
    }
    queries::projects::get(conn, project_id)?
        .map(|p| p.total_cost)
        .ok_or_else(|| EngineError::NotFound {
            what: "project",
            id: project_id.to_owned(),
        })
}
