//! Query functions for the `categories` table.

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::models::{Category, CategoryRole};

use super::{dec, sum_decimal};

fn from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    let role: String = row.get(7)?;
    let role = role.parse::<CategoryRole>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e))
    })?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        project_id: row.get(2)?,
        parent_id: row.get(3)?,
        related_category: row.get(4)?,
        level: row.get(5)?,
        is_final: row.get(6)?,
        role,
        total_cost: dec(row, 8)?,
    })
}

const COLUMNS: &str =
    "id, name, project_id, parent_id, related_category, level, is_final, role, total_cost";

/// Insert or update a category. The cached total is preserved on update;
/// only the aggregator writes it (via [`set_total`]).
pub fn upsert(conn: &Connection, category: &Category) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO categories \
             (id, name, project_id, parent_id, related_category, level, is_final, role, total_cost) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
         ON CONFLICT(id) DO UPDATE SET \
             name = excluded.name, \
             project_id = excluded.project_id, \
             parent_id = excluded.parent_id, \
             related_category = excluded.related_category, \
             level = excluded.level, \
             is_final = excluded.is_final, \
             role = excluded.role",
        params![
            category.id,
            category.name,
            category.project_id,
            category.parent_id,
            category.related_category,
            category.level,
            category.is_final,
            category.role.to_string(),
            category.total_cost.to_string(),
        ],
    )?;
    Ok(())
}

/// Fetch a category by id.
pub fn get(conn: &Connection, id: &str) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM categories WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

/// List a category's direct children.
pub fn list_children(conn: &Connection, parent_id: &str) -> rusqlite::Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM categories WHERE parent_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![parent_id], from_row)?;
    rows.collect()
}

/// List a project's root categories (no parent).
pub fn list_roots(conn: &Connection, project_id: &str) -> rusqlite::Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM categories \
         WHERE project_id = ?1 AND parent_id IS NULL ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![project_id], from_row)?;
    rows.collect()
}

/// List every category of a project, ordered by level then id (parents
/// before children for equal trees built by the loader).
pub fn list_for_project(conn: &Connection, project_id: &str) -> rusqlite::Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM categories WHERE project_id = ?1 ORDER BY level, id"
    ))?;
    let rows = stmt.query_map(params![project_id], from_row)?;
    rows.collect()
}

/// Find a project's category with the given role, if any. At most one
/// Contingency / Profit / VendorAssistance category per project is
/// meaningful; first match by id wins.
pub fn find_by_role(
    conn: &Connection,
    project_id: &str,
    role: CategoryRole,
) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        &format!(
            "SELECT {COLUMNS} FROM categories \
             WHERE project_id = ?1 AND role = ?2 ORDER BY id LIMIT 1"
        ),
        params![project_id, role.to_string()],
        from_row,
    )
    .optional()
}

/// Delete a category. Children cascade through the schema's foreign keys;
/// contributor records cascade or detach per kind. Returns false when the
/// id is unknown.
pub fn delete(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let n = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
    Ok(n > 0)
}

/// Overwrite the cached category total. Returns false when the id is unknown.
pub fn set_total(conn: &Connection, id: &str, total: Decimal) -> rusqlite::Result<bool> {
    let n = conn.execute(
        "UPDATE categories SET total_cost = ?1 WHERE id = ?2",
        params![total.to_string(), id],
    )?;
    Ok(n > 0)
}

/// Sum the cached totals of a category's direct children.
pub fn sum_children_totals(conn: &Connection, parent_id: &str) -> rusqlite::Result<Decimal> {
    sum_decimal(
        conn,
        "SELECT total_cost FROM categories WHERE parent_id = ?1",
        params![parent_id],
    )
}

/// Sum the cached totals of a project's root categories, excluding one
/// category (the Contingency/Profit category excludes itself from its base).
pub fn sum_root_totals_excluding(
    conn: &Connection,
    project_id: &str,
    exclude_id: &str,
) -> rusqlite::Result<Decimal> {
    sum_decimal(
        conn,
        "SELECT total_cost FROM categories \
         WHERE project_id = ?1 AND parent_id IS NULL AND id <> ?2",
        params![project_id, exclude_id],
    )
}

/// Sum the cached totals of all of a project's root categories.
pub fn sum_root_totals(conn: &Connection, project_id: &str) -> rusqlite::Result<Decimal> {
    sum_decimal(
        conn,
        "SELECT total_cost FROM categories WHERE project_id = ?1 AND parent_id IS NULL",
        params![project_id],
    )
}
