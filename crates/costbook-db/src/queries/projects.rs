//! Query functions for the `projects` table.

use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::models::Project;

use super::dec;

fn from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        related_project: row.get(2)?,
        contingency_pct: dec(row, 3)?,
        profit_pct: dec(row, 4)?,
        total_cost: dec(row, 5)?,
    })
}

const COLUMNS: &str = "id, name, related_project, contingency_pct, profit_pct, total_cost";

/// Insert or update a project. The cached total is never touched on update;
/// only the propagation scheduler writes it (via [`set_total`]).
pub fn upsert(conn: &Connection, project: &Project) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO projects (id, name, related_project, contingency_pct, profit_pct, total_cost) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         ON CONFLICT(id) DO UPDATE SET \
             name = excluded.name, \
             related_project = excluded.related_project, \
             contingency_pct = excluded.contingency_pct, \
             profit_pct = excluded.profit_pct",
        params![
            project.id,
            project.name,
            project.related_project,
            project.contingency_pct.to_string(),
            project.profit_pct.to_string(),
            project.total_cost.to_string(),
        ],
    )?;
    Ok(())
}

/// Fetch a project by id.
pub fn get(conn: &Connection, id: &str) -> rusqlite::Result<Option<Project>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM projects WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

/// List all projects, ordered by id.
pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Project>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM projects ORDER BY id"))?;
    let rows = stmt.query_map([], from_row)?;
    rows.collect()
}

/// Overwrite the cached project total. Returns false when the id is unknown.
pub fn set_total(conn: &Connection, id: &str, total: Decimal) -> rusqlite::Result<bool> {
    let n = conn.execute(
        "UPDATE projects SET total_cost = ?1 WHERE id = ?2",
        params![total.to_string(), id],
    )?;
    Ok(n > 0)
}
