//! Tree consistency checks for category placement.

use rusqlite::Connection;

use costbook_db::queries;

use crate::error::{EngineError, Result};

/// Reject a parent assignment that would make `category_id` its own
/// ancestor. Walks the existing parent chain, which is acyclic by this same
/// guard.
pub fn ensure_no_cycle(
    conn: &Connection,
    category_id: &str,
    parent_id: Option<&str>,
) -> Result<()> {
    let mut current = parent_id.map(str::to_owned);
    while let Some(id) = current {
        if id == category_id {
            return Err(EngineError::CyclicParent(category_id.to_owned()));
        }
        let parent = queries::categories::get(conn, &id)?
            .ok_or_else(|| EngineError::MissingCategory(id.clone()))?;
        current = parent.parent_id;
    }
    Ok(())
}

/// Depth of a node placed under `parent_id`; roots sit at level 1.
pub fn level_for(conn: &Connection, parent_id: Option<&str>) -> Result<i64> {
    match parent_id {
        Some(id) => {
            let parent = queries::categories::get(conn, id)?
                .ok_or_else(|| EngineError::MissingCategory(id.to_owned()))?;
            Ok(parent.level + 1)
        }
        None => Ok(1),
    }
}
