//! Per-table query functions.
//!
//! Every function takes a `&rusqlite::Connection` (or transaction deref) and
//! contains no business logic; valuation and propagation live in
//! `costbook-core`. Decimals are stored as TEXT and parsed at this boundary.

pub mod categories;
pub mod contributors;
pub mod projects;
pub mod references;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, Params, Row};
use rust_decimal::Decimal;

/// Read a TEXT column as a [`Decimal`].
pub(crate) fn dec(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: rust_decimal::Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

/// Read a TEXT column as a [`NaiveDate`] (ISO `YYYY-MM-DD`).
pub(crate) fn date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: chrono::ParseError| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

/// Sum a single decimal column produced by `sql`. Missing rows sum to zero.
pub(crate) fn sum_decimal<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> rusqlite::Result<Decimal> {
    let mut stmt = conn.prepare(sql)?;
    let values = stmt.query_map(params, |row| dec(row, 0))?;
    let mut total = Decimal::ZERO;
    for value in values {
        total += value?;
    }
    Ok(total)
}
