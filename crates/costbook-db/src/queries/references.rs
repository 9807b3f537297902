//! Query functions for the reference tables: quantities, price references,
//! and exchange rates.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{ExchangeRate, PriceReference, Quantity};

use super::{date, dec};

// ---------------------------------------------------------------------------
// Quantities
// ---------------------------------------------------------------------------

fn quantity_from_row(row: &Row<'_>) -> rusqlite::Result<Quantity> {
    Ok(Quantity {
        id: row.get(0)?,
        category_id: row.get(1)?,
        unit: row.get(2)?,
        quantity: dec(row, 3)?,
        growth_factor: dec(row, 4)?,
        final_quantity: dec(row, 5)?,
    })
}

const QUANTITY_COLUMNS: &str = "id, category_id, unit, quantity, growth_factor, final_quantity";

/// Insert (id == 0) or upsert (explicit id) a quantity row. Returns the id.
pub fn save_quantity(conn: &Connection, q: &Quantity) -> rusqlite::Result<i64> {
    if q.id == 0 {
        conn.execute(
            "INSERT INTO quantities (category_id, unit, quantity, growth_factor, final_quantity) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                q.category_id,
                q.unit,
                q.quantity.to_string(),
                q.growth_factor.to_string(),
                q.final_quantity.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO quantities (id, category_id, unit, quantity, growth_factor, final_quantity) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 unit = excluded.unit, \
                 quantity = excluded.quantity, \
                 growth_factor = excluded.growth_factor, \
                 final_quantity = excluded.final_quantity",
            params![
                q.id,
                q.category_id,
                q.unit,
                q.quantity.to_string(),
                q.growth_factor.to_string(),
                q.final_quantity.to_string(),
            ],
        )?;
        Ok(q.id)
    }
}

/// Fetch a quantity row by id.
pub fn get_quantity(conn: &Connection, id: i64) -> rusqlite::Result<Option<Quantity>> {
    conn.query_row(
        &format!("SELECT {QUANTITY_COLUMNS} FROM quantities WHERE id = ?1"),
        params![id],
        quantity_from_row,
    )
    .optional()
}

/// The category's quantity record under first-match semantics (lowest id).
pub fn first_quantity(conn: &Connection, category_id: &str) -> rusqlite::Result<Option<Quantity>> {
    conn.query_row(
        &format!(
            "SELECT {QUANTITY_COLUMNS} FROM quantities \
             WHERE category_id = ?1 ORDER BY id LIMIT 1"
        ),
        params![category_id],
        quantity_from_row,
    )
    .optional()
}

/// Delete a quantity row. Returns false when the id is unknown.
pub fn delete_quantity(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let n = conn.execute("DELETE FROM quantities WHERE id = ?1", params![id])?;
    Ok(n > 0)
}

// ---------------------------------------------------------------------------
// Price references
// ---------------------------------------------------------------------------

fn price_reference_from_row(row: &Row<'_>) -> rusqlite::Result<PriceReference> {
    Ok(PriceReference {
        id: row.get(0)?,
        category_id: row.get(1)?,
        supply_type: row.get(2)?,
        currency: row.get(3)?,
        reference_date: date(row, 4)?,
        applied_rate: dec(row, 5)?,
        unit_freight_pct: dec(row, 6)?,
        exchange_rate: dec(row, 7)?,
    })
}

const PRICE_REFERENCE_COLUMNS: &str = "id, category_id, supply_type, currency, reference_date, \
                                       applied_rate, unit_freight_pct, exchange_rate";

/// Insert (id == 0) or upsert (explicit id) a price reference. Returns the id.
pub fn save_price_reference(conn: &Connection, p: &PriceReference) -> rusqlite::Result<i64> {
    if p.id == 0 {
        conn.execute(
            "INSERT INTO price_references \
                 (category_id, supply_type, currency, reference_date, applied_rate, \
                  unit_freight_pct, exchange_rate) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                p.category_id,
                p.supply_type,
                p.currency,
                p.reference_date.to_string(),
                p.applied_rate.to_string(),
                p.unit_freight_pct.to_string(),
                p.exchange_rate.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    } else {
        conn.execute(
            "INSERT INTO price_references \
                 (id, category_id, supply_type, currency, reference_date, applied_rate, \
                  unit_freight_pct, exchange_rate) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT(id) DO UPDATE SET \
                 category_id = excluded.category_id, \
                 supply_type = excluded.supply_type, \
                 currency = excluded.currency, \
                 reference_date = excluded.reference_date, \
                 applied_rate = excluded.applied_rate, \
                 unit_freight_pct = excluded.unit_freight_pct, \
                 exchange_rate = excluded.exchange_rate",
            params![
                p.id,
                p.category_id,
                p.supply_type,
                p.currency,
                p.reference_date.to_string(),
                p.applied_rate.to_string(),
                p.unit_freight_pct.to_string(),
                p.exchange_rate.to_string(),
            ],
        )?;
        Ok(p.id)
    }
}

/// Fetch a price reference by id.
pub fn get_price_reference(conn: &Connection, id: i64) -> rusqlite::Result<Option<PriceReference>> {
    conn.query_row(
        &format!("SELECT {PRICE_REFERENCE_COLUMNS} FROM price_references WHERE id = ?1"),
        params![id],
        price_reference_from_row,
    )
    .optional()
}

/// The category's price reference under first-match semantics (lowest id).
pub fn first_price_reference(
    conn: &Connection,
    category_id: &str,
) -> rusqlite::Result<Option<PriceReference>> {
    conn.query_row(
        &format!(
            "SELECT {PRICE_REFERENCE_COLUMNS} FROM price_references \
             WHERE category_id = ?1 ORDER BY id LIMIT 1"
        ),
        params![category_id],
        price_reference_from_row,
    )
    .optional()
}

/// Delete a price reference. Returns false when the id is unknown.
pub fn delete_price_reference(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let n = conn.execute("DELETE FROM price_references WHERE id = ?1", params![id])?;
    Ok(n > 0)
}

// ---------------------------------------------------------------------------
// Exchange rates
// ---------------------------------------------------------------------------

fn exchange_rate_from_row(row: &Row<'_>) -> rusqlite::Result<ExchangeRate> {
    Ok(ExchangeRate {
        id: row.get(0)?,
        rate: dec(row, 1)?,
        factor: dec(row, 2)?,
        reference_date: date(row, 3)?,
    })
}

/// Insert or update an exchange-rate record.
pub fn save_exchange_rate(conn: &Connection, rate: &ExchangeRate) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO exchange_rates (id, rate, factor, reference_date) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(id) DO UPDATE SET \
             rate = excluded.rate, \
             factor = excluded.factor, \
             reference_date = excluded.reference_date",
        params![
            rate.id,
            rate.rate.to_string(),
            rate.factor.to_string(),
            rate.reference_date.to_string(),
        ],
    )?;
    Ok(())
}

/// Fetch an exchange-rate record by id.
pub fn get_exchange_rate(conn: &Connection, id: &str) -> rusqlite::Result<Option<ExchangeRate>> {
    conn.query_row(
        "SELECT id, rate, factor, reference_date FROM exchange_rates WHERE id = ?1",
        params![id],
        exchange_rate_from_row,
    )
    .optional()
}

/// Delete an exchange-rate record. Contributor references are detached
/// (SET NULL); their derived values fall back to zero on the next save.
pub fn delete_exchange_rate(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let n = conn.execute("DELETE FROM exchange_rates WHERE id = ?1", params![id])?;
    Ok(n > 0)
}
