//! SQLite store: connection setup and schema migration.
//!
//! The schema is embedded and applied through a `user_version`-gated batch,
//! so opening an already-migrated database is a no-op.

use std::path::Path;

use rusqlite::Connection;
use tracing::info;

/// Current schema version recorded in `PRAGMA user_version`.
const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = r#"
CREATE TABLE projects (
    id               TEXT PRIMARY KEY,
    name             TEXT NOT NULL,
    related_project  INTEGER,
    contingency_pct  TEXT NOT NULL DEFAULT '0',
    profit_pct       TEXT NOT NULL DEFAULT '0',
    total_cost       TEXT NOT NULL DEFAULT '0'
);

CREATE TABLE categories (
    id                TEXT PRIMARY KEY,
    name              TEXT NOT NULL,
    project_id        TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    parent_id         TEXT REFERENCES categories(id) ON DELETE CASCADE,
    related_category  TEXT,
    level             INTEGER NOT NULL DEFAULT 1,
    is_final          INTEGER NOT NULL DEFAULT 0,
    role              TEXT NOT NULL DEFAULT 'ordinary',
    total_cost        TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_categories_project ON categories(project_id);
CREATE INDEX idx_categories_parent ON categories(parent_id);

CREATE TABLE quantities (
    id             INTEGER PRIMARY KEY,
    category_id    TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    unit           TEXT NOT NULL,
    quantity       TEXT NOT NULL,
    growth_factor  TEXT NOT NULL,
    final_quantity TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_quantities_category ON quantities(category_id);

CREATE TABLE price_references (
    id               INTEGER PRIMARY KEY,
    category_id      TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    supply_type      TEXT NOT NULL,
    currency         TEXT NOT NULL,
    reference_date   TEXT NOT NULL,
    applied_rate     TEXT NOT NULL,
    unit_freight_pct TEXT NOT NULL DEFAULT '0',
    exchange_rate    TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_price_references_category ON price_references(category_id);

CREATE TABLE exchange_rates (
    id             TEXT PRIMARY KEY,
    rate           TEXT NOT NULL,
    factor         TEXT NOT NULL,
    reference_date TEXT NOT NULL UNIQUE
);

CREATE TABLE procurements (
    id                 INTEGER PRIMARY KEY,
    category_id        TEXT REFERENCES categories(id) ON DELETE SET NULL,
    origin_type        TEXT NOT NULL DEFAULT '',
    category_type      TEXT NOT NULL DEFAULT '',
    unit_cost          TEXT NOT NULL,
    growth_pct         TEXT NOT NULL DEFAULT '0',
    total              TEXT NOT NULL DEFAULT '0',
    freight            TEXT NOT NULL DEFAULT '0',
    total_with_freight TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_procurements_category ON procurements(category_id);

CREATE TABLE other_materials (
    id          INTEGER PRIMARY KEY,
    category_id TEXT REFERENCES categories(id) ON DELETE SET NULL,
    unit_cost   TEXT NOT NULL,
    growth_pct  TEXT NOT NULL DEFAULT '0',
    total       TEXT NOT NULL DEFAULT '0',
    freight     TEXT NOT NULL DEFAULT '0',
    site_total  TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_other_materials_category ON other_materials(category_id);

CREATE TABLE construction_equipment (
    id                     INTEGER PRIMARY KEY,
    category_id            TEXT REFERENCES categories(id) ON DELETE SET NULL,
    machine_hours_per_unit TEXT NOT NULL,
    machine_hourly_cost    TEXT NOT NULL,
    total_machine_hours    TEXT NOT NULL DEFAULT '0',
    total_value            TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_construction_equipment_category ON construction_equipment(category_id);

CREATE TABLE labor (
    id              INTEGER PRIMARY KEY,
    category_id     TEXT REFERENCES categories(id) ON DELETE SET NULL,
    hours_per_unit  TEXT NOT NULL,
    progress_factor TEXT NOT NULL,
    yield_factor    TEXT NOT NULL DEFAULT '1',
    mod_rate        TEXT NOT NULL DEFAULT '0',
    equipment_rate  TEXT NOT NULL DEFAULT '0',
    hourly_cost     TEXT NOT NULL DEFAULT '0',
    hours_final     TEXT NOT NULL DEFAULT '0',
    total_hours     TEXT NOT NULL DEFAULT '0',
    man_hours_qty   TEXT NOT NULL DEFAULT '0',
    value_mod       TEXT NOT NULL DEFAULT '0',
    value_equipment TEXT NOT NULL DEFAULT '0',
    total_value     TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_labor_category ON labor(category_id);

CREATE TABLE category_overheads (
    id              INTEGER PRIMARY KEY,
    category_id     TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    unit            TEXT NOT NULL DEFAULT '',
    quantity        TEXT NOT NULL,
    dedication_pct  TEXT NOT NULL,
    duration_months TEXT NOT NULL,
    monthly_cost    TEXT NOT NULL,
    total           TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_category_overheads_category ON category_overheads(category_id);

CREATE TABLE staff (
    id                 INTEGER PRIMARY KEY,
    category_id        TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    name               TEXT NOT NULL,
    monthly_rate       TEXT NOT NULL,
    headcount          INTEGER NOT NULL,
    duration_months    INTEGER NOT NULL,
    utilization_factor TEXT NOT NULL,
    total_man_hours    TEXT NOT NULL DEFAULT '0',
    total_cost         TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_staff_category ON staff(category_id);

CREATE TABLE detail_engineering (
    id                 INTEGER PRIMARY KEY,
    category_id        TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    professional_hours TEXT NOT NULL,
    hourly_rate        TEXT NOT NULL,
    total_cost         TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_detail_engineering_category ON detail_engineering(category_id);

CREATE TABLE procurement_management (
    id               INTEGER PRIMARY KEY,
    category_id      TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    buyers           INTEGER NOT NULL,
    dedication_pct   TEXT NOT NULL DEFAULT '0',
    term_months      TEXT NOT NULL,
    salary           TEXT NOT NULL,
    travel_value     TEXT NOT NULL DEFAULT '0',
    management_value TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_procurement_management_category ON procurement_management(category_id);

CREATE TABLE contracts (
    id                   INTEGER PRIMARY KEY,
    category_id          TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    indirect_hourly_cost TEXT NOT NULL,
    markup_pct           TEXT NOT NULL DEFAULT '0',
    indirect_value       TEXT NOT NULL DEFAULT '0',
    unit_price           TEXT NOT NULL DEFAULT '0',
    subcontract_total    TEXT NOT NULL DEFAULT '0',
    contract_total       TEXT NOT NULL DEFAULT '0',
    contract_unit_cost   TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_contracts_category ON contracts(category_id);

CREATE TABLE counterpart_engineering (
    id               INTEGER PRIMARY KEY,
    category_id      TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    name             TEXT NOT NULL,
    uf_amount        TEXT NOT NULL,
    exchange_rate_id TEXT REFERENCES exchange_rates(id) ON DELETE SET NULL,
    total_value      TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_counterpart_engineering_category ON counterpart_engineering(category_id);

CREATE TABLE permit_management (
    id               INTEGER PRIMARY KEY,
    category_id      TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    name             TEXT NOT NULL,
    dedication_pct   TEXT NOT NULL,
    months           INTEGER NOT NULL,
    headcount        INTEGER NOT NULL,
    shift            TEXT NOT NULL DEFAULT '',
    total_clp        TEXT NOT NULL DEFAULT '0',
    exchange_rate_id TEXT REFERENCES exchange_rates(id) ON DELETE SET NULL,
    man_hours        TEXT NOT NULL DEFAULT '0',
    total_value      TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_permit_management_category ON permit_management(category_id);

CREATE TABLE owner_costs (
    id          INTEGER PRIMARY KEY,
    category_id TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    total_hours TEXT NOT NULL,
    hourly_cost TEXT NOT NULL,
    total_cost  TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_owner_costs_category ON owner_costs(category_id);

CREATE TABLE admin_supervision (
    id               INTEGER PRIMARY KEY,
    category_id      TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    unit             TEXT NOT NULL DEFAULT '',
    unit_price_clp   TEXT NOT NULL,
    unit_total       TEXT NOT NULL,
    usage_factor     TEXT NOT NULL DEFAULT '0',
    person_qty       TEXT NOT NULL DEFAULT '0',
    exchange_rate_id TEXT REFERENCES exchange_rates(id) ON DELETE SET NULL,
    total_clp        TEXT NOT NULL DEFAULT '0',
    total_usd        TEXT NOT NULL DEFAULT '0',
    total_converted  TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_admin_supervision_category ON admin_supervision(category_id);

CREATE TABLE indirect_personnel (
    id               INTEGER PRIMARY KEY,
    category_id      TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    shift            TEXT NOT NULL DEFAULT '',
    unit             TEXT NOT NULL DEFAULT '',
    hours_per_month  TEXT NOT NULL,
    term_months      TEXT NOT NULL,
    unit_price_clp   TEXT NOT NULL,
    exchange_rate_id TEXT REFERENCES exchange_rates(id) ON DELETE SET NULL,
    total_hours      TEXT NOT NULL DEFAULT '0',
    usd_rate         TEXT NOT NULL DEFAULT '0',
    total_clp        TEXT NOT NULL DEFAULT '0',
    total_usd        TEXT NOT NULL DEFAULT '0',
    total_converted  TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_indirect_personnel_category ON indirect_personnel(category_id);

CREATE TABLE support_services (
    id               INTEGER PRIMARY KEY,
    category_id      TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    unit             TEXT NOT NULL DEFAULT '',
    quantity         TEXT NOT NULL DEFAULT '0',
    total_hours      TEXT NOT NULL DEFAULT '0',
    rate_clp         TEXT NOT NULL,
    exchange_rate_id TEXT REFERENCES exchange_rates(id) ON DELETE SET NULL,
    total_value      TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_support_services_category ON support_services(category_id);

CREATE TABLE other_admin (
    id               INTEGER PRIMARY KEY,
    category_id      TEXT REFERENCES categories(id) ON DELETE SET NULL,
    dedication_pct   TEXT NOT NULL,
    months           INTEGER NOT NULL,
    headcount        INTEGER NOT NULL,
    shift            TEXT NOT NULL DEFAULT '',
    total_clp        TEXT NOT NULL DEFAULT '0',
    exchange_rate_id TEXT REFERENCES exchange_rates(id) ON DELETE SET NULL,
    man_hours        TEXT NOT NULL DEFAULT '0',
    total_value      TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_other_admin_category ON other_admin(category_id);

CREATE TABLE admin_financial (
    id            INTEGER PRIMARY KEY,
    category_id   TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    unit          TEXT NOT NULL DEFAULT '',
    value         TEXT NOT NULL,
    months        INTEGER NOT NULL,
    over_base_pct TEXT NOT NULL DEFAULT '0',
    total_cost    TEXT NOT NULL DEFAULT '0'
);
CREATE INDEX idx_admin_financial_category ON admin_financial(category_id);
"#;

/// Open (or create) a file-backed store and apply pending migrations.
pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    init(&conn)?;
    Ok(conn)
}

/// Open an in-memory store with the schema applied. Used by tests and the
/// loader's dry-run mode.
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init(&conn)?;
    Ok(conn)
}

fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;

    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < SCHEMA_VERSION {
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        info!(version = SCHEMA_VERSION, "schema applied");
    }
    Ok(())
}
