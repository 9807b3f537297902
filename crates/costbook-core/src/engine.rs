//! The engine facade.
//!
//! Every public mutation runs inside a single transaction: mutate, revalue
//! the affected records, reaggregate the owning category, and propagate the
//! change upward. An error at any point rolls the whole mutation back, so
//! cached totals never drift from the records underneath them.

use std::path::Path;

use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::info;

use costbook_db::models::{
    Category, CategoryRole, ContributorKind, ExchangeRate, PriceReference, Project, Quantity,
};
use costbook_db::{queries, store};

use crate::error::{EngineError, Result};
use crate::input::{
    Batch, CategoryInput, ContributorInput, ImportSummary, ProjectInput, SavedContributor,
};
use crate::propagate::{self, Origin};
use crate::{quantity, tree, valuation};

pub struct Engine {
    conn: Connection,
}

impl Engine {
    /// Open (or create) a file-backed cost book.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            conn: store::open(path)?,
        })
    }

    /// Open a throwaway in-memory cost book.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: store::open_in_memory()?,
        })
    }

    /// Raw read access for reporting. Mutations must go through the engine.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// Create or update a project. Percentage changes resettle the project's
    /// contingency and profit categories.
    pub fn save_project(&mut self, input: &ProjectInput) -> Result<Project> {
        let tx = self.conn.transaction()?;
        queries::projects::upsert(&tx, &project_from_input(input))?;
        propagate::settle_project(&tx, &input.id)?;
        let saved = queries::projects::get(&tx, &input.id)?.ok_or_else(|| EngineError::NotFound {
            what: "project",
            id: input.id.clone(),
        })?;
        tx.commit()?;
        Ok(saved)
    }

    /// Update only a project's percentage knobs, resettling its contingency
    /// and profit categories.
    pub fn set_project_percentages(
        &mut self,
        id: &str,
        contingency_pct: Decimal,
        profit_pct: Decimal,
    ) -> Result<Project> {
        let tx = self.conn.transaction()?;
        let mut project =
            queries::projects::get(&tx, id)?.ok_or_else(|| EngineError::NotFound {
                what: "project",
                id: id.to_owned(),
            })?;
        project.contingency_pct = contingency_pct;
        project.profit_pct = profit_pct;
        queries::projects::upsert(&tx, &project)?;
        propagate::settle_project(&tx, id)?;
        let saved = queries::projects::get(&tx, id)?.ok_or_else(|| EngineError::NotFound {
            what: "project",
            id: id.to_owned(),
        })?;
        tx.commit()?;
        Ok(saved)
    }

    pub fn project(&self, id: &str) -> Result<Option<Project>> {
        Ok(queries::projects::get(&self.conn, id)?)
    }

    pub fn projects(&self) -> Result<Vec<Project>> {
        Ok(queries::projects::list(&self.conn)?)
    }

    /// Cached project total.
    pub fn project_total(&self, id: &str) -> Result<Decimal> {
        self.project(id)?
            .map(|p| p.total_cost)
            .ok_or_else(|| EngineError::NotFound {
                what: "project",
                id: id.to_owned(),
            })
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    /// Create, update, or reparent a category. The parent chain is checked
    /// for cycles before anything is written; both the new and (on a move)
    /// the old subtree are repropagated.
    pub fn save_category(&mut self, input: &CategoryInput) -> Result<Category> {
        let tx = self.conn.transaction()?;
        let (saved, old_parent) = save_category_tx(&tx, input)?;
        propagate::propagate(&tx, &saved.id, Origin::Normal)?;
        if let Some(parent_id) = old_parent {
            propagate::propagate(&tx, &parent_id, Origin::Normal)?;
        }
        tx.commit()?;
        Ok(saved)
    }

    /// Delete a category. Children are removed with it; contributor records
    /// cascade or detach per kind. The surviving tree is repropagated so the
    /// deleted subtree's weight disappears from every ancestor.
    pub fn delete_category(&mut self, id: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        let category = queries::categories::get(&tx, id)?
            .ok_or_else(|| EngineError::MissingCategory(id.to_owned()))?;
        queries::categories::delete(&tx, id)?;
        propagate::settle_vendor_assistance(&tx, &category.project_id, id)?;
        match &category.parent_id {
            Some(parent_id) => propagate::propagate(&tx, parent_id, Origin::Normal)?,
            None => {
                propagate::refresh_project(&tx, &category.project_id)?;
                propagate::settle_project(&tx, &category.project_id)?;
            }
        }
        tx.commit()?;
        info!(category = id, "category deleted");
        Ok(())
    }

    pub fn category(&self, id: &str) -> Result<Option<Category>> {
        Ok(queries::categories::get(&self.conn, id)?)
    }

    /// All categories of a project, parents before children.
    pub fn categories(&self, project_id: &str) -> Result<Vec<Category>> {
        Ok(queries::categories::list_for_project(&self.conn, project_id)?)
    }

    /// Cached category total.
    pub fn category_total(&self, id: &str) -> Result<Decimal> {
        self.category(id)?
            .map(|c| c.total_cost)
            .ok_or_else(|| EngineError::MissingCategory(id.to_owned()))
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    /// Save a category's quantity. The final quantity is resolved here and
    /// every record priced off it is revalued.
    pub fn save_quantity(&mut self, input: &Quantity) -> Result<Quantity> {
        let tx = self.conn.transaction()?;
        let category = require_category(&tx, &input.category_id)?;
        let mut record = input.clone();
        record.final_quantity = quantity::final_quantity(record.quantity, record.growth_factor);
        record.id = queries::references::save_quantity(&tx, &record)?;
        revalue_and_propagate(&tx, &category)?;
        tx.commit()?;
        Ok(record)
    }

    pub fn delete_quantity(&mut self, id: i64) -> Result<()> {
        let tx = self.conn.transaction()?;
        let record =
            queries::references::get_quantity(&tx, id)?.ok_or_else(|| EngineError::NotFound {
                what: "quantity",
                id: id.to_string(),
            })?;
        queries::references::delete_quantity(&tx, id)?;
        let category = require_category(&tx, &record.category_id)?;
        revalue_and_propagate(&tx, &category)?;
        tx.commit()?;
        Ok(())
    }

    /// Save a category's price reference and revalue dependent records.
    pub fn save_price_reference(&mut self, input: &PriceReference) -> Result<PriceReference> {
        if input.unit_freight_pct < Decimal::ZERO {
            return Err(EngineError::InvalidInput(
                "unit freight percentage cannot be negative".into(),
            ));
        }
        let tx = self.conn.transaction()?;
        let category = require_category(&tx, &input.category_id)?;
        let mut record = input.clone();
        record.id = queries::references::save_price_reference(&tx, &record)?;
        revalue_and_propagate(&tx, &category)?;
        tx.commit()?;
        Ok(record)
    }

    pub fn delete_price_reference(&mut self, id: i64) -> Result<()> {
        let tx = self.conn.transaction()?;
        let record = queries::references::get_price_reference(&tx, id)?.ok_or_else(|| {
            EngineError::NotFound {
                what: "price reference",
                id: id.to_string(),
            }
        })?;
        queries::references::delete_price_reference(&tx, id)?;
        let category = require_category(&tx, &record.category_id)?;
        revalue_and_propagate(&tx, &category)?;
        tx.commit()?;
        Ok(())
    }

    /// Save an exchange rate. Existing records keep their stored values and
    /// pick up the new rate on their next save.
    pub fn save_exchange_rate(&mut self, rate: &ExchangeRate) -> Result<()> {
        queries::references::save_exchange_rate(&self.conn, rate)?;
        Ok(())
    }

    pub fn exchange_rate(&self, id: &str) -> Result<Option<ExchangeRate>> {
        Ok(queries::references::get_exchange_rate(&self.conn, id)?)
    }

    pub fn delete_exchange_rate(&mut self, id: &str) -> Result<()> {
        if !queries::references::delete_exchange_rate(&self.conn, id)? {
            return Err(EngineError::NotFound {
                what: "exchange rate",
                id: id.to_owned(),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Contributors
    // -----------------------------------------------------------------------

    /// Save a contributor record of any kind: revalue it from the category's
    /// references, persist it, and propagate the category change. Procurement
    /// saves also resettle the project's vendor-assistance category, whose
    /// base is the project-wide procurement spend.
    pub fn save_contributor(&mut self, input: &ContributorInput) -> Result<SavedContributor> {
        let tx = self.conn.transaction()?;
        let (saved, category) = save_contributor_tx(&tx, input)?;
        if saved.kind == ContributorKind::Procurement {
            propagate::settle_vendor_assistance(&tx, &category.project_id, &category.id)?;
        }
        propagate::propagate(&tx, &category.id, Origin::Normal)?;
        tx.commit()?;
        Ok(saved)
    }

    /// Delete a contributor record. Detached records (kinds that survive
    /// category deletion) are removed without propagation.
    pub fn delete_contributor(&mut self, kind: ContributorKind, id: i64) -> Result<()> {
        let tx = self.conn.transaction()?;
        let owner =
            queries::contributors::category_id(&tx, kind, id)?.ok_or_else(|| {
                EngineError::NotFound {
                    what: "contributor record",
                    id: id.to_string(),
                }
            })?;
        queries::contributors::delete(&tx, kind, id)?;
        if let Some(category_id) = owner {
            let category = require_category(&tx, &category_id)?;
            if matches!(kind, ContributorKind::Labor | ContributorKind::OtherMaterials) {
                revalue_contracts(&tx, &category)?;
            }
            if kind == ContributorKind::Procurement {
                propagate::settle_vendor_assistance(&tx, &category.project_id, &category.id)?;
            }
            propagate::propagate(&tx, &category.id, Origin::Normal)?;
        }
        tx.commit()?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Bulk import
    // -----------------------------------------------------------------------

    /// Apply a whole batch in one transaction, then rebuild every imported
    /// project's cached totals bottom-up.
    pub fn import(&mut self, batch: &Batch) -> Result<ImportSummary> {
        let tx = self.conn.transaction()?;
        let mut summary = ImportSummary::default();

        for project in &batch.projects {
            queries::projects::upsert(&tx, &project_from_input(project))?;
            summary.projects += 1;
        }
        for rate in &batch.exchange_rates {
            queries::references::save_exchange_rate(&tx, rate)?;
        }

        // Parents may appear after their children in the input; retry until
        // the pending set stops shrinking.
        let mut pending: Vec<&CategoryInput> = batch.categories.iter().collect();
        while !pending.is_empty() {
            let before = pending.len();
            let mut next = Vec::new();
            for input in pending {
                let parent_known = match &input.parent_id {
                    Some(pid) => queries::categories::get(&tx, pid)?.is_some(),
                    None => true,
                };
                if parent_known {
                    save_category_tx(&tx, input)?;
                    summary.categories += 1;
                } else {
                    next.push(input);
                }
            }
            if next.len() == before {
                let id = next[0].parent_id.clone().unwrap_or_default();
                return Err(EngineError::MissingCategory(id));
            }
            pending = next;
        }

        for input in &batch.quantities {
            require_category(&tx, &input.category_id)?;
            let mut record = input.clone();
            record.final_quantity = quantity::final_quantity(record.quantity, record.growth_factor);
            queries::references::save_quantity(&tx, &record)?;
        }
        for input in &batch.price_references {
            if input.unit_freight_pct < Decimal::ZERO {
                return Err(EngineError::InvalidInput(
                    "unit freight percentage cannot be negative".into(),
                ));
            }
            require_category(&tx, &input.category_id)?;
            queries::references::save_price_reference(&tx, input)?;
        }
        for input in &batch.contributors {
            save_contributor_tx(&tx, input)?;
            summary.contributors += 1;
        }

        for project in &batch.projects {
            propagate::rebuild_project(&tx, &project.id)?;
        }
        tx.commit()?;
        info!(
            projects = summary.projects,
            categories = summary.categories,
            contributors = summary.contributors,
            "batch imported"
        );
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Transaction-scoped helpers
// ---------------------------------------------------------------------------

fn project_from_input(input: &ProjectInput) -> Project {
    Project {
        id: input.id.clone(),
        name: input.name.clone(),
        related_project: input.related_project,
        contingency_pct: input.contingency_pct,
        profit_pct: input.profit_pct,
        total_cost: Decimal::ZERO,
    }
}

fn require_category(conn: &Connection, id: &str) -> Result<Category> {
    queries::categories::get(conn, id)?
        .ok_or_else(|| EngineError::MissingCategory(id.to_owned()))
}

/// Validate and upsert a category without propagating. Returns the saved row
/// and, when the category moved, its previous parent.
fn save_category_tx(
    conn: &Connection,
    input: &CategoryInput,
) -> Result<(Category, Option<String>)> {
    if queries::projects::get(conn, &input.project_id)?.is_none() {
        return Err(EngineError::NotFound {
            what: "project",
            id: input.project_id.clone(),
        });
    }
    if let Some(parent_id) = &input.parent_id {
        let parent = require_category(conn, parent_id)?;
        if parent.project_id != input.project_id {
            return Err(EngineError::ProjectMismatch {
                category: input.id.clone(),
                actual: parent.project_id,
                expected: input.project_id.clone(),
            });
        }
    }
    tree::ensure_no_cycle(conn, &input.id, input.parent_id.as_deref())?;

    let existing = queries::categories::get(conn, &input.id)?;
    let old_parent = existing
        .as_ref()
        .and_then(|c| c.parent_id.clone())
        .filter(|old| Some(old) != input.parent_id.as_ref());

    let category = Category {
        id: input.id.clone(),
        name: input.name.clone(),
        project_id: input.project_id.clone(),
        parent_id: input.parent_id.clone(),
        related_category: input.related_category.clone(),
        level: tree::level_for(conn, input.parent_id.as_deref())?,
        is_final: input.is_final,
        role: input
            .role
            .unwrap_or_else(|| CategoryRole::from_display_name(&input.name)),
        total_cost: Decimal::ZERO,
    };
    queries::categories::upsert(conn, &category)?;
    let saved = require_category(conn, &category.id)?;
    Ok((saved, old_parent))
}

/// Revalue and persist one contributor record without propagating. Returns
/// the saved identity and the owning category.
fn save_contributor_tx(
    conn: &Connection,
    input: &ContributorInput,
) -> Result<(SavedContributor, Category)> {
    let category_id = contributor_category(input)?;
    let category = require_category(conn, &category_id)?;
    let qty = queries::references::first_quantity(conn, &category.id)?;
    let price = queries::references::first_price_reference(conn, &category.id)?;

    let (kind, id) = match input {
        ContributorInput::Procurement(r) => {
            let mut r = r.clone();
            valuation::value_procurement(&mut r, qty.as_ref(), price.as_ref())?;
            (
                ContributorKind::Procurement,
                queries::contributors::save_procurement(conn, &r)?,
            )
        }
        ContributorInput::OtherMaterials(r) => {
            let mut r = r.clone();
            valuation::value_other_materials(&mut r, qty.as_ref(), price.as_ref())?;
            let id = queries::contributors::save_other_materials(conn, &r)?;
            revalue_contracts(conn, &category)?;
            (ContributorKind::OtherMaterials, id)
        }
        ContributorInput::ConstructionEquipment(r) => {
            let mut r = r.clone();
            valuation::value_construction_equipment(&mut r, qty.as_ref(), category.is_final);
            (
                ContributorKind::ConstructionEquipment,
                queries::contributors::save_construction_equipment(conn, &r)?,
            )
        }
        ContributorInput::Labor(r) => {
            let mut r = r.clone();
            valuation::value_labor(&mut r, qty.as_ref());
            let id = queries::contributors::save_labor(conn, &r)?;
            revalue_contracts(conn, &category)?;
            (ContributorKind::Labor, id)
        }
        ContributorInput::CategoryOverhead(r) => {
            let mut r = r.clone();
            valuation::value_category_overhead(&mut r);
            (
                ContributorKind::CategoryOverhead,
                queries::contributors::save_category_overhead(conn, &r)?,
            )
        }
        ContributorInput::Staff(r) => {
            let mut r = r.clone();
            valuation::value_staff(&mut r);
            (
                ContributorKind::Staff,
                queries::contributors::save_staff(conn, &r)?,
            )
        }
        ContributorInput::DetailEngineering(r) => {
            let mut r = r.clone();
            valuation::value_detail_engineering(&mut r);
            (
                ContributorKind::DetailEngineering,
                queries::contributors::save_detail_engineering(conn, &r)?,
            )
        }
        ContributorInput::ProcurementManagement(r) => {
            let mut r = r.clone();
            valuation::value_procurement_management(&mut r);
            (
                ContributorKind::ProcurementManagement,
                queries::contributors::save_procurement_management(conn, &r)?,
            )
        }
        ContributorInput::Contract(r) => {
            let mut r = r.clone();
            let labor = queries::contributors::first_labor(conn, &category.id)?;
            let materials = queries::contributors::first_other_materials(conn, &category.id)?;
            valuation::value_contract(
                &mut r,
                qty.as_ref(),
                price.as_ref(),
                labor.as_ref(),
                materials.as_ref(),
            );
            (
                ContributorKind::Contract,
                queries::contributors::save_contract(conn, &r)?,
            )
        }
        ContributorInput::CounterpartEngineering(r) => {
            let mut r = r.clone();
            let rate = lookup_rate(conn, r.exchange_rate_id.as_deref())?;
            valuation::value_counterpart_engineering(&mut r, rate.as_ref());
            (
                ContributorKind::CounterpartEngineering,
                queries::contributors::save_counterpart_engineering(conn, &r)?,
            )
        }
        ContributorInput::PermitManagement(r) => {
            let mut r = r.clone();
            let rate = lookup_rate(conn, r.exchange_rate_id.as_deref())?;
            valuation::value_permit_management(&mut r, rate.as_ref());
            (
                ContributorKind::PermitManagement,
                queries::contributors::save_permit_management(conn, &r)?,
            )
        }
        ContributorInput::OwnerCost(r) => {
            let mut r = r.clone();
            valuation::value_owner_cost(&mut r);
            (
                ContributorKind::OwnerCost,
                queries::contributors::save_owner_cost(conn, &r)?,
            )
        }
        ContributorInput::AdminSupervision(r) => {
            let mut r = r.clone();
            let rate = lookup_rate(conn, r.exchange_rate_id.as_deref())?;
            valuation::value_admin_supervision(&mut r, rate.as_ref());
            (
                ContributorKind::AdminSupervision,
                queries::contributors::save_admin_supervision(conn, &r)?,
            )
        }
        ContributorInput::IndirectPersonnel(r) => {
            let mut r = r.clone();
            let rate = lookup_rate(conn, r.exchange_rate_id.as_deref())?;
            valuation::value_indirect_personnel(&mut r, rate.as_ref());
            (
                ContributorKind::IndirectPersonnel,
                queries::contributors::save_indirect_personnel(conn, &r)?,
            )
        }
        ContributorInput::SupportServices(r) => {
            let mut r = r.clone();
            let rate = lookup_rate(conn, r.exchange_rate_id.as_deref())?;
            valuation::value_support_services(&mut r, rate.as_ref());
            (
                ContributorKind::SupportServices,
                queries::contributors::save_support_services(conn, &r)?,
            )
        }
        ContributorInput::OtherAdmin(r) => {
            let mut r = r.clone();
            let rate = lookup_rate(conn, r.exchange_rate_id.as_deref())?;
            valuation::value_other_admin(&mut r, rate.as_ref());
            (
                ContributorKind::OtherAdmin,
                queries::contributors::save_other_admin(conn, &r)?,
            )
        }
        ContributorInput::AdminFinancial(r) => {
            let mut r = r.clone();
            valuation::value_admin_financial(&mut r);
            (
                ContributorKind::AdminFinancial,
                queries::contributors::save_admin_financial(conn, &r)?,
            )
        }
    };

    Ok((
        SavedContributor {
            kind,
            id,
            category_id,
        },
        category,
    ))
}

fn contributor_category(input: &ContributorInput) -> Result<String> {
    // A detachable record submitted without a category has nowhere to land.
    let attached =
        |c: &Option<String>| c.clone().ok_or_else(|| EngineError::MissingCategory(String::new()));
    match input {
        ContributorInput::Procurement(r) => attached(&r.category_id),
        ContributorInput::OtherMaterials(r) => attached(&r.category_id),
        ContributorInput::ConstructionEquipment(r) => attached(&r.category_id),
        ContributorInput::Labor(r) => attached(&r.category_id),
        ContributorInput::OtherAdmin(r) => attached(&r.category_id),
        ContributorInput::CategoryOverhead(r) => Ok(r.category_id.clone()),
        ContributorInput::Staff(r) => Ok(r.category_id.clone()),
        ContributorInput::DetailEngineering(r) => Ok(r.category_id.clone()),
        ContributorInput::ProcurementManagement(r) => Ok(r.category_id.clone()),
        ContributorInput::Contract(r) => Ok(r.category_id.clone()),
        ContributorInput::CounterpartEngineering(r) => Ok(r.category_id.clone()),
        ContributorInput::PermitManagement(r) => Ok(r.category_id.clone()),
        ContributorInput::OwnerCost(r) => Ok(r.category_id.clone()),
        ContributorInput::AdminSupervision(r) => Ok(r.category_id.clone()),
        ContributorInput::IndirectPersonnel(r) => Ok(r.category_id.clone()),
        ContributorInput::SupportServices(r) => Ok(r.category_id.clone()),
        ContributorInput::AdminFinancial(r) => Ok(r.category_id.clone()),
    }
}

fn lookup_rate(conn: &Connection, id: Option<&str>) -> Result<Option<ExchangeRate>> {
    match id {
        Some(id) => Ok(queries::references::get_exchange_rate(conn, id)?),
        None => Ok(None),
    }
}

/// Revalue a category's reference-priced records, then propagate. The
/// revaluation rewrites procurement totals, which feed the project's
/// vendor-assistance base, so that category is resettled first.
fn revalue_and_propagate(conn: &Connection, category: &Category) -> Result<()> {
    revalue_category(conn, category)?;
    propagate::settle_vendor_assistance(conn, &category.project_id, &category.id)?;
    propagate::propagate(conn, &category.id, Origin::Normal)?;
    Ok(())
}

/// Revalue every record of a category that is priced off its quantity or
/// price reference, in dependency order: the reference-fed kinds first, then
/// contracts, which read the labor and materials results.
fn revalue_category(conn: &Connection, category: &Category) -> Result<()> {
    let qty = queries::references::first_quantity(conn, &category.id)?;
    let price = queries::references::first_price_reference(conn, &category.id)?;

    for mut r in queries::contributors::list_procurement_by_category(conn, &category.id)? {
        valuation::value_procurement(&mut r, qty.as_ref(), price.as_ref())?;
        queries::contributors::save_procurement(conn, &r)?;
    }
    for mut r in queries::contributors::list_other_materials_by_category(conn, &category.id)? {
        valuation::value_other_materials(&mut r, qty.as_ref(), price.as_ref())?;
        queries::contributors::save_other_materials(conn, &r)?;
    }
    for mut r in
        queries::contributors::list_construction_equipment_by_category(conn, &category.id)?
    {
        valuation::value_construction_equipment(&mut r, qty.as_ref(), category.is_final);
        queries::contributors::save_construction_equipment(conn, &r)?;
    }
    for mut r in queries::contributors::list_labor_by_category(conn, &category.id)? {
        valuation::value_labor(&mut r, qty.as_ref());
        queries::contributors::save_labor(conn, &r)?;
    }
    revalue_contracts(conn, category)
}

fn revalue_contracts(conn: &Connection, category: &Category) -> Result<()> {
    let qty = queries::references::first_quantity(conn, &category.id)?;
    let price = queries::references::first_price_reference(conn, &category.id)?;
    let labor = queries::contributors::first_labor(conn, &category.id)?;
    let materials = queries::contributors::first_other_materials(conn, &category.id)?;
    for mut r in queries::contributors::list_contracts_by_category(conn, &category.id)? {
        valuation::value_contract(
            &mut r,
            qty.as_ref(),
            price.as_ref(),
            labor.as_ref(),
            materials.as_ref(),
        );
        queries::contributors::save_contract(conn, &r)?;
    }
    Ok(())
}
