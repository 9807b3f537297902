//! Input payloads accepted by the engine.
//!
//! Contributor inputs reuse the storage row types; derived fields default
//! to zero and are recomputed on every save, so callers only supply the raw
//! fields.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use costbook_db::models::{
    AdminFinancial, AdminSupervision, CategoryOverhead, CategoryRole, ConstructionEquipment,
    Contract, ContributorKind, CounterpartEngineering, DetailEngineering, ExchangeRate,
    IndirectPersonnel, Labor, OtherAdmin, OtherMaterials, OwnerCost, PermitManagement,
    PriceReference, Procurement, ProcurementManagement, Quantity, Staff, SupportServices,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInput {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub related_project: Option<i64>,
    #[serde(default)]
    pub contingency_pct: Decimal,
    #[serde(default)]
    pub profit_pct: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInput {
    pub id: String,
    pub name: String,
    pub project_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub related_category: Option<String>,
    #[serde(default)]
    pub is_final: bool,
    /// Explicit aggregation role. Derived from the display name when absent,
    /// matching the legacy data where roles were spelled out in names.
    #[serde(default)]
    pub role: Option<CategoryRole>,
}

/// One contributor record of any kind, tagged for dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContributorInput {
    Procurement(Procurement),
    OtherMaterials(OtherMaterials),
    ConstructionEquipment(ConstructionEquipment),
    Labor(Labor),
    CategoryOverhead(CategoryOverhead),
    Staff(Staff),
    DetailEngineering(DetailEngineering),
    ProcurementManagement(ProcurementManagement),
    Contract(Contract),
    CounterpartEngineering(CounterpartEngineering),
    PermitManagement(PermitManagement),
    OwnerCost(OwnerCost),
    AdminSupervision(AdminSupervision),
    IndirectPersonnel(IndirectPersonnel),
    SupportServices(SupportServices),
    OtherAdmin(OtherAdmin),
    AdminFinancial(AdminFinancial),
}

impl ContributorInput {
    pub fn kind(&self) -> ContributorKind {
        match self {
            Self::Procurement(_) => ContributorKind::Procurement,
            Self::OtherMaterials(_) => ContributorKind::OtherMaterials,
            Self::ConstructionEquipment(_) => ContributorKind::ConstructionEquipment,
            Self::Labor(_) => ContributorKind::Labor,
            Self::CategoryOverhead(_) => ContributorKind::CategoryOverhead,
            Self::Staff(_) => ContributorKind::Staff,
            Self::DetailEngineering(_) => ContributorKind::DetailEngineering,
            Self::ProcurementManagement(_) => ContributorKind::ProcurementManagement,
            Self::Contract(_) => ContributorKind::Contract,
            Self::CounterpartEngineering(_) => ContributorKind::CounterpartEngineering,
            Self::PermitManagement(_) => ContributorKind::PermitManagement,
            Self::OwnerCost(_) => ContributorKind::OwnerCost,
            Self::AdminSupervision(_) => ContributorKind::AdminSupervision,
            Self::IndirectPersonnel(_) => ContributorKind::IndirectPersonnel,
            Self::SupportServices(_) => ContributorKind::SupportServices,
            Self::OtherAdmin(_) => ContributorKind::OtherAdmin,
            Self::AdminFinancial(_) => ContributorKind::AdminFinancial,
        }
    }
}

/// Identity of a contributor record after a save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedContributor {
    pub kind: ContributorKind,
    pub id: i64,
    pub category_id: String,
}

/// A full data set for bulk import, applied in one transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Batch {
    #[serde(default)]
    pub projects: Vec<ProjectInput>,
    #[serde(default)]
    pub exchange_rates: Vec<ExchangeRate>,
    #[serde(default)]
    pub categories: Vec<CategoryInput>,
    #[serde(default)]
    pub quantities: Vec<Quantity>,
    #[serde(default)]
    pub price_references: Vec<PriceReference>,
    #[serde(default)]
    pub contributors: Vec<ContributorInput>,
}

/// Counts reported after a batch import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub projects: usize,
    pub categories: usize,
    pub contributors: usize,
}
