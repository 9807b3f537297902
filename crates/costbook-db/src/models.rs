use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn decimal_one() -> Decimal {
    Decimal::ONE
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Aggregation role of a category.
///
/// Ordinary categories roll up their own contributors plus their children.
/// The five special roles compute their total from sibling or project-wide
/// aggregates instead (see `costbook-core::aggregate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryRole {
    Ordinary,
    DetailEngineering,
    ProcurementManagement,
    Contingency,
    Profit,
    VendorAssistance,
}

impl CategoryRole {
    /// Classify a display name into a role, matching the legacy
    /// case-insensitive names. Used when a loader does not set the role
    /// explicitly.
    pub fn from_display_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "ingenieria de detalles" => Self::DetailEngineering,
            "gestion de compras" => Self::ProcurementManagement,
            "contingencia" => Self::Contingency,
            "utilidades" => Self::Profit,
            "asistencia tecnica del vendor" => Self::VendorAssistance,
            _ => Self::Ordinary,
        }
    }
}

impl fmt::Display for CategoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ordinary => "ordinary",
            Self::DetailEngineering => "detail_engineering",
            Self::ProcurementManagement => "procurement_management",
            Self::Contingency => "contingency",
            Self::Profit => "profit",
            Self::VendorAssistance => "vendor_assistance",
        };
        f.write_str(s)
    }
}

impl FromStr for CategoryRole {
    type Err = CategoryRoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ordinary" => Ok(Self::Ordinary),
            "detail_engineering" => Ok(Self::DetailEngineering),
            "procurement_management" => Ok(Self::ProcurementManagement),
            "contingency" => Ok(Self::Contingency),
            "profit" => Ok(Self::Profit),
            "vendor_assistance" => Ok(Self::VendorAssistance),
            other => Err(CategoryRoleParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`CategoryRole`] string.
#[derive(Debug, Clone)]
pub struct CategoryRoleParseError(pub String);

impl fmt::Display for CategoryRoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid category role: {:?}", self.0)
    }
}

impl std::error::Error for CategoryRoleParseError {}

// ---------------------------------------------------------------------------

/// The seventeen contributor record kinds, one table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributorKind {
    Procurement,
    OtherMaterials,
    ConstructionEquipment,
    Labor,
    CategoryOverhead,
    Staff,
    DetailEngineering,
    ProcurementManagement,
    Contract,
    CounterpartEngineering,
    PermitManagement,
    OwnerCost,
    AdminSupervision,
    IndirectPersonnel,
    SupportServices,
    OtherAdmin,
    AdminFinancial,
}

impl ContributorKind {
    /// All kinds, in the fixed valuation order: reference-fed kinds first,
    /// then the contract kind that reads their derived values.
    pub const ALL: [ContributorKind; 17] = [
        Self::Procurement,
        Self::OtherMaterials,
        Self::ConstructionEquipment,
        Self::Labor,
        Self::CategoryOverhead,
        Self::Staff,
        Self::DetailEngineering,
        Self::ProcurementManagement,
        Self::CounterpartEngineering,
        Self::PermitManagement,
        Self::OwnerCost,
        Self::AdminSupervision,
        Self::IndirectPersonnel,
        Self::SupportServices,
        Self::OtherAdmin,
        Self::AdminFinancial,
        Self::Contract,
    ];

    /// SQL table backing this kind.
    pub fn table(self) -> &'static str {
        match self {
            Self::Procurement => "procurements",
            Self::OtherMaterials => "other_materials",
            Self::ConstructionEquipment => "construction_equipment",
            Self::Labor => "labor",
            Self::CategoryOverhead => "category_overheads",
            Self::Staff => "staff",
            Self::DetailEngineering => "detail_engineering",
            Self::ProcurementManagement => "procurement_management",
            Self::Contract => "contracts",
            Self::CounterpartEngineering => "counterpart_engineering",
            Self::PermitManagement => "permit_management",
            Self::OwnerCost => "owner_costs",
            Self::AdminSupervision => "admin_supervision",
            Self::IndirectPersonnel => "indirect_personnel",
            Self::SupportServices => "support_services",
            Self::OtherAdmin => "other_admin",
            Self::AdminFinancial => "admin_financial",
        }
    }

    /// Column contributing to the owning category's ordinary roll-up, or
    /// `None` for kinds that only surface through a special role.
    ///
    /// Contracts contribute their indirect value only: the contract grand
    /// total already embeds the labor and materials totals that roll up
    /// through their own kinds.
    pub fn rollup_column(self) -> Option<&'static str> {
        match self {
            Self::Procurement => Some("total_with_freight"),
            Self::OtherMaterials => Some("site_total"),
            Self::ConstructionEquipment => Some("total_value"),
            Self::Labor => Some("total_value"),
            Self::CategoryOverhead => Some("total"),
            Self::Staff => Some("total_cost"),
            Self::DetailEngineering => Some("total_cost"),
            Self::ProcurementManagement => None,
            Self::Contract => Some("indirect_value"),
            Self::CounterpartEngineering => Some("total_value"),
            Self::PermitManagement => Some("total_value"),
            Self::OwnerCost => Some("total_cost"),
            Self::AdminSupervision => Some("total_usd"),
            Self::IndirectPersonnel => Some("total_usd"),
            Self::SupportServices => Some("total_value"),
            Self::OtherAdmin => Some("total_value"),
            Self::AdminFinancial => Some("total_cost"),
        }
    }

    /// Whether category deletion detaches records of this kind (SET NULL)
    /// instead of cascading, matching the legacy per-kind policy.
    pub fn detaches_on_category_delete(self) -> bool {
        matches!(
            self,
            Self::Procurement
                | Self::OtherMaterials
                | Self::ConstructionEquipment
                | Self::Labor
                | Self::OtherAdmin
        )
    }
}

impl fmt::Display for ContributorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Procurement => "procurement",
            Self::OtherMaterials => "other_materials",
            Self::ConstructionEquipment => "construction_equipment",
            Self::Labor => "labor",
            Self::CategoryOverhead => "category_overhead",
            Self::Staff => "staff",
            Self::DetailEngineering => "detail_engineering",
            Self::ProcurementManagement => "procurement_management",
            Self::Contract => "contract",
            Self::CounterpartEngineering => "counterpart_engineering",
            Self::PermitManagement => "permit_management",
            Self::OwnerCost => "owner_cost",
            Self::AdminSupervision => "admin_supervision",
            Self::IndirectPersonnel => "indirect_personnel",
            Self::SupportServices => "support_services",
            Self::OtherAdmin => "other_admin",
            Self::AdminFinancial => "admin_financial",
        };
        f.write_str(s)
    }
}

impl FromStr for ContributorKind {
    type Err = ContributorKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "procurement" => Ok(Self::Procurement),
            "other_materials" => Ok(Self::OtherMaterials),
            "construction_equipment" => Ok(Self::ConstructionEquipment),
            "labor" => Ok(Self::Labor),
            "category_overhead" => Ok(Self::CategoryOverhead),
            "staff" => Ok(Self::Staff),
            "detail_engineering" => Ok(Self::DetailEngineering),
            "procurement_management" => Ok(Self::ProcurementManagement),
            "contract" => Ok(Self::Contract),
            "counterpart_engineering" => Ok(Self::CounterpartEngineering),
            "permit_management" => Ok(Self::PermitManagement),
            "owner_cost" => Ok(Self::OwnerCost),
            "admin_supervision" => Ok(Self::AdminSupervision),
            "indirect_personnel" => Ok(Self::IndirectPersonnel),
            "support_services" => Ok(Self::SupportServices),
            "other_admin" => Ok(Self::OtherAdmin),
            "admin_financial" => Ok(Self::AdminFinancial),
            other => Err(ContributorKindParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ContributorKind`] string.
#[derive(Debug, Clone)]
pub struct ContributorKindParseError(pub String);

impl fmt::Display for ContributorKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid contributor kind: {:?}", self.0)
    }
}

impl std::error::Error for ContributorKindParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A project -- the root of a cost breakdown forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Optional link to a comparison project, kept for reporting only.
    pub related_project: Option<i64>,
    pub contingency_pct: Decimal,
    pub profit_pct: Decimal,
    /// Cached sum of the project's root-category totals. Written only by
    /// the propagation scheduler.
    pub total_cost: Decimal,
}

/// A node in a project's cost breakdown tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub parent_id: Option<String>,
    /// Cross-project comparison tag, reporting only.
    pub related_category: Option<String>,
    pub level: i64,
    pub is_final: bool,
    pub role: CategoryRole,
    /// Cached total. Written only by the aggregator.
    pub total_cost: Decimal,
}

/// Finalized usable quantity for a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quantity {
    #[serde(default)]
    pub id: i64,
    pub category_id: String,
    pub unit: String,
    pub quantity: Decimal,
    pub growth_factor: Decimal,
    #[serde(default)]
    pub final_quantity: Decimal,
}

/// Unit freight percentage and applicable currency rate for a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceReference {
    #[serde(default)]
    pub id: i64,
    pub category_id: String,
    pub supply_type: String,
    pub currency: String,
    pub reference_date: NaiveDate,
    pub applied_rate: Decimal,
    pub unit_freight_pct: Decimal,
    pub exchange_rate: Decimal,
}

/// Standalone exchange-rate record, selected explicitly per contributor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub id: String,
    pub rate: Decimal,
    pub factor: Decimal,
    pub reference_date: NaiveDate,
}

// ---------------------------------------------------------------------------
// Contributor rows. Derived fields are recomputed by the engine on every
// save; the db layer persists whatever it is handed.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Procurement {
    #[serde(default)]
    pub id: i64,
    pub category_id: Option<String>,
    pub origin_type: String,
    pub category_type: String,
    pub unit_cost: Decimal,
    pub growth_pct: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub freight: Decimal,
    #[serde(default)]
    pub total_with_freight: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtherMaterials {
    #[serde(default)]
    pub id: i64,
    pub category_id: Option<String>,
    pub unit_cost: Decimal,
    pub growth_pct: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub freight: Decimal,
    #[serde(default)]
    pub site_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionEquipment {
    #[serde(default)]
    pub id: i64,
    pub category_id: Option<String>,
    pub machine_hours_per_unit: Decimal,
    pub machine_hourly_cost: Decimal,
    #[serde(default)]
    pub total_machine_hours: Decimal,
    #[serde(default)]
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Labor {
    #[serde(default)]
    pub id: i64,
    pub category_id: Option<String>,
    pub hours_per_unit: Decimal,
    pub progress_factor: Decimal,
    #[serde(default = "decimal_one")]
    pub yield_factor: Decimal,
    pub mod_rate: Decimal,
    pub equipment_rate: Decimal,
    pub hourly_cost: Decimal,
    #[serde(default)]
    pub hours_final: Decimal,
    #[serde(default)]
    pub total_hours: Decimal,
    #[serde(default)]
    pub man_hours_qty: Decimal,
    #[serde(default)]
    pub value_mod: Decimal,
    #[serde(default)]
    pub value_equipment: Decimal,
    #[serde(default)]
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryOverhead {
    #[serde(default)]
    pub id: i64,
    pub category_id: String,
    pub unit: String,
    pub quantity: Decimal,
    pub dedication_pct: Decimal,
    pub duration_months: Decimal,
    pub monthly_cost: Decimal,
    #[serde(default)]
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    #[serde(default)]
    pub id: i64,
    pub category_id: String,
    pub name: String,
    pub monthly_rate: Decimal,
    pub headcount: i64,
    pub duration_months: i64,
    pub utilization_factor: Decimal,
    #[serde(default)]
    pub total_man_hours: Decimal,
    #[serde(default)]
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailEngineering {
    #[serde(default)]
    pub id: i64,
    pub category_id: String,
    pub professional_hours: Decimal,
    pub hourly_rate: Decimal,
    #[serde(default)]
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcurementManagement {
    #[serde(default)]
    pub id: i64,
    pub category_id: String,
    pub buyers: i64,
    pub dedication_pct: Decimal,
    pub term_months: Decimal,
    pub salary: Decimal,
    pub travel_value: Decimal,
    #[serde(default)]
    pub management_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    #[serde(default)]
    pub id: i64,
    pub category_id: String,
    pub indirect_hourly_cost: Decimal,
    pub markup_pct: Decimal,
    #[serde(default)]
    pub indirect_value: Decimal,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default)]
    pub subcontract_total: Decimal,
    #[serde(default)]
    pub contract_total: Decimal,
    #[serde(default)]
    pub contract_unit_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterpartEngineering {
    #[serde(default)]
    pub id: i64,
    pub category_id: String,
    pub name: String,
    pub uf_amount: Decimal,
    pub exchange_rate_id: Option<String>,
    #[serde(default)]
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermitManagement {
    #[serde(default)]
    pub id: i64,
    pub category_id: String,
    pub name: String,
    pub dedication_pct: Decimal,
    pub months: i64,
    pub headcount: i64,
    pub shift: String,
    pub total_clp: Decimal,
    pub exchange_rate_id: Option<String>,
    #[serde(default)]
    pub man_hours: Decimal,
    #[serde(default)]
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerCost {
    #[serde(default)]
    pub id: i64,
    pub category_id: String,
    pub name: String,
    pub total_hours: Decimal,
    pub hourly_cost: Decimal,
    #[serde(default)]
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSupervision {
    #[serde(default)]
    pub id: i64,
    pub category_id: String,
    pub unit: String,
    pub unit_price_clp: Decimal,
    pub unit_total: Decimal,
    pub usage_factor: Decimal,
    pub person_qty: Decimal,
    pub exchange_rate_id: Option<String>,
    #[serde(default)]
    pub total_clp: Decimal,
    #[serde(default)]
    pub total_usd: Decimal,
    #[serde(default)]
    pub total_converted: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndirectPersonnel {
    #[serde(default)]
    pub id: i64,
    pub category_id: String,
    pub shift: String,
    pub unit: String,
    pub hours_per_month: Decimal,
    pub term_months: Decimal,
    pub unit_price_clp: Decimal,
    pub exchange_rate_id: Option<String>,
    #[serde(default)]
    pub total_hours: Decimal,
    #[serde(default)]
    pub usd_rate: Decimal,
    #[serde(default)]
    pub total_clp: Decimal,
    #[serde(default)]
    pub total_usd: Decimal,
    #[serde(default)]
    pub total_converted: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportServices {
    #[serde(default)]
    pub id: i64,
    pub category_id: String,
    pub unit: String,
    pub quantity: Decimal,
    pub total_hours: Decimal,
    pub rate_clp: Decimal,
    pub exchange_rate_id: Option<String>,
    #[serde(default)]
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtherAdmin {
    #[serde(default)]
    pub id: i64,
    pub category_id: Option<String>,
    pub dedication_pct: Decimal,
    pub months: i64,
    pub headcount: i64,
    pub shift: String,
    pub total_clp: Decimal,
    pub exchange_rate_id: Option<String>,
    #[serde(default)]
    pub man_hours: Decimal,
    #[serde(default)]
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminFinancial {
    #[serde(default)]
    pub id: i64,
    pub category_id: String,
    pub unit: String,
    pub value: Decimal,
    pub months: i64,
    pub over_base_pct: Decimal,
    pub total_cost: Decimal,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
