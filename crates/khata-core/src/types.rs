//! # Domain Types
//!
//! Core domain types used throughout Khata.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogItem    │   │ DocumentHeader  │   │     Party       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name, unit     │   │  number         │   │  name, gstin    │       │
//! │  │  3 price tiers  │   │  totals         │   │  addresses      │       │
//! │  └────────┬────────┘   └────────┬────────┘   └─────────────────┘       │
//! │           │ snapshot()          │ owns                                  │
//! │           ▼                     ▼                                       │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │  ItemSnapshot   │──►│  DocumentLine   │                              │
//! │  │  (frozen copy)  │   │  qty × price    │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A document line never reads the live catalog after it is created. Name,
//! unit, HSN code and the three tier prices are copied into an
//! [`ItemSnapshot`] so later catalog edits cannot rewrite historical documents.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::{Adjustments, PricingBreakdown};

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% (standard GST slab)
///
/// Used for tax rates and percentage discounts alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage. Negative or non-finite input is zero.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return Rate(0);
        }
        Rate((pct * 100.0).round().min(u32::MAX as f64) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Formats the rate without trailing zeros: `18`, `8.25`, `12.5`.
    pub fn display_percentage(&self) -> String {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            whole.to_string()
        } else if frac % 10 == 0 {
            format!("{}.{}", whole, frac / 10)
        } else {
            format!("{}.{:02}", whole, frac)
        }
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Price Tier
// =============================================================================

/// One of the three catalog prices selectable per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    /// Regular selling price.
    #[default]
    Selling,
    /// Maximum retail price.
    Mrp,
    /// Wholesale price.
    Wholesale,
}

impl PriceTier {
    pub const ALL: [PriceTier; 3] = [PriceTier::Selling, PriceTier::Mrp, PriceTier::Wholesale];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Selling => "selling",
            PriceTier::Mrp => "mrp",
            PriceTier::Wholesale => "wholesale",
        }
    }
}

impl std::str::FromStr for PriceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "selling" => Ok(PriceTier::Selling),
            "mrp" => Ok(PriceTier::Mrp),
            "wholesale" => Ok(PriceTier::Wholesale),
            other => Err(format!("unknown price tier: {}", other)),
        }
    }
}

// =============================================================================
// Catalog Item
// =============================================================================

/// A sellable item. Read-only from the document engine's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// HSN / SAC tax classification code.
    pub hsn_code: Option<String>,

    pub barcode: Option<String>,

    /// Unit label ("pcs", "kg", "box").
    pub unit: String,

    /// Item tax rate. Informational on lines; document tax uses the header rate.
    pub tax_rate: Rate,

    /// Regular selling price. Always defined.
    pub selling_price: Money,

    /// Maximum retail price.
    pub mrp: Option<Money>,

    pub wholesale_price: Option<Money>,

    /// On-hand stock. Never negative.
    pub on_hand_qty: i64,

    /// Quantity sold to date. Never negative.
    pub sold_qty: i64,

    /// Optional image path or URL.
    pub image_ref: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CatalogItem {
    /// Returns the price stored for a tier. A missing tier price is zero.
    pub fn price_for(&self, tier: PriceTier) -> Money {
        match tier {
            PriceTier::Selling => self.selling_price,
            PriceTier::Mrp => self.mrp.unwrap_or_default(),
            PriceTier::Wholesale => self.wholesale_price.unwrap_or_default(),
        }
    }

    /// Freezes the fields a document line needs.
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            item_id: self.id.clone(),
            name: self.name.clone(),
            unit: self.unit.clone(),
            hsn_code: self.hsn_code.clone(),
            tax_rate: self.tax_rate,
            selling_price: self.selling_price,
            mrp: self.mrp,
            wholesale_price: self.wholesale_price,
        }
    }

    /// Case-insensitive substring match over the searchable fields.
    ///
    /// An empty (or whitespace-only) query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        let contains = |field: &str| field.to_lowercase().contains(&needle);

        contains(&self.name)
            || contains(&self.unit)
            || self.hsn_code.as_deref().is_some_and(contains)
            || self.barcode.as_deref().is_some_and(contains)
    }
}

/// Frozen copy of a catalog item taken when the item enters a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemSnapshot {
    /// Non-owning reference to the catalog item.
    pub item_id: String,
    pub name: String,
    pub unit: String,
    pub hsn_code: Option<String>,
    pub tax_rate: Rate,
    pub selling_price: Money,
    pub mrp: Option<Money>,
    pub wholesale_price: Option<Money>,
}

impl ItemSnapshot {
    /// Returns the frozen price for a tier. A missing tier price is zero.
    pub fn price_for(&self, tier: PriceTier) -> Money {
        match tier {
            PriceTier::Selling => self.selling_price,
            PriceTier::Mrp => self.mrp.unwrap_or_default(),
            PriceTier::Wholesale => self.wholesale_price.unwrap_or_default(),
        }
    }
}

// =============================================================================
// Party
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PartyKind {
    #[default]
    Customer,
    Vendor,
}

/// A postal address. Every component is optional free text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Address {
    pub line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Returns true when no component is set.
    pub fn is_empty(&self) -> bool {
        [&self.line, &self.city, &self.state, &self.postal_code, &self.country]
            .iter()
            .all(|part| part.as_deref().map(str::trim).unwrap_or("").is_empty())
    }

    /// Printable lines: street line, then "city, state postal", then country.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();

        if let Some(line) = non_blank(&self.line) {
            out.push(line.to_string());
        }

        let locality = [non_blank(&self.city), non_blank(&self.state)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        let locality = match non_blank(&self.postal_code) {
            Some(pin) if locality.is_empty() => pin.to_string(),
            Some(pin) => format!("{} {}", locality, pin),
            None => locality,
        };
        if !locality.is_empty() {
            out.push(locality);
        }

        if let Some(country) = non_blank(&self.country) {
            out.push(country.to_string());
        }

        out
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// A customer or vendor contact record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Party {
    pub id: String,
    pub kind: PartyKind,

    /// Contact name shown on documents.
    pub name: String,

    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,

    pub billing_address: Address,

    /// Shipping address. Printing falls back to billing when absent.
    pub shipping_address: Option<Address>,

    /// GSTIN or equivalent tax identifier.
    pub gstin: Option<String>,

    pub opening_balance: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Party {
    /// The address goods ship to.
    pub fn ship_to(&self) -> &Address {
        match &self.shipping_address {
            Some(addr) if !addr.is_empty() => addr,
            _ => &self.billing_address,
        }
    }

    /// Business name when set, otherwise the contact name.
    pub fn display_name(&self) -> &str {
        non_blank(&self.business_name).unwrap_or(&self.name)
    }
}

// =============================================================================
// Document Kind
// =============================================================================

/// Quotations and invoices are structurally identical; the kind decides
/// numbering prefix and print title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Quotation,
    Invoice,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "quotation",
            DocumentKind::Invoice => "invoice",
        }
    }

    /// Heading printed at the top of the document.
    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "QUOTATION",
            DocumentKind::Invoice => "TAX INVOICE",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quotation" | "quote" => Ok(DocumentKind::Quotation),
            "invoice" => Ok(DocumentKind::Invoice),
            other => Err(format!("unknown document kind: {}", other)),
        }
    }
}

// =============================================================================
// Document Line
// =============================================================================

/// A line of a composed or persisted document.
///
/// Uses the snapshot pattern: `item` is frozen at selection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentLine {
    /// Line row id (UUID v4). Regenerated whenever lines are copied.
    pub id: String,

    /// Display order, starting at 0.
    pub position: u32,

    pub item: ItemSnapshot,

    /// Tier the unit price was taken from.
    pub tier: PriceTier,

    pub unit_price: Money,

    /// Always >= 1.
    pub quantity: i64,

    /// `unit_price × quantity`.
    pub line_total: Money,
}

impl DocumentLine {
    /// Checks `line_total == unit_price × quantity`.
    pub fn is_consistent(&self) -> bool {
        self.quantity >= 1 && self.line_total == self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Document Header & Aggregate
// =============================================================================

/// A persisted quotation or invoice header.
///
/// `id`, `kind`, `number` and `sequence` never change after the first save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentHeader {
    pub id: String,
    pub kind: DocumentKind,

    /// Display number, e.g. `INV-0007`.
    pub number: String,

    /// Store-assigned sequence behind `number`.
    pub sequence: i64,

    #[ts(as = "String")]
    pub issue_date: NaiveDate,

    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,

    /// Non-owning reference to the party.
    pub party_id: String,

    pub terms: Option<String>,

    /// Inputs to the pricing pipeline, kept for edit mode.
    pub adjustments: Adjustments,

    /// Outputs of the pricing pipeline at save time.
    pub totals: PricingBreakdown,

    /// Set when this document was derived from another (invoice from quotation).
    pub source_document_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Header plus its ordered lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentAggregate {
    pub header: DocumentHeader,
    pub lines: Vec<DocumentLine>,
}

// =============================================================================
// Business Profile
// =============================================================================

/// The issuing business, printed in the document header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessProfile {
    pub name: String,

    #[serde(default)]
    pub address_lines: Vec<String>,

    #[serde(default)]
    pub gstin: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    /// Prefix for amounts in the totals block.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

impl Default for BusinessProfile {
    fn default() -> Self {
        BusinessProfile {
            name: "My Business".to_string(),
            address_lines: Vec::new(),
            gstin: None,
            phone: None,
            email: None,
            currency_symbol: default_currency_symbol(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
