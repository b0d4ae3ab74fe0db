//! # Line-Item Cart
//!
//! The in-progress line set of a quotation or invoice.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Pick item ──────────► add(item, tier) ────────► push line, qty = 1     │
//! │                                                                         │
//! │  Change quantity ────► set_quantity(id, n) ────► qty = max(n, 1)        │
//! │                                                                         │
//! │  Change tier ────────► set_price_tier(id, t) ──► price from snapshot    │
//! │                                                                         │
//! │  Remove ─────────────► remove(id) ─────────────► other ids unchanged    │
//! │                                                                         │
//! │  Every mutation recomputes the touched line's total on the spot.        │
//! │  subtotal() always sums the current lines; nothing is cached.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Identity
//! Line ids come from a per-cart counter and are never reused, so removing a
//! line never renumbers the others.

use serde::Serialize;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CatalogItem, DocumentLine, ItemSnapshot, PriceTier};
use crate::validation::clamp_quantity;

/// Identity of a line within one cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LineId(u32);

impl LineId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        LineId(raw)
    }

    #[inline]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A line in the cart.
///
/// Fields are private so `total` can never drift from `unit_price × quantity`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    id: LineId,
    item: ItemSnapshot,
    tier: PriceTier,
    unit_price: Money,
    quantity: i64,
    total: Money,
}

impl CartLine {
    fn new(id: LineId, item: ItemSnapshot, tier: PriceTier) -> Self {
        let unit_price = item.price_for(tier);
        CartLine::restored(id, item, tier, unit_price, 1)
    }

    fn restored(
        id: LineId,
        item: ItemSnapshot,
        tier: PriceTier,
        unit_price: Money,
        quantity: i64,
    ) -> Self {
        let quantity = clamp_quantity(quantity);
        CartLine {
            id,
            item,
            tier,
            unit_price,
            quantity,
            total: unit_price.multiply_quantity(quantity),
        }
    }

    fn recompute(&mut self) {
        self.total = self.unit_price.multiply_quantity(self.quantity);
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    pub fn item(&self) -> &ItemSnapshot {
        &self.item
    }

    pub fn tier(&self) -> PriceTier {
        self.tier
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn total(&self) -> Money {
        self.total
    }
}

/// Ordered collection of document lines.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LineItemCart {
    lines: Vec<CartLine>,
    #[serde(skip)]
    next_id: u32,
}

impl LineItemCart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a cart from stored lines.
    ///
    /// Item snapshot, tier, unit price and quantity are preserved; line
    /// identity is regenerated.
    pub fn from_lines(lines: &[DocumentLine]) -> Self {
        let mut ordered: Vec<&DocumentLine> = lines.iter().collect();
        ordered.sort_by_key(|line| line.position);

        let mut cart = LineItemCart::new();
        for line in ordered {
            let id = cart.allocate_id();
            cart.lines.push(CartLine::restored(
                id,
                line.item.clone(),
                line.tier,
                line.unit_price,
                line.quantity,
            ));
        }
        cart
    }

    fn allocate_id(&mut self) -> LineId {
        self.next_id += 1;
        LineId(self.next_id)
    }

    fn line_mut(&mut self, id: LineId) -> CoreResult<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.id == id)
            .ok_or(CoreError::LineNotFound(id.get()))
    }

    /// Appends a line for `item` at `tier` with quantity 1.
    ///
    /// Returns `None` and leaves the cart untouched when `item` is `None`.
    pub fn add(&mut self, item: Option<&CatalogItem>, tier: PriceTier) -> Option<LineId> {
        let item = item?;
        Some(self.add_snapshot(item.snapshot(), tier))
    }

    /// Appends a line for an already-frozen snapshot.
    pub fn add_snapshot(&mut self, item: ItemSnapshot, tier: PriceTier) -> LineId {
        let id = self.allocate_id();
        self.lines.push(CartLine::new(id, item, tier));
        id
    }

    /// Sets a line's quantity. Values below 1 are clamped to 1.
    pub fn set_quantity(&mut self, id: LineId, qty: i64) -> CoreResult<()> {
        let line = self.line_mut(id)?;
        line.quantity = clamp_quantity(qty);
        line.recompute();
        Ok(())
    }

    /// Switches a line to another tier, re-reading the price from its snapshot.
    pub fn set_price_tier(&mut self, id: LineId, tier: PriceTier) -> CoreResult<()> {
        let line = self.line_mut(id)?;
        line.tier = tier;
        line.unit_price = line.item.price_for(tier);
        line.recompute();
        Ok(())
    }

    /// Removes a line. Other line ids are unchanged.
    pub fn remove(&mut self, id: LineId) -> CoreResult<CartLine> {
        let index = self
            .lines
            .iter()
            .position(|line| line.id == id)
            .ok_or(CoreError::LineNotFound(id.get()))?;
        Ok(self.lines.remove(index))
    }

    /// Sum of line totals. Zero for an empty cart.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::total).sum()
    }

    /// Removes every line. Ids keep counting up.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, id: LineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the total quantity of all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(CartLine::quantity).sum()
    }

    /// Freezes the cart into document lines with fresh row ids.
    pub fn to_document_lines(&self) -> Vec<DocumentLine> {
        self.lines
            .iter()
            .enumerate()
            .map(|(position, line)| DocumentLine {
                id: Uuid::new_v4().to_string(),
                position: position as u32,
                item: line.item.clone(),
                tier: line.tier,
                unit_price: line.unit_price,
                quantity: line.quantity,
                line_total: line.total,
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
