//! # Print Renderer
//!
//! Read-side formatter for stored documents. Trusts the persisted totals
//! verbatim and never re-runs the pricing pipeline.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            TAX INVOICE                                  │
//! │  Business name / address / GSTIN                                        │
//! │  Invoice No: INV-0001                         Date: 01-04-2024          │
//! │                                               Due:  15-04-2024          │
//! │  Bill To                          │ Ship To                             │
//! │  ─────────────────────────────────────────────────────────────────────  │
//! │  #  Item          HSN      Qty     Rate     Amount                      │
//! │  ─────────────────────────────────────────────────────────────────────  │
//! │                                   Subtotal / Discount / Tax (18%)       │
//! │                                   Additional charge / Total             │
//! │  Terms                                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use crate::money::Money;
use crate::types::{
    Address, BusinessProfile, DocumentAggregate, DocumentHeader, DocumentKind, DocumentLine, Party,
};

const PAGE_WIDTH: usize = 78;
const DATE_FORMAT: &str = "%d-%m-%Y";

/// One row of the line-item table. Monetary cells carry two decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLine {
    pub index: usize,
    pub name: String,
    pub hsn_code: String,
    pub quantity: String,
    pub unit_price: String,
    pub total: String,
}

/// A labelled amount in the totals block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotalRow {
    pub label: String,
    pub amount: String,
}

/// A document laid out for printing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedDocument {
    pub title: String,
    pub number_label: String,
    pub number: String,
    pub issue_date: String,
    pub due_date: Option<String>,
    pub business: Vec<String>,
    pub bill_to: Vec<String>,
    pub ship_to: Vec<String>,
    pub lines: Vec<RenderedLine>,
    /// Subtotal, discount, tax (with rate), additional charge, total.
    pub totals: Vec<TotalRow>,
    pub terms: Option<String>,
}

/// Lays out a stored document.
pub fn render(
    header: &DocumentHeader,
    party: &Party,
    lines: &[DocumentLine],
    business: &BusinessProfile,
) -> RenderedDocument {
    let mut ordered: Vec<&DocumentLine> = lines.iter().collect();
    ordered.sort_by_key(|line| line.position);

    let symbol = business.currency_symbol.as_str();
    let amount = |value: Money| format!("{}{}", symbol, value);
    let totals = &header.totals;

    RenderedDocument {
        title: header.kind.title().to_string(),
        number_label: match header.kind {
            DocumentKind::Quotation => "Quotation No".to_string(),
            DocumentKind::Invoice => "Invoice No".to_string(),
        },
        number: header.number.clone(),
        issue_date: header.issue_date.format(DATE_FORMAT).to_string(),
        due_date: header
            .due_date
            .map(|due| due.format(DATE_FORMAT).to_string()),
        business: business_block(business),
        bill_to: party_block(party, &party.billing_address),
        ship_to: party_block(party, party.ship_to()),
        lines: ordered
            .iter()
            .enumerate()
            .map(|(i, line)| RenderedLine {
                index: i + 1,
                name: line.item.name.clone(),
                hsn_code: line.item.hsn_code.clone().unwrap_or_default(),
                quantity: format!("{} {}", line.quantity, line.item.unit),
                unit_price: line.unit_price.to_string(),
                total: line.line_total.to_string(),
            })
            .collect(),
        totals: vec![
            TotalRow {
                label: "Subtotal".to_string(),
                amount: amount(totals.subtotal),
            },
            TotalRow {
                label: "Discount".to_string(),
                amount: amount(totals.discount),
            },
            TotalRow {
                label: format!("Tax ({}%)", totals.tax_rate.display_percentage()),
                amount: amount(totals.tax_amount),
            },
            TotalRow {
                label: "Additional charge".to_string(),
                amount: amount(totals.additional_charge),
            },
            TotalRow {
                label: "Total".to_string(),
                amount: amount(totals.total),
            },
        ],
        terms: header.terms.clone().filter(|t| !t.trim().is_empty()),
    }
}

/// Lays out a loaded aggregate.
pub fn render_aggregate(
    document: &DocumentAggregate,
    party: &Party,
    business: &BusinessProfile,
) -> RenderedDocument {
    render(&document.header, party, &document.lines, business)
}

fn business_block(business: &BusinessProfile) -> Vec<String> {
    let mut out = vec![business.name.clone()];
    out.extend(business.address_lines.iter().cloned());
    if let Some(gstin) = &business.gstin {
        out.push(format!("GSTIN: {}", gstin));
    }
    let contact: Vec<&str> = [business.phone.as_deref(), business.email.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !contact.is_empty() {
        out.push(contact.join(" | "));
    }
    out
}

fn party_block(party: &Party, address: &Address) -> Vec<String> {
    let mut out = vec![party.display_name().to_string()];
    if party.display_name() != party.name {
        out.push(format!("Attn: {}", party.name));
    }
    out.extend(address.lines());
    if let Some(phone) = &party.phone {
        out.push(format!("Ph: {}", phone));
    }
    if let Some(gstin) = &party.gstin {
        out.push(format!("GSTIN: {}", gstin));
    }
    out
}

impl RenderedDocument {
    /// Plain-text page, fixed width.
    pub fn to_text(&self) -> String {
        let rule = "-".repeat(PAGE_WIDTH);
        let mut out = Vec::new();

        out.push(format!("{:^width$}", self.title, width = PAGE_WIDTH));
        out.push(String::new());
        out.extend(self.business.iter().cloned());
        out.push(rule.clone());

        out.push(two_columns(
            &format!("{}: {}", self.number_label, self.number),
            &format!("Date: {}", self.issue_date),
        ));
        if let Some(due) = &self.due_date {
            out.push(two_columns("", &format!("Due:  {}", due)));
        }
        out.push(rule.clone());

        let half = PAGE_WIDTH / 2 - 2;
        out.push(format!("{:<half$} | {}", "Bill To", "Ship To", half = half));
        let rows = self.bill_to.len().max(self.ship_to.len());
        for i in 0..rows {
            let left = self.bill_to.get(i).map(String::as_str).unwrap_or("");
            let right = self.ship_to.get(i).map(String::as_str).unwrap_or("");
            out.push(format!("{:<half$} | {}", left, right, half = half));
        }
        out.push(rule.clone());

        out.push(format!(
            "{:>3}  {:<28} {:<9} {:>10} {:>10} {:>12}",
            "#", "Item", "HSN", "Qty", "Rate", "Amount"
        ));
        out.push(rule.clone());
        for line in &self.lines {
            out.push(format!(
                "{:>3}  {:<28} {:<9} {:>10} {:>10} {:>12}",
                line.index, line.name, line.hsn_code, line.quantity, line.unit_price, line.total
            ));
        }
        out.push(rule.clone());

        for row in &self.totals {
            out.push(format!("{:>60} {:>17}", row.label, row.amount));
        }

        if let Some(terms) = &self.terms {
            out.push(rule);
            out.push("Terms & Conditions".to_string());
            out.extend(terms.lines().map(str::to_string));
        }

        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

fn two_columns(left: &str, right: &str) -> String {
    let right_width = 24;
    let left_width = PAGE_WIDTH - right_width;
    format!("{:<lw$}{:<rw$}", left, right, lw = left_width, rw = right_width)
        .trim_end()
        .to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{Adjustments, PricingBreakdown};
    use crate::types::{ItemSnapshot, PartyKind, PriceTier, Rate};
    use chrono::{NaiveDate, Utc};

    fn header(totals: PricingBreakdown) -> DocumentHeader {
        DocumentHeader {
            id: "doc-1".to_string(),
            kind: DocumentKind::Invoice,
            number: "INV-0007".to_string(),
            sequence: 7,
            issue_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 4, 15),
            party_id: "party-1".to_string(),
            terms: Some("Goods once sold will not be taken back.".to_string()),
            adjustments: Adjustments::default(),
            totals,
            source_document_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn party() -> Party {
        Party {
            id: "party-1".to_string(),
            kind: PartyKind::Customer,
            name: "Ravi Kumar".to_string(),
            business_name: Some("Kumar Hardware".to_string()),
            phone: Some("98200 00000".to_string()),
            email: None,
            billing_address: Address {
                line: Some("14 Station Road".to_string()),
                city: Some("Nashik".to_string()),
                state: None,
                postal_code: Some("422001".to_string()),
                country: None,
            },
            shipping_address: Some(Address {
                line: Some("Plot 9 MIDC".to_string()),
                city: Some("Sinnar".to_string()),
                ..Address::default()
            }),
            gstin: Some("27ABCDE1234F1Z5".to_string()),
            opening_balance: Money::zero(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(position: u32, name: &str, price: i64, qty: i64) -> DocumentLine {
        DocumentLine {
            id: format!("line-{}", position),
            position,
            item: ItemSnapshot {
                item_id: name.to_lowercase(),
                name: name.to_string(),
                unit: "pcs".to_string(),
                hsn_code: Some("7318".to_string()),
                tax_rate: Rate::from_bps(1800),
                selling_price: Money::from_minor(price),
                mrp: None,
                wholesale_price: None,
            },
            tier: PriceTier::Selling,
            unit_price: Money::from_minor(price),
            quantity: qty,
            line_total: Money::from_minor(price * qty),
        }
    }

    fn totals() -> PricingBreakdown {
        PricingBreakdown {
            subtotal: Money::from_minor(25_000),
            discount: Money::from_minor(2_500),
            taxable_amount: Money::from_minor(22_500),
            tax_rate: Rate::from_bps(1800),
            tax_amount: Money::from_minor(4_050),
            additional_charge: Money::zero(),
            total: Money::from_minor(26_550),
            round_off: false,
        }
    }

    #[test]
    fn test_render_fields() {
        let lines = vec![line(1, "Washer", 5_000, 1), line(0, "Bolt", 10_000, 2)];
        let doc = render(&header(totals()), &party(), &lines, &BusinessProfile::default());

        assert_eq!(doc.title, "TAX INVOICE");
        assert_eq!(doc.number, "INV-0007");
        assert_eq!(doc.issue_date, "01-04-2024");
        assert_eq!(doc.due_date.as_deref(), Some("15-04-2024"));

        // Ordered by position, indexed from 1
        assert_eq!(doc.lines[0].index, 1);
        assert_eq!(doc.lines[0].name, "Bolt");
        assert_eq!(doc.lines[0].unit_price, "100.00");
        assert_eq!(doc.lines[0].total, "200.00");
        assert_eq!(doc.lines[1].total, "50.00");
    }

    #[test]
    fn test_totals_block_order_and_rate() {
        let doc = render(&header(totals()), &party(), &[], &BusinessProfile::default());
        let labels: Vec<_> = doc.totals.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Subtotal", "Discount", "Tax (18%)", "Additional charge", "Total"]
        );
        assert_eq!(doc.totals[2].amount, "₹40.50");
        assert_eq!(doc.totals[4].amount, "₹265.50");
    }

    #[test]
    fn test_trusts_stored_totals() {
        let mut stored = totals();
        stored.total = Money::from_minor(99_999);
        let lines = vec![line(0, "Bolt", 10_000, 2)];
        let doc = render(&header(stored), &party(), &lines, &BusinessProfile::default());
        assert_eq!(doc.totals[4].amount, "₹999.99");
    }

    #[test]
    fn test_address_blocks() {
        let doc = render(&header(totals()), &party(), &[], &BusinessProfile::default());
        assert_eq!(doc.bill_to[0], "Kumar Hardware");
        assert_eq!(doc.bill_to[1], "Attn: Ravi Kumar");
        assert!(doc.bill_to.contains(&"Nashik 422001".to_string()));
        assert!(doc.ship_to.contains(&"Plot 9 MIDC".to_string()));

        let mut no_ship = party();
        no_ship.shipping_address = None;
        let doc = render(&header(totals()), &no_ship, &[], &BusinessProfile::default());
        assert_eq!(doc.bill_to, doc.ship_to);
    }

    #[test]
    fn test_to_text_layout() {
        let business = BusinessProfile {
            name: "Shree Traders".to_string(),
            gstin: Some("27AAAAA0000A1Z5".to_string()),
            currency_symbol: "Rs.".to_string(),
            ..BusinessProfile::default()
        };
        let lines = vec![line(0, "Bolt", 10_000, 2)];
        let text = render(&header(totals()), &party(), &lines, &business).to_text();

        assert!(text.contains("TAX INVOICE"));
        assert!(text.contains("Invoice No: INV-0007"));
        assert!(text.contains("GSTIN: 27AAAAA0000A1Z5"));
        assert!(text.contains("Rs.265.50"));
        assert!(text.contains("Terms & Conditions"));

        let subtotal = text.find("Subtotal").unwrap();
        let discount = text.find("Discount").unwrap();
        let tax = text.find("Tax (18%)").unwrap();
        let total = text.rfind("Total").unwrap();
        assert!(subtotal < discount && discount < tax && tax < total);
    }
}
