//! # Document Composer
//!
//! Packages a priced cart and header fields into a [`DocumentDraft`], the
//! unpersisted form of a quotation or invoice.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Party ─────┐                                                           │
//! │  Dates ─────┤                                                           │
//! │  Terms ─────┼──► compose() ──► validate ──► snapshot lines ──► price    │
//! │  Cart ──────┤                                    │                      │
//! │  Adjust. ───┘                                    ▼                      │
//! │                                            DocumentDraft                │
//! │                                                                         │
//! │  Stored quotation ──► derive_from() ──► cart (same lines) ──► compose() │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Derived documents are always re-priced; stored totals are never copied.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::LineItemCart;
use crate::error::{CoreResult, ValidationError};
use crate::pricing::{price_cart, Adjustments, PricingBreakdown};
use crate::types::{DocumentAggregate, DocumentKind, DocumentLine, Party};
use crate::validation::validate_terms;

/// Issue and due dates for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFields {
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
}

impl DateFields {
    pub fn issued(issue_date: NaiveDate) -> Self {
        DateFields {
            issue_date,
            due_date: None,
        }
    }

    pub fn due(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// A composed document that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentDraft {
    pub kind: DocumentKind,
    pub party_id: String,

    #[ts(as = "String")]
    pub issue_date: NaiveDate,

    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,

    pub terms: Option<String>,
    pub adjustments: Adjustments,
    pub totals: PricingBreakdown,

    /// Document this one was derived from.
    pub source_document_id: Option<String>,

    pub lines: Vec<DocumentLine>,
}

/// Validates inputs, snapshots the cart and prices it once.
///
/// ## Errors
/// - `party required` when `party` is `None`
/// - `items required` when the cart is empty
/// - `due_date` when a new document is due before it is issued
pub fn compose(
    kind: DocumentKind,
    party: Option<&Party>,
    dates: DateFields,
    terms: Option<&str>,
    cart: &LineItemCart,
    adjustments: Adjustments,
) -> CoreResult<DocumentDraft> {
    let draft = assemble(kind, party, dates, terms, cart, adjustments)?;

    if let Some(due) = draft.due_date {
        if due < draft.issue_date {
            return Err(ValidationError::InvalidFormat {
                field: "due_date".to_string(),
                reason: "must not be before the issue date".to_string(),
            }
            .into());
        }
    }

    Ok(draft)
}

/// Builds a new draft of kind `target` from a stored document.
///
/// Lines keep item reference, tier, unit price and quantity but get new
/// ids. Terms, due date and adjustments are copied as stored (the source's
/// due date may already lie behind `issue_date`); totals are recomputed.
pub fn derive_from(
    source: &DocumentAggregate,
    target: DocumentKind,
    party: Option<&Party>,
    issue_date: NaiveDate,
) -> CoreResult<DocumentDraft> {
    let cart = LineItemCart::from_lines(&source.lines);
    let header = &source.header;

    let dates = DateFields {
        issue_date,
        due_date: header.due_date,
    };

    let mut draft = assemble(
        target,
        party,
        dates,
        header.terms.as_deref(),
        &cart,
        header.adjustments,
    )?;
    draft.source_document_id = Some(header.id.clone());
    Ok(draft)
}

fn assemble(
    kind: DocumentKind,
    party: Option<&Party>,
    dates: DateFields,
    terms: Option<&str>,
    cart: &LineItemCart,
    adjustments: Adjustments,
) -> CoreResult<DocumentDraft> {
    let party = party.ok_or_else(|| ValidationError::required("party"))?;

    if cart.is_empty() {
        return Err(ValidationError::required("items").into());
    }

    let terms = terms.map(str::trim).filter(|t| !t.is_empty());
    if let Some(text) = terms {
        validate_terms(text)?;
    }

    Ok(DocumentDraft {
        kind,
        party_id: party.id.clone(),
        issue_date: dates.issue_date,
        due_date: dates.due_date,
        terms: terms.map(str::to_string),
        adjustments,
        totals: price_cart(cart, &adjustments),
        source_document_id: None,
        lines: cart.to_document_lines(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
