//! # Document Numbering
//!
//! Formats display numbers (`INV-0001`) from store-assigned sequences.
//! The store guarantees sequence uniqueness; this module only formats.

use serde::{Deserialize, Serialize};

use crate::types::DocumentKind;

/// Prefix and padding rules for display numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberingScheme {
    pub quotation_prefix: String,
    pub invoice_prefix: String,
    /// Minimum digits; longer sequences are printed in full.
    pub width: usize,
}

impl Default for NumberingScheme {
    fn default() -> Self {
        NumberingScheme {
            quotation_prefix: "QT-".to_string(),
            invoice_prefix: "INV-".to_string(),
            width: 4,
        }
    }
}

impl NumberingScheme {
    pub fn prefix(&self, kind: DocumentKind) -> &str {
        match kind {
            DocumentKind::Quotation => &self.quotation_prefix,
            DocumentKind::Invoice => &self.invoice_prefix,
        }
    }

    /// Display number for the given kind and sequence.
    pub fn format(&self, kind: DocumentKind, sequence: i64) -> String {
        format_document_number(self.prefix(kind), sequence, self.width)
    }
}

/// `prefix + zero-padded(sequence, width)`.
pub fn format_document_number(prefix: &str, sequence: i64, width: usize) -> String {
    format!("{}{:0width$}", prefix, sequence, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scheme() {
        let scheme = NumberingScheme::default();
        assert_eq!(scheme.format(DocumentKind::Invoice, 1), "INV-0001");
        assert_eq!(scheme.format(DocumentKind::Quotation, 42), "QT-0042");
    }

    #[test]
    fn test_sequence_wider_than_padding() {
        assert_eq!(format_document_number("INV-", 123_456, 4), "INV-123456");
        assert_eq!(format_document_number("", 7, 0), "7");
    }
}
