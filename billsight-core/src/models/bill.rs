//! Extracted bill data.
//!
//! Both types deserialize through loosely-typed raw structs so that the
//! defaults and invariants hold no matter what shape the model answered in:
//!
//! - missing merchant → `"Unknown"`
//! - missing category → [`Category::Uncategorized`]
//! - missing confidence → `0.0`, present confidence clamped to `[0, 1]`
//! - missing currency → `"USD"`
//! - missing total → sum of line item amounts

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::category::Category;
use super::de::{as_f64, as_string, clamp_unit};
use super::quality::QualityAssessment;

/// Placeholder for text fields the model left out.
pub const UNKNOWN: &str = "Unknown";

/// Currency assumed when the model does not report one.
pub const DEFAULT_CURRENCY: &str = "USD";

// ============================================================================
// Line Item
// ============================================================================

/// One itemized entry on a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawLineItem")]
pub struct LineItem {
    /// Item description as printed on the bill.
    pub description: String,
    /// Amount charged.
    pub amount: f64,
    /// Expense category.
    pub category: Category,
    /// Per-item confidence, in `[0, 1]`.
    pub confidence: f64,
}

impl LineItem {
    /// Creates a line item, clamping the confidence.
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        category: Category,
        confidence: f64,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            category,
            confidence: clamp_unit(confidence),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawLineItem {
    #[serde(default, alias = "item", alias = "name")]
    description: Option<Value>,
    #[serde(default, alias = "price")]
    amount: Option<Value>,
    #[serde(default)]
    category: Option<Value>,
    #[serde(default, alias = "confidence_score")]
    confidence: Option<Value>,
}

impl From<RawLineItem> for LineItem {
    fn from(raw: RawLineItem) -> Self {
        Self {
            description: raw.description.as_ref().and_then(as_string).unwrap_or_default(),
            amount: raw.amount.as_ref().and_then(as_f64).unwrap_or(0.0),
            category: raw
                .category
                .as_ref()
                .and_then(as_string)
                .map(|tag| Category::parse(&tag))
                .unwrap_or_default(),
            confidence: raw.confidence.as_ref().and_then(as_f64).map_or(0.0, clamp_unit),
        }
    }
}

// ============================================================================
// Extracted Bill
// ============================================================================

/// Normalized result of the extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawExtractedBill")]
pub struct ExtractedBill {
    /// Merchant or vendor name.
    pub merchant_name: String,
    /// Bill date, ideally `YYYY-MM-DD`. `None` when the model could not read it.
    pub bill_date: Option<String>,
    /// The model's quality self-assessment.
    pub quality_assessment: QualityAssessment,
    /// Line items in bill order.
    pub line_items: Vec<LineItem>,
    /// Bill total.
    pub total_amount: f64,
    /// ISO currency code.
    pub currency: String,
}

impl ExtractedBill {
    /// Returns the self-reported confidence score.
    pub fn confidence(&self) -> f64 {
        self.quality_assessment.confidence_score
    }

    /// Returns the bill date or the `"Unknown"` placeholder.
    pub fn bill_date_or_unknown(&self) -> &str {
        self.bill_date.as_deref().unwrap_or(UNKNOWN)
    }

    /// Sum of all line item amounts.
    pub fn items_total(&self) -> f64 {
        self.line_items.iter().map(|i| i.amount).sum()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawExtractedBill {
    #[serde(default, alias = "merchant", alias = "vendor")]
    merchant_name: Option<Value>,
    #[serde(default, alias = "date")]
    bill_date: Option<Value>,
    #[serde(default)]
    quality_assessment: Option<QualityAssessment>,
    #[serde(default, alias = "items", alias = "expenses")]
    line_items: Option<Vec<LineItem>>,
    #[serde(default, alias = "total")]
    total_amount: Option<Value>,
    #[serde(default)]
    currency: Option<Value>,
}

impl From<RawExtractedBill> for ExtractedBill {
    fn from(raw: RawExtractedBill) -> Self {
        let line_items = raw.line_items.unwrap_or_default();
        let total_amount = raw
            .total_amount
            .as_ref()
            .and_then(as_f64)
            .unwrap_or_else(|| line_items.iter().map(|i| i.amount).sum());

        Self {
            merchant_name: raw
                .merchant_name
                .as_ref()
                .and_then(as_string)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            bill_date: raw.bill_date.as_ref().and_then(as_string),
            quality_assessment: raw.quality_assessment.unwrap_or_default(),
            line_items,
            total_amount,
            currency: raw
                .currency
                .as_ref()
                .and_then(as_string)
                .map_or_else(|| DEFAULT_CURRENCY.to_string(), |c| c.to_ascii_uppercase()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
