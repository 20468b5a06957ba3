//! Domain models for `BillSight`.
//!
//! ## Submodules
//!
//! - [`category`] - The closed expense category set
//! - [`quality`] - Quality tiers, thresholds and the image self-assessment
//! - [`bill`] - Extracted bills and line items
//! - [`summary`] - Spending summaries and their reconciliation
//! - [`record`] - Final processing records and process outcomes

mod bill;
mod category;
mod de;
mod quality;
mod record;
mod summary;

pub use bill::{DEFAULT_CURRENCY, ExtractedBill, LineItem, UNKNOWN};
pub use category::Category;
pub use quality::{ConfidenceThresholds, QualityAssessment, QualityTier};
pub use record::{
    BillMetadata, ProcessOutcome, ProcessingRecord, Provenance, RecordMetadata,
    RecordQualityMetrics, Stage,
};
pub use summary::{Insights, QualityMetrics, SpendingSummary, SummaryResponse, SummaryResult};
