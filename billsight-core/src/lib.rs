// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `BillSight` Core
//!
//! Core types and pure logic shared by all other `BillSight` crates:
//!
//! - Domain models (bills, line items, summaries, processing records)
//! - The response extractor that recovers JSON from model replies
//! - Error types
//! - CSV export
//!
//! ## Key Types
//!
//! ### Extraction
//! - [`ExtractedBill`] - Normalized result of the vision call
//! - [`LineItem`] - One itemized entry
//! - [`Category`] - Closed expense category set
//! - [`QualityAssessment`] - The model's view of the image
//!
//! ### Summary
//! - [`SummaryResult`] - Totals, insights and quality metrics
//! - [`SummaryResponse`] - Model summary before reconciliation
//!
//! ### Output
//! - [`ProcessingRecord`] - Artifact of a successful run
//! - [`ProcessOutcome`] - Result of the process entry point
//! - [`Stage`] - Where a failed run stopped

pub mod error;
pub mod export;
pub mod extract;
pub mod models;

pub use error::{CoreError, ParseError};
pub use export::{CSV_HEADER, line_items_to_csv};
pub use extract::{extract, extract_as};

pub use models::{
    // Extraction
    Category,
    ConfidenceThresholds,
    DEFAULT_CURRENCY,
    ExtractedBill,
    LineItem,
    QualityAssessment,
    QualityTier,
    UNKNOWN,
    // Summary
    Insights,
    QualityMetrics,
    SpendingSummary,
    SummaryResponse,
    SummaryResult,
    // Output
    BillMetadata,
    ProcessOutcome,
    ProcessingRecord,
    Provenance,
    RecordMetadata,
    RecordQualityMetrics,
    Stage,
};
