//! Final processing artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::bill::{ExtractedBill, LineItem};
use super::quality::{QualityAssessment, QualityTier};
use super::summary::{Insights, QualityMetrics, SpendingSummary, SummaryResult};

// ============================================================================
// Stage
// ============================================================================

/// Workflow stage that a failed run stopped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Image validation and normalization.
    Preparation,
    /// Vision model extraction call.
    VlmExtraction,
    /// Confidence gate.
    QualityCheck,
    /// Text model summary call.
    SummaryGeneration,
    /// Database writes.
    Persistence,
    /// Anything that escaped the other stages.
    Unknown,
}

impl Stage {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preparation => "preparation",
            Self::VlmExtraction => "vlm_extraction",
            Self::QualityCheck => "quality_check",
            Self::SummaryGeneration => "summary_generation",
            Self::Persistence => "persistence",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Processing Record
// ============================================================================

/// Header describing the stored bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillMetadata {
    /// Database id of the stored bill.
    pub bill_id: i64,
    /// Merchant name.
    pub merchant_name: String,
    /// Bill date, or `"Unknown"`.
    pub bill_date: String,
    /// When the run completed.
    pub processing_timestamp: DateTime<Utc>,
    /// Self-reported image quality tier.
    pub image_quality: QualityTier,
    /// Self-reported extraction confidence.
    pub overall_confidence: f64,
    /// Provider that answered the extraction call.
    pub model_used: String,
    /// True if any call fell back.
    pub fallback_used: bool,
}

/// Summary metrics plus the image self-assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordQualityMetrics {
    /// Confidence statistics from the summary.
    #[serde(flatten)]
    pub metrics: QualityMetrics,
    /// The model's assessment of the image.
    pub image_quality_assessment: QualityAssessment,
}

/// Run-level provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Cumulative elapsed time of the model calls.
    pub processing_time_seconds: f64,
    /// Provider that answered the extraction call.
    pub model_used: String,
    /// True if any call fell back.
    pub fallback_used: bool,
    /// Number of line items.
    pub total_items: usize,
    /// Provider that answered the extraction call.
    pub extraction_model: String,
    /// Provider that answered the summary call.
    pub summary_model: String,
}

/// The artifact produced by a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRecord {
    /// Bill header.
    pub bill_metadata: BillMetadata,
    /// Extracted line items.
    pub expenses: Vec<LineItem>,
    /// Spending totals.
    pub summary: SpendingSummary,
    /// Narrative insights.
    pub insights: Insights,
    /// Quality statistics.
    pub quality_metrics: RecordQualityMetrics,
    /// Run provenance.
    pub metadata: RecordMetadata,
}

/// Which model answered each call, and how long the calls took.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    /// Database id of the stored bill.
    pub bill_id: i64,
    /// Provider that answered the extraction call.
    pub extraction_model: String,
    /// Extraction call fell back.
    pub extraction_fallback: bool,
    /// Extraction call duration.
    pub extraction_elapsed: Duration,
    /// Provider that answered the summary call.
    pub summary_model: String,
    /// Summary call fell back.
    pub summary_fallback: bool,
    /// Summary call duration.
    pub summary_elapsed: Duration,
}

impl Provenance {
    /// True if either call was answered by the fallback provider.
    pub fn fallback_used(&self) -> bool {
        self.extraction_fallback || self.summary_fallback
    }

    /// Cumulative elapsed time of both model calls.
    pub fn total_elapsed(&self) -> Duration {
        self.extraction_elapsed + self.summary_elapsed
    }
}

impl ProcessingRecord {
    /// Assembles the final record from the stage results.
    ///
    /// `model_used` reports the extraction model; `fallback_used` is set if
    /// any call fell back.
    pub fn assemble(
        bill: ExtractedBill,
        summary: SummaryResult,
        provenance: Provenance,
        processed_at: DateTime<Utc>,
    ) -> Self {
        let fallback_used = provenance.fallback_used();
        let seconds = (provenance.total_elapsed().as_secs_f64() * 1000.0).round() / 1000.0;
        let total_items = bill.line_items.len();

        Self {
            bill_metadata: BillMetadata {
                bill_id: provenance.bill_id,
                bill_date: bill.bill_date_or_unknown().to_string(),
                merchant_name: bill.merchant_name,
                processing_timestamp: processed_at,
                image_quality: bill.quality_assessment.overall_quality,
                overall_confidence: bill.quality_assessment.confidence_score,
                model_used: provenance.extraction_model.clone(),
                fallback_used,
            },
            expenses: bill.line_items,
            summary: summary.summary,
            insights: summary.insights,
            quality_metrics: RecordQualityMetrics {
                metrics: summary.quality_metrics,
                image_quality_assessment: bill.quality_assessment,
            },
            metadata: RecordMetadata {
                processing_time_seconds: seconds,
                model_used: provenance.extraction_model.clone(),
                fallback_used,
                total_items,
                extraction_model: provenance.extraction_model,
                summary_model: provenance.summary_model,
            },
        }
    }
}

// ============================================================================
// Process Outcome
// ============================================================================

/// Result of the process entry point.
///
/// On success `data` and `bill_id` are set. On failure `error` and `stage`
/// are set; a quality rejection also carries `quality_score` and the
/// assessment as `details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    /// True if the run completed.
    pub success: bool,
    /// The record, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ProcessingRecord>,
    /// Stored bill id, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_id: Option<i64>,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stage the run stopped at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// Confidence that failed the gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    /// Assessment that failed the gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<QualityAssessment>,
}

impl ProcessOutcome {
    /// Successful run.
    pub fn completed(record: ProcessingRecord) -> Self {
        Self {
            success: true,
            bill_id: Some(record.bill_metadata.bill_id),
            data: Some(record),
            error: None,
            stage: None,
            quality_score: None,
            details: None,
        }
    }

    /// Run that failed at `stage`.
    pub fn failed(stage: Stage, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            bill_id: None,
            error: Some(error.into()),
            stage: Some(stage),
            quality_score: None,
            details: None,
        }
    }

    /// Run stopped by the quality gate.
    pub fn rejected(score: f64, assessment: QualityAssessment, message: impl Into<String>) -> Self {
        Self {
            quality_score: Some(score),
            details: Some(assessment),
            ..Self::failed(Stage::QualityCheck, message)
        }
    }

    /// True if the run was stopped by the quality gate.
    pub fn is_rejected(&self) -> bool {
        self.stage == Some(Stage::QualityCheck)
    }
}

// ============================================================================
// Tests
// ============================================================================
