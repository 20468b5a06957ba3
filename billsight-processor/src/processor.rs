//! The bill processing workflow.
//!
//! A run moves through preparation, extraction, the quality gate, summary
//! generation and persistence, stopping at the first failure. Whatever
//! happens, [`BillProcessor::process`] returns a [`ProcessOutcome`].

use billsight_core::{
    ConfidenceThresholds, ExtractedBill, LineItem, ProcessOutcome, ProcessingRecord, Provenance,
    Stage, SummaryResponse, SummaryResult, extract_as,
};
use billsight_fetch::{CallResult, ModelManager, ModelRequest};
use billsight_store::{BillRepository, NewBill};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::error::ProcessError;
use crate::image_prep::ImagePreparer;
use crate::prompts::{extraction_prompt, summary_prompt};

/// A successful model call that produced a decoded value.
struct Answered<T> {
    value: T,
    model: String,
    fallback_used: bool,
    elapsed: Duration,
}

/// Coordinates one bill through every stage.
pub struct BillProcessor {
    manager: ModelManager,
    preparer: Arc<dyn ImagePreparer>,
    repository: Arc<dyn BillRepository>,
    thresholds: ConfidenceThresholds,
}

impl BillProcessor {
    /// Creates a processor with default thresholds.
    pub fn new(
        manager: ModelManager,
        preparer: Arc<dyn ImagePreparer>,
        repository: Arc<dyn BillRepository>,
    ) -> Self {
        Self {
            manager,
            preparer,
            repository,
            thresholds: ConfidenceThresholds::default(),
        }
    }

    /// Sets the quality thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Returns the quality thresholds in use.
    pub fn thresholds(&self) -> &ConfidenceThresholds {
        &self.thresholds
    }

    /// Processes the bill image at `path`.
    ///
    /// Never fails: stage errors and panics alike are reported through the
    /// returned outcome.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn process(&self, path: &Path) -> ProcessOutcome {
        match AssertUnwindSafe(self.run(path)).catch_unwind().await {
            Ok(Ok(record)) => {
                info!(
                    bill_id = record.bill_metadata.bill_id,
                    items = record.metadata.total_items,
                    "Processing complete"
                );
                ProcessOutcome::completed(record)
            }
            Ok(Err(e)) => {
                warn!(stage = %e.stage(), error = %e, "Processing stopped");
                e.into_outcome()
            }
            Err(panic) => {
                let e = ProcessError::Internal(panic_message(panic.as_ref()));
                warn!(error = %e, "Processing panicked");
                e.into_outcome()
            }
        }
    }

    /// Runs every stage, returning the first error.
    ///
    /// # Errors
    ///
    /// Returns the [`ProcessError`] of the stage that failed.
    pub async fn run(&self, path: &Path) -> Result<ProcessingRecord, ProcessError> {
        info!("Preparing image");
        let prepared = self.preparer.prepare(path).await?;

        info!("Extracting bill");
        let request = ModelRequest::vision(prepared.into_payload(), extraction_prompt());
        let extraction = self
            .call::<ExtractedBill>(&request, Stage::VlmExtraction)
            .await?;
        let bill = extraction.value;

        let score = bill.confidence();
        if !self.thresholds.passes(score) {
            info!(score, minimum = self.thresholds.minimum, "Rejected by quality gate");
            return Err(ProcessError::QualityRejected {
                score,
                assessment: bill.quality_assessment,
            });
        }

        info!("Generating summary");
        let request = ModelRequest::text(summary_prompt(&bill.line_items));
        let summary = self
            .call::<SummaryResponse>(&request, Stage::SummaryGeneration)
            .await?;
        let summary_result: SummaryResult =
            summary.value.reconcile(&bill.line_items, &self.thresholds);

        let provenance_elapsed = extraction.elapsed + summary.elapsed;
        let new_bill = NewBill {
            merchant_name: bill.merchant_name.clone(),
            bill_date: bill
                .bill_date
                .clone()
                .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string()),
            total_amount: bill.total_amount,
            currency: bill.currency.clone(),
            image_path: Some(path.display().to_string()),
            quality_score: Some(score),
            confidence_score: score,
            model_used: extraction.model.clone(),
            fallback_used: extraction.fallback_used || summary.fallback_used,
            processing_time_secs: provenance_elapsed.as_secs_f64(),
        };

        info!("Saving bill");
        let bill_id = self.persist(new_bill, bill.line_items.clone()).await?;

        let provenance = Provenance {
            bill_id,
            extraction_model: extraction.model,
            extraction_fallback: extraction.fallback_used,
            extraction_elapsed: extraction.elapsed,
            summary_model: summary.model,
            summary_fallback: summary.fallback_used,
            summary_elapsed: summary.elapsed,
        };

        Ok(ProcessingRecord::assemble(
            bill,
            summary_result,
            provenance,
            Utc::now(),
        ))
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        request: &ModelRequest,
        stage: Stage,
    ) -> Result<Answered<T>, ProcessError> {
        let result = self.manager.call_with_fallback(request).await;
        let CallResult {
            text,
            error,
            model_used,
            fallback_used,
            elapsed,
            ..
        } = result;

        let Some(text) = text else {
            return Err(ProcessError::ModelCall {
                stage,
                message: error.unwrap_or_else(|| "model call failed".to_string()),
            });
        };

        let value = extract_as::<T>(&text).map_err(|source| ProcessError::Parse { stage, source })?;

        Ok(Answered {
            value,
            model: model_used.unwrap_or_else(|| self.manager.primary_name().to_string()),
            fallback_used,
            elapsed,
        })
    }

    async fn persist(&self, bill: NewBill, items: Vec<LineItem>) -> Result<i64, ProcessError> {
        let repository = Arc::clone(&self.repository);
        let (bill_id, _) =
            tokio::task::spawn_blocking(move || repository.save_bill_with_items(&bill, &items))
                .await
                .map_err(|e| ProcessError::Internal(format!("persistence task failed: {e}")))??;
        Ok(bill_id)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic".to_string()
    }
}
