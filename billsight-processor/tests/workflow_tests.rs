//! End-to-end workflow tests with mocked models, image preparation and
//! persistence.

use async_trait::async_trait;
use billsight_core::{Category, LineItem, QualityTier, Stage};
use billsight_fetch::{
    CallKind, ModelManager, ModelRequest, ProviderError, ProviderErrorKind, VisionModel,
};
use billsight_processor::{
    BillProcessor, ImageMetadata, ImagePreparer, LOW_QUALITY_MESSAGE, PreparedImage, ProcessError,
};
use billsight_store::{BillRepository, BillStore, NewBill, StoreError};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mocks
// ============================================================================

/// Replies from a queue; an empty queue fails with `Unknown`.
struct ScriptedModel {
    name: String,
    replies: Mutex<VecDeque<Result<String, ProviderErrorKind>>>,
    seen: Mutex<Vec<CallKind>>,
}

impl ScriptedModel {
    fn new(name: &str, replies: Vec<Result<&str, ProviderErrorKind>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            replies: Mutex::new(replies.into_iter().map(|r| r.map(str::to_string)).collect()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn always_failing(name: &str, kind: ProviderErrorKind) -> Arc<Self> {
        Self::new(name, vec![Err(kind); 4])
    }

    fn seen(&self) -> Vec<CallKind> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionModel for ScriptedModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, request: &ModelRequest) -> Result<String, ProviderError> {
        self.seen.lock().unwrap().push(request.kind);
        if request.kind == CallKind::Vision {
            assert!(request.image.is_some(), "vision call without image");
        }
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(kind)) => Err(ProviderError::new(kind, self.name.clone(), "scripted failure")),
            None => Err(ProviderError::unknown(self.name.clone(), "no scripted reply")),
        }
    }
}

enum PrepBehavior {
    Ok,
    Invalid,
    Panic,
}

struct FakePreparer(PrepBehavior);

#[async_trait]
impl ImagePreparer for FakePreparer {
    async fn prepare(&self, path: &Path) -> Result<PreparedImage, ProcessError> {
        match self.0 {
            PrepBehavior::Ok => Ok(PreparedImage {
                path: path.to_path_buf(),
                bytes: vec![0xff, 0xd8, 0xff],
                format: "jpeg".to_string(),
                metadata: ImageMetadata {
                    original_path: path.to_path_buf(),
                    validation_passed: true,
                    converted_from_pdf: false,
                    preprocessed: false,
                    image_info: None,
                },
            }),
            PrepBehavior::Invalid => {
                Err(ProcessError::Validation("File does not exist".to_string()))
            }
            PrepBehavior::Panic => panic!("decoder exploded"),
        }
    }
}

/// Records writes; optionally refuses them.
#[derive(Default)]
struct RecordingRepository {
    bills: Mutex<Vec<NewBill>>,
    items: Mutex<Vec<(i64, Vec<LineItem>)>>,
    fail: bool,
}

impl RecordingRepository {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn bill_count(&self) -> usize {
        self.bills.lock().unwrap().len()
    }

    fn item_calls(&self) -> usize {
        self.items.lock().unwrap().len()
    }
}

impl BillRepository for RecordingRepository {
    fn save_bill(&self, bill: &NewBill) -> Result<i64, StoreError> {
        if self.fail {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        let mut bills = self.bills.lock().unwrap();
        bills.push(bill.clone());
        Ok(i64::try_from(bills.len()).unwrap())
    }

    fn save_line_items(&self, bill_id: i64, items: &[LineItem]) -> Result<Vec<i64>, StoreError> {
        self.items.lock().unwrap().push((bill_id, items.to_vec()));
        Ok((1..=i64::try_from(items.len()).unwrap()).collect())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

const ACME_EXTRACTION: &str = r#"{"merchant_name":"Acme","bill_date":"2024-01-05","quality_assessment":{"is_clear":true,"is_complete":true,"overall_quality":"excellent","confidence_score":0.9,"issues":[]},"line_items":[{"description":"Milk","amount":3.5,"category":"groceries","confidence":0.95}],"total_amount":3.5,"currency":"USD"}"#;

const ACME_SUMMARY: &str = r#"Here is the analysis:
```json
{
  "summary": {
    "total_amount": 3.5,
    "item_count": 1,
    "category_breakdown": {"groceries": 3.5, "dining": 0.0},
    "category_percentages": {"groceries": 100.0},
    "highest_spending_category": "groceries"
  },
  "insights": {
    "primary_insight": "Groceries account for 100% of total spending",
    "spending_patterns": ["Single grocery purchase"]
  }
}
```"#;

const LOW_CONFIDENCE_EXTRACTION: &str = r#"{"merchant_name":"Blurry Mart","quality_assessment":{"is_clear":false,"is_complete":false,"overall_quality":"poor","confidence_score":0.3,"issues":["blurred text"]},"line_items":[]}"#;

fn receipt() -> PathBuf {
    PathBuf::from("receipt.jpg")
}

fn processor(
    manager: ModelManager,
    prep: PrepBehavior,
    repository: Arc<dyn BillRepository>,
) -> BillProcessor {
    BillProcessor::new(manager, Arc::new(FakePreparer(prep)), repository)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_acme_end_to_end() {
    let primary = ScriptedModel::new("primary", vec![Ok(ACME_EXTRACTION), Ok(ACME_SUMMARY)]);
    let store = Arc::new(BillStore::open_in_memory().unwrap());
    let manager = ModelManager::new(primary.clone(), None);

    let outcome = processor(manager, PrepBehavior::Ok, store.clone())
        .process(&receipt())
        .await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.bill_id, Some(1));
    assert_eq!(primary.seen(), vec![CallKind::Vision, CallKind::Text]);

    let record = outcome.data.unwrap();
    assert_eq!(record.bill_metadata.bill_id, 1);
    assert_eq!(record.bill_metadata.merchant_name, "Acme");
    assert_eq!(record.bill_metadata.bill_date, "2024-01-05");
    assert_eq!(record.bill_metadata.model_used, "primary");
    assert!(!record.bill_metadata.fallback_used);
    assert!((record.summary.total_amount - 3.5).abs() < 1e-9);
    assert_eq!(record.summary.highest_spending_category, Some(Category::Groceries));
    assert_eq!(record.metadata.total_items, 1);
    assert_eq!(record.metadata.extraction_model, "primary");
    assert_eq!(record.metadata.summary_model, "primary");
    assert_eq!(record.quality_metrics.metrics.items_with_high_confidence, 1);
    assert_eq!(record.quality_metrics.image_quality_assessment.overall_quality, QualityTier::Excellent);

    let stored = store.get_bill(1).unwrap();
    assert_eq!(stored.merchant_name, "Acme");
    assert_eq!(stored.image_path.as_deref(), Some("receipt.jpg"));
    let items = store.get_line_items(1).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].description, "Milk");
}

#[tokio::test]
async fn test_unauthorized_primary_falls_back() {
    let primary = ScriptedModel::always_failing("openrouter_gemini", ProviderErrorKind::Unauthorized);
    let fallback = ScriptedModel::new("groq_llama_scout", vec![Ok(ACME_EXTRACTION), Ok(ACME_SUMMARY)]);
    let manager = ModelManager::new(primary.clone(), Some(fallback.clone() as Arc<dyn VisionModel>));
    let repository = Arc::new(RecordingRepository::default());

    let outcome = processor(manager, PrepBehavior::Ok, repository.clone())
        .process(&receipt())
        .await;

    assert!(outcome.success, "{:?}", outcome.error);
    let record = outcome.data.unwrap();
    assert!(record.bill_metadata.fallback_used);
    assert!(record.metadata.fallback_used);
    assert_eq!(record.bill_metadata.model_used, "groq_llama_scout");
    assert_eq!(primary.seen().len(), 2);
    assert_eq!(fallback.seen(), vec![CallKind::Vision, CallKind::Text]);

    let bills = repository.bills.lock().unwrap();
    assert_eq!(bills[0].model_used, "groq_llama_scout");
    assert!(bills[0].fallback_used);
}

#[tokio::test]
async fn test_low_confidence_is_rejected_without_persistence() {
    let primary = ScriptedModel::new("primary", vec![Ok(LOW_CONFIDENCE_EXTRACTION)]);
    let repository = Arc::new(RecordingRepository::default());

    let outcome = processor(
        ModelManager::new(primary.clone(), None),
        PrepBehavior::Ok,
        repository.clone(),
    )
    .process(&receipt())
    .await;

    assert!(!outcome.success);
    assert_eq!(outcome.stage, Some(Stage::QualityCheck));
    assert_eq!(outcome.quality_score, Some(0.3));
    assert_eq!(outcome.error.as_deref(), Some(LOW_QUALITY_MESSAGE));
    assert_eq!(outcome.details.as_ref().unwrap().issues, vec!["blurred text"]);
    assert_eq!(repository.bill_count(), 0);
    assert_eq!(repository.item_calls(), 0);
    // No summary call after a rejection.
    assert_eq!(primary.seen(), vec![CallKind::Vision]);

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["stage"], "quality_check");
    assert_eq!(json["success"], false);
    assert!(json.get("data").is_none());
}

#[tokio::test]
async fn test_confidence_equal_to_minimum_passes() {
    let extraction = ACME_EXTRACTION.replace("0.9,\"issues\"", "0.5,\"issues\"");
    let primary = ScriptedModel::new("primary", vec![Ok(extraction.as_str()), Ok(ACME_SUMMARY)]);
    let repository = Arc::new(RecordingRepository::default());

    let outcome = processor(ModelManager::new(primary, None), PrepBehavior::Ok, repository.clone())
        .process(&receipt())
        .await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(repository.bill_count(), 1);
}

#[tokio::test]
async fn test_just_below_minimum_is_rejected() {
    let extraction = ACME_EXTRACTION.replace("0.9,\"issues\"", "0.49,\"issues\"");
    let primary = ScriptedModel::new("primary", vec![Ok(extraction.as_str())]);

    let outcome = processor(
        ModelManager::new(primary, None),
        PrepBehavior::Ok,
        Arc::new(RecordingRepository::default()),
    )
    .process(&receipt())
    .await;

    assert!(outcome.is_rejected());
    assert_eq!(outcome.quality_score, Some(0.49));
}

// ============================================================================
// Stage Failures
// ============================================================================

#[tokio::test]
async fn test_preparation_failure() {
    let primary = ScriptedModel::new("primary", vec![]);

    let outcome = processor(
        ModelManager::new(primary.clone(), None),
        PrepBehavior::Invalid,
        Arc::new(RecordingRepository::default()),
    )
    .process(&receipt())
    .await;

    assert_eq!(outcome.stage, Some(Stage::Preparation));
    assert!(outcome.error.unwrap().contains("File does not exist"));
    assert!(primary.seen().is_empty());
}

#[tokio::test]
async fn test_extraction_failure_from_both_providers() {
    let primary = ScriptedModel::always_failing("a", ProviderErrorKind::RateLimited);
    let fallback = ScriptedModel::always_failing("b", ProviderErrorKind::NotFound);

    let outcome = processor(
        ModelManager::new(primary, Some(fallback as Arc<dyn VisionModel>)),
        PrepBehavior::Ok,
        Arc::new(RecordingRepository::default()),
    )
    .process(&receipt())
    .await;

    assert_eq!(outcome.stage, Some(Stage::VlmExtraction));
    let error = outcome.error.unwrap();
    assert!(error.contains("Primary"), "{error}");
    assert!(error.contains("Fallback"), "{error}");
}

#[tokio::test]
async fn test_unparseable_extraction() {
    let primary = ScriptedModel::new("primary", vec![Ok("Sorry, I cannot read this receipt.")]);

    let outcome = processor(
        ModelManager::new(primary, None),
        PrepBehavior::Ok,
        Arc::new(RecordingRepository::default()),
    )
    .process(&receipt())
    .await;

    assert_eq!(outcome.stage, Some(Stage::VlmExtraction));
    assert!(outcome.error.unwrap().contains("cannot read this receipt"));
}

#[tokio::test]
async fn test_summary_failure() {
    let primary = ScriptedModel::new(
        "primary",
        vec![Ok(ACME_EXTRACTION), Err(ProviderErrorKind::Timeout)],
    );
    let repository = Arc::new(RecordingRepository::default());

    let outcome = processor(ModelManager::new(primary, None), PrepBehavior::Ok, repository.clone())
        .process(&receipt())
        .await;

    assert_eq!(outcome.stage, Some(Stage::SummaryGeneration));
    assert_eq!(repository.bill_count(), 0);
}

#[tokio::test]
async fn test_sparse_summary_is_filled_locally() {
    let primary = ScriptedModel::new("primary", vec![Ok(ACME_EXTRACTION), Ok("{}")]);

    let outcome = processor(
        ModelManager::new(primary, None),
        PrepBehavior::Ok,
        Arc::new(RecordingRepository::default()),
    )
    .process(&receipt())
    .await;

    let record = outcome.data.unwrap();
    assert!((record.summary.total_amount - 3.5).abs() < 1e-9);
    assert_eq!(record.summary.item_count, 1);
    assert!((record.summary.category_breakdown[&Category::Groceries] - 3.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_persistence_failure() {
    let primary = ScriptedModel::new("primary", vec![Ok(ACME_EXTRACTION), Ok(ACME_SUMMARY)]);

    let outcome = processor(
        ModelManager::new(primary, None),
        PrepBehavior::Ok,
        Arc::new(RecordingRepository::failing()),
    )
    .process(&receipt())
    .await;

    assert_eq!(outcome.stage, Some(Stage::Persistence));
    assert!(outcome.error.unwrap().contains("disk full"));
    assert!(outcome.bill_id.is_none());
}

#[tokio::test]
async fn test_panic_is_reported_as_unknown() {
    let primary = ScriptedModel::new("primary", vec![]);

    let outcome = processor(
        ModelManager::new(primary, None),
        PrepBehavior::Panic,
        Arc::new(RecordingRepository::default()),
    )
    .process(&receipt())
    .await;

    assert!(!outcome.success);
    assert_eq!(outcome.stage, Some(Stage::Unknown));
    assert!(outcome.error.unwrap().contains("decoder exploded"));
}

#[tokio::test]
async fn test_slow_primary_hits_deadline_and_falls_back() {
    struct Stalled;

    #[async_trait]
    impl VisionModel for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn invoke(&self, _request: &ModelRequest) -> Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(String::new())
        }
    }

    let fallback = ScriptedModel::new("fallback", vec![Ok(ACME_EXTRACTION), Ok(ACME_SUMMARY)]);
    let manager = ModelManager::new(Arc::new(Stalled), Some(fallback as Arc<dyn VisionModel>))
        .with_deadline(Duration::from_millis(50));

    let outcome = processor(manager, PrepBehavior::Ok, Arc::new(RecordingRepository::default()))
        .process(&receipt())
        .await;

    let record = outcome.data.unwrap();
    assert_eq!(record.metadata.extraction_model, "fallback");
    assert_eq!(record.metadata.summary_model, "fallback");
}
