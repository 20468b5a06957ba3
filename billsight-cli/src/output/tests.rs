//! CLI output formatting tests.
//!
//! These tests verify that CLI output is correctly formatted for both
//! text and JSON output modes.

use billsight_core::{
    Category, ConfidenceThresholds, ExtractedBill, LineItem, ProcessOutcome, ProcessingRecord,
    Provenance, QualityAssessment, QualityTier, Stage, SummaryResult,
};
use billsight_store::{Statistics, StoredBill, StoredLineItem};
use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

fn record(fallback: bool) -> ProcessingRecord {
    let items = vec![
        LineItem::new("Milk", 3.5, Category::Groceries, 0.95),
        LineItem::new("Sandwich", 12.0, Category::Dining, 0.9),
    ];
    let bill = ExtractedBill {
        merchant_name: "Acme Market".to_string(),
        bill_date: Some("2024-03-01".to_string()),
        quality_assessment: QualityAssessment {
            is_clear: true,
            is_complete: true,
            overall_quality: QualityTier::Excellent,
            confidence_score: 0.92,
            issues: vec![],
        },
        line_items: items.clone(),
        total_amount: 15.5,
        currency: "USD".to_string(),
    };
    let summary = SummaryResult::from_items(&items, &ConfidenceThresholds::default());
    let provenance = Provenance {
        bill_id: 7,
        extraction_model: "openrouter_gemini".to_string(),
        extraction_fallback: false,
        extraction_elapsed: Duration::from_millis(1500),
        summary_model: "groq_llama_scout".to_string(),
        summary_fallback: fallback,
        summary_elapsed: Duration::from_millis(500),
    };
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap();
    ProcessingRecord::assemble(bill, summary, provenance, at)
}

fn stored_bill(id: i64, merchant: &str) -> StoredBill {
    StoredBill {
        id,
        merchant_name: merchant.to_string(),
        bill_date: "2024-03-01".to_string(),
        total_amount: 15.5,
        currency: "USD".to_string(),
        image_path: Some("/tmp/receipt.jpg".to_string()),
        quality_score: Some(0.92),
        confidence_score: 0.92,
        model_used: "openrouter_gemini".to_string(),
        fallback_used: false,
        processing_time_secs: 2.0,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap(),
    }
}

mod text_formatter_tests {
    use super::*;
    use crate::output::text::TextFormatter;
    use crate::output::{BillDetailOutput, CheckOutput, ProviderCheck};

    #[test]
    fn test_progress_bar_boundary_values() {
        let formatter = TextFormatter::new(false);

        let test_cases = vec![
            (0.0, "░░░░░░░░░░"),
            (10.0, "█░░░░░░░░░"),
            (25.0, "███░░░░░░░"), // 2.5 rounds to 3 blocks
            (50.0, "█████░░░░░"),
            (75.0, "████████░░"), // 7.5 rounds to 8 blocks
            (100.0, "██████████"),
        ];

        for (percent, expected) in test_cases {
            assert_eq!(formatter.progress_bar(percent), expected, "Failed for {percent}%");
        }
    }

    #[test]
    fn test_progress_bar_with_colors() {
        let formatter = TextFormatter::new(true);
        assert!(formatter.progress_bar(40.0).contains("\x1b[31m"));
        assert!(formatter.progress_bar(60.0).contains("\x1b[33m"));
        assert!(formatter.progress_bar(90.0).contains("\x1b[32m"));
    }

    #[test]
    fn test_format_record() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_record(&record(false));

        assert!(output.contains("Acme Market (bill #7)"));
        assert!(output.contains("Date:       2024-03-01"));
        assert!(output.contains("15.50"));
        assert!(output.contains("92%"));
        assert!(output.contains("Milk"));
        assert!(output.contains("Dining"));
        assert!(!output.contains("(fallback)"));
    }

    #[test]
    fn test_format_record_marks_fallback() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_record(&record(true));
        assert!(output.contains("openrouter_gemini (fallback)"));
    }

    #[test]
    fn test_format_record_orders_categories_by_amount() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_record(&record(false));
        let section = output.split("By category").nth(1).unwrap();
        let dining = section.find("Dining").unwrap();
        let groceries = section.find("Groceries").unwrap();
        assert!(dining < groceries);
    }

    #[test]
    fn test_format_outcome_success_uses_record() {
        let formatter = TextFormatter::new(false);
        let outcome = ProcessOutcome::completed(record(false));
        assert!(formatter.format_outcome(&outcome).contains("Acme Market"));
    }

    #[test]
    fn test_format_outcome_rejected() {
        let formatter = TextFormatter::new(false);
        let assessment = QualityAssessment {
            is_clear: false,
            is_complete: false,
            overall_quality: QualityTier::Poor,
            confidence_score: 0.3,
            issues: vec!["blurry".to_string()],
        };
        let outcome = ProcessOutcome::rejected(
            0.3,
            assessment,
            "Image quality too low. Please upload a clearer image.",
        );
        let output = formatter.format_outcome(&outcome);

        assert!(output.starts_with("Rejected:"));
        assert!(output.contains("quality_check"));
        assert!(output.contains("30%"));
        assert!(output.contains("• blurry"));
    }

    #[test]
    fn test_format_outcome_failed() {
        let formatter = TextFormatter::new(false);
        let outcome = ProcessOutcome::failed(Stage::VlmExtraction, "both providers failed");
        let output = formatter.format_outcome(&outcome);

        assert!(output.starts_with("Failed: both providers failed"));
        assert!(output.contains("vlm_extraction"));
        assert!(!output.contains("Confidence"));
    }

    #[test]
    fn test_format_bill_list_empty() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.format_bill_list(&[]), "No bills stored yet.");
    }

    #[test]
    fn test_format_bill_list() {
        let formatter = TextFormatter::new(false);
        let output =
            formatter.format_bill_list(&[stored_bill(2, "Corner Cafe"), stored_bill(1, "Acme")]);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("Corner Cafe"));
        assert!(lines[3].contains("15.50 USD"));
    }

    #[test]
    fn test_format_bill_detail() {
        let formatter = TextFormatter::new(false);
        let detail = BillDetailOutput {
            bill: stored_bill(3, "Acme"),
            items: vec![StoredLineItem {
                id: 1,
                bill_id: 3,
                description: "Milk".to_string(),
                amount: 3.5,
                category: Category::Groceries,
                confidence: 0.95,
            }],
        };
        let output = formatter.format_bill(&detail);

        assert!(output.contains("Acme (bill #3)"));
        assert!(output.contains("/tmp/receipt.jpg"));
        assert!(output.contains("Groceries"));
        assert!(output.contains("2024-03-01 12:00:00 UTC"));
    }

    #[test]
    fn test_format_stats() {
        let formatter = TextFormatter::new(false);
        let mut by_category = BTreeMap::new();
        by_category.insert(Category::Groceries, 75.0);
        by_category.insert(Category::Dining, 25.0);
        let stats = Statistics {
            total_bills: 4,
            total_spent: 100.0,
            average_bill: 25.0,
            by_category,
        };
        let output = formatter.format_stats(&stats);

        assert!(output.contains("Bills:        4"));
        assert!(output.contains("100.00"));
        assert!(output.contains("75.0%"));
        assert!(output.contains("25.0%"));
    }

    #[test]
    fn test_format_check_not_ready() {
        let formatter = TextFormatter::new(false);
        let check = CheckOutput {
            ok: false,
            primary_model: "openrouter_gemini".to_string(),
            primary_ready: false,
            fallback_model: None,
            fallback_ready: None,
            providers: vec![ProviderCheck {
                name: "openrouter_gemini".to_string(),
                api_key_env: "OPENROUTER_API_KEY".to_string(),
                masked_key: None,
                configured: false,
                is_primary: true,
                is_fallback: false,
            }],
            settings_error: None,
            database_path: "/tmp/bills.db".to_string(),
            database_bills: Some(0),
            database_error: None,
            output_dir: "/tmp/outputs".to_string(),
        };
        let output = formatter.format_check(&check);

        assert!(output.contains("✗ openrouter_gemini"));
        assert!(output.contains("[primary]"));
        assert!(output.contains("(missing key)"));
        assert!(output.contains("Fallback: (disabled)"));
        assert!(output.contains("Not ready"));
    }
}

mod json_formatter_tests {
    use super::*;
    use crate::output::{BillDetailOutput, JsonFormatter};
    use billsight_providers::ProviderRegistry;

    #[test]
    fn test_outcome_json_uses_stage_names() {
        let formatter = JsonFormatter::new(false);
        let outcome = ProcessOutcome::failed(Stage::SummaryGeneration, "bad json");
        let json = formatter.format(&outcome).unwrap();

        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"stage\":\"summary_generation\""));
        assert!(!json.contains("\"data\""));
    }

    #[test]
    fn test_record_json_shape() {
        let formatter = JsonFormatter::new(false);
        let json = formatter.format(&ProcessOutcome::completed(record(false))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["bill_id"], 7);
        assert_eq!(value["data"]["bill_metadata"]["merchant_name"], "Acme Market");
        assert_eq!(value["data"]["expenses"].as_array().unwrap().len(), 2);
        assert_eq!(value["data"]["metadata"]["total_items"], 2);
    }

    #[test]
    fn test_bill_detail_flattens_bill() {
        let formatter = JsonFormatter::new(false);
        let detail = BillDetailOutput {
            bill: stored_bill(5, "Acme"),
            items: vec![],
        };
        let value: serde_json::Value =
            serde_json::from_str(&formatter.format(&detail).unwrap()).unwrap();

        assert_eq!(value["id"], 5);
        assert_eq!(value["merchant_name"], "Acme");
        assert!(value["items"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_providers_json_lists_registry() {
        let formatter = JsonFormatter::new(false);
        let json = formatter.format_providers(ProviderRegistry::all()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entries = value.as_array().unwrap();

        assert_eq!(entries.len(), ProviderRegistry::count());
        assert!(entries.iter().any(|e| e["name"] == "openrouter_gemini"));
        assert!(entries.iter().all(|e| e.get("has_credentials").is_some()));
    }
}
