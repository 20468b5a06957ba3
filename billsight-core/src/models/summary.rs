//! Spending summary types.
//!
//! A [`SummaryResult`] can be computed locally from line items with
//! [`SummaryResult::from_items`], or decoded from a model reply as a
//! [`SummaryResponse`] and then reconciled against the local computation so
//! that every field the model left out is still filled in.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use super::bill::LineItem;
use super::category::Category;
use super::de::{as_count, as_f64, as_string, as_string_list, clamp_unit};
use super::quality::{ConfidenceThresholds, QualityTier};

// ============================================================================
// Summary Types
// ============================================================================

/// Aggregated spending view for one bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingSummary {
    /// Total spent across all items.
    pub total_amount: f64,
    /// Number of line items.
    pub item_count: usize,
    /// Amount spent per category.
    pub category_breakdown: BTreeMap<Category, f64>,
    /// Share of the total per category, in percent.
    pub category_percentages: BTreeMap<Category, f64>,
    /// Category with the most spending.
    pub highest_spending_category: Option<Category>,
    /// Category with the least non-zero spending.
    pub lowest_spending_category: Option<Category>,
}

/// Narrative observations about the spending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    /// One-sentence headline.
    pub primary_insight: String,
    /// Observed patterns.
    pub spending_patterns: Vec<String>,
    /// Items that stand out.
    pub unusual_items: Vec<String>,
    /// Suggestions for the user.
    pub recommendations: Vec<String>,
}

/// Confidence statistics over the line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Mean per-item confidence.
    pub average_confidence: f64,
    /// Items at or above the high-confidence threshold.
    pub items_with_high_confidence: usize,
    /// Items below the high-confidence threshold.
    pub items_with_low_confidence: usize,
    /// Overall tier derived from the average confidence.
    pub overall_data_quality: QualityTier,
}

/// Result of the summary stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Spending totals.
    pub summary: SpendingSummary,
    /// Narrative insights.
    pub insights: Insights,
    /// Quality statistics.
    pub quality_metrics: QualityMetrics,
}

// ============================================================================
// Local Computation
// ============================================================================

impl SummaryResult {
    /// Computes a summary directly from line items.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_items(items: &[LineItem], thresholds: &ConfidenceThresholds) -> Self {
        let mut breakdown: BTreeMap<Category, f64> = BTreeMap::new();
        for item in items {
            *breakdown.entry(item.category).or_insert(0.0) += item.amount;
        }
        let total: f64 = breakdown.values().sum();
        let percentages = percentages_of(&breakdown, total);
        let (highest, lowest) = extremes(&breakdown);

        let average_confidence = if items.is_empty() {
            0.0
        } else {
            round2(items.iter().map(|i| i.confidence).sum::<f64>() / items.len() as f64)
        };
        let high = items
            .iter()
            .filter(|i| i.confidence >= thresholds.high_item)
            .count();

        let insights = Insights {
            primary_insight: highest
                .map(|c| {
                    format!(
                        "{} accounts for {:.0}% of total spending",
                        c.display_name(),
                        percentages.get(&c).copied().unwrap_or(0.0)
                    )
                })
                .unwrap_or_else(|| "No spending recorded".to_string()),
            ..Insights::default()
        };

        Self {
            summary: SpendingSummary {
                total_amount: round2(total),
                item_count: items.len(),
                category_breakdown: breakdown.into_iter().map(|(c, v)| (c, round2(v))).collect(),
                category_percentages: percentages,
                highest_spending_category: highest,
                lowest_spending_category: lowest,
            },
            insights,
            quality_metrics: QualityMetrics {
                average_confidence,
                items_with_high_confidence: high,
                items_with_low_confidence: items.len() - high,
                overall_data_quality: if items.is_empty() {
                    QualityTier::Unknown
                } else {
                    QualityTier::from_score(average_confidence, thresholds)
                },
            },
        }
    }
}

fn percentages_of(breakdown: &BTreeMap<Category, f64>, total: f64) -> BTreeMap<Category, f64> {
    breakdown
        .iter()
        .map(|(c, v)| {
            let pct = if total > 0.0 { v / total * 100.0 } else { 0.0 };
            (*c, round1(pct))
        })
        .collect()
}

fn extremes(breakdown: &BTreeMap<Category, f64>) -> (Option<Category>, Option<Category>) {
    let spent = || breakdown.iter().filter(|(_, v)| **v > 0.0);
    let highest = spent()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(c, _)| *c);
    let lowest = spent()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(c, _)| *c);
    (highest, lowest)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ============================================================================
// Model Response
// ============================================================================

/// Summary as returned by a model, before reconciliation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    summary: Option<RawSpendingSummary>,
    #[serde(default)]
    insights: Option<RawInsights>,
    #[serde(default)]
    quality_metrics: Option<RawQualityMetrics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawSpendingSummary {
    #[serde(default)]
    total_amount: Option<Value>,
    #[serde(default)]
    item_count: Option<Value>,
    #[serde(default)]
    category_breakdown: Option<HashMap<String, Value>>,
    #[serde(default)]
    category_percentages: Option<HashMap<String, Value>>,
    #[serde(default)]
    highest_spending_category: Option<Value>,
    #[serde(default)]
    lowest_spending_category: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawInsights {
    #[serde(default)]
    primary_insight: Option<Value>,
    #[serde(default)]
    spending_patterns: Option<Value>,
    #[serde(default)]
    unusual_items: Option<Value>,
    #[serde(default)]
    recommendations: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawQualityMetrics {
    #[serde(default)]
    average_confidence: Option<Value>,
    #[serde(default)]
    items_with_high_confidence: Option<Value>,
    #[serde(default)]
    items_with_low_confidence: Option<Value>,
    #[serde(default)]
    overall_data_quality: Option<Value>,
}

impl SummaryResponse {
    /// Merges the model's summary with one computed from `items`.
    ///
    /// Values the model supplied win; anything missing or unreadable is
    /// taken from the local computation. Category keys are normalized into
    /// the closed category set, summing amounts that fold together.
    pub fn reconcile(self, items: &[LineItem], thresholds: &ConfidenceThresholds) -> SummaryResult {
        let local = SummaryResult::from_items(items, thresholds);
        let raw = self.summary.unwrap_or_default();

        let breakdown = raw
            .category_breakdown
            .as_ref()
            .map(fold_categories)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| local.summary.category_breakdown.clone());
        let total = raw
            .total_amount
            .as_ref()
            .and_then(as_f64)
            .unwrap_or(local.summary.total_amount);
        let percentages = raw
            .category_percentages
            .as_ref()
            .map(fold_categories)
            .filter(|m| consistent_percentages(m, &breakdown))
            .unwrap_or_else(|| percentages_of(&breakdown, breakdown.values().sum()));
        let (highest, lowest) = extremes(&breakdown);

        let summary = SpendingSummary {
            total_amount: total,
            item_count: raw
                .item_count
                .as_ref()
                .and_then(as_count)
                .unwrap_or(local.summary.item_count),
            highest_spending_category: raw
                .highest_spending_category
                .as_ref()
                .and_then(as_string)
                .map(|s| Category::parse(&s))
                .filter(|c| breakdown.contains_key(c))
                .or(highest),
            lowest_spending_category: raw
                .lowest_spending_category
                .as_ref()
                .and_then(as_string)
                .map(|s| Category::parse(&s))
                .filter(|c| breakdown.contains_key(c))
                .or(lowest),
            category_breakdown: breakdown,
            category_percentages: percentages,
        };

        let raw_insights = self.insights.unwrap_or_default();
        let insights = Insights {
            primary_insight: raw_insights
                .primary_insight
                .as_ref()
                .and_then(as_string)
                .unwrap_or(local.insights.primary_insight),
            spending_patterns: list_or_empty(raw_insights.spending_patterns.as_ref()),
            unusual_items: list_or_empty(raw_insights.unusual_items.as_ref()),
            recommendations: list_or_empty(raw_insights.recommendations.as_ref()),
        };

        let raw_metrics = self.quality_metrics.unwrap_or_default();
        let local_metrics = local.quality_metrics;
        let quality_metrics = QualityMetrics {
            average_confidence: raw_metrics
                .average_confidence
                .as_ref()
                .and_then(as_f64)
                .map_or(local_metrics.average_confidence, clamp_unit),
            items_with_high_confidence: raw_metrics
                .items_with_high_confidence
                .as_ref()
                .and_then(as_count)
                .unwrap_or(local_metrics.items_with_high_confidence),
            items_with_low_confidence: raw_metrics
                .items_with_low_confidence
                .as_ref()
                .and_then(as_count)
                .unwrap_or(local_metrics.items_with_low_confidence),
            overall_data_quality: raw_metrics
                .overall_data_quality
                .as_ref()
                .and_then(as_string)
                .map(|s| QualityTier::parse(&s))
                .filter(|t| *t != QualityTier::Unknown)
                .unwrap_or(local_metrics.overall_data_quality),
        };

        SummaryResult {
            summary,
            insights,
            quality_metrics,
        }
    }
}

fn fold_categories(raw: &HashMap<String, Value>) -> BTreeMap<Category, f64> {
    let mut folded = BTreeMap::new();
    for (key, value) in raw {
        if let Some(amount) = as_f64(value) {
            *folded.entry(Category::parse(key)).or_insert(0.0) += amount;
        }
    }
    folded
}

/// Tolerance, in percentage points, for model percentages that should sum to 100.
const PERCENT_SUM_TOLERANCE: f64 = 1.0;

/// True if `percentages` only names categories of `breakdown` and sums to 100.
fn consistent_percentages(
    percentages: &BTreeMap<Category, f64>,
    breakdown: &BTreeMap<Category, f64>,
) -> bool {
    if percentages.is_empty() || !percentages.keys().all(|c| breakdown.contains_key(c)) {
        return false;
    }
    let sum: f64 = percentages.values().sum();
    (sum - 100.0).abs() <= PERCENT_SUM_TOLERANCE
}

fn list_or_empty(value: Option<&Value>) -> Vec<String> {
    value.map(as_string_list).unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
