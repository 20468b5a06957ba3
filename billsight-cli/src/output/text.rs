//! Text output formatting with confidence bars and colors.

use billsight_core::{Category, ProcessOutcome, ProcessingRecord};
use billsight_providers::ProviderConfig;
use billsight_store::{Statistics, StoredBill};
use std::collections::BTreeMap;

use super::json::{BillDetailOutput, CheckOutput};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";
const CYAN: &str = "\x1b[36m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 10,
        }
    }

    // ========================================================================
    // Processing
    // ========================================================================

    /// Formats the outcome of a process run.
    pub fn format_outcome(&self, outcome: &ProcessOutcome) -> String {
        if let Some(record) = &outcome.data {
            return self.format_record(record);
        }

        let mut lines = Vec::new();
        let error = outcome.error.as_deref().unwrap_or("unknown error");
        let stage = outcome
            .stage
            .map_or_else(|| "unknown".to_string(), |s| s.to_string());

        if outcome.is_rejected() {
            lines.push(format!("{} {}", self.yellow("Rejected:"), error));
        } else {
            lines.push(format!("{} {}", self.red("Failed:"), error));
        }
        lines.push(format!("Stage:      {}", self.dim(&stage)));

        if let Some(score) = outcome.quality_score {
            lines.push(format!("Confidence: {}", self.confidence(score)));
        }
        if let Some(details) = &outcome.details {
            lines.push(format!(
                "Quality:    {} (clear: {}, complete: {})",
                details.overall_quality, details.is_clear, details.is_complete
            ));
            for issue in &details.issues {
                lines.push(format!("  • {issue}"));
            }
        }

        lines.join("\n")
    }

    /// Formats a completed processing record.
    pub fn format_record(&self, record: &ProcessingRecord) -> String {
        let meta = &record.bill_metadata;
        let mut lines = Vec::new();

        lines.push(format!(
            "{} {}",
            self.bold(&meta.merchant_name),
            self.dim(&format!("(bill #{})", meta.bill_id))
        ));
        lines.push("─".repeat(50));
        lines.push(format!("Date:       {}", meta.bill_date));
        lines.push(format!(
            "Total:      {}",
            self.green(&format!("{:.2}", record.summary.total_amount))
        ));
        lines.push(format!("Confidence: {}", self.confidence(meta.overall_confidence)));
        lines.push(format!("Quality:    {}", meta.image_quality));

        let model = if meta.fallback_used {
            format!("{} {}", meta.model_used, self.yellow("(fallback)"))
        } else {
            meta.model_used.clone()
        };
        lines.push(format!("Model:      {model}"));
        lines.push(format!(
            "Time:       {:.1}s",
            record.metadata.processing_time_seconds
        ));

        if !record.expenses.is_empty() {
            lines.push(String::new());
            lines.push(self.bold("Items"));
            for item in &record.expenses {
                lines.push(format!(
                    "  {:<30} {:>10.2}  {:<14} {}",
                    truncate(&item.description, 30),
                    item.amount,
                    item.category.display_name(),
                    self.dim(&format!("{:.0}%", item.confidence * 100.0))
                ));
            }
        }

        if !record.summary.category_breakdown.is_empty() {
            lines.push(String::new());
            lines.push(self.bold("By category"));
            lines.extend(self.category_lines(
                &record.summary.category_breakdown,
                &record.summary.category_percentages,
            ));
        }

        let insights = &record.insights;
        if !insights.primary_insight.is_empty() {
            lines.push(String::new());
            lines.push(self.cyan(&insights.primary_insight));
        }
        for pattern in &insights.spending_patterns {
            lines.push(format!("  • {pattern}"));
        }
        for item in &insights.unusual_items {
            lines.push(format!("  {} {item}", self.yellow("!")));
        }
        for rec in &insights.recommendations {
            lines.push(format!("  {} {rec}", self.blue("→")));
        }

        lines.join("\n")
    }

    fn category_lines(
        &self,
        amounts: &BTreeMap<Category, f64>,
        percentages: &BTreeMap<Category, f64>,
    ) -> Vec<String> {
        let mut sorted: Vec<_> = amounts.iter().collect();
        sorted.sort_by(|a, b| b.1.total_cmp(a.1).then(a.0.cmp(b.0)));

        sorted
            .into_iter()
            .map(|(category, amount)| {
                let pct = percentages.get(category).copied().unwrap_or(0.0);
                format!(
                    "  {:<14} {:>10.2}  {}",
                    category.display_name(),
                    amount,
                    self.dim(&format!("{pct:.1}%"))
                )
            })
            .collect()
    }

    // ========================================================================
    // Providers and check
    // ========================================================================

    /// Formats provider list header.
    pub fn format_providers_header(&self) -> String {
        format!(
            "{:<26} {:<11} {:<8} {:<9} {}",
            self.bold("Provider"),
            self.bold("Service"),
            self.bold("Vision"),
            self.bold("Role"),
            self.bold("Key")
        )
    }

    /// Formats a single provider line.
    pub fn format_provider_line(&self, config: &ProviderConfig) -> String {
        let vision = if config.supports_images {
            self.green("✓")
        } else {
            self.dim("−")
        };

        let key = if config.has_credentials() {
            self.green(config.api_key_env())
        } else {
            self.dim(&format!("{} (unset)", config.api_key_env()))
        };

        format!(
            "{:<26} {:<11} {:<8} {:<9} {}",
            config.name,
            config.service.to_string(),
            vision,
            config.role.to_string(),
            key
        )
    }

    /// Formats the check report.
    pub fn format_check(&self, check: &CheckOutput) -> String {
        let mut lines = Vec::new();

        lines.push(self.bold("BillSight Check"));
        lines.push("─".repeat(50));
        lines.push(String::new());

        lines.push(self.bold("API keys"));
        for provider in &check.providers {
            let mark = if provider.configured {
                self.green("✓")
            } else {
                self.red("✗")
            };
            let key = provider
                .masked_key
                .as_deref()
                .map_or_else(|| self.dim("not set"), str::to_string);
            let role = if provider.is_primary {
                self.cyan(" [primary]")
            } else if provider.is_fallback {
                self.cyan(" [fallback]")
            } else {
                String::new()
            };
            lines.push(format!(
                "  {mark} {:<26} {:<20} {key}{role}",
                provider.name, provider.api_key_env
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Primary:  {} {}",
            check.primary_model,
            self.status(check.primary_ready)
        ));
        match (&check.fallback_model, check.fallback_ready) {
            (Some(name), Some(ready)) => {
                lines.push(format!("Fallback: {name} {}", self.status(ready)));
            }
            _ => lines.push(format!("Fallback: {}", self.dim("(disabled)"))),
        }

        lines.push(String::new());
        match &check.settings_error {
            None => lines.push(format!("Settings: {}", self.green("valid"))),
            Some(e) => lines.push(format!("Settings: {} {e}", self.red("invalid:"))),
        }
        match (&check.database_error, check.database_bills) {
            (Some(e), _) => lines.push(format!("Database: {} {e}", self.red("error:"))),
            (None, bills) => lines.push(format!(
                "Database: {} {}",
                check.database_path,
                self.dim(&format!("({} bills)", bills.unwrap_or(0)))
            )),
        }
        lines.push(format!("Outputs:  {}", check.output_dir));

        lines.push(String::new());
        if check.ok {
            lines.push(self.green("Ready to process bills."));
        } else {
            lines.push(self.red("Not ready. Set the primary model's API key in .env or the environment."));
        }

        lines.join("\n")
    }

    fn status(&self, ready: bool) -> String {
        if ready {
            self.green("(ready)")
        } else {
            self.red("(missing key)")
        }
    }

    // ========================================================================
    // Stored bills
    // ========================================================================

    /// Formats one stored bill with its items.
    pub fn format_bill(&self, detail: &BillDetailOutput) -> String {
        let bill = &detail.bill;
        let mut lines = Vec::new();

        lines.push(format!(
            "{} {}",
            self.bold(&bill.merchant_name),
            self.dim(&format!("(bill #{})", bill.id))
        ));
        lines.push("─".repeat(50));
        lines.push(format!("Date:       {}", bill.bill_date));
        lines.push(format!(
            "Total:      {}",
            self.green(&format!("{:.2} {}", bill.total_amount, bill.currency))
        ));
        lines.push(format!("Confidence: {}", self.confidence(bill.confidence_score)));
        lines.push(format!("Model:      {}", bill.model_used));
        if let Some(path) = &bill.image_path {
            lines.push(format!("Image:      {}", self.dim(path)));
        }
        lines.push(format!(
            "Stored:     {}",
            bill.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        if !detail.items.is_empty() {
            lines.push(String::new());
            for item in &detail.items {
                lines.push(format!(
                    "  {:<30} {:>10.2}  {}",
                    truncate(&item.description, 30),
                    item.amount,
                    item.category.display_name()
                ));
            }
        }

        lines.join("\n")
    }

    /// Formats a table of stored bills.
    pub fn format_bill_list(&self, bills: &[StoredBill]) -> String {
        if bills.is_empty() {
            return self.dim("No bills stored yet.");
        }

        let mut lines = Vec::new();
        lines.push(format!(
            "{:>5}  {:<10}  {:<28} {:>12}  {}",
            self.bold("ID"),
            self.bold("Date"),
            self.bold("Merchant"),
            self.bold("Total"),
            self.bold("Conf")
        ));
        lines.push("─".repeat(70));

        for bill in bills {
            lines.push(format!(
                "{:>5}  {:<10}  {:<28} {:>12}  {}",
                bill.id,
                bill.bill_date,
                truncate(&bill.merchant_name, 28),
                format!("{:.2} {}", bill.total_amount, bill.currency),
                self.color_for_percent(
                    bill.confidence_score * 100.0,
                    &format!("{:.0}%", bill.confidence_score * 100.0)
                )
            ));
        }

        lines.join("\n")
    }

    /// Formats aggregate statistics.
    pub fn format_stats(&self, stats: &Statistics) -> String {
        let mut lines = Vec::new();

        lines.push(self.bold("Spending Statistics"));
        lines.push("─".repeat(40));
        lines.push(format!("Bills:        {}", stats.total_bills));
        lines.push(format!(
            "Total spent:  {}",
            self.green(&format!("{:.2}", stats.total_spent))
        ));
        lines.push(format!("Average bill: {:.2}", stats.average_bill));

        if !stats.by_category.is_empty() {
            let total: f64 = stats.by_category.values().sum();
            let percentages: BTreeMap<Category, f64> = stats
                .by_category
                .iter()
                .map(|(c, amount)| {
                    let pct = if total > 0.0 { amount / total * 100.0 } else { 0.0 };
                    (*c, pct)
                })
                .collect();

            lines.push(String::new());
            lines.push(self.bold("By category"));
            lines.extend(self.category_lines(&stats.by_category, &percentages));
        }

        lines.join("\n")
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    /// Formats a confidence score as a bar and percentage.
    fn confidence(&self, score: f64) -> String {
        let pct = score * 100.0;
        format!(
            "{} {}",
            self.progress_bar(pct),
            self.color_for_percent(pct, &format!("{pct:.0}%"))
        )
    }

    /// Formats a progress bar.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn progress_bar(&self, percent: f64) -> String {
        let clamped = percent.clamp(0.0, 100.0);
        let filled = ((clamped / 100.0) * self.bar_width as f64).round() as usize;
        let empty = self.bar_width.saturating_sub(filled);

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_percent(clamped, &bar)
    }

    fn color_for_percent(&self, percent: f64, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }

        if percent < 50.0 {
            self.red(text)
        } else if percent < 70.0 {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn blue(&self, text: &str) -> String {
        self.paint(BLUE, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

/// Shortens `text` to at most `max` characters, marking the cut with `…`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

// ============================================================================
// Tests
// ============================================================================
