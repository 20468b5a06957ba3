//! Prompt templates for the extraction and summary calls.

use billsight_core::{Category, LineItem};

/// Builds the prompt sent with the bill image.
pub fn extraction_prompt() -> String {
    format!(
        r#"Analyze this bill/receipt image and extract all information in JSON format.

You MUST extract:
1. Merchant/vendor name
2. Date in YYYY-MM-DD format
3. All line items with descriptions and prices
4. Total amount
5. Categorize each item into one of: {categories}

Also assess the image quality:
- Is text clear and readable?
- Is information complete?
- Provide confidence score (0.0 to 1.0)

Respond ONLY with valid JSON in this exact format:
{{
    "merchant_name": "store name",
    "bill_date": "YYYY-MM-DD",
    "quality_assessment": {{
        "is_clear": true,
        "is_complete": true,
        "overall_quality": "excellent",
        "confidence_score": 0.95,
        "issues": []
    }},
    "line_items": [
        {{
            "description": "item name",
            "amount": 12.50,
            "category": "groceries",
            "confidence": 0.90
        }}
    ],
    "total_amount": 12.50,
    "currency": "USD"
}}"#,
        categories = Category::prompt_list()
    )
}

/// Builds the summary prompt with the extracted items embedded as JSON.
pub fn summary_prompt(items: &[LineItem]) -> String {
    let expenses = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
    let zeroes = Category::all()
        .iter()
        .map(|c| format!("\"{c}\": 0.0"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Analyze these expenses and provide insights in JSON format.

Expenses data:
{expenses}

Generate:
1. Total spending per category
2. Category percentages
3. Insights about spending patterns
4. Quality metrics

Respond ONLY with valid JSON in this exact format:
{{
    "summary": {{
        "total_amount": 0.0,
        "item_count": 0,
        "category_breakdown": {{ {zeroes} }},
        "category_percentages": {{ {zeroes} }},
        "highest_spending_category": "groceries",
        "lowest_spending_category": "utilities"
    }},
    "insights": {{
        "primary_insight": "Groceries account for 57% of total spending",
        "spending_patterns": ["Pattern 1", "Pattern 2"],
        "unusual_items": [],
        "recommendations": []
    }},
    "quality_metrics": {{
        "average_confidence": 0.90,
        "items_with_high_confidence": 10,
        "items_with_low_confidence": 2,
        "overall_data_quality": "excellent"
    }}
}}"#
    )
}
