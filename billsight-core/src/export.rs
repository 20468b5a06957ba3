//! CSV export of line items.

use csv::WriterBuilder;

use crate::error::CoreError;
use crate::models::LineItem;

/// Header row of the line item export.
pub const CSV_HEADER: &str = "description,amount,category,confidence";

/// Renders line items as CSV with a header row.
///
/// Returns an empty string for an empty list. Fields containing commas,
/// quotes or line breaks are quoted, with embedded quotes doubled.
///
/// # Errors
///
/// Returns [`CoreError::Csv`] if a record cannot be written.
pub fn line_items_to_csv(items: &[LineItem]) -> Result<String, CoreError> {
    if items.is_empty() {
        return Ok(String::new());
    }

    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(CSV_HEADER.split(','))?;
    for item in items {
        let amount = format!("{:.2}", item.amount);
        let confidence = format!("{:.2}", item.confidence);
        writer.write_record([
            item.description.as_str(),
            amount.as_str(),
            item.category.as_str(),
            confidence.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Csv(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|e| CoreError::InvalidData(e.to_string()))
}
