//! Output formatting for CLI.

mod json;
mod text;

pub use json::{BillDetailOutput, CheckOutput, JsonFormatter, ProviderCheck};
pub use text::TextFormatter;
#[cfg(test)]
mod tests;
