//! Expense categories.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The closed set of expense categories a line item can carry.
///
/// Anything a model returns outside this set is folded into
/// [`Category::Uncategorized`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Food and household supplies.
    Groceries,
    /// Restaurants, cafes, takeaway.
    Dining,
    /// Power, water, phone, internet.
    Utilities,
    /// General retail.
    Shopping,
    /// Cinema, events, subscriptions.
    Entertainment,
    /// Everything else.
    #[default]
    Uncategorized,
}

impl Category {
    /// Returns all categories in display order.
    pub fn all() -> &'static [Category] {
        &[
            Self::Groceries,
            Self::Dining,
            Self::Utilities,
            Self::Shopping,
            Self::Entertainment,
            Self::Uncategorized,
        ]
    }

    /// Returns the wire name of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groceries => "groceries",
            Self::Dining => "dining",
            Self::Utilities => "utilities",
            Self::Shopping => "shopping",
            Self::Entertainment => "entertainment",
            Self::Uncategorized => "uncategorized",
        }
    }

    /// Returns the capitalized display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Groceries => "Groceries",
            Self::Dining => "Dining",
            Self::Utilities => "Utilities",
            Self::Shopping => "Shopping",
            Self::Entertainment => "Entertainment",
            Self::Uncategorized => "Uncategorized",
        }
    }

    /// Normalizes a free-form category tag.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Unknown tags map to [`Category::Uncategorized`].
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == tag)
            .unwrap_or_default()
    }

    /// Returns the comma-separated list used in prompts.
    pub fn prompt_list() -> String {
        Self::all()
            .iter()
            .map(Category::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::parse(&tag))
    }
}
