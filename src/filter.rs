use std::collections::BTreeSet;

use crate::error::Result;
use crate::models::{Category, TransactionRecord};

/// Category selection applied before any aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(BTreeSet<Category>),
}

impl CategoryFilter {
    /// Build a filter from user-supplied names. `"All"` anywhere, or no
    /// names at all, selects everything.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if names.is_empty() || names.iter().any(|n| n.as_ref().trim().eq_ignore_ascii_case("all")) {
            return Ok(Self::All);
        }
        let set = names
            .iter()
            .map(|n| n.as_ref().parse::<Category>())
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Self::Only(set))
    }

    /// Rows without a category only pass the `All` filter.
    pub fn matches(&self, category: Option<Category>) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => category.is_some_and(|c| set.contains(&c)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::All => "All".to_string(),
            Self::Only(set) => set.iter().map(|c| c.label()).collect::<Vec<_>>().join(", "),
        }
    }
}

pub fn filter(records: &[TransactionRecord], categories: &CategoryFilter) -> Vec<TransactionRecord> {
    if *categories == CategoryFilter::All {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| categories.matches(r.category))
        .cloned()
        .collect()
}
