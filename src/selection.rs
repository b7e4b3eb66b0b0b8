use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;

use crate::error::PinebarError;
use crate::filter::CategoryFilter;
use crate::models::Period;
use crate::reports::ProductSort;

/// A single reporting period, or every period concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodChoice {
    Single(Period),
    AllTime,
}

impl PeriodChoice {
    pub fn periods(&self) -> Vec<Period> {
        match self {
            Self::Single(p) => vec![*p],
            Self::AllTime => Period::ALL.to_vec(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Single(p) => p.label(),
            Self::AllTime => "All Time",
        }
    }
}

impl Default for PeriodChoice {
    fn default() -> Self {
        Self::Single(Period::Y2024)
    }
}

impl fmt::Display for PeriodChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PeriodChoice {
    type Err = PinebarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.eq_ignore_ascii_case("all") || t.eq_ignore_ascii_case("all time") {
            return Ok(Self::AllTime);
        }
        t.parse().map(Self::Single)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum View {
    #[default]
    Overview,
    Sales,
    Profitability,
    Category,
    Product,
    Trend,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Sales => "Sales Analysis",
            Self::Profitability => "Profitability Analysis",
            Self::Category => "Category Performance",
            Self::Product => "Product Performance",
            Self::Trend => "Monthly Trend",
        }
    }
}

/// Where transaction tables come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Source {
    #[default]
    Synthetic,
    /// Directory holding one POS export per period.
    Csv(PathBuf),
}

impl Source {
    pub fn describe(&self) -> String {
        match self {
            Self::Synthetic => "synthetic".to_string(),
            Self::Csv(dir) => format!("csv ({})", dir.display()),
        }
    }
}

/// Everything the dashboard needs to render one view.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub period: PeriodChoice,
    pub categories: CategoryFilter,
    pub view: View,
    pub sort: ProductSort,
    pub source: Source,
    pub target_revenue: Option<f64>,
    pub top_n: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            period: PeriodChoice::default(),
            categories: CategoryFilter::All,
            view: View::Overview,
            sort: ProductSort::default(),
            source: Source::Synthetic,
            target_revenue: None,
            top_n: 10,
        }
    }
}
