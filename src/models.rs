use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PinebarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "BEER")]
    Beer,
    #[serde(rename = "COCKTAILS")]
    Cocktails,
    #[serde(rename = "FOOD")]
    Food,
    #[serde(rename = "SPIRITS")]
    Spirits,
    #[serde(rename = "WINE")]
    Wine,
    #[serde(rename = "N/A")]
    NonAlcoholic,
    #[serde(rename = "Merch")]
    Merch,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Beer,
        Category::Cocktails,
        Category::Food,
        Category::Spirits,
        Category::Wine,
        Category::NonAlcoholic,
        Category::Merch,
    ];

    /// Label as it appears in the POS export.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Beer => "BEER",
            Self::Cocktails => "COCKTAILS",
            Self::Food => "FOOD",
            Self::Spirits => "SPIRITS",
            Self::Wine => "WINE",
            Self::NonAlcoholic => "N/A",
            Self::Merch => "Merch",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = PinebarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(c) = Category::ALL
            .iter()
            .find(|c| c.label().eq_ignore_ascii_case(trimmed))
        {
            return Ok(*c);
        }
        match trimmed.to_lowercase().as_str() {
            "na" | "non-alcoholic" => Ok(Self::NonAlcoholic),
            _ => Err(PinebarError::UnknownCategory(trimmed.to_string())),
        }
    }
}

/// Display a possibly-unmapped category.
pub fn category_label(category: Option<Category>) -> &'static str {
    category.map(|c| c.label()).unwrap_or("—")
}

// ---------------------------------------------------------------------------
// Periods
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Y2023,
    Y2024,
    Y2025,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Y2023, Period::Y2024, Period::Y2025];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Y2023 => "2023 Full Year",
            Self::Y2024 => "2024 Full Year",
            Self::Y2025 => "2025 (up to March 5)",
        }
    }

    /// Short key used on the command line and in settings.
    pub fn key(&self) -> &'static str {
        self.year()
    }

    /// Year tag written to every generated row.
    pub fn year(&self) -> &'static str {
        match self {
            Self::Y2023 => "2023",
            Self::Y2024 => "2024",
            Self::Y2025 => "2025",
        }
    }

    pub fn seed(&self) -> u64 {
        match self {
            Self::Y2023 => 2023,
            Self::Y2024 => 2024,
            Self::Y2025 => 2025,
        }
    }

    /// POS export file name for this period.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Y2023 => "hemlock_product_breakdown_20230512_20240101.csv",
            Self::Y2024 => "hemlock_product_breakdown_20240101_20250101.csv",
            Self::Y2025 => "hemlock_product_breakdown_20250101_20260101.csv",
        }
    }

    /// Gross amount range per SKU, upper bound exclusive.
    pub fn amount_range(&self) -> (i64, i64) {
        match self {
            Self::Y2023 => (500, 25_000),
            Self::Y2024 => (550, 27_500),
            Self::Y2025 => (80, 4_500),
        }
    }

    /// Months covered by the period with the fraction of each month included.
    pub fn covered_months(&self) -> &'static [(u32, f64)] {
        const FULL_YEAR: &[(u32, f64)] = &[
            (1, 1.0), (2, 1.0), (3, 1.0), (4, 1.0), (5, 1.0), (6, 1.0),
            (7, 1.0), (8, 1.0), (9, 1.0), (10, 1.0), (11, 1.0), (12, 1.0),
        ];
        const UP_TO_MARCH_5: &[(u32, f64)] = &[(1, 1.0), (2, 1.0), (3, 5.0 / 31.0)];
        match self {
            Self::Y2023 | Self::Y2024 => FULL_YEAR,
            Self::Y2025 => UP_TO_MARCH_5,
        }
    }

    pub fn previous(&self) -> Option<Period> {
        match self {
            Self::Y2023 => None,
            Self::Y2024 => Some(Self::Y2023),
            Self::Y2025 => Some(Self::Y2024),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = PinebarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Period::ALL
            .iter()
            .copied()
            .find(|p| p.key() == s || p.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| PinebarError::UnknownPeriod(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Transaction records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentKind {
    ZeroPriced,
    Discounted,
    Offered,
    Loss,
    Returned,
}

impl AdjustmentKind {
    pub const ALL: [AdjustmentKind; 5] = [
        AdjustmentKind::ZeroPriced,
        AdjustmentKind::Discounted,
        AdjustmentKind::Offered,
        AdjustmentKind::Loss,
        AdjustmentKind::Returned,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::ZeroPriced => "Zero Priced",
            Self::Discounted => "Discounted",
            Self::Offered => "Offered",
            Self::Loss => "Loss",
            Self::Returned => "Returned",
        }
    }
}

/// One deduction bucket. Amount is never positive.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Adjustment {
    pub amount: f64,
    pub quantity: u64,
    pub transaction_count: u64,
}

/// One SKU for one reporting period, with POS export column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Category")]
    pub category: Option<Category>,
    #[serde(rename = "Total Amount")]
    pub total_amount: f64,
    #[serde(rename = "Total Quantity")]
    pub total_quantity: u64,
    #[serde(rename = "Total Transaction Count")]
    pub total_transaction_count: u64,
    #[serde(rename = "Zero Priced Amount")]
    pub zero_priced_amount: f64,
    #[serde(rename = "Zero Priced Quantity")]
    pub zero_priced_quantity: u64,
    #[serde(rename = "Zero Priced Transaction Count")]
    pub zero_priced_transaction_count: u64,
    #[serde(rename = "Discounted Amount")]
    pub discounted_amount: f64,
    #[serde(rename = "Discounted Quantity")]
    pub discounted_quantity: u64,
    #[serde(rename = "Discounted Transaction Count")]
    pub discounted_transaction_count: u64,
    #[serde(rename = "Offered Amount")]
    pub offered_amount: f64,
    #[serde(rename = "Offered Quantity")]
    pub offered_quantity: u64,
    #[serde(rename = "Offered Transaction Count")]
    pub offered_transaction_count: u64,
    #[serde(rename = "Loss Amount")]
    pub loss_amount: f64,
    #[serde(rename = "Loss Quantity")]
    pub loss_quantity: u64,
    #[serde(rename = "Loss Transaction Count")]
    pub loss_transaction_count: u64,
    #[serde(rename = "Returned Amount")]
    pub returned_amount: f64,
    #[serde(rename = "Returned Quantity")]
    pub returned_quantity: u64,
    #[serde(rename = "Returned Transaction Count")]
    pub returned_transaction_count: u64,
    #[serde(rename = "Transaction Amount")]
    pub transaction_amount: f64,
    #[serde(rename = "Transaction Quantity")]
    pub transaction_quantity: u64,
    #[serde(rename = "Transaction Count")]
    pub transaction_count: u64,
    #[serde(rename = "Cost")]
    pub cost: f64,
    #[serde(rename = "Profit")]
    pub profit: f64,
    #[serde(rename = "Profit Margin")]
    pub profit_margin: f64,
    #[serde(rename = "Year")]
    pub year: String,
}

impl TransactionRecord {
    /// Build a record from gross figures and adjustment buckets, deriving the
    /// net amount, net quantity, profit and margin.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        sku: &str,
        category: Option<Category>,
        year: &str,
        total_amount: f64,
        total_quantity: u64,
        total_transaction_count: u64,
        adjustments: [Adjustment; 5],
        cost: f64,
    ) -> Self {
        let [zero, disc, offered, loss, returned] = adjustments;
        let transaction_amount = total_amount + adjustments.iter().map(|a| a.amount).sum::<f64>();
        let deducted: u64 = adjustments.iter().map(|a| a.quantity).sum();
        let transaction_quantity = total_quantity.saturating_sub(deducted);
        let profit = transaction_amount - cost;

        Self {
            sku: sku.to_string(),
            category,
            total_amount,
            total_quantity,
            total_transaction_count,
            zero_priced_amount: zero.amount,
            zero_priced_quantity: zero.quantity,
            zero_priced_transaction_count: zero.transaction_count,
            discounted_amount: disc.amount,
            discounted_quantity: disc.quantity,
            discounted_transaction_count: disc.transaction_count,
            offered_amount: offered.amount,
            offered_quantity: offered.quantity,
            offered_transaction_count: offered.transaction_count,
            loss_amount: loss.amount,
            loss_quantity: loss.quantity,
            loss_transaction_count: loss.transaction_count,
            returned_amount: returned.amount,
            returned_quantity: returned.quantity,
            returned_transaction_count: returned.transaction_count,
            transaction_amount,
            transaction_quantity,
            transaction_count: total_transaction_count,
            cost,
            profit,
            profit_margin: margin_pct(profit, transaction_amount),
            year: year.to_string(),
        }
    }

    pub fn adjustment(&self, kind: AdjustmentKind) -> Adjustment {
        match kind {
            AdjustmentKind::ZeroPriced => Adjustment {
                amount: self.zero_priced_amount,
                quantity: self.zero_priced_quantity,
                transaction_count: self.zero_priced_transaction_count,
            },
            AdjustmentKind::Discounted => Adjustment {
                amount: self.discounted_amount,
                quantity: self.discounted_quantity,
                transaction_count: self.discounted_transaction_count,
            },
            AdjustmentKind::Offered => Adjustment {
                amount: self.offered_amount,
                quantity: self.offered_quantity,
                transaction_count: self.offered_transaction_count,
            },
            AdjustmentKind::Loss => Adjustment {
                amount: self.loss_amount,
                quantity: self.loss_quantity,
                transaction_count: self.loss_transaction_count,
            },
            AdjustmentKind::Returned => Adjustment {
                amount: self.returned_amount,
                quantity: self.returned_quantity,
                transaction_count: self.returned_transaction_count,
            },
        }
    }

    pub fn adjustments(&self) -> [Adjustment; 5] {
        AdjustmentKind::ALL.map(|k| self.adjustment(k))
    }

    /// Multiply every monetary column by `factor`.
    pub fn scale_money(&mut self, factor: f64) {
        self.total_amount *= factor;
        self.zero_priced_amount *= factor;
        self.discounted_amount *= factor;
        self.offered_amount *= factor;
        self.loss_amount *= factor;
        self.returned_amount *= factor;
        self.transaction_amount *= factor;
        self.cost *= factor;
        self.profit *= factor;
    }

    /// Net revenue per order; 0 without orders.
    pub fn avg_order_value(&self) -> f64 {
        if self.transaction_count > 0 {
            self.transaction_amount / self.transaction_count as f64
        } else {
            0.0
        }
    }

    pub fn recompute_margin(&mut self) {
        self.profit_margin = margin_pct(self.profit, self.transaction_amount);
    }
}

/// Profit as a percentage of revenue; 0 when there is no revenue.
pub fn margin_pct(profit: f64, revenue: f64) -> f64 {
    if revenue > 0.0 {
        profit / revenue * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_labels() {
        assert_eq!("BEER".parse::<Category>().unwrap(), Category::Beer);
        assert_eq!("wine".parse::<Category>().unwrap(), Category::Wine);
        assert_eq!("N/A".parse::<Category>().unwrap(), Category::NonAlcoholic);
        assert_eq!("na".parse::<Category>().unwrap(), Category::NonAlcoholic);
        assert_eq!("merch".parse::<Category>().unwrap(), Category::Merch);
        assert!("Desserts".parse::<Category>().is_err());
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("2023".parse::<Period>().unwrap(), Period::Y2023);
        assert_eq!("2024 Full Year".parse::<Period>().unwrap(), Period::Y2024);
        assert_eq!("2025 (up to March 5)".parse::<Period>().unwrap(), Period::Y2025);
        let err = "1999".parse::<Period>().unwrap_err().to_string();
        assert!(err.contains("Unknown period"), "got: {err}");
    }

    #[test]
    fn test_from_parts_derives_net_figures() {
        let adjustments = [
            Adjustment { amount: 0.0, quantity: 2, transaction_count: 1 },
            Adjustment { amount: -100.0, quantity: 5, transaction_count: 3 },
            Adjustment::default(),
            Adjustment { amount: -50.0, quantity: 1, transaction_count: 1 },
            Adjustment::default(),
        ];
        let r = TransactionRecord::from_parts(
            "Negroni", Some(Category::Cocktails), "2024", 1000.0, 100, 40, adjustments, 300.0,
        );
        assert_eq!(r.transaction_amount, 850.0);
        assert_eq!(r.transaction_quantity, 92);
        assert_eq!(r.transaction_count, 40);
        assert_eq!(r.profit, 550.0);
        assert!((r.profit_margin - 550.0 / 850.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_parts_floors_quantity_at_zero() {
        let adjustments = [
            Adjustment { amount: 0.0, quantity: 8, transaction_count: 1 },
            Adjustment { amount: -10.0, quantity: 8, transaction_count: 1 },
            Adjustment::default(),
            Adjustment::default(),
            Adjustment::default(),
        ];
        let r = TransactionRecord::from_parts(
            "Fries", Some(Category::Food), "2023", 100.0, 10, 5, adjustments, 40.0,
        );
        assert_eq!(r.transaction_quantity, 0);
    }

    #[test]
    fn test_avg_order_value_guards_zero_orders() {
        let mut r = TransactionRecord::from_parts(
            "Fries", Some(Category::Food), "2023", 100.0, 10, 4, [Adjustment::default(); 5], 40.0,
        );
        assert_eq!(r.avg_order_value(), 25.0);
        r.transaction_count = 0;
        assert_eq!(r.avg_order_value(), 0.0);
    }

    #[test]
    fn test_adjustments_follow_kind_order() {
        let adjustments = [
            Adjustment { amount: 0.0, quantity: 1, transaction_count: 1 },
            Adjustment { amount: -2.0, quantity: 2, transaction_count: 1 },
            Adjustment { amount: -3.0, quantity: 3, transaction_count: 1 },
            Adjustment { amount: -4.0, quantity: 4, transaction_count: 1 },
            Adjustment { amount: -5.0, quantity: 5, transaction_count: 1 },
        ];
        let r = TransactionRecord::from_parts(
            "Negroni", Some(Category::Cocktails), "2024", 100.0, 50, 10, adjustments, 10.0,
        );
        assert_eq!(r.adjustments(), adjustments);
        assert_eq!(r.adjustment(AdjustmentKind::Loss).amount, -4.0);
        assert_eq!(AdjustmentKind::Returned.label(), "Returned");
    }

    #[test]
    fn test_margin_zero_revenue() {
        assert_eq!(margin_pct(-20.0, 0.0), 0.0);
        assert_eq!(margin_pct(25.0, 100.0), 25.0);
    }
}
