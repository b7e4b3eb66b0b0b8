use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::PinebarError;
use crate::models::{margin_pct, AdjustmentKind, Category, Period, TransactionRecord};

fn ratio(num: f64, den: f64) -> f64 {
    if den != 0.0 {
        num / den
    } else {
        0.0
    }
}

fn pct(part: f64, whole: f64) -> f64 {
    ratio(part, whole) * 100.0
}

fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

// ---------------------------------------------------------------------------
// Metrics row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kpis {
    pub revenue: f64,
    pub profit: f64,
    pub orders: u64,
    pub margin: f64,
    pub avg_order_value: f64,
}

pub fn metrics_row(records: &[TransactionRecord]) -> Kpis {
    let revenue: f64 = records.iter().map(|r| r.transaction_amount).sum();
    let profit: f64 = records.iter().map(|r| r.profit).sum();
    let orders: u64 = records.iter().map(|r| r.transaction_count).sum();
    Kpis {
        revenue,
        profit,
        orders,
        margin: margin_pct(profit, revenue),
        avg_order_value: ratio(revenue, orders as f64),
    }
}

// ---------------------------------------------------------------------------
// Category grouping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
struct CategoryTotals {
    revenue: f64,
    profit: f64,
    cost: f64,
    orders: u64,
    quantity: u64,
    skus: BTreeSet<String>,
}

/// Sum per category. Unmapped rows form their own group, listed last.
fn group_by_category(records: &[TransactionRecord]) -> Vec<(Option<Category>, CategoryTotals)> {
    let mut groups: BTreeMap<Option<Category>, CategoryTotals> = BTreeMap::new();
    for r in records {
        let g = groups.entry(r.category).or_default();
        g.revenue += r.transaction_amount;
        g.profit += r.profit;
        g.cost += r.cost;
        g.orders += r.transaction_count;
        g.quantity += r.transaction_quantity;
        g.skus.insert(r.sku.clone());
    }
    let unmapped = groups.remove(&None);
    let mut out: Vec<_> = groups.into_iter().collect();
    if let Some(g) = unmapped {
        out.push((None, g));
    }
    out
}

// ---------------------------------------------------------------------------
// Category breakdown (overview)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBreakdownRow {
    pub category: Option<Category>,
    pub revenue: f64,
    pub orders: u64,
    pub profit: f64,
    pub cost: f64,
    pub margin: f64,
    pub avg_order_value: f64,
}

pub struct CategoryBreakdown {
    /// Revenue, highest first.
    pub by_revenue: Vec<CategoryBreakdownRow>,
    /// Profit, lowest first.
    pub by_profit: Vec<CategoryBreakdownRow>,
}

pub fn category_breakdown(records: &[TransactionRecord]) -> CategoryBreakdown {
    let rows: Vec<CategoryBreakdownRow> = group_by_category(records)
        .into_iter()
        .map(|(category, g)| CategoryBreakdownRow {
            category,
            revenue: g.revenue,
            orders: g.orders,
            profit: g.profit,
            cost: g.cost,
            margin: margin_pct(g.profit, g.revenue),
            avg_order_value: ratio(g.revenue, g.orders as f64),
        })
        .collect();

    let mut by_revenue = rows.clone();
    by_revenue.sort_by(|a, b| desc(a.revenue, b.revenue));
    let mut by_profit = rows;
    by_profit.sort_by(|a, b| a.profit.total_cmp(&b.profit));

    CategoryBreakdown { by_revenue, by_profit }
}

// ---------------------------------------------------------------------------
// Category performance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPerformanceRow {
    pub category: Option<Category>,
    pub revenue: f64,
    pub profit: f64,
    pub cost: f64,
    pub orders: u64,
    pub quantity: u64,
    pub products: usize,
    pub margin: f64,
    pub avg_order_value: f64,
    pub items_per_order: f64,
    pub revenue_per_item: f64,
    /// Share of the filtered table's revenue.
    pub revenue_share: f64,
    /// Share of the filtered table's profit.
    pub profit_share: f64,
}

pub fn category_performance(records: &[TransactionRecord]) -> Vec<CategoryPerformanceRow> {
    let total_revenue: f64 = records.iter().map(|r| r.transaction_amount).sum();
    let total_profit: f64 = records.iter().map(|r| r.profit).sum();

    let mut rows: Vec<CategoryPerformanceRow> = group_by_category(records)
        .into_iter()
        .map(|(category, g)| CategoryPerformanceRow {
            category,
            revenue: g.revenue,
            profit: g.profit,
            cost: g.cost,
            orders: g.orders,
            quantity: g.quantity,
            products: g.skus.len(),
            margin: margin_pct(g.profit, g.revenue),
            avg_order_value: ratio(g.revenue, g.orders as f64),
            items_per_order: ratio(g.quantity as f64, g.orders as f64),
            revenue_per_item: ratio(g.revenue, g.quantity as f64),
            revenue_share: pct(g.revenue, total_revenue),
            profit_share: pct(g.profit, total_profit),
        })
        .collect();
    rows.sort_by(|a, b| desc(a.revenue, b.revenue));
    rows
}

// ---------------------------------------------------------------------------
// Product performance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductMetric {
    Sales,
    Profit,
    Margin,
    Orders,
}

impl ProductMetric {
    pub fn value(&self, r: &TransactionRecord) -> f64 {
        match self {
            Self::Sales => r.transaction_amount,
            Self::Profit => r.profit,
            Self::Margin => r.profit_margin,
            Self::Orders => r.transaction_count as f64,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sales => "Sales",
            Self::Profit => "Profit",
            Self::Margin => "Profit Margin",
            Self::Orders => "Order Count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Top,
    Bottom,
}

/// Which metric to rank products by, and from which end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSort {
    pub metric: ProductMetric,
    pub direction: SortDirection,
}

impl Default for ProductSort {
    fn default() -> Self {
        Self {
            metric: ProductMetric::Sales,
            direction: SortDirection::Top,
        }
    }
}

impl ProductSort {
    pub const OPTIONS: [&'static str; 8] = [
        "most-sales",
        "least-sales",
        "most-profit",
        "least-profit",
        "highest-margin",
        "lowest-margin",
        "most-orders",
        "least-orders",
    ];

    pub fn key(&self) -> &'static str {
        match (self.direction, self.metric) {
            (SortDirection::Top, ProductMetric::Sales) => "most-sales",
            (SortDirection::Bottom, ProductMetric::Sales) => "least-sales",
            (SortDirection::Top, ProductMetric::Profit) => "most-profit",
            (SortDirection::Bottom, ProductMetric::Profit) => "least-profit",
            (SortDirection::Top, ProductMetric::Margin) => "highest-margin",
            (SortDirection::Bottom, ProductMetric::Margin) => "lowest-margin",
            (SortDirection::Top, ProductMetric::Orders) => "most-orders",
            (SortDirection::Bottom, ProductMetric::Orders) => "least-orders",
        }
    }

    pub fn title(&self, n: usize) -> String {
        let end = match self.direction {
            SortDirection::Top => "Top",
            SortDirection::Bottom => "Bottom",
        };
        format!("{end} {n} Products by {}", self.metric.label())
    }
}

impl fmt::Display for ProductSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ProductSort {
    type Err = PinebarError;

    /// Accepts `most-sales` as well as the menu label `Most Sales`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || {
            PinebarError::UnknownSort(format!("{s} (expected one of: {})", Self::OPTIONS.join(", ")))
        };
        let normalized = s.trim().to_lowercase().replace([' ', '_'], "-");
        let (end, metric) = normalized
            .split_once('-')
            .ok_or_else(unknown)?;
        let metric = match metric {
            "sales" => ProductMetric::Sales,
            "profit" => ProductMetric::Profit,
            "margin" => ProductMetric::Margin,
            "orders" => ProductMetric::Orders,
            _ => return Err(unknown()),
        };
        let direction = match (end, metric) {
            ("highest", ProductMetric::Margin) => SortDirection::Top,
            ("lowest", ProductMetric::Margin) => SortDirection::Bottom,
            ("most", m) if m != ProductMetric::Margin => SortDirection::Top,
            ("least", m) if m != ProductMetric::Margin => SortDirection::Bottom,
            _ => return Err(unknown()),
        };
        Ok(Self { metric, direction })
    }
}

/// The first `n` products after sorting on the chosen metric. Ties keep
/// table order.
pub fn product_ranking(
    records: &[TransactionRecord],
    sort: ProductSort,
    n: usize,
) -> Vec<TransactionRecord> {
    let mut rows = records.to_vec();
    match sort.direction {
        SortDirection::Top => {
            rows.sort_by(|a, b| desc(sort.metric.value(a), sort.metric.value(b)))
        }
        SortDirection::Bottom => {
            rows.sort_by(|a, b| sort.metric.value(a).total_cmp(&sort.metric.value(b)))
        }
    }
    rows.truncate(n);
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopSeller {
    pub category: Option<Category>,
    pub sku: String,
    pub revenue: f64,
    pub profit: f64,
    pub margin: f64,
}

/// Highest-revenue product in each category.
pub fn top_sellers(records: &[TransactionRecord]) -> Vec<TopSeller> {
    let mut best: BTreeMap<Option<Category>, &TransactionRecord> = BTreeMap::new();
    for r in records {
        let replace = best
            .get(&r.category)
            .map_or(true, |cur| r.transaction_amount > cur.transaction_amount);
        if replace {
            best.insert(r.category, r);
        }
    }
    let mut sellers: Vec<TopSeller> = best
        .into_values()
        .map(|r| TopSeller {
            category: r.category,
            sku: r.sku.clone(),
            revenue: r.transaction_amount,
            profit: r.profit,
            margin: r.profit_margin,
        })
        .collect();
    // Unmapped last, as in grouping.
    sellers.sort_by_key(|s| s.category.is_none());
    sellers
}

// ---------------------------------------------------------------------------
// Profitability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MarginStats {
    pub category: Option<Category>,
    pub avg_margin: f64,
    pub min_margin: f64,
    pub max_margin: f64,
    /// Sample standard deviation; 0 below two products.
    pub std_dev: f64,
    pub revenue: f64,
    pub profit: f64,
    pub overall_margin: f64,
}

pub struct ProfitabilityReport {
    pub total_profit: f64,
    pub overall_margin: f64,
    pub profit_per_order: f64,
    /// Overall margin, highest first.
    pub categories: Vec<MarginStats>,
    pub high_threshold: f64,
    pub low_threshold: f64,
    pub high_margin: Vec<TransactionRecord>,
    pub low_margin: Vec<TransactionRecord>,
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

pub fn margin_stats(records: &[TransactionRecord]) -> Vec<MarginStats> {
    let mut margins: BTreeMap<Option<Category>, Vec<f64>> = BTreeMap::new();
    for r in records {
        margins.entry(r.category).or_default().push(r.profit_margin);
    }

    let mut stats: Vec<MarginStats> = group_by_category(records)
        .into_iter()
        .map(|(category, g)| {
            let m = margins.remove(&category).unwrap_or_default();
            MarginStats {
                category,
                avg_margin: ratio(m.iter().sum(), m.len() as f64),
                min_margin: m.iter().copied().fold(f64::INFINITY, f64::min),
                max_margin: m.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                std_dev: std_dev(&m),
                revenue: g.revenue,
                profit: g.profit,
                overall_margin: margin_pct(g.profit, g.revenue),
            }
        })
        .collect();
    stats.sort_by(|a, b| desc(a.overall_margin, b.overall_margin));
    stats
}

pub fn profitability(records: &[TransactionRecord]) -> ProfitabilityReport {
    let kpis = metrics_row(records);
    let margins: Vec<f64> = records.iter().map(|r| r.profit_margin).collect();
    let high_threshold = quantile(&margins, 0.9);
    let low_threshold = quantile(&margins, 0.1);

    let mut high_margin: Vec<TransactionRecord> = records
        .iter()
        .filter(|r| r.profit_margin >= high_threshold)
        .cloned()
        .collect();
    high_margin.sort_by(|a, b| desc(a.profit, b.profit));
    high_margin.truncate(5);

    let mut low_margin: Vec<TransactionRecord> = records
        .iter()
        .filter(|r| r.profit_margin <= low_threshold)
        .cloned()
        .collect();
    low_margin.sort_by(|a, b| a.profit.total_cmp(&b.profit));
    low_margin.truncate(5);

    ProfitabilityReport {
        total_profit: kpis.profit,
        overall_margin: kpis.margin,
        profit_per_order: ratio(kpis.profit, kpis.orders as f64),
        categories: margin_stats(records),
        high_threshold,
        low_threshold,
        high_margin,
        low_margin,
    }
}

// ---------------------------------------------------------------------------
// Sales analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SalesCategoryRow {
    pub category: Option<Category>,
    pub revenue: f64,
    pub quantity: u64,
    pub orders: u64,
    pub sales_pct: f64,
    pub norm_revenue: f64,
    pub norm_quantity: f64,
    pub norm_orders: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductShare {
    pub sku: String,
    pub revenue: f64,
    pub margin: f64,
    /// Share of the parent category's revenue.
    pub share: f64,
}

/// One node of the category → product revenue hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: Option<Category>,
    pub revenue: f64,
    pub share: f64,
    pub products: Vec<ProductShare>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearRow {
    pub year: String,
    pub revenue: f64,
    pub orders: u64,
    pub profit: f64,
    /// Revenue change vs. the previous listed year.
    pub revenue_change: Option<f64>,
}

/// Summed adjustment bucket across the table.
#[derive(Debug, Clone, PartialEq)]
pub struct DeductionRow {
    pub kind: AdjustmentKind,
    pub amount: f64,
    pub quantity: u64,
    pub transactions: u64,
    /// Amount as a share of gross total amount; negative for deductions.
    pub share_of_gross: f64,
}

pub fn deductions(records: &[TransactionRecord]) -> Vec<DeductionRow> {
    let gross: f64 = records.iter().map(|r| r.total_amount).sum();
    let mut rows: Vec<DeductionRow> = AdjustmentKind::ALL
        .iter()
        .map(|&kind| DeductionRow {
            kind,
            amount: 0.0,
            quantity: 0,
            transactions: 0,
            share_of_gross: 0.0,
        })
        .collect();
    for r in records {
        for (row, adj) in rows.iter_mut().zip(r.adjustments()) {
            row.amount += adj.amount;
            row.quantity += adj.quantity;
            row.transactions += adj.transaction_count;
        }
    }
    for row in &mut rows {
        row.share_of_gross = pct(row.amount, gross);
    }
    rows
}

pub struct SalesReport {
    pub revenue: f64,
    pub orders: u64,
    pub avg_order_value: f64,
    pub items_sold: u64,
    pub categories: Vec<SalesCategoryRow>,
    pub breakdown: Vec<CategoryShare>,
    pub median_margin: f64,
    pub deductions: Vec<DeductionRow>,
    /// Empty unless the table spans more than one year.
    pub years: Vec<YearRow>,
}

fn change_pct(current: f64, previous: f64) -> Option<f64> {
    if previous > 0.0 {
        Some((current - previous) / previous * 100.0)
    } else {
        None
    }
}

pub fn year_over_year(records: &[TransactionRecord]) -> Vec<YearRow> {
    let mut years: BTreeMap<&str, (f64, u64, f64)> = BTreeMap::new();
    for r in records {
        let y = years.entry(r.year.as_str()).or_default();
        y.0 += r.transaction_amount;
        y.1 += r.transaction_count;
        y.2 += r.profit;
    }
    if years.len() < 2 {
        return Vec::new();
    }

    let mut rows = Vec::new();
    let mut previous: Option<f64> = None;
    for (year, (revenue, orders, profit)) in years {
        rows.push(YearRow {
            year: year.to_string(),
            revenue,
            orders,
            profit,
            revenue_change: previous.and_then(|p| change_pct(revenue, p)),
        });
        previous = Some(revenue);
    }
    rows
}

pub fn sales_analysis(records: &[TransactionRecord]) -> SalesReport {
    let kpis = metrics_row(records);
    let items_sold: u64 = records.iter().map(|r| r.transaction_quantity).sum();
    let groups = group_by_category(records);

    let sum_revenue: f64 = groups.iter().map(|(_, g)| g.revenue).sum();
    let sum_quantity: u64 = groups.iter().map(|(_, g)| g.quantity).sum();
    let sum_orders: u64 = groups.iter().map(|(_, g)| g.orders).sum();

    let mut categories: Vec<SalesCategoryRow> = groups
        .iter()
        .map(|(category, g)| SalesCategoryRow {
            category: *category,
            revenue: g.revenue,
            quantity: g.quantity,
            orders: g.orders,
            sales_pct: pct(g.revenue, kpis.revenue),
            norm_revenue: pct(g.revenue, sum_revenue),
            norm_quantity: pct(g.quantity as f64, sum_quantity as f64),
            norm_orders: pct(g.orders as f64, sum_orders as f64),
        })
        .collect();
    categories.sort_by(|a, b| desc(a.revenue, b.revenue));

    let mut breakdown: Vec<CategoryShare> = groups
        .iter()
        .map(|(category, g)| {
            let mut products: Vec<ProductShare> = records
                .iter()
                .filter(|r| r.category == *category)
                .map(|r| ProductShare {
                    sku: r.sku.clone(),
                    revenue: r.transaction_amount,
                    margin: r.profit_margin,
                    share: pct(r.transaction_amount, g.revenue),
                })
                .collect();
            products.sort_by(|a, b| desc(a.revenue, b.revenue));
            CategoryShare {
                category: *category,
                revenue: g.revenue,
                share: pct(g.revenue, kpis.revenue),
                products,
            }
        })
        .collect();
    breakdown.sort_by(|a, b| desc(a.revenue, b.revenue));

    let margins: Vec<f64> = records.iter().map(|r| r.profit_margin).collect();

    SalesReport {
        revenue: kpis.revenue,
        orders: kpis.orders,
        avg_order_value: kpis.avg_order_value,
        items_sold,
        categories,
        breakdown,
        median_margin: quantile(&margins, 0.5),
        deductions: deductions(records),
        years: year_over_year(records),
    }
}

// ---------------------------------------------------------------------------
// Monthly trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthPoint {
    pub year: String,
    pub month: u32,
    pub revenue: f64,
    /// Change vs. the same month of the previous year.
    pub yoy_change: Option<f64>,
}

pub struct TrendReport {
    pub points: Vec<MonthPoint>,
}

impl TrendReport {
    pub fn year_total(&self, year: &str) -> f64 {
        self.points.iter().filter(|p| p.year == year).map(|p| p.revenue).sum()
    }
}

/// Seasonal revenue multiplier for a calendar month.
pub fn seasonal_multiplier(month: u32) -> f64 {
    match month {
        1 => 0.7,
        6..=8 => 1.3,
        11 | 12 => 1.4,
        _ => 1.0,
    }
}

/// Added to the period seed for the trend jitter stream.
const TREND_SEED_OFFSET: u64 = 7_919;

/// Spread each period's revenue over its covered months.
///
/// Monthly weights combine the seasonal multiplier, the fraction of the month
/// the period covers and a seeded ±10% jitter; the months of a year always sum
/// to that year's revenue in `records`.
pub fn monthly_trend(records: &[TransactionRecord], periods: &[Period]) -> TrendReport {
    let mut ordered: Vec<Period> = periods.to_vec();
    ordered.sort();
    ordered.dedup();

    let mut points: Vec<MonthPoint> = Vec::new();
    for period in ordered {
        let annual: f64 = records
            .iter()
            .filter(|r| r.year == period.year())
            .map(|r| r.transaction_amount)
            .sum();

        let mut rng = StdRng::seed_from_u64(period.seed() + TREND_SEED_OFFSET);
        let weights: Vec<(u32, f64)> = period
            .covered_months()
            .iter()
            .map(|&(month, fraction)| {
                let jitter = rng.gen_range(0.9..1.1);
                (month, seasonal_multiplier(month) * fraction * jitter)
            })
            .collect();
        let weight_sum: f64 = weights.iter().map(|(_, w)| w).sum();

        for (month, w) in weights {
            let revenue = annual * ratio(w, weight_sum);
            let yoy_change = period.previous().and_then(|prev| {
                points
                    .iter()
                    .find(|p| p.year == prev.year() && p.month == month)
                    .and_then(|p| change_pct(revenue, p.revenue))
            });
            points.push(MonthPoint {
                year: period.year().to_string(),
                month,
                revenue,
                yoy_change,
            });
        }
    }

    TrendReport { points }
}
