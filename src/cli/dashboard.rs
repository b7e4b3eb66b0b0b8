use std::path::PathBuf;

use chrono::Month;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::catalog::Catalog;
use crate::chart::{grouped_hbar, hbar, range_strip, BAR_WIDTH};
use crate::cli::{DashboardArgs, SourceKind};
use crate::error::Result;
use crate::filter::{filter, CategoryFilter};
use crate::fmt::{change, compact, count, money, money_whole, pct};
use crate::generator::rescale_to_target;
use crate::loader::TableCache;
use crate::models::{category_label, Period, TransactionRecord};
use crate::reports::{self, Kpis, ProductSort};
use crate::selection::{PeriodChoice, Selection, Source, View};
use crate::settings::{load_settings, shellexpand_path, Settings};

/// Resolve command-line arguments against saved settings.
pub fn build_selection(args: DashboardArgs, settings: &Settings) -> Result<Selection> {
    let period = match args.period {
        Some(p) => p,
        None => settings.default_period.parse()?,
    };
    let source = match args.source {
        SourceKind::Synthetic => Source::Synthetic,
        SourceKind::Csv => {
            let dir = args.data_dir.unwrap_or_else(|| settings.data_dir.clone());
            Source::Csv(PathBuf::from(shellexpand_path(&dir)))
        }
    };
    let target_revenue = match period {
        PeriodChoice::Single(p) => args.target_revenue.or_else(|| settings.target_for(p)),
        PeriodChoice::AllTime => args.target_revenue,
    };
    Ok(Selection {
        period,
        categories: CategoryFilter::from_names(&args.categories)?,
        view: args.view,
        sort: args.sort,
        source,
        target_revenue,
        top_n: args.top.unwrap_or(settings.top_n),
    })
}

/// Per-table rescale target for `period` under `selection`.
fn table_target(selection: &Selection, settings: &Settings, period: Period) -> Option<f64> {
    match selection.period {
        PeriodChoice::Single(p) if p == period => selection.target_revenue,
        _ => settings.target_for(period),
    }
}

/// Concatenate the tables for `periods`, unfiltered.
fn concat_tables(
    cache: &mut TableCache,
    selection: &Selection,
    settings: &Settings,
    periods: &[Period],
) -> Vec<TransactionRecord> {
    let mut records = Vec::new();
    for &p in periods {
        let target = table_target(selection, settings, p);
        records.extend_from_slice(cache.get_or_load(&selection.source, p, target));
    }
    records
}

/// Load and filter the table the selection asks for.
pub fn load_table(cache: &mut TableCache, selection: &Selection, settings: &Settings) -> Vec<TransactionRecord> {
    let mut records = concat_tables(cache, selection, settings, &selection.period.periods());
    if selection.period == PeriodChoice::AllTime {
        if let Some(target) = selection.target_revenue {
            rescale_to_target(&mut records, target);
        }
    }
    filter(&records, &selection.categories)
}

/// Periods the trend view compares: the selection plus the year before it.
fn trend_periods(selection: &Selection) -> Vec<Period> {
    match selection.period {
        PeriodChoice::Single(p) => p.previous().into_iter().chain([p]).collect(),
        PeriodChoice::AllTime => Period::ALL.to_vec(),
    }
}

/// Monthly trend for the selection. All-time reuses the loaded table so the
/// trend matches the KPI row; a single period adds the year before it.
pub fn load_trend(
    cache: &mut TableCache,
    selection: &Selection,
    settings: &Settings,
    records: &[TransactionRecord],
) -> reports::TrendReport {
    let periods = trend_periods(selection);
    match selection.period {
        PeriodChoice::AllTime => reports::monthly_trend(records, &periods),
        PeriodChoice::Single(_) => {
            let table = concat_tables(cache, selection, settings, &periods);
            reports::monthly_trend(&filter(&table, &selection.categories), &periods)
        }
    }
}

// ---------------------------------------------------------------------------
// Pure formatting functions (report data → String)
// ---------------------------------------------------------------------------

pub fn format_header(selection: &Selection) -> String {
    format!(
        "{}\n{} · Categories: {} · Source: {}\n",
        format!("Pine Bar Analytics · {}", selection.view.title()).bold(),
        selection.period.label(),
        selection.categories.describe(),
        selection.source.describe()
    )
}

pub fn format_kpis(kpis: &Kpis) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        "Total Revenue",
        "Total Profit",
        "Total Orders",
        "Profit Margin",
        "Avg Order Value",
    ]);
    table.add_row(vec![
        Cell::new(money_whole(kpis.revenue)),
        Cell::new(money_whole(kpis.profit)),
        Cell::new(count(kpis.orders)),
        Cell::new(pct(kpis.margin)),
        Cell::new(money(kpis.avg_order_value)),
    ]);
    format!("{table}\n")
}

pub fn format_overview(records: &[TransactionRecord]) -> String {
    let breakdown = reports::category_breakdown(records);
    let mut out = String::new();

    let revenue: Vec<(String, f64)> = breakdown
        .by_revenue
        .iter()
        .map(|r| (category_label(r.category).to_string(), r.revenue))
        .collect();
    out.push_str(&hbar("Revenue by Category", &revenue, BAR_WIDTH, compact));
    out.push('\n');

    let profit: Vec<(String, f64)> = breakdown
        .by_profit
        .iter()
        .map(|r| (category_label(r.category).to_string(), r.profit))
        .collect();
    out.push_str(&hbar("Profit by Category", &profit, BAR_WIDTH, compact));
    out.push('\n');

    let mut table = Table::new();
    table.set_header(vec!["Category", "Revenue", "Orders", "Profit", "Margin", "Avg Order"]);
    for r in &breakdown.by_revenue {
        table.add_row(vec![
            Cell::new(category_label(r.category)),
            Cell::new(money_whole(r.revenue)),
            Cell::new(count(r.orders)),
            Cell::new(money_whole(r.profit)),
            Cell::new(pct(r.margin)),
            Cell::new(money(r.avg_order_value)),
        ]);
    }
    out.push_str(&format!("{}\n{table}\n\n", "Category Breakdown".bold()));

    let mut sellers = Table::new();
    sellers.set_header(vec!["Category", "Top Seller", "Revenue", "Profit", "Margin"]);
    for s in reports::top_sellers(records) {
        sellers.add_row(vec![
            Cell::new(category_label(s.category)),
            Cell::new(&s.sku),
            Cell::new(money_whole(s.revenue)),
            Cell::new(money_whole(s.profit)),
            Cell::new(pct(s.margin)),
        ]);
    }
    out.push_str(&format!("{}\n{sellers}\n", "Top Sellers by Category".bold()));
    out
}

pub fn format_sales(data: &reports::SalesReport) -> String {
    let mut out = format!(
        "Revenue {} · Orders {} · Avg Order {} · Items Sold {} · Median Margin {}\n\n",
        money_whole(data.revenue),
        count(data.orders),
        money(data.avg_order_value),
        count(data.items_sold),
        pct(data.median_margin)
    );

    let labels: Vec<String> = data
        .categories
        .iter()
        .map(|c| category_label(c.category).to_string())
        .collect();
    let series: Vec<(&str, Vec<f64>)> = vec![
        ("Revenue", data.categories.iter().map(|c| c.norm_revenue).collect()),
        ("Quantity", data.categories.iter().map(|c| c.norm_quantity).collect()),
        ("Orders", data.categories.iter().map(|c| c.norm_orders).collect()),
    ];
    out.push_str(&grouped_hbar(
        "Category Mix (% of each total)",
        &labels,
        &series,
        BAR_WIDTH,
        pct,
    ));
    out.push('\n');

    let mut table = Table::new();
    table.set_header(vec!["Category", "Revenue", "Quantity", "Orders", "% of Sales"]);
    for c in &data.categories {
        table.add_row(vec![
            Cell::new(category_label(c.category)),
            Cell::new(money_whole(c.revenue)),
            Cell::new(count(c.quantity)),
            Cell::new(count(c.orders)),
            Cell::new(pct(c.sales_pct)),
        ]);
    }
    out.push_str(&format!("{table}\n\n"));

    out.push_str(&format!("{}\n", "Revenue Breakdown".bold()));
    for node in &data.breakdown {
        out.push_str(&format!(
            "  {} {} ({})\n",
            category_label(node.category).bold(),
            money_whole(node.revenue),
            pct(node.share)
        ));
        for p in node.products.iter().take(5) {
            out.push_str(&format!(
                "    {:<28} {:>10} {:>7}  margin {}\n",
                p.sku,
                money_whole(p.revenue),
                pct(p.share),
                pct(p.margin)
            ));
        }
        if node.products.len() > 5 {
            out.push_str(&format!("    … {} more\n", node.products.len() - 5));
        }
    }

    let mut deductions = Table::new();
    deductions.set_header(vec!["Adjustment", "Amount", "Quantity", "Transactions", "% of Gross"]);
    for d in &data.deductions {
        deductions.add_row(vec![
            Cell::new(d.kind.label()),
            Cell::new(money_whole(d.amount)),
            Cell::new(count(d.quantity)),
            Cell::new(count(d.transactions)),
            Cell::new(pct(d.share_of_gross)),
        ]);
    }
    out.push_str(&format!("\n{}\n{deductions}\n", "Deductions".bold()));

    if !data.years.is_empty() {
        let mut years = Table::new();
        years.set_header(vec!["Year", "Revenue", "Orders", "Profit", "Revenue Change"]);
        for y in &data.years {
            years.add_row(vec![
                Cell::new(&y.year),
                Cell::new(money_whole(y.revenue)),
                Cell::new(count(y.orders)),
                Cell::new(money_whole(y.profit)),
                Cell::new(change(y.revenue_change)),
            ]);
        }
        out.push_str(&format!("\n{}\n{years}\n", "Year over Year".bold()));
    }
    out
}

fn product_table(rows: &[TransactionRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Product", "Category", "Sales", "Profit", "Margin", "Orders", "Avg Order",
    ]);
    for r in rows {
        table.add_row(vec![
            Cell::new(&r.sku),
            Cell::new(category_label(r.category)),
            Cell::new(money_whole(r.transaction_amount)),
            Cell::new(money_whole(r.profit)),
            Cell::new(pct(r.profit_margin)),
            Cell::new(count(r.transaction_count)),
            Cell::new(money(r.avg_order_value())),
        ]);
    }
    table
}

pub fn format_profitability(data: &reports::ProfitabilityReport) -> String {
    let mut out = format!(
        "Total Profit {} · Overall Margin {} · Profit per Order {}\n\n",
        money_whole(data.total_profit),
        pct(data.overall_margin),
        money(data.profit_per_order)
    );

    let lo = data.categories.iter().map(|c| c.min_margin).fold(f64::INFINITY, f64::min);
    let hi = data.categories.iter().map(|c| c.max_margin).fold(f64::NEG_INFINITY, f64::max);

    let mut table = Table::new();
    table.set_header(vec![
        "Category", "Margin", "Avg", "Min", "Max", "Std Dev", "Revenue", "Profit", "Range",
    ]);
    for c in &data.categories {
        table.add_row(vec![
            Cell::new(category_label(c.category)),
            Cell::new(pct(c.overall_margin)),
            Cell::new(pct(c.avg_margin)),
            Cell::new(pct(c.min_margin)),
            Cell::new(pct(c.max_margin)),
            Cell::new(format!("{:.1}", c.std_dev)),
            Cell::new(money_whole(c.revenue)),
            Cell::new(money_whole(c.profit)),
            Cell::new(range_strip(c.min_margin, c.avg_margin, c.max_margin, lo, hi, 24)),
        ]);
    }
    out.push_str(&format!("{}\n{table}\n\n", "Margin by Category".bold()));

    out.push_str(&format!(
        "{}\n{}\n\n",
        format!("High-Margin Products (margin ≥ {})", pct(data.high_threshold)).green().bold(),
        product_table(&data.high_margin)
    ));
    out.push_str(&format!(
        "{}\n{}\n",
        format!("Low-Margin Products (margin ≤ {})", pct(data.low_threshold)).red().bold(),
        product_table(&data.low_margin)
    ));
    out
}

pub fn format_category(rows: &[reports::CategoryPerformanceRow]) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        "Category",
        "Revenue",
        "Profit",
        "Margin",
        "Orders",
        "Quantity",
        "Products",
        "Avg Order",
        "Items/Order",
        "Rev/Item",
        "Rev Share",
        "Profit Share",
    ]);
    for r in rows {
        table.add_row(vec![
            Cell::new(category_label(r.category)),
            Cell::new(money_whole(r.revenue)),
            Cell::new(money_whole(r.profit)),
            Cell::new(pct(r.margin)),
            Cell::new(count(r.orders)),
            Cell::new(count(r.quantity)),
            Cell::new(r.products),
            Cell::new(money(r.avg_order_value)),
            Cell::new(format!("{:.2}", r.items_per_order)),
            Cell::new(money(r.revenue_per_item)),
            Cell::new(pct(r.revenue_share)),
            Cell::new(pct(r.profit_share)),
        ]);
    }

    let shares: Vec<(String, f64)> = rows
        .iter()
        .map(|r| (category_label(r.category).to_string(), r.revenue_share))
        .collect();
    let margins: Vec<(String, f64)> = rows
        .iter()
        .map(|r| (category_label(r.category).to_string(), r.margin))
        .collect();

    format!(
        "{table}\n\n{}\n{}",
        hbar("Revenue Share", &shares, BAR_WIDTH, pct),
        hbar("Profit Margin", &margins, BAR_WIDTH, pct)
    )
}

pub fn format_product(records: &[TransactionRecord], sort: ProductSort, n: usize) -> String {
    let ranked = reports::product_ranking(records, sort, n);
    let bars: Vec<(String, f64)> = ranked
        .iter()
        .map(|r| (r.sku.clone(), sort.metric.value(r)))
        .collect();
    let chart = match sort.metric {
        reports::ProductMetric::Sales | reports::ProductMetric::Profit => {
            hbar(&sort.title(n), &bars, BAR_WIDTH, compact)
        }
        reports::ProductMetric::Margin => hbar(&sort.title(n), &bars, BAR_WIDTH, pct),
        reports::ProductMetric::Orders => {
            hbar(&sort.title(n), &bars, BAR_WIDTH, |v| count(v as u64))
        }
    };
    format!("{chart}\n{}\n", product_table(&ranked))
}

fn month_abbrev(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name()[..3].to_string())
        .unwrap_or_else(|| month.to_string())
}

pub fn format_trend(data: &reports::TrendReport) -> String {
    let mut years: Vec<&str> = data.points.iter().map(|p| p.year.as_str()).collect();
    years.dedup();

    let mut header = vec!["Month".to_string()];
    for y in &years {
        header.push(y.to_string());
        header.push(format!("{y} YoY"));
    }
    let mut table = Table::new();
    table.set_header(header);
    for month in 1..=12u32 {
        if !data.points.iter().any(|p| p.month == month) {
            continue;
        }
        let mut row = vec![Cell::new(month_abbrev(month))];
        for y in &years {
            match data.points.iter().find(|p| p.year == *y && p.month == month) {
                Some(p) => {
                    row.push(Cell::new(money_whole(p.revenue)));
                    row.push(Cell::new(change(p.yoy_change)));
                }
                None => {
                    row.push(Cell::new(""));
                    row.push(Cell::new(""));
                }
            }
        }
        table.add_row(row);
    }
    let mut totals = vec![Cell::new("Total".bold())];
    for y in &years {
        totals.push(Cell::new(money_whole(data.year_total(y))));
        totals.push(Cell::new(""));
    }
    table.add_row(totals);

    let mut out = format!("{table}\n\n");
    if let Some(latest) = years.last() {
        let bars: Vec<(String, f64)> = data
            .points
            .iter()
            .filter(|p| p.year == *latest)
            .map(|p| (month_abbrev(p.month), p.revenue))
            .collect();
        out.push_str(&hbar(&format!("Monthly Revenue {latest}"), &bars, BAR_WIDTH, compact));
    }
    out
}

/// Render the selected view over an already-filtered table.
pub fn render(selection: &Selection, records: &[TransactionRecord], trend: &reports::TrendReport) -> String {
    let mut out = format_header(selection);
    out.push('\n');
    out.push_str(&format_kpis(&reports::metrics_row(records)));
    out.push('\n');
    let body = match selection.view {
        View::Overview => format!(
            "{}\n{}",
            format_overview(records),
            format_product(records, selection.sort, selection.top_n)
        ),
        View::Sales => format_sales(&reports::sales_analysis(records)),
        View::Profitability => format_profitability(&reports::profitability(records)),
        View::Category => format_category(&reports::category_performance(records)),
        View::Product => format_product(records, selection.sort, selection.top_n),
        View::Trend => format_trend(trend),
    };
    out.push_str(&body);
    out
}

pub fn run(args: DashboardArgs) -> Result<()> {
    let settings = load_settings();
    let selection = build_selection(args, &settings)?;
    tracing::debug!(?selection, "dashboard selection");

    let mut cache = TableCache::new(Catalog::standard());
    let records = load_table(&mut cache, &selection, &settings);

    let trend = if selection.view == View::Trend {
        load_trend(&mut cache, &selection, &settings, &records)
    } else {
        reports::TrendReport { points: Vec::new() }
    };
    tracing::debug!(tables = cache.len(), rows = records.len(), "tables loaded");

    for warning in cache.take_warnings() {
        eprintln!("{}", format!("Warning: {warning}").yellow());
    }
    print!("{}", render(&selection, &records, &trend));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn plain() {
        colored::control::set_override(false);
    }

    fn table_for(selection: &Selection) -> Vec<TransactionRecord> {
        let mut cache = TableCache::new(Catalog::standard());
        load_table(&mut cache, selection, &Settings::default())
    }

    #[test]
    fn test_build_selection_uses_settings_defaults() {
        let mut settings = Settings {
            default_period: "2023".to_string(),
            top_n: 7,
            ..Settings::default()
        };
        settings.target_revenue.insert("2023".to_string(), 900_000.0);
        let s = build_selection(DashboardArgs::default(), &settings).unwrap();
        assert_eq!(s.period, PeriodChoice::Single(Period::Y2023));
        assert_eq!(s.top_n, 7);
        assert_eq!(s.target_revenue, Some(900_000.0));
        assert_eq!(s.categories, CategoryFilter::All);
    }

    #[test]
    fn test_build_selection_rejects_unknown_category() {
        let args = DashboardArgs {
            categories: vec!["Desserts".to_string()],
            ..DashboardArgs::default()
        };
        assert!(build_selection(args, &Settings::default()).is_err());
    }

    #[test]
    fn test_csv_source_uses_data_dir_flag() {
        let args = DashboardArgs {
            source: SourceKind::Csv,
            data_dir: Some("/tmp/pinebar-exports".to_string()),
            ..DashboardArgs::default()
        };
        let s = build_selection(args, &Settings::default()).unwrap();
        assert_eq!(s.source, Source::Csv(PathBuf::from("/tmp/pinebar-exports")));
    }

    #[test]
    fn test_all_time_concatenates_periods() {
        let selection = Selection {
            period: PeriodChoice::AllTime,
            ..Selection::default()
        };
        let all = table_for(&selection);
        let single: usize = Period::ALL
            .iter()
            .map(|&p| {
                table_for(&Selection {
                    period: PeriodChoice::Single(p),
                    ..Selection::default()
                })
                .len()
            })
            .sum();
        assert_eq!(all.len(), single);
    }

    #[test]
    fn test_all_time_target_rescales_combined_table() {
        let selection = Selection {
            period: PeriodChoice::AllTime,
            target_revenue: Some(3_000_000.0),
            ..Selection::default()
        };
        let total: f64 = table_for(&selection).iter().map(|r| r.transaction_amount).sum();
        assert!((total - 3_000_000.0).abs() < 1e-4);
    }

    #[test]
    fn test_trend_periods_include_previous_year() {
        let selection = Selection {
            period: PeriodChoice::Single(Period::Y2025),
            ..Selection::default()
        };
        assert_eq!(trend_periods(&selection), vec![Period::Y2024, Period::Y2025]);
        let first = Selection {
            period: PeriodChoice::Single(Period::Y2023),
            ..Selection::default()
        };
        assert_eq!(trend_periods(&first), vec![Period::Y2023]);
    }

    #[test]
    fn test_render_every_view() {
        plain();
        let mut selection = Selection::default();
        let records = table_for(&selection);
        let trend = reports::monthly_trend(&records, &[Period::Y2024]);
        for (view, marker) in [
            (View::Overview, "Revenue by Category"),
            (View::Sales, "Deductions"),
            (View::Profitability, "Margin by Category"),
            (View::Category, "Revenue Share"),
            (View::Product, "Top 10 Products by Sales"),
            (View::Trend, "Monthly Revenue 2024"),
        ] {
            selection.view = view;
            let out = render(&selection, &records, &trend);
            assert!(out.contains("Total Revenue"), "{view:?}");
            assert!(out.contains(marker), "{view:?}: missing {marker}");
        }
    }

    #[test]
    fn test_overview_follows_product_sort() {
        plain();
        let mut selection = Selection::default();
        let records = table_for(&selection);
        let trend = reports::TrendReport { points: Vec::new() };
        let most = render(&selection, &records, &trend);
        assert!(most.contains("Top 10 Products by Sales"));

        selection.sort = "least-profit".parse().unwrap();
        let least = render(&selection, &records, &trend);
        assert!(least.contains("Bottom 10 Products by Profit"));
        assert_ne!(most, least);

        selection.top_n = 3;
        assert!(render(&selection, &records, &trend).contains("Bottom 3 Products by Profit"));
    }

    #[test]
    fn test_all_time_trend_matches_rescaled_kpis() {
        let settings = Settings::default();
        let selection = Selection {
            period: PeriodChoice::AllTime,
            view: View::Trend,
            target_revenue: Some(3_000_000.0),
            ..Selection::default()
        };
        let mut cache = TableCache::new(Catalog::standard());
        let records = load_table(&mut cache, &selection, &settings);
        let trend = load_trend(&mut cache, &selection, &settings, &records);
        let kpi = reports::metrics_row(&records).revenue;
        let months: f64 = trend.points.iter().map(|p| p.revenue).sum();
        assert!((kpi - 3_000_000.0).abs() < 1e-4);
        assert!((months - kpi).abs() < 1e-4, "kpi {kpi} vs trend {months}");
    }

    #[test]
    fn test_single_period_trend_adds_previous_year() {
        let settings = Settings::default();
        let selection = Selection {
            period: PeriodChoice::Single(Period::Y2024),
            view: View::Trend,
            ..Selection::default()
        };
        let mut cache = TableCache::new(Catalog::standard());
        let records = load_table(&mut cache, &selection, &settings);
        let trend = load_trend(&mut cache, &selection, &settings, &records);
        let kpi = reports::metrics_row(&records).revenue;
        assert!((trend.year_total("2024") - kpi).abs() < 1e-6);
        assert!(trend.year_total("2023") > 0.0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_product_table_avg_order_column() {
        plain();
        let mut rows = table_for(&Selection::default());
        rows.truncate(1);
        rows[0].transaction_amount = 500.0;
        rows[0].transaction_count = 4;
        let out = product_table(&rows).to_string();
        assert!(out.contains("Avg Order"));
        assert!(out.contains("$125.00"));
        rows[0].transaction_count = 0;
        assert!(product_table(&rows).to_string().contains("$0.00"));
    }

    #[test]
    fn test_render_empty_table() {
        plain();
        let selection = Selection::default();
        let trend = reports::TrendReport { points: Vec::new() };
        let out = render(&selection, &[], &trend);
        assert!(out.contains("$0"));
        assert!(out.contains("(no data)"));
    }

    #[test]
    fn test_beer_filter_header_and_share() {
        plain();
        let selection = Selection {
            categories: CategoryFilter::Only([Category::Beer].into_iter().collect()),
            view: View::Category,
            ..Selection::default()
        };
        let records = table_for(&selection);
        let out = render(&selection, &records, &reports::TrendReport { points: Vec::new() });
        assert!(out.contains("Categories: BEER"));
        assert!(out.contains("100.0%"));
        assert!(!out.contains("WINE"));
    }

    #[test]
    fn test_month_abbrev() {
        assert_eq!(month_abbrev(1), "Jan");
        assert_eq!(month_abbrev(12), "Dec");
        assert_eq!(month_abbrev(13), "13");
    }
}
