use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::generator::{generate, rescale_to_target};
use crate::models::{margin_pct, Adjustment, Category, Period, TransactionRecord};
use crate::selection::Source;

/// Parse a POS amount: strips `$`, commas and quotes; `(12.50)` is negative;
/// anything unparseable is 0.
pub fn parse_amount(raw: &str) -> f64 {
    let s = raw.replace(',', "").replace('"', "").replace('$', "");
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return -inner.trim().parse::<f64>().unwrap_or(0.0);
    }
    s.parse().unwrap_or(0.0)
}

fn parse_count(raw: &str) -> u64 {
    parse_amount(raw).max(0.0).round() as u64
}

/// A CSV row as exported, every column optional.
#[derive(Debug, Default, Deserialize)]
struct RawRow {
    #[serde(rename = "SKU", default)]
    sku: Option<String>,
    #[serde(rename = "Category", default)]
    category: Option<String>,
    #[serde(rename = "Total Amount", default)]
    total_amount: Option<String>,
    #[serde(rename = "Total Quantity", default)]
    total_quantity: Option<String>,
    #[serde(rename = "Total Transaction Count", default)]
    total_transaction_count: Option<String>,
    #[serde(rename = "Zero Priced Amount", default)]
    zero_priced_amount: Option<String>,
    #[serde(rename = "Zero Priced Quantity", default)]
    zero_priced_quantity: Option<String>,
    #[serde(rename = "Zero Priced Transaction Count", default)]
    zero_priced_transaction_count: Option<String>,
    #[serde(rename = "Discounted Amount", default)]
    discounted_amount: Option<String>,
    #[serde(rename = "Discounted Quantity", default)]
    discounted_quantity: Option<String>,
    #[serde(rename = "Discounted Transaction Count", default)]
    discounted_transaction_count: Option<String>,
    #[serde(rename = "Offered Amount", default)]
    offered_amount: Option<String>,
    #[serde(rename = "Offered Quantity", default)]
    offered_quantity: Option<String>,
    #[serde(rename = "Offered Transaction Count", default)]
    offered_transaction_count: Option<String>,
    #[serde(rename = "Loss Amount", default)]
    loss_amount: Option<String>,
    #[serde(rename = "Loss Quantity", default)]
    loss_quantity: Option<String>,
    #[serde(rename = "Loss Transaction Count", default)]
    loss_transaction_count: Option<String>,
    #[serde(rename = "Returned Amount", default)]
    returned_amount: Option<String>,
    #[serde(rename = "Returned Quantity", default)]
    returned_quantity: Option<String>,
    #[serde(rename = "Returned Transaction Count", default)]
    returned_transaction_count: Option<String>,
    #[serde(rename = "Transaction Amount", default)]
    transaction_amount: Option<String>,
    #[serde(rename = "Transaction Quantity", default)]
    transaction_quantity: Option<String>,
    #[serde(rename = "Transaction Count", default)]
    transaction_count: Option<String>,
    #[serde(rename = "Cost", default)]
    cost: Option<String>,
    #[serde(rename = "Profit", default)]
    profit: Option<String>,
    #[serde(rename = "Profit Margin", default)]
    profit_margin: Option<String>,
    #[serde(rename = "Year", default)]
    year: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn amount(field: &Option<String>) -> f64 {
    present(field).map(parse_amount).unwrap_or(0.0)
}

fn count(field: &Option<String>) -> u64 {
    present(field).map(parse_count).unwrap_or(0)
}

fn bucket(amt: &Option<String>, qty: &Option<String>, txns: &Option<String>) -> Adjustment {
    Adjustment {
        amount: amount(amt),
        quantity: count(qty),
        transaction_count: count(txns),
    }
}

impl RawRow {
    /// Fill in whatever the export left out. Returns `None` for rows without a SKU.
    fn into_record(self, catalog: &Catalog, period: Period) -> Option<TransactionRecord> {
        let sku = present(&self.sku)?.to_string();
        let category = present(&self.category)
            .and_then(|c| c.parse::<Category>().ok())
            .or_else(|| catalog.category_of(&sku));
        let year = present(&self.year).unwrap_or(period.year());

        let adjustments = [
            bucket(
                &self.zero_priced_amount,
                &self.zero_priced_quantity,
                &self.zero_priced_transaction_count,
            ),
            bucket(
                &self.discounted_amount,
                &self.discounted_quantity,
                &self.discounted_transaction_count,
            ),
            bucket(
                &self.offered_amount,
                &self.offered_quantity,
                &self.offered_transaction_count,
            ),
            bucket(&self.loss_amount, &self.loss_quantity, &self.loss_transaction_count),
            bucket(
                &self.returned_amount,
                &self.returned_quantity,
                &self.returned_transaction_count,
            ),
        ];

        let mut record = TransactionRecord::from_parts(
            &sku,
            category,
            year,
            amount(&self.total_amount),
            count(&self.total_quantity),
            count(&self.total_transaction_count),
            adjustments,
            amount(&self.cost),
        );

        if let Some(v) = present(&self.transaction_amount) {
            record.transaction_amount = parse_amount(v);
        }
        if let Some(v) = present(&self.transaction_quantity) {
            record.transaction_quantity = parse_count(v);
        }
        if let Some(v) = present(&self.transaction_count) {
            record.transaction_count = parse_count(v);
        }
        record.profit = present(&self.profit)
            .map(parse_amount)
            .unwrap_or(record.transaction_amount - record.cost);
        record.profit_margin = present(&self.profit_margin)
            .map(parse_amount)
            .unwrap_or_else(|| margin_pct(record.profit, record.transaction_amount));

        Some(record)
    }
}

/// Read a POS export for `period`.
pub fn read_csv(path: &Path, catalog: &Catalog, period: Period) -> Result<Vec<TransactionRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in rdr.deserialize::<RawRow>() {
        match row?.into_record(catalog, period) {
            Some(r) => records.push(r),
            None => skipped += 1,
        }
    }
    tracing::debug!(path = %path.display(), rows = records.len(), skipped, "loaded csv");
    Ok(records)
}

/// Write records with the POS export header.
pub fn write_csv(path: &Path, records: &[TransactionRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    tracing::debug!(path = %path.display(), rows = records.len(), "wrote csv");
    Ok(())
}

/// A loaded table, plus a message for the user when loading fell back to an
/// empty table.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub records: Vec<TransactionRecord>,
    pub warning: Option<String>,
}

/// Load one period's export from `dir`. Never fails: a missing or unreadable
/// file yields an empty table and a warning.
pub fn load_period(dir: &Path, catalog: &Catalog, period: Period) -> LoadOutcome {
    let path = dir.join(period.file_name());
    if !path.exists() {
        let warning = format!("Data file not found: {}", path.display());
        tracing::warn!(path = %path.display(), "data file missing");
        return LoadOutcome { records: Vec::new(), warning: Some(warning) };
    }
    match read_csv(&path, catalog, period) {
        Ok(records) => LoadOutcome { records, warning: None },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not load data file");
            LoadOutcome {
                records: Vec::new(),
                warning: Some(format!("Could not load {}: {e}", path.display())),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source: Source,
    period: Period,
    /// Target revenue bits; f64 is not hashable.
    target: Option<u64>,
}

/// Memoizes period tables for one invocation.
pub struct TableCache<'a> {
    catalog: &'a Catalog,
    tables: HashMap<CacheKey, Vec<TransactionRecord>>,
    warnings: Vec<String>,
}

impl<'a> TableCache<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            tables: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// The table for `period` from `source`, rescaled to `target` if given.
    pub fn get_or_load(
        &mut self,
        source: &Source,
        period: Period,
        target: Option<f64>,
    ) -> &[TransactionRecord] {
        let key = CacheKey {
            source: source.clone(),
            period,
            target: target.map(f64::to_bits),
        };
        if self.tables.contains_key(&key) {
            tracing::debug!(period = period.key(), "table cache hit");
        } else {
            let mut records = match source {
                Source::Synthetic => generate(self.catalog, period),
                Source::Csv(dir) => {
                    let outcome = load_period(dir, self.catalog, period);
                    self.warnings.extend(outcome.warning);
                    outcome.records
                }
            };
            if let Some(t) = target {
                rescale_to_target(&mut records, t);
            }
            self.tables.insert(key.clone(), records);
        }
        &self.tables[&key]
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Drain warnings collected while loading.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), 1234.56);
        assert_eq!(parse_amount("\"500.00\""), 500.0);
        assert_eq!(parse_amount("  -42.50  "), -42.5);
        assert_eq!(parse_amount("not_a_number"), 0.0);
    }

    #[test]
    fn test_parse_amount_parenthesized_and_currency() {
        assert_eq!(parse_amount("(1,234.56)"), -1234.56);
        assert_eq!(parse_amount("$1,234.56"), 1234.56);
        assert_eq!(parse_amount("-$50.00"), -50.0);
    }

    #[test]
    fn test_parse_count_floors_negatives() {
        assert_eq!(parse_count("12"), 12);
        assert_eq!(parse_count("1,200"), 1200);
        assert_eq!(parse_count("-3"), 0);
        assert_eq!(parse_count("abc"), 0);
    }

    #[test]
    fn test_missing_file_yields_empty_table_and_warning() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = load_period(dir.path(), Catalog::standard(), Period::Y2023);
        assert!(outcome.records.is_empty());
        let warning = outcome.warning.unwrap();
        assert!(warning.contains("hemlock_product_breakdown_20230512_20240101.csv"));
    }

    #[test]
    fn test_minimal_columns_are_derived() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            Period::Y2024.file_name(),
            "SKU,Total Amount,Total Quantity,Total Transaction Count,Discounted Amount,Cost\n\
             Negroni,\"$1,000.00\",100,40,(100.00),300\n",
        );
        let outcome = load_period(dir.path(), Catalog::standard(), Period::Y2024);
        assert!(outcome.warning.is_none());
        let r = &outcome.records[0];
        assert_eq!(r.category, Some(Category::Cocktails));
        assert_eq!(r.year, "2024");
        assert_eq!(r.transaction_amount, 900.0);
        assert_eq!(r.transaction_count, 40);
        assert_eq!(r.profit, 600.0);
        assert!((r.profit_margin - 600.0 / 900.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_columns_win_over_derivation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "export.csv",
            "SKU,Category,Total Amount,Transaction Amount,Profit,Year\n\
             Fries,FOOD,500,480,200,2023\n",
        );
        let rows = read_csv(&path, Catalog::standard(), Period::Y2025).unwrap();
        assert_eq!(rows[0].transaction_amount, 480.0);
        assert_eq!(rows[0].cost, 0.0);
        assert_eq!(rows[0].profit, 200.0);
        assert_eq!(rows[0].year, "2023");
    }

    #[test]
    fn test_unknown_sku_has_no_category() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "export.csv",
            "SKU,Category,Total Amount\nMystery Shot,,100\n,BEER,50\n",
        );
        let rows = read_csv(&path, Catalog::standard(), Period::Y2023).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, None);
    }

    #[test]
    fn test_export_then_load_keeps_totals() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::standard();
        let generated = generate(catalog, Period::Y2023);
        write_csv(&dir.path().join(Period::Y2023.file_name()), &generated).unwrap();

        let outcome = load_period(dir.path(), catalog, Period::Y2023);
        assert!(outcome.warning.is_none());
        assert_eq!(outcome.records.len(), generated.len());
        let before: f64 = generated.iter().map(|r| r.transaction_amount).sum();
        let after: f64 = outcome.records.iter().map(|r| r.transaction_amount).sum();
        assert!((before - after).abs() < 1e-6);
        assert!(outcome
            .records
            .iter()
            .zip(&generated)
            .all(|(a, b)| a.sku == b.sku && a.category == b.category));
    }

    #[test]
    fn test_cache_reuses_tables() {
        let catalog = Catalog::standard();
        let mut cache = TableCache::new(catalog);
        let first = cache.get_or_load(&Source::Synthetic, Period::Y2023, None).len();
        let second = cache.get_or_load(&Source::Synthetic, Period::Y2023, None).len();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        cache.get_or_load(&Source::Synthetic, Period::Y2023, Some(100_000.0));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_rescales_and_collects_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::standard();
        let mut cache = TableCache::new(catalog);
        let total: f64 = cache
            .get_or_load(&Source::Synthetic, Period::Y2024, Some(50_000.0))
            .iter()
            .map(|r| r.transaction_amount)
            .sum();
        assert!((total - 50_000.0).abs() < 1e-6);

        let source = Source::Csv(dir.path().to_path_buf());
        assert!(cache.get_or_load(&source, Period::Y2025, None).is_empty());
        assert_eq!(cache.take_warnings().len(), 1);
        assert!(cache.take_warnings().is_empty());
    }
}
