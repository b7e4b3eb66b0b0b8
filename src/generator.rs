use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::Catalog;
use crate::models::{Adjustment, AdjustmentKind, Category, Period, TransactionRecord};

/// Chance that a cataloged item appears in a period at all.
const INCLUSION_PROBABILITY: f64 = 0.7;

/// Activation probability and bounds for one adjustment bucket.
struct AdjustmentRule {
    kind: AdjustmentKind,
    probability: f64,
    /// Fraction of the gross amount the deduction may reach.
    amount_frac: f64,
    /// Fraction of the gross quantity the bucket may reach.
    quantity_frac: f64,
    max_transactions: i64,
}

const ADJUSTMENT_RULES: [AdjustmentRule; 5] = [
    AdjustmentRule {
        kind: AdjustmentKind::ZeroPriced,
        probability: 1.0,
        amount_frac: 0.0,
        quantity_frac: 0.05,
        max_transactions: 25,
    },
    AdjustmentRule {
        kind: AdjustmentKind::Discounted,
        probability: 0.7,
        amount_frac: 0.15,
        quantity_frac: 0.15,
        max_transactions: 50,
    },
    AdjustmentRule {
        kind: AdjustmentKind::Offered,
        probability: 0.3,
        amount_frac: 0.10,
        quantity_frac: 0.05,
        max_transactions: 20,
    },
    AdjustmentRule {
        kind: AdjustmentKind::Loss,
        probability: 0.2,
        amount_frac: 0.10,
        quantity_frac: 0.05,
        max_transactions: 10,
    },
    AdjustmentRule {
        kind: AdjustmentKind::Returned,
        probability: 0.15,
        amount_frac: 0.05,
        quantity_frac: 0.03,
        max_transactions: 5,
    },
];

/// Uniform integer in `[lo, hi)`, collapsing to `lo` when the range is empty.
fn draw(rng: &mut StdRng, lo: i64, hi: i64) -> i64 {
    if hi <= lo {
        lo
    } else {
        rng.gen_range(lo..hi)
    }
}

fn draw_adjustment(
    rng: &mut StdRng,
    rule: &AdjustmentRule,
    total_amount: i64,
    total_quantity: i64,
) -> Adjustment {
    if !rng.gen_bool(rule.probability) {
        return Adjustment::default();
    }

    let amount = if rule.kind == AdjustmentKind::ZeroPriced {
        0
    } else {
        -draw(rng, 0, (total_amount as f64 * rule.amount_frac) as i64 + 1)
    };

    // A bucket only moves units when it moved money; zero-priced units are free.
    let quantity = if amount < 0 || rule.kind == AdjustmentKind::ZeroPriced {
        draw(rng, 0, (total_quantity as f64 * rule.quantity_frac) as i64 + 1)
    } else {
        0
    };

    let transaction_count = if quantity > 0 {
        draw(rng, 0, rule.max_transactions.min(quantity + 1))
    } else {
        0
    };

    Adjustment {
        amount: amount as f64,
        quantity: quantity as u64,
        transaction_count: transaction_count as u64,
    }
}

fn generate_record(
    rng: &mut StdRng,
    catalog: &Catalog,
    period: Period,
    category: Category,
    sku: &str,
) -> TransactionRecord {
    let (amount_lo, amount_hi) = period.amount_range();
    let total_amount = draw(rng, amount_lo, amount_hi);
    let total_quantity = draw(rng, 10, total_amount / 10 + 1);
    let transaction_count = draw(rng, 5, 500_i64.min(total_quantity + 1));

    let adjustments =
        ADJUSTMENT_RULES.map(|rule| draw_adjustment(rng, &rule, total_amount, total_quantity));

    let unit: f64 = rng.gen();
    let cost_factor = catalog
        .cost_band(category)
        .map(|band| band.factor(unit))
        .unwrap_or(0.0);

    TransactionRecord::from_parts(
        sku,
        Some(category),
        period.year(),
        total_amount as f64,
        total_quantity as u64,
        transaction_count as u64,
        adjustments,
        total_amount as f64 * cost_factor,
    )
}

/// Generate the synthetic transaction table for one period.
///
/// The RNG is seeded from the period, so repeated calls within one build
/// return identical tables.
pub fn generate(catalog: &Catalog, period: Period) -> Vec<TransactionRecord> {
    let mut rng = StdRng::seed_from_u64(period.seed());
    let mut records = Vec::new();

    for entry in catalog.entries() {
        for sku in entry.items {
            if rng.gen::<f64>() < INCLUSION_PROBABILITY {
                records.push(generate_record(&mut rng, catalog, period, entry.category, sku));
            }
        }
    }

    tracing::debug!(
        period = period.key(),
        rows = records.len(),
        catalog_items = catalog.len(),
        "generated synthetic table"
    );
    records
}

/// Scale all monetary columns so total transaction amount equals `target`.
///
/// Profit margin is recomputed from the scaled columns.
pub fn rescale_to_target(records: &mut [TransactionRecord], target: f64) {
    let current: f64 = records.iter().map(|r| r.transaction_amount).sum();
    if records.is_empty() || current == 0.0 {
        return;
    }
    let factor = target / current;
    for r in records.iter_mut() {
        r.scale_money(factor);
        r.recompute_margin();
    }
    tracing::debug!(target, factor, "rescaled table to target revenue");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_revenue(records: &[TransactionRecord]) -> f64 {
        records.iter().map(|r| r.transaction_amount).sum()
    }

    #[test]
    fn test_generate_is_deterministic() {
        let catalog = Catalog::standard();
        let a = generate(catalog, Period::Y2023);
        let b = generate(catalog, Period::Y2023);
        assert_eq!(a.len(), b.len());
        assert_eq!(a, b);
    }

    #[test]
    fn test_periods_produce_different_tables() {
        let catalog = Catalog::standard();
        let a = generate(catalog, Period::Y2023);
        let b = generate(catalog, Period::Y2024);
        assert_ne!(a, b);
    }

    #[test]
    fn test_inclusion_rate_is_plausible() {
        let catalog = Catalog::standard();
        for period in Period::ALL {
            let n = generate(catalog, period).len();
            // 141 items at p=0.7 → mean ~99; generous bounds.
            assert!(n > 60 && n < 135, "{period}: {n} rows");
        }
    }

    #[test]
    fn test_transaction_quantity_never_negative_and_bounded() {
        let catalog = Catalog::standard();
        for period in Period::ALL {
            for r in generate(catalog, period) {
                assert!(r.transaction_quantity <= r.total_quantity, "{}", r.sku);
            }
        }
    }

    #[test]
    fn test_transaction_amount_identity() {
        let catalog = Catalog::standard();
        for period in Period::ALL {
            for r in generate(catalog, period) {
                let deductions: f64 = r.adjustments().iter().map(|a| a.amount).sum();
                assert!(r.adjustments().iter().all(|a| a.amount <= 0.0), "{}", r.sku);
                assert!(
                    (r.transaction_amount - (r.total_amount + deductions)).abs() < 1e-9,
                    "{}",
                    r.sku
                );
                assert_eq!(r.zero_priced_amount, 0.0);
            }
        }
    }

    #[test]
    fn test_rows_match_catalog_and_period() {
        let catalog = Catalog::standard();
        let (lo, hi) = Period::Y2024.amount_range();
        for r in generate(catalog, Period::Y2024) {
            assert_eq!(catalog.category_of(&r.sku), r.category);
            assert_eq!(r.year, "2024");
            assert!(r.total_amount >= lo as f64 && r.total_amount < hi as f64);
            assert!(r.total_quantity >= 10);
            assert!(r.transaction_count >= 5);
        }
    }

    #[test]
    fn test_cost_stays_within_category_band() {
        let catalog = Catalog::standard();
        for r in generate(catalog, Period::Y2023) {
            let band = catalog.cost_band(r.category.unwrap()).unwrap();
            let factor = r.cost / r.total_amount;
            assert!(factor >= band.low - 1e-9 && factor < band.high() + 1e-9, "{}", r.sku);
        }
    }

    #[test]
    fn test_partial_year_generates_small_amounts() {
        let catalog = Catalog::standard();
        let rows = generate(catalog, Period::Y2025);
        assert!(!rows.is_empty());
        for r in &rows {
            assert!(r.total_amount < 4_500.0);
            assert!(r.total_quantity >= 10);
        }
    }

    #[test]
    fn test_rescale_hits_target_and_preserves_margins() {
        let catalog = Catalog::standard();
        let mut rows = generate(catalog, Period::Y2023);
        let before: Vec<f64> = rows.iter().map(|r| r.profit_margin).collect();
        rescale_to_target(&mut rows, 250_000.0);
        assert!((total_revenue(&rows) - 250_000.0).abs() < 1e-6);
        for (r, m) in rows.iter().zip(before) {
            assert!((r.profit_margin - m).abs() < 1e-9, "{}", r.sku);
        }
    }

    #[test]
    fn test_rescale_empty_table_is_noop() {
        let mut rows: Vec<TransactionRecord> = Vec::new();
        rescale_to_target(&mut rows, 1000.0);
        assert!(rows.is_empty());
    }
}
