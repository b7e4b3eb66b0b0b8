use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::catalog::Catalog;
use crate::error::Result;
use crate::models::Category;

pub fn format_catalog(catalog: &Catalog, only: Option<Category>) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Items", "Cost (% of gross)"]);
    let mut listing = String::new();

    for category in catalog.categories() {
        if only.is_some_and(|c| c != category) {
            continue;
        }
        let items = catalog.items(category);
        let band = catalog
            .cost_band(category)
            .map(|b| format!("{:.0}–{:.0}%", b.low * 100.0, b.high() * 100.0))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(category.label()),
            Cell::new(items.len()),
            Cell::new(band),
        ]);
        listing.push_str(&format!("\n{}\n", category.label().bold()));
        for item in items {
            listing.push_str(&format!("  {item}\n"));
        }
    }
    format!("{table}\n{listing}")
}

pub fn run(category: Option<Category>) -> Result<()> {
    print!("{}", format_catalog(Catalog::standard(), category));
    Ok(())
}
