use std::path::PathBuf;

use colored::Colorize;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::generator::{generate, rescale_to_target};
use crate::loader::write_csv;
use crate::models::Period;
use crate::selection::PeriodChoice;
use crate::settings::{load_settings, shellexpand_path};

/// Where the export for `period` goes. With several periods `output` names a
/// directory; with one it names the file.
fn output_path(output: Option<&str>, data_dir: &str, period: Period, several: bool) -> PathBuf {
    match output {
        Some(o) if several => PathBuf::from(shellexpand_path(o)).join(period.file_name()),
        Some(o) => PathBuf::from(shellexpand_path(o)),
        None => PathBuf::from(shellexpand_path(data_dir)).join(period.file_name()),
    }
}

pub fn run(period: PeriodChoice, output: Option<String>, target_revenue: Option<f64>) -> Result<()> {
    let settings = load_settings();
    let catalog = Catalog::standard();
    let periods = period.periods();
    let several = periods.len() > 1;

    for p in periods {
        let mut records = generate(catalog, p);
        if let Some(target) = target_revenue.or_else(|| settings.target_for(p)) {
            rescale_to_target(&mut records, target);
        }
        let path = output_path(output.as_deref(), &settings.data_dir, p, several);
        write_csv(&path, &records)?;
        println!(
            "{} {} rows for {} to {}",
            "Wrote".green(),
            records.len(),
            p.label(),
            path.display()
        );
    }
    Ok(())
}
