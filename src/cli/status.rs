use std::path::PathBuf;

use crate::error::Result;
use crate::fmt::money_whole;
use crate::models::Period;
use crate::settings::{load_settings, settings_file_exists, settings_path};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = PathBuf::from(&settings.data_dir);

    let source = if settings_file_exists() { "" } else { " (defaults)" };
    println!("Settings:        {}{source}", settings_path().display());
    println!("Data dir:        {}", data_dir.display());
    println!("Default period:  {}", settings.default_period);
    println!("Top N:           {}", settings.top_n);

    println!();
    for period in Period::ALL {
        let path = data_dir.join(period.file_name());
        let state = if path.exists() { "present" } else { "missing" };
        let target = settings
            .target_for(period)
            .map(|t| format!("  target {}", money_whole(t)))
            .unwrap_or_default();
        println!("{:<22} {state:<8}{target}", period.label());
    }
    Ok(())
}
