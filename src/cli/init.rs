use std::path::PathBuf;

use colored::Colorize;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    let dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&dir)?;
    save_settings(&settings)?;

    println!("{} {}", "Data directory:".green(), dir.display());
    println!("Settings saved to {}", settings_path().display());
    println!("Run `pinebar generate --period all` to write synthetic exports.");
    Ok(())
}
