use comfy_table::Table;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, Settings};

pub fn show() -> Result<()> {
    println!("{}", format_settings(&load_settings()));
    println!("({})", settings_path().display());
    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let mut settings = load_settings();
    settings.set(key, value)?;
    save_settings(&settings)?;
    tracing::info!(key, "setting updated");
    println!("Set {key}.");
    Ok(())
}

pub fn format_settings(settings: &Settings) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    for (key, value) in settings.entries() {
        table.add_row(vec![key.to_string(), value]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_lists_every_key() {
        let out = format_settings(&Settings::default());
        for key in Settings::keys() {
            assert!(out.contains(key), "missing {key}");
        }
        assert!(out.contains("GaPakeRem Adventure"));
    }
}
