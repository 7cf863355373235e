use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const API_URL_ENV: &str = "GAPAKEREM_API_URL";
/// Earliest year the report screen may offer.
pub const MIN_REPORT_YEAR: i32 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub data_dir: String,
    pub company_name: String,
    pub city: String,
    pub first_report_year: i32,
    pub items_per_page: usize,
    pub print_command: String,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "https://gapakerem.vercel.app".to_string(),
            data_dir: default_data_dir().to_string_lossy().to_string(),
            company_name: "GaPakeRem Adventure".to_string(),
            city: "Makassar".to_string(),
            first_report_year: 2023,
            items_per_page: 8,
            print_command: "lp".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Base URL with the env override applied and no trailing slash.
    pub fn api_url(&self) -> String {
        let url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.api_base_url.clone());
        url.trim().trim_end_matches('/').to_string()
    }

    /// Years selectable in the report screen: first_report_year through this year.
    pub fn report_years(&self) -> RangeInclusive<i32> {
        let current = chrono::Local::now().year();
        let first = self.first_report_year.clamp(MIN_REPORT_YEAR.min(current), current);
        first..=current
    }

    pub fn exports_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("exports")
    }

    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("gapakerem.log")
    }

    pub fn keys() -> &'static [&'static str] {
        &[
            "api_base_url",
            "data_dir",
            "company_name",
            "city",
            "first_report_year",
            "items_per_page",
            "print_command",
            "timeout_secs",
        ]
    }

    /// Update one field from its string form, as typed on the command line.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |what: &str| AppError::Settings(format!("{key}: {value:?} is not {what}"));
        match key {
            "api_base_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(invalid("an http(s) URL"));
                }
                self.api_base_url = value.trim_end_matches('/').to_string();
            }
            "data_dir" => self.data_dir = shellexpand_path(value),
            "company_name" => self.company_name = value.to_string(),
            "city" => self.city = value.to_string(),
            "first_report_year" => {
                let current = chrono::Local::now().year();
                let year: i32 = value.parse().map_err(|_| invalid("a year"))?;
                if !(MIN_REPORT_YEAR..=current).contains(&year) {
                    let range = format!("a year between {MIN_REPORT_YEAR} and {current}");
                    return Err(invalid(&range));
                }
                self.first_report_year = year;
            }
            "items_per_page" => {
                let n: usize = value.parse().map_err(|_| invalid("a number"))?;
                if n == 0 {
                    return Err(invalid("a positive number"));
                }
                self.items_per_page = n;
            }
            "print_command" => self.print_command = value.to_string(),
            "timeout_secs" => {
                self.timeout_secs = value.parse().map_err(|_| invalid("a number of seconds"))?;
            }
            _ => {
                return Err(AppError::Settings(format!(
                    "unknown key {key:?} (expected one of: {})",
                    Settings::keys().join(", ")
                )))
            }
        }
        Ok(())
    }

    /// (key, value) pairs in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("api_base_url", self.api_base_url.clone()),
            ("data_dir", self.data_dir.clone()),
            ("company_name", self.company_name.clone()),
            ("city", self.city.clone()),
            ("first_report_year", self.first_report_year.to_string()),
            ("items_per_page", self.items_per_page.to_string()),
            ("print_command", self.print_command.clone()),
            ("timeout_secs", self.timeout_secs.to_string()),
        ]
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("gapakerem")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("gapakerem")
}

pub fn load_settings() -> Settings {
    load_from(&settings_path())
}

/// Missing or unreadable files fall back to defaults.
pub fn load_from(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_to(settings, &settings_path())
}

pub fn save_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| AppError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
