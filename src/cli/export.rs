use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::report::{export_filename, MonthlyReport};
use crate::settings::Settings;

pub fn default_path(settings: &Settings, report: &MonthlyReport, ext: &str) -> PathBuf {
    settings
        .exports_dir()
        .join(export_filename(&report.period, ext))
}

pub fn write_file(bytes: &[u8], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "export written");
    Ok(())
}

/// Render the report to PDF and write it. Returns the written path.
pub fn write_pdf(report: &MonthlyReport, settings: &Settings, output: Option<&str>) -> Result<PathBuf> {
    let today = chrono::Local::now().date_naive();
    let bytes =
        crate::pdf::render_monthly_report(report, &settings.company_name, &settings.city, today)?;
    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_path(settings, report, "pdf"));
    write_file(&bytes, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TripStatRecord;
    use crate::report::{Month, ReportPeriod};

    fn report() -> MonthlyReport {
        let period = ReportPeriod::new(Month::from_number(4).unwrap(), 2025, &(2023..=2025)).unwrap();
        MonthlyReport::new(
            period,
            vec![TripStatRecord {
                mountain_name: "Rinjani".into(),
                total_participants: 10,
                total_price: 5_000_000,
            }],
            vec![],
        )
    }

    #[test]
    fn test_default_path_uses_report_filename() {
        let settings = Settings {
            data_dir: "/srv/gapakerem".into(),
            ..Settings::default()
        };
        let path = default_path(&settings, &report(), "pdf");
        assert_eq!(path, PathBuf::from("/srv/gapakerem/exports/laporan-2025-04.pdf"));
    }

    #[test]
    fn test_write_pdf_to_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            data_dir: dir.path().to_string_lossy().to_string(),
            ..Settings::default()
        };
        let path = write_pdf(&report(), &settings, None).unwrap();
        assert!(path.ends_with("exports/laporan-2025-04.pdf"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_write_pdf_to_explicit_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("april.pdf");
        let path = write_pdf(&report(), &Settings::default(), out.to_str()).unwrap();
        assert_eq!(path, out);
        assert!(out.exists());
    }
}
