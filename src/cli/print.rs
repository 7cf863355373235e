use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{AppError, Result};
use crate::report::{export_filename, MonthlyReport};
use crate::settings::{load_settings, Settings};

use super::PeriodArgs;

/// Split the configured print command into program and arguments.
fn command_parts(print_command: &str) -> Result<(String, Vec<String>)> {
    let mut parts = print_command.split_whitespace().map(str::to_string);
    let program = parts
        .next()
        .ok_or_else(|| AppError::Print("print_command is empty".into()))?;
    Ok((program, parts.collect()))
}

/// Hand a rendered file to the print spooler.
pub fn print_file(path: &Path, print_command: &str) -> Result<()> {
    let (program, args) = command_parts(print_command)?;
    tracing::info!(%program, path = %path.display(), "sending to printer");
    let output = Command::new(&program)
        .args(&args)
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| AppError::Print(format!("could not run {program}: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Print(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

/// Render the report to a spool file and print it. Returns the spool path.
pub fn print_report(report: &MonthlyReport, settings: &Settings) -> Result<PathBuf> {
    let path = std::env::temp_dir().join(export_filename(&report.period, "pdf"));
    let path = super::export::write_pdf(report, settings, path.to_str())?;
    print_file(&path, &settings.print_command)?;
    Ok(path)
}

/// `gapakerem print`: fetch the period fresh, then print it.
pub fn run(period: &PeriodArgs) -> Result<()> {
    let settings = load_settings();
    let period = period.resolve(&settings)?;
    let client = super::client(&settings)?;
    let report = client.monthly_report(&period)?;
    let path = print_report(&report, &settings)?;
    println!("Sent {} to {}", path.display(), settings.print_command);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parts() {
        let (program, args) = command_parts("lp -d office -o media=A4").unwrap();
        assert_eq!(program, "lp");
        assert_eq!(args, vec!["-d", "office", "-o", "media=A4"]);
        assert!(matches!(command_parts("   "), Err(AppError::Print(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_print_file_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.pdf");
        std::fs::write(&file, b"%PDF").unwrap();
        assert!(print_file(&file, "true").is_ok());
        assert!(matches!(print_file(&file, "false"), Err(AppError::Print(_))));
        assert!(matches!(
            print_file(&file, "gapakerem-no-such-printer-binary"),
            Err(AppError::Print(_))
        ));
    }
}
