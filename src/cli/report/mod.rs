pub mod text;
pub mod view;

use std::io::IsTerminal;
use std::path::PathBuf;

use crate::cli::{PeriodArgs, ReportOutputArgs};
use crate::error::Result;
use crate::report::{export_filename, MonthlyReport};
use crate::settings::{load_settings, Settings};

pub fn dispatch(period: PeriodArgs, args: ReportOutputArgs) -> Result<()> {
    let settings = load_settings();
    // Reject a bad period before touching the session or the network
    let period = period.resolve(&settings)?;
    let client = super::client(&settings)?;

    if args.output.is_some() || args.mode.as_deref() == Some("export") || args.format.is_some() {
        let report = client.monthly_report(&period)?;
        dispatch_export(&report, &settings, args)
    } else if std::io::stdout().is_terminal() {
        view::run(period, settings, client)
    } else {
        // Non-TTY: plain text to stdout
        let report = client.monthly_report(&period)?;
        println!("{}", render_text(&report, &settings));
        Ok(())
    }
}

fn render_text(report: &MonthlyReport, settings: &Settings) -> String {
    let today = chrono::Local::now().date_naive();
    text::format_monthly_report(report, &settings.company_name, today)
}

fn dispatch_export(report: &MonthlyReport, settings: &Settings, args: ReportOutputArgs) -> Result<()> {
    if args.format.as_deref() == Some("text") {
        return export_text(report, settings, args.output);
    }
    dispatch_pdf_export(report, settings, args.output)
}

fn export_text(report: &MonthlyReport, settings: &Settings, output: Option<String>) -> Result<()> {
    colored::control::set_override(false);
    let s = render_text(report, settings);
    let p = output
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.exports_dir().join(export_filename(&report.period, "txt")));
    if let Some(parent) = p.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&p, s)?;
    println!("Wrote {}", p.display());
    Ok(())
}

fn dispatch_pdf_export(report: &MonthlyReport, settings: &Settings, output: Option<String>) -> Result<()> {
    #[cfg(not(feature = "pdf"))]
    {
        let _ = (report, settings, output);
        return Err(crate::error::AppError::Other(
            "PDF export requires the 'pdf' feature, build with `cargo build --features pdf`".into(),
        ));
    }

    #[cfg(feature = "pdf")]
    {
        let path = crate::cli::export::write_pdf(report, settings, output.as_deref())?;
        println!("Wrote {}", path.display());
        Ok(())
    }
}
