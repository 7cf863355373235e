use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::fmt::{long_date, number, rupiah};
use crate::models::TripStatRecord;
use crate::report::MonthlyReport;

fn trip_table(title: &str, records: &[TripStatRecord], total: u64) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Nama Gunung", "Jumlah Peserta", "Pendapatan"]);
    for r in records {
        table.add_row(vec![
            Cell::new(&r.mountain_name),
            Cell::new(number(r.total_participants)),
            Cell::new(rupiah(r.total_price)),
        ]);
    }
    table.add_row(vec![
        Cell::new(format!("Total {title}").bold()),
        Cell::new(""),
        Cell::new(rupiah(total).bold()),
    ]);
    format!("{} ({})\n{table}", title.bold(), records.len())
}

/// Plain-text rendition of the monthly report, same sections as the PDF.
pub fn format_monthly_report(report: &MonthlyReport, company: &str, today: NaiveDate) -> String {
    let totals = report.totals();
    let mut out = String::new();
    if !company.is_empty() {
        out.push_str(&format!("{company}\n"));
    }
    out.push_str(&format!("Laporan Bulanan, tanggal: {}\n\n", long_date(today)));
    out.push_str(&format!("{}\n{}\n\n", "LAPORAN TRIP".bold(), report.period.label()));

    let mut summary = Table::new();
    summary.set_header(vec!["Ringkasan", ""]);
    summary.add_row(vec!["Total Trip".to_string(), totals.total_trip_count.to_string()]);
    summary.add_row(vec!["Open Trip".to_string(), totals.open_trip_count.to_string()]);
    summary.add_row(vec!["Private Trip".to_string(), totals.private_trip_count.to_string()]);
    summary.add_row(vec!["Total Pendapatan".to_string(), rupiah(totals.grand_total)]);
    out.push_str(&format!("{summary}\n\n"));

    out.push_str(&trip_table("Open Trip", &report.open_trips, totals.total_open_revenue));
    out.push_str("\n\n");
    out.push_str(&trip_table("Private Trip", &report.private_trips, totals.total_private_revenue));
    out.push_str("\n\n");
    out.push_str(&format!(
        "{} {}",
        "Total Keseluruhan Pendapatan:".bold(),
        rupiah(totals.grand_total).green().bold()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Month, ReportPeriod};

    #[test]
    fn test_rinjani_report_text() {
        colored::control::set_override(false);
        let period = ReportPeriod::new(Month::from_number(4).unwrap(), 2025, &(2023..=2025)).unwrap();
        let report = MonthlyReport::new(
            period,
            vec![TripStatRecord {
                mountain_name: "Rinjani".into(),
                total_participants: 10,
                total_price: 5_000_000,
            }],
            vec![],
        );
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let out = format_monthly_report(&report, "GaPakeRem Adventure", today);
        assert!(out.starts_with("GaPakeRem Adventure\n"));
        assert!(out.contains("19 Oktober 2026"));
        assert!(out.contains("April 2025"));
        assert!(out.contains("Rinjani"));
        let header = out.lines().find(|l| l.contains("Jumlah Peserta")).unwrap();
        assert!(header.contains("Pendapatan"));
        assert!(!out.contains("Jumlah Transaksi"));
        assert!(out.contains("Open Trip (1)"));
        assert!(out.contains("Private Trip (0)"));
        assert!(out.contains("Total Private Trip"));
        assert!(out.ends_with("Total Keseluruhan Pendapatan: Rp 5.000.000"));
    }
}
