//! Monthly trip report: period selection, aggregation and the report screen's
//! load/export lifecycle.

use std::ops::RangeInclusive;

use chrono::Datelike;

use crate::error::{AppError, Result};
use crate::models::TripStatRecord;

// ---------------------------------------------------------------------------
// Period
// ---------------------------------------------------------------------------

const MONTH_NAMES: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni",
    "Juli", "Agustus", "September", "Oktober", "November", "Desember",
];

/// A calendar month, guaranteed to be in 1..=12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Month(u32);

impl Month {
    pub fn from_number(n: u32) -> Option<Month> {
        (1..=12).contains(&n).then_some(Month(n))
    }

    /// Parse a month value such as "04" or "4". Anything outside 1..=12 is rejected.
    pub fn parse(value: &str) -> Result<Month> {
        let trimmed = value.trim();
        trimmed
            .parse::<u32>()
            .ok()
            .and_then(Month::from_number)
            .ok_or_else(|| AppError::InvalidPeriod(format!("month {trimmed:?} is not in 01..12")))
    }

    pub fn number(self) -> u32 {
        self.0
    }

    /// Two-digit value used in file names and the print route: "04".
    pub fn value(self) -> String {
        format!("{:02}", self.0)
    }

    pub fn label(self) -> &'static str {
        MONTH_NAMES[(self.0 - 1) as usize]
    }
}

/// The `(month, year)` pair a report is fetched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    pub month: Month,
    pub year: i32,
}

impl ReportPeriod {
    pub fn new(month: Month, year: i32, years: &RangeInclusive<i32>) -> Result<Self> {
        if !years.contains(&year) {
            return Err(AppError::InvalidPeriod(format!(
                "year {year} is not one of {}..{}",
                years.start(),
                years.end()
            )));
        }
        Ok(Self { month, year })
    }

    pub fn parse(month: &str, year: &str, years: &RangeInclusive<i32>) -> Result<Self> {
        let month = Month::parse(month)?;
        let year = year
            .trim()
            .parse::<i32>()
            .map_err(|_| AppError::InvalidPeriod(format!("year {year:?} is not a number")))?;
        Self::new(month, year, years)
    }

    /// Current month, with the year clamped into the supported range.
    pub fn current(years: &RangeInclusive<i32>) -> Self {
        let now = chrono::Local::now();
        let month = Month::from_number(now.month()).unwrap_or(Month(1));
        let year = now.year().clamp(*years.start(), *years.end());
        Self { month, year }
    }

    /// "April 2025"
    pub fn label(&self) -> String {
        format!("{} {}", self.month.label(), self.year)
    }

    /// Step by whole months, staying inside the supported years.
    pub fn shift_months(&self, delta: i32, years: &RangeInclusive<i32>) -> Self {
        let index = self.year * 12 + self.month.0 as i32 - 1 + delta;
        let lo = years.start() * 12;
        let hi = years.end() * 12 + 11;
        let index = index.clamp(lo, hi);
        Self {
            month: Month((index.rem_euclid(12) + 1) as u32),
            year: index.div_euclid(12),
        }
    }

    pub fn shift_years(&self, delta: i32, years: &RangeInclusive<i32>) -> Self {
        Self {
            month: self.month,
            year: (self.year + delta).clamp(*years.start(), *years.end()),
        }
    }
}

/// `laporan-2025-04.pdf`
pub fn export_filename(period: &ReportPeriod, ext: &str) -> String {
    format!("laporan-{}-{}.{ext}", period.year, period.month.value())
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportTotals {
    pub total_open_revenue: u64,
    pub total_private_revenue: u64,
    pub grand_total: u64,
    pub open_trip_count: usize,
    pub private_trip_count: usize,
    pub total_trip_count: usize,
}

pub fn aggregate(open: &[TripStatRecord], private: &[TripStatRecord]) -> ReportTotals {
    let total_open_revenue: u64 = open.iter().map(|r| r.total_price).sum();
    let total_private_revenue: u64 = private.iter().map(|r| r.total_price).sum();
    ReportTotals {
        total_open_revenue,
        total_private_revenue,
        grand_total: total_open_revenue + total_private_revenue,
        open_trip_count: open.len(),
        private_trip_count: private.len(),
        total_trip_count: open.len() + private.len(),
    }
}

/// Both record collections for one period. Totals are derived on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyReport {
    pub period: ReportPeriod,
    pub open_trips: Vec<TripStatRecord>,
    pub private_trips: Vec<TripStatRecord>,
}

impl MonthlyReport {
    pub fn new(
        period: ReportPeriod,
        open_trips: Vec<TripStatRecord>,
        private_trips: Vec<TripStatRecord>,
    ) -> Self {
        Self {
            period,
            open_trips,
            private_trips,
        }
    }

    pub fn totals(&self) -> ReportTotals {
        aggregate(&self.open_trips, &self.private_trips)
    }
}

// ---------------------------------------------------------------------------
// Report screen lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportState {
    Idle,
    Loading,
    Ready(MonthlyReport),
    Exporting(MonthlyReport),
    Error(String),
}

/// A load request: results are only applied if the generation is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub period: ReportPeriod,
}

/// Period selection plus state machine for the report screen, independent of
/// how fetching, exporting and drawing are done.
#[derive(Debug)]
pub struct ReportSession {
    period: ReportPeriod,
    state: ReportState,
    generation: u64,
}

impl ReportSession {
    pub fn new(period: ReportPeriod) -> Self {
        Self {
            period,
            state: ReportState::Idle,
            generation: 0,
        }
    }

    pub fn period(&self) -> ReportPeriod {
        self.period
    }

    pub fn state(&self) -> &ReportState {
        &self.state
    }

    pub fn is_exporting(&self) -> bool {
        matches!(self.state, ReportState::Exporting(_))
    }

    /// Select a period (or reload the current one). Any in-flight load becomes stale.
    pub fn select(&mut self, period: ReportPeriod) -> LoadTicket {
        self.period = period;
        self.generation += 1;
        self.state = ReportState::Loading;
        LoadTicket {
            generation: self.generation,
            period,
        }
    }

    pub fn reload(&mut self) -> LoadTicket {
        self.select(self.period)
    }

    /// Apply a finished load. Returns false when the result was stale and dropped.
    pub fn apply_load(&mut self, ticket: LoadTicket, result: Result<MonthlyReport>) -> bool {
        if ticket.generation != self.generation || !matches!(self.state, ReportState::Loading) {
            tracing::debug!(
                generation = ticket.generation,
                current = self.generation,
                "discarding stale report load"
            );
            return false;
        }
        self.state = match result {
            Ok(report) => ReportState::Ready(report),
            Err(e) => ReportState::Error(e.user_message()),
        };
        true
    }

    /// Enter Exporting. Returns the report to export, or None when not Ready
    /// (including when an export is already running).
    pub fn begin_export(&mut self) -> Option<MonthlyReport> {
        match std::mem::replace(&mut self.state, ReportState::Idle) {
            ReportState::Ready(report) => {
                self.state = ReportState::Exporting(report.clone());
                Some(report)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Leave Exporting, back to Ready regardless of the export outcome.
    pub fn finish_export(&mut self) {
        if let ReportState::Exporting(report) = std::mem::replace(&mut self.state, ReportState::Idle) {
            self.state = ReportState::Ready(report);
        } else {
            // A period change while exporting already moved us on; keep that state.
            tracing::debug!("export finished after the report was replaced");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEARS: RangeInclusive<i32> = 2023..=2025;

    fn rec(name: &str, participants: u64, price: u64) -> TripStatRecord {
        TripStatRecord {
            mountain_name: name.to_string(),
            total_participants: participants,
            total_price: price,
        }
    }

    fn period(m: u32, y: i32) -> ReportPeriod {
        ReportPeriod::new(Month::from_number(m).unwrap(), y, &YEARS).unwrap()
    }

    #[test]
    fn test_month_labels() {
        assert_eq!(Month::parse("01").unwrap().label(), "Januari");
        assert_eq!(Month::parse("12").unwrap().label(), "Desember");
        assert_eq!(Month::parse("4").unwrap().value(), "04");
    }

    #[test]
    fn test_month_out_of_range_rejected() {
        for bad in ["00", "13", "", "abc", "-1"] {
            assert!(
                matches!(Month::parse(bad), Err(AppError::InvalidPeriod(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(Month::from_number(0).is_none());
        assert!(Month::from_number(13).is_none());
    }

    #[test]
    fn test_period_year_validation() {
        assert!(ReportPeriod::parse("04", "2025", &YEARS).is_ok());
        assert!(ReportPeriod::parse("04", "2022", &YEARS).is_err());
        assert!(ReportPeriod::parse("04", "twenty", &YEARS).is_err());
        assert_eq!(period(4, 2025).label(), "April 2025");
    }

    #[test]
    fn test_shift_months_wraps_and_clamps() {
        let p = period(12, 2023).shift_months(1, &YEARS);
        assert_eq!((p.month.number(), p.year), (1, 2024));
        let p = period(1, 2024).shift_months(-1, &YEARS);
        assert_eq!((p.month.number(), p.year), (12, 2023));
        let p = period(1, 2023).shift_months(-1, &YEARS);
        assert_eq!((p.month.number(), p.year), (1, 2023));
        let p = period(12, 2025).shift_months(3, &YEARS);
        assert_eq!((p.month.number(), p.year), (12, 2025));
        let p = period(6, 2025).shift_years(1, &YEARS);
        assert_eq!(p.year, 2025);
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename(&period(4, 2025), "pdf"), "laporan-2025-04.pdf");
        assert_eq!(export_filename(&period(11, 2024), "txt"), "laporan-2024-11.txt");
    }

    #[test]
    fn test_rinjani_scenario() {
        let totals = aggregate(&[rec("Rinjani", 10, 5_000_000)], &[]);
        assert_eq!(totals.total_open_revenue, 5_000_000);
        assert_eq!(totals.total_private_revenue, 0);
        assert_eq!(totals.grand_total, 5_000_000);
        assert_eq!(totals.total_trip_count, 1);
    }

    #[test]
    fn test_empty_collections_total_zero() {
        let totals = aggregate(&[], &[]);
        assert_eq!(totals, ReportTotals::default());
    }

    #[test]
    fn test_grand_total_is_sum_of_categories() {
        let open = vec![rec("Rinjani", 10, 5_000_000), rec("Semeru", 3, 1_200_000)];
        let private = vec![rec("Latimojong", 2, 3_500_000)];
        let totals = aggregate(&open, &private);
        assert_eq!(totals.total_open_revenue, 6_200_000);
        assert_eq!(totals.total_private_revenue, 3_500_000);
        assert_eq!(
            totals.grand_total,
            totals.total_open_revenue + totals.total_private_revenue
        );
        assert_eq!(totals.total_trip_count, 3);
        assert_eq!(totals.open_trip_count, 2);
        assert_eq!(totals.private_trip_count, 1);
    }

    #[test]
    fn test_report_totals_follow_records() {
        let mut report = MonthlyReport::new(period(4, 2025), vec![rec("Rinjani", 10, 5_000_000)], vec![]);
        assert_eq!(report.totals().grand_total, 5_000_000);
        report.private_trips.push(rec("Bawakaraeng", 4, 2_000_000));
        assert_eq!(report.totals().grand_total, 7_000_000);
    }

    #[test]
    fn test_session_load_and_export_cycle() {
        let mut s = ReportSession::new(period(4, 2025));
        assert_eq!(s.state(), &ReportState::Idle);

        let ticket = s.reload();
        assert_eq!(s.state(), &ReportState::Loading);
        let report = MonthlyReport::new(ticket.period, vec![rec("Rinjani", 10, 5_000_000)], vec![]);
        assert!(s.apply_load(ticket, Ok(report.clone())));
        assert_eq!(s.state(), &ReportState::Ready(report.clone()));

        let exported = s.begin_export();
        assert_eq!(exported, Some(report.clone()));
        assert!(s.is_exporting());
        // second export while the first is in flight is ignored
        assert_eq!(s.begin_export(), None);
        assert!(s.is_exporting());

        s.finish_export();
        assert_eq!(s.state(), &ReportState::Ready(report));
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let mut s = ReportSession::new(period(4, 2025));
        let first = s.reload();
        let second = s.select(period(5, 2025));
        let stale = MonthlyReport::new(first.period, vec![rec("Old", 1, 1)], vec![]);
        assert!(!s.apply_load(first, Ok(stale)));
        assert_eq!(s.state(), &ReportState::Loading);

        let fresh = MonthlyReport::new(second.period, vec![], vec![]);
        assert!(s.apply_load(second, Ok(fresh)));
        assert_eq!(s.period().month.number(), 5);
    }

    #[test]
    fn test_load_error_is_recoverable() {
        let mut s = ReportSession::new(period(4, 2025));
        let t = s.reload();
        s.apply_load(t, Err(AppError::Api { status: 500, message: None }));
        assert!(matches!(s.state(), ReportState::Error(m) if m == crate::error::FALLBACK_MESSAGE));
        assert_eq!(s.begin_export(), None);

        let t = s.select(period(3, 2025));
        assert_eq!(s.state(), &ReportState::Loading);
        assert!(s.apply_load(t, Ok(MonthlyReport::new(t.period, vec![], vec![]))));
    }
}
