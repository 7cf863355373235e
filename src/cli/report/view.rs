use std::ops::RangeInclusive;
use std::sync::Arc;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::api::ApiClient;
use crate::error::{AppError, Result, FALLBACK_MESSAGE};
use crate::fmt::{number, rupiah};
use crate::models::TripStatRecord;
use crate::report::{LoadTicket, MonthlyReport, ReportPeriod, ReportSession, ReportState};
use crate::settings::Settings;
use crate::tasks::{self, ExportGuard, Pending, Poll};
use crate::tui::{
    rupiah_span, run_view, View, ViewAction, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE,
};

const BOLD: Style = Style::new().add_modifier(Modifier::BOLD);
const SECTION_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);
const HEADER_ROW_STYLE: Style = Style::new()
    .fg(Color::DarkGray)
    .add_modifier(Modifier::BOLD);
const NOTICE_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
const TABLE_HEADER: [&str; 3] = ["Nama Gunung", "Jumlah Peserta", "Pendapatan"];

pub type Fetcher = Arc<dyn Fn(ReportPeriod) -> Result<MonthlyReport> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Pdf,
    Print,
}

/// Standalone `gapakerem report` view.
pub fn run(period: ReportPeriod, settings: Settings, client: ApiClient) -> Result<()> {
    let mut view = ReportScreen::from_client(period, settings, client);
    run_view(&mut view)
}

pub struct ReportScreen {
    session: ReportSession,
    years: RangeInclusive<i32>,
    settings: Settings,
    fetch: Fetcher,
    load: Option<(LoadTicket, Pending<Result<MonthlyReport>>)>,
    guard: ExportGuard,
    export: Option<Pending<Result<String>>>,
    notice: Option<(String, bool)>,
    offset: usize,
    visible_count: usize,
}

impl ReportScreen {
    pub fn new(period: ReportPeriod, settings: Settings, fetch: Fetcher) -> Self {
        let years = settings.report_years();
        let mut screen = Self {
            session: ReportSession::new(period),
            years,
            settings,
            fetch,
            load: None,
            guard: ExportGuard::new(),
            export: None,
            notice: None,
            offset: 0,
            visible_count: 20,
        };
        screen.select(period);
        screen
    }

    pub fn from_client(period: ReportPeriod, settings: Settings, client: ApiClient) -> Self {
        let fetch: Fetcher = Arc::new(move |p: ReportPeriod| client.monthly_report(&p));
        Self::new(period, settings, fetch)
    }

    #[cfg(test)]
    pub fn state(&self) -> &ReportState {
        self.session.state()
    }

    pub fn period(&self) -> ReportPeriod {
        self.session.period()
    }

    #[cfg(test)]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|(m, _)| m.as_str())
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.load.is_some() || self.export.is_some()
    }

    /// Start loading a period. A load still in flight is abandoned.
    fn select(&mut self, period: ReportPeriod) {
        let ticket = self.session.select(period);
        self.start_load(ticket);
    }

    fn reload(&mut self) {
        let ticket = self.session.reload();
        self.start_load(ticket);
    }

    fn start_load(&mut self, ticket: LoadTicket) {
        let period = self.period();
        let fetch = Arc::clone(&self.fetch);
        self.offset = 0;
        tracing::debug!(period = %period.label(), generation = ticket.generation, "loading report");
        self.load = Some((ticket, tasks::spawn(ticket.generation, move || fetch(period))));
    }

    fn poll_load(&mut self) {
        let Some((ticket, pending)) = &self.load else {
            return;
        };
        let ticket = *ticket;
        let result = match pending.poll() {
            Poll::Waiting => return,
            Poll::Done(result) => result,
            Poll::Lost => Err(AppError::Other(FALLBACK_MESSAGE.into())),
        };
        self.load = None;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "report load failed");
        }
        self.session.apply_load(ticket, result);
    }

    /// Kick off an export unless one is already running.
    pub fn start_export(&mut self, kind: ExportKind) {
        let Some(permit) = self.guard.try_acquire() else {
            tracing::debug!("export already running, ignoring request");
            return;
        };
        let Some(report) = self.session.begin_export() else {
            return;
        };
        let settings = self.settings.clone();
        self.notice = Some((
            match kind {
                ExportKind::Pdf => "Mengekspor PDF...".to_string(),
                ExportKind::Print => "Mengirim ke printer...".to_string(),
            },
            false,
        ));
        self.export = Some(tasks::spawn(0, move || {
            let _permit = permit;
            run_export(kind, &report, &settings)
        }));
    }

    fn poll_export(&mut self) {
        let Some(pending) = &self.export else {
            return;
        };
        let outcome = match pending.poll() {
            Poll::Waiting => return,
            Poll::Done(outcome) => outcome,
            Poll::Lost => Err(AppError::Other(FALLBACK_MESSAGE.into())),
        };
        self.export = None;
        self.session.finish_export();
        self.notice = Some(match outcome {
            Ok(msg) => (msg, false),
            Err(e) => {
                tracing::warn!(error = %e, "export failed");
                (e.user_message(), true)
            }
        });
    }

    fn shift_months(&mut self, delta: i32) {
        let next = self.period().shift_months(delta, &self.years);
        if next != self.period() {
            self.select(next);
        }
    }

    fn shift_years(&mut self, delta: i32) {
        let next = self.period().shift_years(delta, &self.years);
        if next != self.period() {
            self.select(next);
        }
    }

    fn build_rows(report: &MonthlyReport) -> Vec<Row<'static>> {
        let totals = report.totals();
        let mut rows = vec![
            Row::new(vec![Cell::from("Ringkasan").style(SECTION_STYLE)]),
            Row::new(vec![
                Cell::from("  Total Trip"),
                Cell::from(""),
                Cell::from(totals.total_trip_count.to_string()),
            ]),
            Row::new(vec![
                Cell::from("  Open Trip"),
                Cell::from(""),
                Cell::from(totals.open_trip_count.to_string()),
            ]),
            Row::new(vec![
                Cell::from("  Private Trip"),
                Cell::from(""),
                Cell::from(totals.private_trip_count.to_string()),
            ]),
            Row::new(vec![
                Cell::from("  Total Pendapatan"),
                Cell::from(""),
                Cell::from(rupiah_span(totals.grand_total)),
            ]),
            Row::new(vec![Cell::from("")]),
        ];
        let mut section = |title: &str, records: &[TripStatRecord], total: u64| {
            rows.push(Row::new(vec![
                Cell::from(format!("{title} ({})", records.len())).style(SECTION_STYLE),
            ]));
            if records.is_empty() {
                rows.push(Row::new(vec![Cell::from("  Tidak ada data").style(FOOTER_STYLE)]));
            }
            for r in records {
                rows.push(Row::new(vec![
                    Cell::from(format!("  {}", r.mountain_name)),
                    Cell::from(number(r.total_participants)),
                    Cell::from(rupiah(r.total_price)),
                ]));
            }
            rows.push(
                Row::new(vec![
                    Cell::from(format!("  Total {title}")),
                    Cell::from(""),
                    Cell::from(rupiah(total)),
                ])
                .style(BOLD),
            );
            rows.push(Row::new(vec![Cell::from("")]));
        };
        section("Open Trip", report.open_trips.as_slice(), totals.total_open_revenue);
        section("Private Trip", report.private_trips.as_slice(), totals.total_private_revenue);
        rows.push(
            Row::new(vec![
                Cell::from("Total Keseluruhan Pendapatan"),
                Cell::from(""),
                Cell::from(rupiah_span(totals.grand_total)),
            ])
            .style(BOLD),
        );
        rows
    }
}

fn run_export(kind: ExportKind, report: &MonthlyReport, settings: &Settings) -> Result<String> {
    #[cfg(not(feature = "pdf"))]
    {
        let _ = (kind, report, settings);
        return Err(AppError::Other(
            "PDF export requires the 'pdf' feature, build with `cargo build --features pdf`".into(),
        ));
    }

    #[cfg(feature = "pdf")]
    {
        match kind {
            ExportKind::Pdf => {
                let path = crate::cli::export::write_pdf(report, settings, None)?;
                Ok(format!("Tersimpan: {}", path.display()))
            }
            ExportKind::Print => {
                crate::cli::print::print_report(report, settings)?;
                Ok(format!("Dikirim ke printer ({})", settings.print_command))
            }
        }
    }
}

impl View for ReportScreen {
    fn tick(&mut self) {
        self.poll_load();
        self.poll_export();
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep_area, content_area, notice_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(format!(
                " {}  |  LAPORAN TRIP  |  {}",
                self.settings.company_name,
                self.period().label()
            ))
            .style(HEADER_STYLE),
            header_area,
        );
        frame.render_widget(
            Paragraph::new("\u{2501}".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );

        match self.session.state() {
            ReportState::Idle | ReportState::Loading => {
                frame.render_widget(Paragraph::new(" Memuat...").style(FOOTER_STYLE), content_area);
            }
            ReportState::Error(msg) => {
                let lines = vec![
                    Line::styled(format!(" {msg}"), ERROR_STYLE),
                    Line::styled(" r: coba lagi", FOOTER_STYLE),
                ];
                frame.render_widget(Paragraph::new(lines), content_area);
            }
            ReportState::Ready(report) | ReportState::Exporting(report) => {
                let rows = Self::build_rows(report);
                let visible = content_area.height.saturating_sub(2) as usize;
                self.visible_count = visible.max(1);
                let max = rows.len().saturating_sub(self.visible_count);
                self.offset = self.offset.min(max);
                let visible_rows: Vec<Row> =
                    rows.into_iter().skip(self.offset).take(visible).collect();
                let table = Table::new(
                    visible_rows,
                    [Constraint::Fill(1), Constraint::Length(16), Constraint::Length(20)],
                )
                .header(
                    Row::new(TABLE_HEADER)
                        .style(HEADER_ROW_STYLE)
                        .bottom_margin(1),
                )
                .column_spacing(2);
                frame.render_widget(table, content_area);
            }
        }

        if let Some((msg, is_error)) = &self.notice {
            let style = if *is_error { ERROR_STYLE } else { NOTICE_STYLE };
            frame.render_widget(Paragraph::new(format!(" {msg}")).style(style), notice_area);
        }

        let busy = if self.session.is_exporting() { "  [exporting]" } else { "" };
        frame.render_widget(
            Paragraph::new(format!(
                " \u{2190}/\u{2192}=month  [/]=year  e=export pdf  p=print  r=reload  \u{2191}/\u{2193}=scroll  q/Esc=close{busy}"
            ))
            .style(FOOTER_STYLE),
            footer_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Left => self.shift_months(-1),
            KeyCode::Right => self.shift_months(1),
            KeyCode::Char('[') => self.shift_years(-1),
            KeyCode::Char(']') => self.shift_years(1),
            KeyCode::Char('r') => {
                if !self.session.is_exporting() {
                    self.reload();
                }
            }
            KeyCode::Char('e') => self.start_export(ExportKind::Pdf),
            KeyCode::Char('p') => self.start_export(ExportKind::Print),
            KeyCode::Up | KeyCode::Char('k') => self.offset = self.offset.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.offset += 1,
            KeyCode::PageUp => self.offset = self.offset.saturating_sub(self.visible_count),
            KeyCode::PageDown => self.offset += self.visible_count,
            KeyCode::Home => self.offset = 0,
            _ => {}
        }
        ViewAction::Continue
    }
}
