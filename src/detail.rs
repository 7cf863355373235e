//! Read-only record screens opened from a list row, and the field layout they
//! share with the `show` commands.

use std::sync::Arc;

use chrono::NaiveDate;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::error::{Result, FALLBACK_MESSAGE};
use crate::fmt::{long_date, rupiah};
use crate::models::{BookingDetail, TripDetail, UserDetail};
use crate::tasks::{self, Pending, Poll};
use crate::tui::{self, View, ViewAction, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE};

const MISSING: &str = "-";
const NOBODY: &str = "Tidak ada";
const LABEL_WIDTH: usize = 18;

/// A record shown as labelled fields, one per line.
pub trait DetailRecord {
    fn title(&self) -> String;
    fn fields(&self) -> Vec<(&'static str, String)>;
}

fn or_missing(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| MISSING.to_string())
}

impl DetailRecord for UserDetail {
    fn title(&self) -> String {
        "Detail Pengguna".to_string()
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Nama", self.name.clone()),
            ("Username", or_missing(&self.username)),
            ("Email", or_missing(&self.email)),
            ("Nomor HP", or_missing(&self.number)),
            ("Foto Profil", or_missing(&self.photo)),
        ]
    }
}

impl DetailRecord for TripDetail {
    fn title(&self) -> String {
        match self.trip_type.as_deref() {
            Some("open") => "Detail Open Trip".to_string(),
            Some("private") => "Detail Private Trip".to_string(),
            _ => "Detail Trip".to_string(),
        }
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        let guide = self
            .guide
            .as_ref()
            .map(|g| g.name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| NOBODY.to_string());
        let porters = if self.porters.is_empty() {
            NOBODY.to_string()
        } else {
            self.porters.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
        };
        vec![
            ("Nama Gunung", self.mountain_name.clone()),
            ("Harga", rupiah(self.price)),
            ("Deskripsi", or_missing(&self.description)),
            ("Peralatan", or_missing(&self.equipment)),
            ("Estimasi Waktu", or_missing(&self.estimation_time)),
            (
                "Jam Keberangkatan",
                self.traveling_time
                    .as_ref()
                    .map(|t| format!("{t}:00"))
                    .unwrap_or_else(|| MISSING.to_string()),
            ),
            ("Agenda", or_missing(&self.agenda)),
            ("Guide", guide),
            ("Porter", porters),
        ]
    }
}

/// Admin-facing label for a booking's payment status.
pub fn booking_status_label(status: &str) -> &'static str {
    match status.trim().to_ascii_lowercase().as_str() {
        "approved" => "Diterima",
        "rejected" => "Ditolak",
        _ => "Menunggu Aksi",
    }
}

/// `2025-04-03T08:15:00.000Z` -> `3 April 2025`. Unrecognised text is shown as sent.
fn booking_date(raw: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return long_date(dt.date_naive());
    }
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .map(long_date)
        .unwrap_or_else(|| raw.to_string())
}

impl DetailRecord for BookingDetail {
    fn title(&self) -> String {
        "Detail Transaksi".to_string()
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Peserta", self.participant_name.clone()),
            ("No Hp", or_missing(&self.phone_number)),
            ("Nama Gunung", or_missing(&self.mountain_name)),
            ("Harga", rupiah(self.total_price)),
            ("Meeting Point", or_missing(&self.meeting_point)),
            (
                "Bukti Pembayaran",
                self.payment_proof.clone().unwrap_or_else(|| "Belum Ada".to_string()),
            ),
            ("Status", booking_status_label(&self.status).to_string()),
            (
                "Tanggal Pesan",
                self.created_at
                    .as_deref()
                    .map(booking_date)
                    .unwrap_or_else(|| MISSING.to_string()),
            ),
        ]
    }
}

/// Label column plus the value wrapped to the remaining width. Continuation
/// lines are indented under the value.
pub fn field_lines(fields: &[(&'static str, String)], width: usize) -> Vec<Line<'static>> {
    let value_width = width.saturating_sub(LABEL_WIDTH + 1);
    let mut lines = Vec::new();
    for (label, value) in fields {
        let (wrapped, _) = tui::wrap_text(value, value_width);
        for (i, part) in wrapped.lines().enumerate() {
            let head = if i == 0 {
                Span::styled(format!("{label:<width$} ", width = LABEL_WIDTH), FOOTER_STYLE)
            } else {
                Span::raw(" ".repeat(LABEL_WIDTH + 1))
            };
            lines.push(Line::from(vec![head, Span::raw(part.to_string())]));
        }
        if wrapped.is_empty() {
            lines.push(Line::styled(format!("{label:<width$} ", width = LABEL_WIDTH), FOOTER_STYLE));
        }
    }
    lines
}

// ---------------------------------------------------------------------------
// Detail view
// ---------------------------------------------------------------------------

type Loader<T> = Arc<dyn Fn() -> Result<T> + Send + Sync>;

/// Fetches one record on a worker thread and shows it read-only.
pub struct DetailView<T> {
    title: String,
    loader: Loader<T>,
    record: Option<T>,
    pending: Option<Pending<Result<T>>>,
    generation: u64,
    error: Option<String>,
    scroll: u16,
}

impl<T: DetailRecord + Send + 'static> DetailView<T> {
    /// `title` is shown until the record arrives and names its own.
    pub fn new(
        title: impl Into<String>,
        loader: impl Fn() -> Result<T> + Send + Sync + 'static,
    ) -> Self {
        let mut view = Self {
            title: title.into(),
            loader: Arc::new(loader),
            record: None,
            pending: None,
            generation: 0,
            error: None,
            scroll: 0,
        };
        view.load();
        view
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    #[cfg(test)]
    pub fn record(&self) -> Option<&T> {
        self.record.as_ref()
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn load(&mut self) {
        self.generation += 1;
        self.error = None;
        let loader = Arc::clone(&self.loader);
        tracing::debug!(title = %self.title, generation = self.generation, "loading detail");
        self.pending = Some(tasks::spawn(self.generation, move || loader()));
    }

    fn poll_pending(&mut self) {
        let Some(pending) = &self.pending else {
            return;
        };
        match pending.poll() {
            Poll::Waiting => {}
            Poll::Done(Ok(record)) => {
                self.title = record.title();
                self.record = Some(record);
                self.scroll = 0;
                self.pending = None;
            }
            Poll::Done(Err(e)) => {
                tracing::warn!(title = %self.title, error = %e, "detail load failed");
                self.error = Some(e.user_message());
                self.pending = None;
            }
            Poll::Lost => {
                self.error = Some(FALLBACK_MESSAGE.to_string());
                self.pending = None;
            }
        }
    }
}

impl<T: DetailRecord + Send + 'static> View for DetailView<T> {
    fn tick(&mut self) {
        self.poll_pending();
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Char('r') if !self.is_loading() => self.load(),
            _ => {}
        }
        ViewAction::Continue
    }

    fn draw(&mut self, frame: &mut Frame) {
        let [title_area, body_area, status_area, keys_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_widget(Paragraph::new(self.title.clone()).style(HEADER_STYLE), title_area);

        match &self.record {
            Some(record) => {
                let lines = field_lines(&record.fields(), body_area.width as usize);
                let max = (lines.len() as u16).saturating_sub(body_area.height);
                self.scroll = self.scroll.min(max);
                frame.render_widget(Paragraph::new(lines).scroll((self.scroll, 0)), body_area);
            }
            None if self.is_loading() => {
                frame.render_widget(Paragraph::new("Memuat...").style(FOOTER_STYLE), body_area);
            }
            None => {}
        }

        if let Some(msg) = &self.error {
            frame.render_widget(Paragraph::new(msg.clone()).style(ERROR_STYLE), status_area);
        }

        frame.render_widget(
            Paragraph::new("\u{2191}/\u{2193}:scroll  r:reload  q:back").style(FOOTER_STYLE),
            keys_area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::StaffName;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn settle<T: DetailRecord + Send + 'static>(view: &mut DetailView<T>) {
        for _ in 0..500 {
            view.tick();
            if !view.is_loading() {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("detail never loaded");
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn trip() -> TripDetail {
        TripDetail {
            mountain_name: "Bawakaraeng".into(),
            price: 750_000,
            trip_type: Some("open".into()),
            traveling_time: Some("7".into()),
            porters: vec![StaffName { name: "Udin".into() }, StaffName { name: "Baco".into() }],
            ..TripDetail::default()
        }
    }

    #[test]
    fn test_trip_fields() {
        let t = trip();
        assert_eq!(t.title(), "Detail Open Trip");
        let fields = t.fields();
        assert!(fields.contains(&("Harga", "Rp 750.000".to_string())));
        assert!(fields.contains(&("Jam Keberangkatan", "7:00".to_string())));
        assert!(fields.contains(&("Guide", "Tidak ada".to_string())));
        assert!(fields.contains(&("Porter", "Udin, Baco".to_string())));
        assert!(fields.contains(&("Deskripsi", "-".to_string())));
    }

    #[test]
    fn test_booking_fields() {
        let b = BookingDetail {
            participant_name: "Andi".into(),
            status: "Approved".into(),
            created_at: Some("2025-04-03T08:15:00.000Z".into()),
            ..BookingDetail::default()
        };
        let fields = b.fields();
        assert!(fields.contains(&("Status", "Diterima".to_string())));
        assert!(fields.contains(&("Bukti Pembayaran", "Belum Ada".to_string())));
        assert!(fields.contains(&("Meeting Point", "-".to_string())));
        assert!(fields.contains(&("Tanggal Pesan", "3 April 2025".to_string())));
        assert_eq!(booking_status_label("rejected"), "Ditolak");
        assert_eq!(booking_status_label("paid"), "Menunggu Aksi");
        assert_eq!(booking_date("kemarin"), "kemarin");
    }

    #[test]
    fn test_long_values_wrap_under_the_value_column() {
        let fields = vec![
            ("Nama Gunung", "Latimojong".to_string()),
            ("Agenda", "Kumpul di Makassar, berangkat ke Baraka, mendaki ke pos tujuh".to_string()),
        ];
        let lines = field_lines(&fields, LABEL_WIDTH + 1 + 20);
        assert!(lines.len() > fields.len());
        assert!(line_text(&lines[0]).starts_with("Nama Gunung"));
        let continuation = line_text(&lines[2]);
        assert!(continuation.starts_with(&" ".repeat(LABEL_WIDTH + 1)));
        assert!(lines.iter().all(|l| line_text(l).chars().count() <= LABEL_WIDTH + 1 + 20));
    }

    #[test]
    fn test_view_loads_record_and_retries_after_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut view = DetailView::new("Detail Trip", move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::Api { status: 500, message: None })
            } else {
                Ok(trip())
            }
        });
        settle(&mut view);
        assert_eq!(view.error(), Some(FALLBACK_MESSAGE));
        assert!(view.record().is_none());

        view.handle_key(KeyCode::Char('r'));
        settle(&mut view);
        assert!(view.error().is_none());
        assert_eq!(view.record().map(|t| t.mountain_name.as_str()), Some("Bawakaraeng"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(view.handle_key(KeyCode::Esc), ViewAction::Close));
    }
}
