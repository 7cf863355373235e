use std::sync::Arc;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    text::Line,
    widgets::{Paragraph, Row, Table, TableState},
    Frame,
};

use crate::error::{Result, FALLBACK_MESSAGE};
use crate::fmt::{number, rupiah};
use crate::models::{Booking, Staff, Trip, User};
use crate::pager::{PageInfo, PagerControl};
use crate::paginator::{Page, PageQuery, Paginator};
use crate::tasks::{self, Pending, Poll};
use crate::tui::{self, View, ViewAction, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE};

/// Column layout shared by the list browser and the plain-text list output.
pub trait ListRow {
    const HEADERS: &'static [&'static str];
    fn widths() -> Vec<Constraint>;
    fn cells(&self) -> Vec<String>;
}

impl ListRow for Trip {
    const HEADERS: &'static [&'static str] = &["ID", "Gunung", "Harga"];

    fn widths() -> Vec<Constraint> {
        vec![Constraint::Length(8), Constraint::Fill(1), Constraint::Length(16)]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.id.clone(), self.mountain_name.clone(), rupiah(self.price)]
    }
}

impl ListRow for User {
    const HEADERS: &'static [&'static str] = &["ID", "Nama", "No. HP", "Email"];

    fn widths() -> Vec<Constraint> {
        vec![
            Constraint::Length(8),
            Constraint::Fill(1),
            Constraint::Length(16),
            Constraint::Fill(1),
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.number.clone().unwrap_or_default(),
            self.email.clone().unwrap_or_default(),
        ]
    }
}

impl ListRow for Booking {
    const HEADERS: &'static [&'static str] = &["ID", "Peserta", "No. HP", "Gunung", "Status"];

    fn widths() -> Vec<Constraint> {
        vec![
            Constraint::Length(8),
            Constraint::Fill(1),
            Constraint::Length(16),
            Constraint::Fill(1),
            Constraint::Length(12),
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.participant_name.clone(),
            self.phone_number.clone().unwrap_or_default(),
            self.mountain_name.clone().unwrap_or_default(),
            self.payment_status.clone(),
        ]
    }
}

impl ListRow for Staff {
    const HEADERS: &'static [&'static str] = &["ID", "Nama"];

    fn widths() -> Vec<Constraint> {
        vec![Constraint::Length(8), Constraint::Fill(1)]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.id.clone(), self.name.clone()]
    }
}

// ---------------------------------------------------------------------------
// Browser
// ---------------------------------------------------------------------------

enum BrowseMode {
    Normal,
    GotoPage(String),
    Search(String),
}

type Opener<T> = Box<dyn Fn(&T) -> Box<dyn View>>;

/// Full-screen paged list over any `Paginator`. Pages load on a worker thread;
/// a response for anything but the latest request is dropped.
pub struct ListBrowser<T> {
    title: String,
    paginator: Arc<dyn Paginator<T>>,
    query: PageQuery,
    page: Option<Page<T>>,
    pending: Option<Pending<Result<Page<T>>>>,
    generation: u64,
    requested_page: u32,
    mode: BrowseMode,
    status_message: Option<String>,
    table_state: TableState,
    opener: Option<Opener<T>>,
    detail: Option<Box<dyn View>>,
}

impl<T: ListRow + Send + 'static> ListBrowser<T> {
    pub fn new(title: impl Into<String>, paginator: Arc<dyn Paginator<T>>) -> Self {
        let mut browser = Self {
            title: title.into(),
            paginator,
            query: PageQuery::default(),
            page: None,
            pending: None,
            generation: 0,
            requested_page: 1,
            mode: BrowseMode::Normal,
            status_message: None,
            table_state: TableState::default(),
            opener: None,
            detail: None,
        };
        browser.load(1);
        browser
    }

    /// Let Enter open a read-only view of the selected row.
    pub fn with_detail(mut self, open: impl Fn(&T) -> Box<dyn View> + 'static) -> Self {
        self.opener = Some(Box::new(open));
        self
    }

    pub fn info(&self) -> PageInfo {
        self.page.as_ref().map(|p| p.info).unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn items(&self) -> &[T] {
        self.page.as_ref().map(|p| p.items.as_slice()).unwrap_or(&[])
    }

    #[cfg(test)]
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    fn load(&mut self, page: u32) {
        self.generation += 1;
        self.requested_page = page;
        let paginator = Arc::clone(&self.paginator);
        let query = self.query.clone();
        tracing::debug!(title = %self.title, page, generation = self.generation, "loading page");
        // replacing an older Pending drops its receiver, so a late answer is discarded
        self.pending = Some(tasks::spawn(self.generation, move || {
            paginator.fetch_page(page, &query)
        }));
    }

    /// Apply a finished load, if any.
    fn poll_pending(&mut self) {
        let Some(pending) = &self.pending else {
            return;
        };
        if pending.generation() != self.generation {
            self.pending = None;
            return;
        }
        match pending.poll() {
            Poll::Waiting => {}
            Poll::Done(Ok(page)) => {
                let selected = (!page.items.is_empty()).then_some(0);
                self.page = Some(page);
                self.pending = None;
                self.table_state.select(selected);
            }
            Poll::Done(Err(e)) => {
                tracing::warn!(title = %self.title, error = %e, "page load failed");
                self.status_message = Some(e.user_message());
                self.pending = None;
            }
            Poll::Lost => {
                self.status_message = Some(FALLBACK_MESSAGE.to_string());
                self.pending = None;
            }
        }
    }

    /// Route a pager control through the pager's own activation rule.
    fn activate(&mut self, pick: impl Fn(&PagerControl) -> bool) {
        let controls = self.info().window().controls();
        let mut target = None;
        if let Some(control) = controls.iter().find(|c| pick(c)) {
            control.activate(|p| target = Some(p));
        }
        if let Some(p) = target {
            self.load(p);
        }
    }

    fn submit_input(&mut self) {
        let mode = std::mem::replace(&mut self.mode, BrowseMode::Normal);
        match mode {
            BrowseMode::GotoPage(input) => {
                let info = self.info();
                match input.trim().parse::<u32>() {
                    Ok(p) if info.window().accepts(p) => self.load(p),
                    _ => {
                        self.status_message =
                            Some(format!("Halaman harus 1-{}", info.total_pages.max(1)));
                    }
                }
            }
            BrowseMode::Search(input) => {
                self.query = PageQuery::search(input.trim());
                self.load(1);
            }
            BrowseMode::Normal => {}
        }
    }

    fn open_selected(&mut self) {
        let Some(open) = &self.opener else {
            return;
        };
        let Some(item) = self.table_state.selected().and_then(|i| self.items().get(i)) else {
            return;
        };
        let view = open(item);
        self.detail = Some(view);
    }

    fn move_selection(&mut self, down: bool) {
        let len = self.items().len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = if down {
            (current + 1).min(len - 1)
        } else {
            current.saturating_sub(1)
        };
        self.table_state.select(Some(next));
    }
}

impl<T: ListRow + Send + 'static> View for ListBrowser<T> {
    fn tick(&mut self) {
        self.poll_pending();
        if let Some(detail) = self.detail.as_mut() {
            detail.tick();
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        if let Some(detail) = self.detail.as_mut() {
            if let ViewAction::Close = detail.handle_key(code) {
                self.detail = None;
            }
            return ViewAction::Continue;
        }
        match &mut self.mode {
            BrowseMode::Normal => {
                self.status_message = None;
                match code {
                    KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
                    KeyCode::Enter => self.open_selected(),
                    KeyCode::Down => self.move_selection(true),
                    KeyCode::Up => self.move_selection(false),
                    KeyCode::Left | KeyCode::Char('p') | KeyCode::PageUp => {
                        self.activate(|c| matches!(c, PagerControl::Prev { .. }))
                    }
                    KeyCode::Right | KeyCode::Char('n') | KeyCode::PageDown => {
                        self.activate(|c| matches!(c, PagerControl::Next { .. }))
                    }
                    KeyCode::Home => self.activate(|c| c.target() == Some(1)),
                    KeyCode::End => {
                        let last = self.info().total_pages;
                        self.activate(move |c| {
                            !matches!(c, PagerControl::Next { .. }) && c.target() == Some(last)
                        })
                    }
                    KeyCode::Char('g') => self.mode = BrowseMode::GotoPage(String::new()),
                    KeyCode::Char('/') => self.mode = BrowseMode::Search(self.query.search.clone()),
                    KeyCode::Char('r') => {
                        self.paginator.refresh();
                        self.load(self.requested_page);
                    }
                    _ => {}
                }
            }
            BrowseMode::GotoPage(input) | BrowseMode::Search(input) => match code {
                KeyCode::Esc => self.mode = BrowseMode::Normal,
                KeyCode::Enter => self.submit_input(),
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            },
        }
        ViewAction::Continue
    }

    fn draw(&mut self, frame: &mut Frame) {
        if let Some(detail) = self.detail.as_mut() {
            detail.draw(frame);
            return;
        }
        let [title_area, table_area, pager_area, status_area, keys_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let title = if self.query.is_empty() {
            self.title.clone()
        } else {
            format!("{}  (cari: {})", self.title, self.query.search)
        };
        frame.render_widget(Paragraph::new(title).style(HEADER_STYLE), title_area);

        if self.page.is_none() {
            let msg = if self.is_loading() { "Memuat..." } else { "Tidak ada data" };
            frame.render_widget(Paragraph::new(msg).style(FOOTER_STYLE), table_area);
        } else if self.items().is_empty() {
            frame.render_widget(Paragraph::new("Tidak ada data").style(FOOTER_STYLE), table_area);
        } else {
            let rows: Vec<Row> = self.items().iter().map(|item| Row::new(item.cells())).collect();
            let table = Table::new(rows, T::widths())
                .header(Row::new(T::HEADERS.to_vec()).style(HEADER_STYLE).bottom_margin(1))
                .column_spacing(1)
                .row_highlight_style(SELECTED_STYLE);
            frame.render_stateful_widget(table, table_area, &mut self.table_state);
        }

        frame.render_widget(Paragraph::new(tui::pager_line(self.info())), pager_area);

        let status = match (&self.status_message, &self.page) {
            (Some(msg), _) => Line::styled(msg.clone(), ERROR_STYLE),
            (None, Some(page)) => Line::styled(
                format!(
                    "{} data | halaman {} dari {}{}",
                    number(page.total_items as u64),
                    page.info.current_page,
                    page.info.total_pages,
                    if self.is_loading() { " | memuat..." } else { "" }
                ),
                FOOTER_STYLE,
            ),
            (None, None) => Line::default(),
        };
        frame.render_widget(Paragraph::new(status), status_area);

        let keys = match &self.mode {
            BrowseMode::Normal => Paragraph::new(format!(
                "\u{2190}/\u{2192}:page  Home/End:first/last  g:go to  /:search  r:refresh{}  q:back",
                if self.opener.is_some() { "  Enter:detail" } else { "" }
            ))
            .style(FOOTER_STYLE),
            BrowseMode::GotoPage(input) => Paragraph::new(format!("Go to page: {input}\u{2588}")),
            BrowseMode::Search(input) => Paragraph::new(format!("Search: {input}\u{2588}")),
        };
        frame.render_widget(keys, keys_area);
    }
}
