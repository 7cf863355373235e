use std::sync::Arc;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use crate::api::ApiClient;
use crate::browser::ListBrowser;
use crate::error::{AppError, Result, FALLBACK_MESSAGE};
use crate::fmt::number;
use crate::models::{DashboardSummary, TripKind};
use crate::report::ReportPeriod;
use crate::settings::{load_settings, Settings};
use crate::tasks::{self, Pending, Poll};
use crate::tui::{
    rupiah_span, run_view, View, ViewAction, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE,
    SELECTED_STYLE,
};

use super::{details, lists};
use super::report::view::ReportScreen;

pub type SummaryFetcher = Arc<dyn Fn() -> Result<DashboardSummary> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuEntry {
    Trips(TripKind),
    Users,
    Bookings(TripKind),
    Guides,
    Porters,
    Report,
    Logout,
    Quit,
}

const MENU_ITEMS: &[(&str, MenuEntry)] = &[
    ("Open Trip", MenuEntry::Trips(TripKind::Open)),
    ("Private Trip", MenuEntry::Trips(TripKind::Private)),
    ("Users", MenuEntry::Users),
    ("Booking Open Trip", MenuEntry::Bookings(TripKind::Open)),
    ("Booking Private Trip", MenuEntry::Bookings(TripKind::Private)),
    ("Guides", MenuEntry::Guides),
    ("Porters", MenuEntry::Porters),
    ("Laporan Bulanan", MenuEntry::Report),
    ("Logout", MenuEntry::Logout),
    ("Keluar", MenuEntry::Quit),
];

/// Number of menu items in the left column; remainder goes in the right column.
const MENU_LEFT_COUNT: usize = 5;

enum Screen {
    Home,
    Child(Box<dyn View>),
}

enum Summary {
    Loading,
    Ready(DashboardSummary),
    Failed(String),
}

pub struct Dashboard {
    screen: Screen,
    settings: Settings,
    client: ApiClient,
    fetch: SummaryFetcher,
    summary: Summary,
    pending: Option<Pending<Result<DashboardSummary>>>,
    generation: u64,
    menu_selection: usize,
    status_message: Option<String>,
    logged_out: bool,
}

impl Dashboard {
    pub fn new(settings: Settings, client: ApiClient) -> Self {
        let api = client.clone();
        let fetch: SummaryFetcher = Arc::new(move || api.dashboard_summary());
        Self::with_fetcher(settings, client, fetch)
    }

    pub fn with_fetcher(settings: Settings, client: ApiClient, fetch: SummaryFetcher) -> Self {
        let mut dashboard = Self {
            screen: Screen::Home,
            settings,
            client,
            fetch,
            summary: Summary::Loading,
            pending: None,
            generation: 0,
            menu_selection: 0,
            status_message: None,
            logged_out: false,
        };
        dashboard.refresh();
        dashboard
    }

    pub fn logged_out(&self) -> bool {
        self.logged_out
    }

    #[cfg(test)]
    pub fn is_home(&self) -> bool {
        matches!(self.screen, Screen::Home)
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    #[cfg(test)]
    pub fn summary(&self) -> Option<&DashboardSummary> {
        match &self.summary {
            Summary::Ready(s) => Some(s),
            _ => None,
        }
    }

    fn refresh(&mut self) {
        self.generation += 1;
        let fetch = Arc::clone(&self.fetch);
        tracing::debug!(generation = self.generation, "loading dashboard summary");
        self.summary = Summary::Loading;
        self.pending = Some(tasks::spawn(self.generation, move || fetch()));
    }

    fn poll_summary(&mut self) {
        let Some(pending) = &self.pending else {
            return;
        };
        let stale = pending.generation() != self.generation;
        let result = match pending.poll() {
            Poll::Waiting => return,
            Poll::Done(result) => result,
            Poll::Lost => Err(AppError::Other(FALLBACK_MESSAGE.into())),
        };
        self.pending = None;
        if stale {
            return;
        }
        self.summary = match result {
            Ok(summary) => Summary::Ready(summary),
            Err(e) => {
                tracing::warn!(error = %e, "dashboard summary failed");
                Summary::Failed(e.user_message())
            }
        };
    }

    fn move_selection(&mut self, delta: isize) {
        let last = MENU_ITEMS.len() as isize - 1;
        self.menu_selection = (self.menu_selection as isize + delta).clamp(0, last) as usize;
    }

    fn open(&mut self, entry: MenuEntry) -> ViewAction {
        let client = self.client.clone();
        let per_page = self.settings.items_per_page;
        let view: Box<dyn View> = match entry {
            MenuEntry::Trips(kind) => Box::new(
                ListBrowser::new(kind.title(), lists::trips(client.clone(), kind))
                    .with_detail(details::open_trip(client)),
            ),
            MenuEntry::Users => Box::new(
                ListBrowser::new("Users", lists::users(client.clone(), per_page))
                    .with_detail(details::open_user(client)),
            ),
            MenuEntry::Bookings(kind) => Box::new(
                ListBrowser::new(
                    format!("Booking {}", kind.title()),
                    lists::bookings(client.clone(), kind, per_page),
                )
                .with_detail(details::open_booking(client)),
            ),
            MenuEntry::Guides => Box::new(ListBrowser::new("Guides", lists::guides(client))),
            MenuEntry::Porters => Box::new(ListBrowser::new("Porters", lists::porters(client))),
            MenuEntry::Report => {
                let period = ReportPeriod::current(&self.settings.report_years());
                Box::new(ReportScreen::from_client(period, self.settings.clone(), client))
            }
            MenuEntry::Logout => {
                return match self.client.logout() {
                    Ok(()) => {
                        self.logged_out = true;
                        ViewAction::Close
                    }
                    Err(e) => {
                        self.status_message = Some(e.user_message());
                        ViewAction::Continue
                    }
                };
            }
            MenuEntry::Quit => return ViewAction::Close,
        };
        self.screen = Screen::Child(view);
        ViewAction::Continue
    }

    fn handle_home_key(&mut self, code: KeyCode) -> ViewAction {
        self.status_message = None;
        match code {
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Left => self.move_selection(-(MENU_LEFT_COUNT as isize)),
            KeyCode::Right => self.move_selection(MENU_LEFT_COUNT as isize),
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Enter => return self.open(MENU_ITEMS[self.menu_selection].1),
            _ => {}
        }
        ViewAction::Continue
    }

    fn menu_item_line(&self, i: usize) -> Line<'static> {
        let label = MENU_ITEMS[i].0;
        if i == self.menu_selection {
            Line::from(Span::styled(format!(" > {label}"), SELECTED_STYLE))
        } else {
            Line::from(format!("   {label}"))
        }
    }

    fn draw_home(&self, frame: &mut Frame) {
        let area = frame.area();
        let border_style = Style::default().fg(Color::DarkGray);
        let menu_rows = MENU_LEFT_COUNT as u16 + 1;

        let [header_area, sep1, stats_area, sep2, chart_area, sep3, menu_area, hints_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(5),
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(menu_rows),
                Constraint::Length(1),
            ])
            .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" {} Admin", self.settings.company_name)).style(HEADER_STYLE),
            header_area,
        );

        let sep_line = "━".repeat(area.width as usize);
        let sep_widget = Paragraph::new(sep_line.as_str()).style(border_style);
        frame.render_widget(sep_widget.clone(), sep1);
        frame.render_widget(sep_widget.clone(), sep2);
        frame.render_widget(sep_widget, sep3);

        match &self.summary {
            Summary::Loading => {
                frame.render_widget(Paragraph::new(" Memuat...").style(FOOTER_STYLE), stats_area);
            }
            Summary::Failed(msg) => {
                frame.render_widget(
                    Paragraph::new(format!(" {msg}  (r=coba lagi)")).style(ERROR_STYLE),
                    stats_area,
                );
            }
            Summary::Ready(data) => {
                let [left_area, right_area] =
                    Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                        .areas(stats_area);

                let bold = Style::default().add_modifier(Modifier::BOLD);
                let trip_lines = vec![
                    Line::from(vec![
                        Span::raw(" "),
                        Span::styled(format!("{:<16}", "Open Trip"), bold),
                        Span::styled("Private Trip", bold),
                    ]),
                    Line::from(format!(
                        " {:<16}{}",
                        format!("{} trip", number(data.total_open_trip)),
                        format!("{} trip", number(data.total_private_trip))
                    )),
                    Line::from(format!(
                        " {:<16}{}",
                        format!("{} transaksi", number(data.total_open_trip_transactions)),
                        format!("{} transaksi", number(data.total_private_trip_transactions))
                    )),
                    Line::from(format!(
                        " {:<16}{}",
                        format!("{} peserta", number(data.total_open_trip_participants)),
                        format!("{} peserta", number(data.total_private_trip_participants))
                    )),
                ];
                frame.render_widget(Paragraph::new(trip_lines), left_area);

                let money_lines = vec![
                    Line::from(Span::styled(" Pembayaran", bold)),
                    Line::from(vec![Span::raw(" Lunas          "), Span::raw(number(data.total_paid))]),
                    Line::from(vec![
                        Span::raw(" Belum lunas    "),
                        Span::raw(number(data.total_unpaid)),
                    ]),
                    Line::from(vec![Span::raw(" Pendapatan     "), rupiah_span(data.total_revenue)]),
                ];
                frame.render_widget(Paragraph::new(money_lines), right_area);

                let open_style = Style::default().fg(Color::Rgb(80, 220, 100));
                let private_style = Style::default().fg(Color::Cyan);
                let bars = [
                    Bar::default()
                        .value(data.total_open_trip_participants)
                        .label(Line::from("Open"))
                        .style(open_style),
                    Bar::default()
                        .value(data.total_private_trip_participants)
                        .label(Line::from("Private"))
                        .style(private_style),
                ];
                let chart = BarChart::default()
                    .block(
                        Block::default()
                            .title(" Peserta per kategori")
                            .title_style(bold)
                            .borders(Borders::NONE),
                    )
                    .bar_width(9)
                    .bar_gap(2)
                    .data(BarGroup::default().bars(&bars));
                frame.render_widget(chart, chart_area);
            }
        }

        let [menu_title_area, menu_cols_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(menu_area);
        frame.render_widget(
            Paragraph::new(Span::styled(
                " Menu",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            menu_title_area,
        );
        let [menu_left, menu_right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(menu_cols_area);
        let left_lines: Vec<Line> = (0..MENU_LEFT_COUNT).map(|i| self.menu_item_line(i)).collect();
        frame.render_widget(Paragraph::new(left_lines), menu_left);
        let right_lines: Vec<Line> = (MENU_LEFT_COUNT..MENU_ITEMS.len())
            .map(|i| self.menu_item_line(i))
            .collect();
        frame.render_widget(Paragraph::new(right_lines), menu_right);

        if let Some(msg) = &self.status_message {
            frame.render_widget(Paragraph::new(format!(" {msg}")).style(ERROR_STYLE), hints_area);
        } else {
            frame.render_widget(
                Paragraph::new(" Arrows=navigate  Enter=select  r=refresh  q=quit").style(FOOTER_STYLE),
                hints_area,
            );
        }
    }
}

impl View for Dashboard {
    fn tick(&mut self) {
        self.poll_summary();
        if let Screen::Child(view) = &mut self.screen {
            view.tick();
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        let Screen::Child(view) = &mut self.screen else {
            return self.handle_home_key(code);
        };
        if matches!(view.handle_key(code), ViewAction::Close) {
            self.screen = Screen::Home;
            self.refresh();
        }
        ViewAction::Continue
    }

    fn draw(&mut self, frame: &mut Frame) {
        if let Screen::Child(view) = &mut self.screen {
            view.draw(frame);
            return;
        }
        self.draw_home(frame);
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

pub fn run() -> Result<()> {
    let settings = load_settings();
    let client = super::client(&settings)?;
    if client.credentials().get()?.is_none() {
        return Err(AppError::NotLoggedIn);
    }
    std::fs::create_dir_all(settings.exports_dir())?;

    let mut dashboard = Dashboard::new(settings, client);
    run_view(&mut dashboard)?;
    if dashboard.logged_out() {
        println!("Logged out.");
    }
    Ok(())
}
