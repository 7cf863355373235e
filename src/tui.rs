use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::Frame;

use crate::error::Result;
use crate::fmt::rupiah;
use crate::pager::{PageInfo, PagerControl};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));

pub const ERROR_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

const CURRENT_PAGE_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

/// How long the event loop waits for input before polling background work.
pub const TICK: Duration = Duration::from_millis(100);

pub fn rupiah_span(amount: u64) -> Span<'static> {
    Span::styled(rupiah(amount), AMOUNT_STYLE)
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

/// Pager bar built from the pager's controls. Disabled Prev/Next are dimmed.
pub fn pager_line(info: PageInfo) -> Line<'static> {
    let mut spans = Vec::new();
    for control in info.window().controls() {
        let span = match control {
            PagerControl::Prev { disabled, .. } => {
                Span::styled("\u{2039} Prev", if disabled { FOOTER_STYLE } else { Style::new() })
            }
            PagerControl::Next { disabled, .. } => {
                Span::styled("Next \u{203a}", if disabled { FOOTER_STYLE } else { Style::new() })
            }
            PagerControl::Jump(p) => Span::raw(p.to_string()),
            PagerControl::Ellipsis => Span::styled("\u{2026}", FOOTER_STYLE),
            PagerControl::Page { number, current: true } => {
                Span::styled(format!(" {number} "), CURRENT_PAGE_STYLE)
            }
            PagerControl::Page { number, .. } => Span::raw(number.to_string()),
        };
        if !spans.is_empty() {
            spans.push(Span::raw("  "));
        }
        spans.push(span);
    }
    Line::from(spans)
}

// ---------------------------------------------------------------------------
// View infrastructure
// ---------------------------------------------------------------------------

pub enum ViewAction {
    Continue,
    Close,
}

pub trait View {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ViewAction;
    /// Called every loop iteration; views poll their background work here.
    fn tick(&mut self) {}
}

/// Run a full-screen view until it closes. Sets up the terminal and panic
/// hook, and restores the terminal on exit.
pub fn run_view(view: &mut dyn View) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        view.tick();
        if let Err(e) = terminal.draw(|frame| view.draw(frame)) {
            break Err(e.into());
        }

        match event::poll(TICK) {
            Err(e) => break Err(e.into()),
            Ok(false) => continue,
            Ok(true) => {}
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    break Ok(());
                }
                match view.handle_key(key.code) {
                    ViewAction::Close => break Ok(()),
                    ViewAction::Continue => {}
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_pager_line_middle() {
        let line = pager_line(PageInfo {
            current_page: 7,
            total_pages: 12,
        });
        assert_eq!(
            line_text(&line),
            "\u{2039} Prev  1  \u{2026}  5  6   7   8  9  \u{2026}  12  Next \u{203a}"
        );
    }

    #[test]
    fn test_pager_line_disables_prev_on_first_page() {
        let line = pager_line(PageInfo {
            current_page: 1,
            total_pages: 3,
        });
        assert_eq!(line.spans[0].style, FOOTER_STYLE);
        let last = line.spans.last().unwrap();
        assert_ne!(last.style, FOOTER_STYLE);
    }

    #[test]
    fn test_pager_line_without_pages() {
        let line = pager_line(PageInfo::default());
        assert_eq!(line_text(&line), "\u{2039} Prev  Next \u{203a}");
    }

    #[test]
    fn test_wrap_text() {
        let (s, n) = wrap_text("Gunung Bawakaraeng via Lembanna", 10);
        assert!(n > 1);
        assert!(s.contains('\n'));
        assert_eq!(wrap_text("x", 0).1, 1);
    }
}
