//! Windowed page-number selection shared by every list screen.
//!
//! A list screen shows at most `window_size` numbered page controls centred on
//! the current page, plus shortcuts to the first and last page when the window
//! does not reach them, and Prev/Next controls.

use std::ops::RangeInclusive;

use serde::Deserialize;

pub const DEFAULT_WINDOW: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub current_page: u32,
    pub total_pages: u32,
    start: u32,
    end: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerControl {
    Prev { target: u32, disabled: bool },
    /// Shortcut to the first or last page, outside the numbered window.
    Jump(u32),
    Ellipsis,
    Page { number: u32, current: bool },
    Next { target: u32, disabled: bool },
}

impl PagerControl {
    /// Page requested when this control is activated, if it can be activated.
    pub fn target(&self) -> Option<u32> {
        match *self {
            PagerControl::Prev { target, disabled } | PagerControl::Next { target, disabled } => {
                (!disabled).then_some(target)
            }
            PagerControl::Jump(p) => Some(p),
            PagerControl::Page { number, .. } => Some(number),
            PagerControl::Ellipsis => None,
        }
    }

    /// Invoke `on_change` with this control's page. Bounds are the caller's job.
    pub fn activate(&self, mut on_change: impl FnMut(u32)) {
        if let Some(p) = self.target() {
            on_change(p);
        }
    }
}

impl PageWindow {
    pub fn new(current_page: u32, total_pages: u32) -> Self {
        Self::with_size(current_page, total_pages, DEFAULT_WINDOW)
    }

    pub fn with_size(current_page: u32, total_pages: u32, window_size: u32) -> Self {
        let window_size = window_size.max(1);
        let half = window_size / 2;
        let mut start = current_page.saturating_sub(half).max(1);
        let mut end = start.saturating_add(window_size - 1);
        if end > total_pages {
            end = total_pages;
            start = end.saturating_add(1).saturating_sub(window_size).max(1);
        }
        Self {
            current_page,
            total_pages,
            start,
            end,
        }
    }

    /// Numbered pages to render. Empty when there are no pages.
    pub fn pages(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }

    #[cfg(test)]
    pub fn start(&self) -> u32 {
        self.start
    }

    #[cfg(test)]
    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn shows_first(&self) -> bool {
        self.total_pages > 0 && self.start > 1
    }

    pub fn leading_ellipsis(&self) -> bool {
        self.shows_first() && self.start > 2
    }

    pub fn shows_last(&self) -> bool {
        self.end < self.total_pages
    }

    pub fn trailing_ellipsis(&self) -> bool {
        self.shows_last() && self.end.saturating_add(1) < self.total_pages
    }

    pub fn prev_disabled(&self) -> bool {
        self.current_page <= 1
    }

    pub fn next_disabled(&self) -> bool {
        self.total_pages == 0 || self.current_page >= self.total_pages
    }

    /// True when `page` names an existing page.
    pub fn accepts(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }

    /// Controls in display order: Prev, [1, …], window, […, last], Next.
    pub fn controls(&self) -> Vec<PagerControl> {
        let mut out = Vec::with_capacity(self.pages().count() + 6);
        out.push(PagerControl::Prev {
            target: self.current_page.saturating_sub(1),
            disabled: self.prev_disabled(),
        });
        if self.shows_first() {
            out.push(PagerControl::Jump(1));
            if self.leading_ellipsis() {
                out.push(PagerControl::Ellipsis);
            }
        }
        for number in self.pages() {
            out.push(PagerControl::Page {
                number,
                current: number == self.current_page,
            });
        }
        if self.shows_last() {
            if self.trailing_ellipsis() {
                out.push(PagerControl::Ellipsis);
            }
            out.push(PagerControl::Jump(self.total_pages));
        }
        out.push(PagerControl::Next {
            target: self.current_page.saturating_add(1),
            disabled: self.next_disabled(),
        });
        out
    }

    /// Plain-text pager line: `‹ Prev  1 … 5 6 [7] 8 9 … 12  Next ›`
    pub fn render_text(&self) -> String {
        let mut parts = Vec::new();
        for control in self.controls() {
            let s = match control {
                PagerControl::Prev { disabled, .. } => {
                    if disabled { "  " } else { "\u{2039} Prev " }.to_string()
                }
                PagerControl::Next { disabled, .. } => {
                    if disabled { "  " } else { " Next \u{203a}" }.to_string()
                }
                PagerControl::Jump(p) => p.to_string(),
                PagerControl::Ellipsis => "\u{2026}".to_string(),
                PagerControl::Page { number, current: true } => format!("[{number}]"),
                PagerControl::Page { number, .. } => number.to_string(),
            };
            parts.push(s);
        }
        parts.join(" ").trim().to_string()
    }
}

// ---------------------------------------------------------------------------
// Normalized page position
// ---------------------------------------------------------------------------

/// Pagination block returned by server-paginated list endpoints.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub last_page: u32,
    #[serde(default)]
    pub total_data: u64,
    #[serde(default)]
    pub limit: u32,
}

/// The one contract the pager accepts: where we are and how many pages exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
}

impl PageInfo {
    pub fn from_meta(meta: &PaginationMeta) -> Self {
        Self {
            current_page: clamp_page(meta.current_page, meta.last_page),
            total_pages: meta.last_page,
        }
    }

    /// Client-side variant: derive the page count from an item count.
    pub fn from_item_count(current_page: u32, total_items: usize, per_page: usize) -> Self {
        let total_pages = total_pages_for(total_items, per_page);
        Self {
            current_page: clamp_page(current_page, total_pages),
            total_pages,
        }
    }

    pub fn window(&self) -> PageWindow {
        PageWindow::new(self.current_page, self.total_pages)
    }
}

pub fn total_pages_for(total_items: usize, per_page: usize) -> u32 {
    if per_page == 0 {
        return 0;
    }
    total_items.div_ceil(per_page) as u32
}

/// Clamp a requested page into `1..=total_pages` (1 when there are no pages).
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_vec(w: &PageWindow) -> Vec<u32> {
        w.pages().collect()
    }

    #[test]
    fn test_middle_of_twelve_pages() {
        let w = PageWindow::with_size(7, 12, 5);
        assert_eq!(window_vec(&w), vec![5, 6, 7, 8, 9]);
        assert!(w.shows_first());
        assert!(w.leading_ellipsis());
        assert!(w.shows_last());
        assert!(w.trailing_ellipsis());
        assert!(!w.prev_disabled());
        assert!(!w.next_disabled());
    }

    #[test]
    fn test_three_pages_from_first() {
        let w = PageWindow::with_size(1, 3, 5);
        assert_eq!(window_vec(&w), vec![1, 2, 3]);
        assert!(!w.shows_first());
        assert!(!w.leading_ellipsis());
        assert!(!w.shows_last());
        assert!(!w.trailing_ellipsis());
        assert!(w.prev_disabled());
        assert!(!w.next_disabled());
    }

    #[test]
    fn test_zero_pages_renders_no_buttons() {
        let w = PageWindow::new(1, 0);
        assert_eq!(w.pages().count(), 0);
        assert!(!w.shows_first());
        assert!(!w.shows_last());
        assert!(w.prev_disabled());
        assert!(w.next_disabled());
        let controls = w.controls();
        assert_eq!(controls.len(), 2);
        assert!(controls.iter().all(|c| c.target().is_none()));
    }

    #[test]
    fn test_clamped_at_end_is_flush() {
        let w = PageWindow::new(12, 12);
        assert_eq!(window_vec(&w), vec![8, 9, 10, 11, 12]);
        assert!(w.next_disabled());
        assert!(w.leading_ellipsis());
        assert!(!w.shows_last());
    }

    #[test]
    fn test_gap_of_one_has_no_ellipsis() {
        // window 2..=6 of 7: shortcut to 1 without ellipsis, shortcut to 7 without ellipsis
        let w = PageWindow::new(4, 7);
        assert_eq!(window_vec(&w), vec![2, 3, 4, 5, 6]);
        assert!(w.shows_first() && !w.leading_ellipsis());
        assert!(w.shows_last() && !w.trailing_ellipsis());
    }

    #[test]
    fn test_window_properties_hold_for_all_inputs() {
        for size in [1u32, 3, 5, 7] {
            for total in 0u32..=30 {
                for current in 1..=total {
                    let w = PageWindow::with_size(current, total, size);
                    let pages = window_vec(&w);
                    assert_eq!(pages.len() as u32, size.min(total), "size={size} total={total} cur={current}");
                    assert!(pages.windows(2).all(|p| p[1] == p[0] + 1));
                    assert!(pages.iter().all(|&p| p >= 1 && p <= total));
                    assert!(pages.contains(&current));

                    let half = size / 2;
                    if total < size {
                        assert_eq!((w.start(), w.end()), (1, total));
                    } else if current <= half {
                        assert_eq!(w.start(), 1);
                    } else if current + half > total {
                        assert_eq!(w.end(), total);
                    } else {
                        assert_eq!((w.start(), w.end()), (current - half, current + half));
                    }

                    assert_eq!(w.shows_first(), w.start() > 1);
                    assert_eq!(w.shows_last(), w.end() < total);
                    assert_eq!(w.leading_ellipsis(), w.start() > 2);
                    assert_eq!(w.trailing_ellipsis(), w.end() + 1 < total);
                }
            }
        }
    }

    #[test]
    fn test_controls_order_and_targets() {
        let w = PageWindow::new(7, 12);
        let controls = w.controls();
        assert_eq!(controls.first(), Some(&PagerControl::Prev { target: 6, disabled: false }));
        assert_eq!(controls[1], PagerControl::Jump(1));
        assert_eq!(controls[2], PagerControl::Ellipsis);
        assert_eq!(controls[5], PagerControl::Page { number: 7, current: true });
        assert_eq!(controls[controls.len() - 2], PagerControl::Jump(12));
        assert_eq!(controls.last(), Some(&PagerControl::Next { target: 8, disabled: false }));
    }

    #[test]
    fn test_extreme_page_numbers_do_not_overflow() {
        let w = PageWindow::new(u32::MAX, u32::MAX);
        assert_eq!(w.end(), u32::MAX);
        let controls = w.controls();
        assert_eq!(
            controls.last(),
            Some(&PagerControl::Next { target: u32::MAX, disabled: true })
        );
        assert!(controls.contains(&PagerControl::Page { number: u32::MAX, current: true }));
        assert!(!w.render_text().is_empty());
    }

    #[test]
    fn test_activate_invokes_callback_with_page() {
        let mut requested = Vec::new();
        for control in PageWindow::new(1, 3).controls() {
            control.activate(|p| requested.push(p));
        }
        // Prev disabled; pages 1..3; Next -> 2
        assert_eq!(requested, vec![1, 2, 3, 2]);
    }

    #[test]
    fn test_render_text() {
        assert_eq!(
            PageWindow::new(7, 12).render_text(),
            "\u{2039} Prev  1 \u{2026} 5 6 [7] 8 9 \u{2026} 12  Next \u{203a}"
        );
        assert_eq!(PageWindow::new(1, 3).render_text(), "[1] 2 3  Next \u{203a}");
    }

    #[test]
    fn test_page_info_from_meta_and_counts() {
        let meta = PaginationMeta {
            current_page: 3,
            last_page: 4,
            total_data: 37,
            limit: 10,
        };
        assert_eq!(
            PageInfo::from_meta(&meta),
            PageInfo { current_page: 3, total_pages: 4 }
        );

        let info = PageInfo::from_item_count(9, 17, 8);
        assert_eq!(info, PageInfo { current_page: 3, total_pages: 3 });

        let empty = PageInfo::from_item_count(1, 0, 8);
        assert_eq!(empty, PageInfo { current_page: 1, total_pages: 0 });
    }

    #[test]
    fn test_total_pages_for() {
        assert_eq!(total_pages_for(0, 5), 0);
        assert_eq!(total_pages_for(5, 5), 1);
        assert_eq!(total_pages_for(6, 5), 2);
        assert_eq!(total_pages_for(6, 0), 0);
    }

    #[test]
    fn test_accepts_and_clamp() {
        let w = PageWindow::new(2, 4);
        assert!(!w.accepts(0));
        assert!(w.accepts(4));
        assert!(!w.accepts(5));
        assert_eq!(clamp_page(0, 4), 1);
        assert_eq!(clamp_page(9, 4), 4);
        assert_eq!(clamp_page(3, 0), 1);
    }
}
