use std::sync::Arc;

use comfy_table::Table;

use crate::api::ApiClient;
use crate::browser::ListRow;
use crate::error::Result;
use crate::models::{Booking, Staff, Trip, TripKind, User};
use crate::pager::PageInfo;
use crate::paginator::{contains_ci, InMemoryPaginator, Page, PageQuery, Paginator, RemotePaginator};
use crate::settings::load_settings;

use super::ListArgs;

/// Guides and porters are shown five to a page.
pub const STAFF_PER_PAGE: usize = 5;

// ---------------------------------------------------------------------------
// Paginators per resource
// ---------------------------------------------------------------------------

pub fn trips(client: ApiClient, kind: TripKind) -> Arc<dyn Paginator<Trip>> {
    Arc::new(RemotePaginator::new(move |page, query: &PageQuery| {
        let result = client.list_trips(kind, page, &query.search)?;
        Ok(Page {
            info: PageInfo::from_meta(&result.pagination),
            total_items: result.pagination.total_data as usize,
            items: result.trips,
        })
    }))
}

pub fn users(client: ApiClient, per_page: usize) -> Arc<dyn Paginator<User>> {
    Arc::new(InMemoryPaginator::new(
        per_page,
        |u: &User, needle| contains_ci(&u.name, needle),
        move || client.list_users(),
    ))
}

pub fn bookings(client: ApiClient, kind: TripKind, per_page: usize) -> Arc<dyn Paginator<Booking>> {
    Arc::new(InMemoryPaginator::new(
        per_page,
        |b: &Booking, needle| contains_ci(&b.participant_name, needle),
        move || client.list_bookings(kind),
    ))
}

pub fn guides(client: ApiClient) -> Arc<dyn Paginator<Staff>> {
    Arc::new(InMemoryPaginator::new(
        STAFF_PER_PAGE,
        |s: &Staff, needle| contains_ci(&s.name, needle),
        move || client.list_guides(),
    ))
}

pub fn porters(client: ApiClient) -> Arc<dyn Paginator<Staff>> {
    Arc::new(InMemoryPaginator::new(
        STAFF_PER_PAGE,
        |s: &Staff, needle| contains_ci(&s.name, needle),
        move || client.list_porters(),
    ))
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

pub fn format_page<T: ListRow>(title: &str, page: &Page<T>) -> String {
    let mut out = format!("{title}\n");
    if page.items.is_empty() {
        out.push_str("Tidak ada data\n");
    } else {
        let mut table = Table::new();
        table.set_header(T::HEADERS.to_vec());
        for item in &page.items {
            table.add_row(item.cells());
        }
        out.push_str(&table.to_string());
        out.push('\n');
    }
    out.push_str(&format!(
        "{} data, halaman {} dari {}\n",
        page.total_items, page.info.current_page, page.info.total_pages
    ));
    out.push_str(&page.info.window().render_text());
    out
}

fn print_page<T: ListRow>(title: &str, paginator: &dyn Paginator<T>, args: &ListArgs) -> Result<()> {
    let query = PageQuery::search(args.search.clone().unwrap_or_default());
    let page = paginator.fetch_page(args.page, &query)?;
    if page.info.total_pages > 0 && page.info.current_page != args.page {
        eprintln!(
            "Page {} is out of range, showing page {}",
            args.page, page.info.current_page
        );
    }
    println!("{}", format_page(title, &page));
    Ok(())
}

pub fn run_trips(kind: TripKind, args: &ListArgs) -> Result<()> {
    let client = super::client(&load_settings())?;
    print_page(kind.title(), trips(client, kind).as_ref(), args)
}

pub fn run_users(args: &ListArgs) -> Result<()> {
    let settings = load_settings();
    let client = super::client(&settings)?;
    print_page("Users", users(client, settings.items_per_page).as_ref(), args)
}

pub fn run_bookings(kind: TripKind, args: &ListArgs) -> Result<()> {
    let settings = load_settings();
    let client = super::client(&settings)?;
    let title = format!("Booking {}", kind.title());
    print_page(&title, bookings(client, kind, settings.items_per_page).as_ref(), args)
}

pub fn run_guides(args: &ListArgs) -> Result<()> {
    let client = super::client(&load_settings())?;
    print_page("Guides", guides(client).as_ref(), args)
}

pub fn run_porters(args: &ListArgs) -> Result<()> {
    let client = super::client(&load_settings())?;
    print_page("Porters", porters(client).as_ref(), args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(id: u32, name: &str) -> Trip {
        Trip {
            id: id.to_string(),
            mountain_name: name.to_string(),
            price: 1_500_000,
        }
    }

    #[test]
    fn test_format_page_with_pager() {
        let page = Page {
            items: vec![trip(1, "Rinjani"), trip(2, "Semeru")],
            info: PageInfo {
                current_page: 7,
                total_pages: 12,
            },
            total_items: 24,
        };
        let out = format_page("Open Trip", &page);
        assert!(out.starts_with("Open Trip\n"));
        assert!(out.contains("Rinjani"));
        assert!(out.contains("Rp 1.500.000"));
        assert!(out.contains("halaman 7 dari 12"));
        assert!(out.ends_with("\u{2039} Prev  1 \u{2026} 5 6 [7] 8 9 \u{2026} 12  Next \u{203a}"));
    }

    #[test]
    fn test_format_empty_page() {
        let page: Page<Staff> = Page {
            items: vec![],
            info: PageInfo::default(),
            total_items: 0,
        };
        let out = format_page("Porters", &page);
        assert!(out.contains("Tidak ada data"));
        assert!(out.contains("halaman 0 dari 0"));
    }
}
