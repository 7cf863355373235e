use comfy_table::Table;

use crate::api::ApiClient;
use crate::detail::{DetailRecord, DetailView};
use crate::error::Result;
use crate::models::{Booking, Trip, User};
use crate::settings::load_settings;
use crate::tui::View;

// ---------------------------------------------------------------------------
// Openers for the list browsers
// ---------------------------------------------------------------------------

pub fn open_user(client: ApiClient) -> impl Fn(&User) -> Box<dyn View> {
    move |user: &User| -> Box<dyn View> {
        let client = client.clone();
        let id = user.id.clone();
        Box::new(DetailView::new("Detail Pengguna", move || client.user_detail(&id)))
    }
}

pub fn open_trip(client: ApiClient) -> impl Fn(&Trip) -> Box<dyn View> {
    move |trip: &Trip| -> Box<dyn View> {
        let client = client.clone();
        let id = trip.id.clone();
        Box::new(DetailView::new("Detail Trip", move || client.trip_detail(&id)))
    }
}

pub fn open_booking(client: ApiClient) -> impl Fn(&Booking) -> Box<dyn View> {
    move |booking: &Booking| -> Box<dyn View> {
        let client = client.clone();
        let id = booking.id.clone();
        Box::new(DetailView::new("Detail Transaksi", move || client.booking_detail(&id)))
    }
}

// ---------------------------------------------------------------------------
// `show` commands
// ---------------------------------------------------------------------------

pub fn format_detail<T: DetailRecord>(record: &T) -> String {
    let mut table = Table::new();
    for (label, value) in record.fields() {
        table.add_row(vec![label.to_string(), value]);
    }
    format!("{}\n{table}", record.title())
}

fn show<T: DetailRecord>(fetch: impl FnOnce(&ApiClient) -> Result<T>) -> Result<()> {
    let client = super::client(&load_settings())?;
    let record = fetch(&client)?;
    println!("{}", format_detail(&record));
    Ok(())
}

pub fn run_user(id: &str) -> Result<()> {
    show(|client| client.user_detail(id))
}

pub fn run_trip(id: &str) -> Result<()> {
    show(|client| client.trip_detail(id))
}

pub fn run_booking(id: &str) -> Result<()> {
    show(|client| client.booking_detail(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingDetail, UserDetail};

    #[test]
    fn test_format_user_detail() {
        let user = UserDetail {
            name: "Andi".into(),
            email: Some("andi@mail.id".into()),
            ..UserDetail::default()
        };
        let out = format_detail(&user);
        assert!(out.starts_with("Detail Pengguna\n"));
        assert!(out.contains("andi@mail.id"));
        assert!(out.contains("Username"));
    }

    #[test]
    fn test_format_booking_detail_shows_status_label() {
        let booking = BookingDetail {
            participant_name: "Sitti".into(),
            total_price: 1_500_000,
            status: "rejected".into(),
            ..BookingDetail::default()
        };
        let out = format_detail(&booking);
        assert!(out.contains("Ditolak"));
        assert!(out.contains("Rp 1.500.000"));
        assert!(out.contains("Belum Ada"));
    }
}
