use chrono::{Datelike, NaiveDate};

use crate::report::Month;

/// Group an integer into thousands with `.` separators: 1.234.567
pub fn number(val: u64) -> String {
    let digits = val.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

/// Format a whole-rupiah amount: Rp 1.000.000
pub fn rupiah(val: u64) -> String {
    format!("Rp {}", number(val))
}

/// Long Indonesian date as printed on reports: 19 Oktober 2026
pub fn long_date(date: NaiveDate) -> String {
    // month() is always 1..=12 for a valid NaiveDate
    let month = Month::from_number(date.month()).map(Month::label).unwrap_or("");
    format!("{} {} {}", date.day(), month, date.year())
}
