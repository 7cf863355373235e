use serde::{Deserialize, Deserializer};

use crate::pager::PaginationMeta;

/// Standard `{ status, message, data }` wrapper every endpoint responds with.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripKind {
    Open,
    Private,
}

impl TripKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TripKind::Open => "open",
            TripKind::Private => "private",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            TripKind::Open => "Open Trip",
            TripKind::Private => "Private Trip",
        }
    }
}

// ---------------------------------------------------------------------------
// Monthly statistics
// ---------------------------------------------------------------------------

/// One mountain's figures for a reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TripStatRecord {
    pub mountain_name: String,
    #[serde(default, deserialize_with = "de_amount")]
    pub total_participants: u64,
    #[serde(default, deserialize_with = "de_amount")]
    pub total_price: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryStats {
    #[serde(default)]
    pub trips: Vec<TripStatRecord>,
    #[serde(default, deserialize_with = "de_amount")]
    pub total_price: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonthlyStatistics {
    pub open_trip: CategoryStats,
    pub private_trip: CategoryStats,
}

// ---------------------------------------------------------------------------
// Dashboard summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashboardSummary {
    #[serde(deserialize_with = "de_amount")]
    pub total_open_trip: u64,
    #[serde(deserialize_with = "de_amount")]
    pub total_private_trip: u64,
    #[serde(deserialize_with = "de_amount")]
    pub total_open_trip_transactions: u64,
    #[serde(deserialize_with = "de_amount")]
    pub total_private_trip_transactions: u64,
    #[serde(deserialize_with = "de_amount")]
    pub total_open_trip_participants: u64,
    #[serde(deserialize_with = "de_amount")]
    pub total_private_trip_participants: u64,
    #[serde(deserialize_with = "de_amount")]
    pub total_paid: u64,
    #[serde(deserialize_with = "de_amount")]
    pub total_unpaid: u64,
    #[serde(deserialize_with = "de_amount")]
    pub total_revenue: u64,
}

// ---------------------------------------------------------------------------
// List resources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Trip {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub mountain_name: String,
    #[serde(default, deserialize_with = "de_amount")]
    pub price: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripPage {
    #[serde(default)]
    pub trips: Vec<Trip>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Booking {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub participant_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub mountain_name: Option<String>,
    #[serde(default)]
    pub payment_status: String,
}

/// Guides and porters share one shape.
#[derive(Debug, Clone, Deserialize)]
pub struct Staff {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Detail records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserDetail {
    pub name: String,
    #[serde(deserialize_with = "de_text")]
    pub username: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub number: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub photo: Option<String>,
}

/// Only the name of an assigned guide or porter is shown.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StaffName {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TripDetail {
    pub mountain_name: String,
    #[serde(deserialize_with = "de_amount")]
    pub price: u64,
    #[serde(deserialize_with = "de_text")]
    pub trip_type: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub equipment: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub estimation_time: Option<String>,
    /// Departure hour, e.g. 7 for 07:00.
    #[serde(deserialize_with = "de_text")]
    pub traveling_time: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub agenda: Option<String>,
    pub guide: Option<StaffName>,
    pub porters: Vec<StaffName>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingDetail {
    pub participant_name: String,
    #[serde(deserialize_with = "de_text")]
    pub phone_number: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub mountain_name: Option<String>,
    #[serde(deserialize_with = "de_amount")]
    pub total_price: u64,
    #[serde(deserialize_with = "de_text")]
    pub meeting_point: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub payment_proof: Option<String>,
    pub status: String,
    #[serde(deserialize_with = "de_text")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub token: String,
}

// ---------------------------------------------------------------------------
// Lenient number decoding
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(u64),
    Float(f64),
    Text(String),
    Null(()),
}

/// Amounts arrive as integers, floats or numeric strings depending on the endpoint.
fn de_amount<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u64, D::Error> {
    match RawNumber::deserialize(d)? {
        RawNumber::Int(n) => Ok(n),
        RawNumber::Float(f) if f >= 0.0 && f.is_finite() => Ok(f.round() as u64),
        RawNumber::Float(f) => Err(serde::de::Error::custom(format!("invalid amount {f}"))),
        RawNumber::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| *f >= 0.0 && f.is_finite())
            .map(|f| f.round() as u64)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid amount {s:?}"))),
        RawNumber::Null(()) => Ok(0),
    }
}

fn de_id<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id {other}"))),
    }
}

/// Free-text fields that some rows send as numbers, and some leave null or blank.
fn de_text<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    let text = match Option::<serde_json::Value>::deserialize(d)? {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => return Ok(None),
    };
    Ok((!text.trim().is_empty()).then_some(text))
}
