//! Blocking client for the GaPakeRem REST backend.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::credentials::{CredentialProvider, Token, SESSION_TTL};
use crate::error::{AppError, Result};
use crate::models::{
    Booking, BookingDetail, DashboardSummary, Envelope, LoginData, MonthlyStatistics, Staff,
    TripDetail, TripKind, TripPage, TripStatRecord, User, UserDetail,
};
use crate::report::{aggregate, MonthlyReport, ReportPeriod};
use crate::settings::Settings;

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    pub fn new(settings: &Settings, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("gapakerem/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            http,
            base_url: settings.api_url(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.credentials.get()?.ok_or(AppError::NotLoggedIn)?;
        Ok(builder.bearer_auth(token.expose()))
    }

    fn get_data<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        tracing::debug!(%url, ?query, "GET");
        let response = self.authorized(self.http.get(&url).query(query))?.send()?;
        let body = read_body(response)?;
        unwrap_data(&body, path)
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Exchange credentials for a token and store it for one day.
    pub fn login(&self, username: &str, password: &str) -> Result<()> {
        let url = self.url("/login");
        tracing::info!(%url, username, "logging in");
        let payload = serde_json::json!({ "username": username, "password": password });
        let response = self.http.post(&url).json(&payload).send()?;
        let body = read_body(response)?;
        let data: LoginData = unwrap_data(&body, "/login")?;
        if data.token.trim().is_empty() {
            return Err(AppError::Malformed("login response has an empty token".into()));
        }
        self.credentials.set(Token::new(data.token), SESSION_TTL)
    }

    pub fn logout(&self) -> Result<()> {
        self.credentials.clear()
    }

    // -----------------------------------------------------------------------
    // Dashboard and report
    // -----------------------------------------------------------------------

    pub fn dashboard_summary(&self) -> Result<DashboardSummary> {
        self.get_data("/dashboard", &[])
    }

    pub fn monthly_statistics(&self, period: &ReportPeriod) -> Result<MonthlyStatistics> {
        self.get_data("/dashboard/monthly-trip-statistics", &period_query(period))
    }

    /// Fetch both collections for a period. Totals are always recomputed from
    /// the records; a disagreeing server total is only logged.
    pub fn monthly_report(&self, period: &ReportPeriod) -> Result<MonthlyReport> {
        let stats = self.monthly_statistics(period)?;
        Ok(report_from_statistics(*period, stats))
    }

    // -----------------------------------------------------------------------
    // Lists
    // -----------------------------------------------------------------------

    pub fn list_trips(&self, kind: TripKind, page: u32, search: &str) -> Result<TripPage> {
        let mut query = vec![("page", page.max(1).to_string())];
        if !search.trim().is_empty() {
            query.push(("search", search.trim().to_string()));
        }
        self.get_data(&format!("/trips/{}", kind.as_str()), &query)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let data: UsersData = self.get_data("/users", &[])?;
        Ok(data.users)
    }

    pub fn list_bookings(&self, kind: TripKind) -> Result<Vec<Booking>> {
        let data: BookingsData =
            self.get_data("/bookings/", &[("trip_type", kind.as_str().to_string())])?;
        Ok(data.bookings)
    }

    pub fn list_guides(&self) -> Result<Vec<Staff>> {
        let data: GuidesData = self.get_data("/guides", &[])?;
        Ok(data.guides)
    }

    pub fn list_porters(&self) -> Result<Vec<Staff>> {
        let data: PortersData = self.get_data("/porters", &[])?;
        Ok(data.porters)
    }

    // -----------------------------------------------------------------------
    // Details
    // -----------------------------------------------------------------------

    pub fn user_detail(&self, id: &str) -> Result<UserDetail> {
        self.get_data(&detail_path("users", id)?, &[])
    }

    pub fn trip_detail(&self, id: &str) -> Result<TripDetail> {
        self.get_data(&detail_path("trips", id)?, &[])
    }

    pub fn booking_detail(&self, id: &str) -> Result<BookingDetail> {
        self.get_data(&detail_path("bookings", id)?, &[])
    }
}

#[derive(Deserialize)]
struct UsersData {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Deserialize)]
struct BookingsData {
    #[serde(default)]
    bookings: Vec<Booking>,
}

#[derive(Deserialize)]
struct GuidesData {
    #[serde(default)]
    guides: Vec<Staff>,
}

#[derive(Deserialize)]
struct PortersData {
    #[serde(default)]
    porters: Vec<Staff>,
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

fn endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// `/users/17`. Ids are path segments, so anything beyond a plain token is refused.
fn detail_path(resource: &str, id: &str) -> Result<String> {
    let id = id.trim();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(AppError::Other(format!("invalid id {id:?}")));
    }
    Ok(format!("/{resource}/{id}"))
}

/// The backend takes the month as a plain integer: 4, not "04".
fn period_query(period: &ReportPeriod) -> [(&'static str, String); 2] {
    [
        ("month", period.month.number().to_string()),
        ("year", period.year.to_string()),
    ]
}

fn read_body(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text()?;
    check_status(status.as_u16(), &body)?;
    Ok(body)
}

fn check_status(status: u16, body: &str) -> Result<()> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    tracing::warn!(status, "request failed");
    if status == 401 {
        return Err(AppError::Unauthorized);
    }
    Err(AppError::Api {
        status,
        message: error_message(body),
    })
}

/// Pull `message` out of an error body, whatever else it contains.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

fn unwrap_data<T: DeserializeOwned>(body: &str, path: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(body).map_err(|e| {
        tracing::warn!(path, error = %e, "could not decode response");
        AppError::Malformed(format!("{path}: {e}"))
    })?;
    if envelope.status == Some(false) {
        return Err(AppError::Api {
            status: 200,
            message: envelope.message,
        });
    }
    envelope
        .data
        .ok_or_else(|| AppError::Malformed(format!("{path}: response has no data")))
}

pub fn report_from_statistics(period: ReportPeriod, stats: MonthlyStatistics) -> MonthlyReport {
    let report = MonthlyReport::new(period, stats.open_trip.trips, stats.private_trip.trips);
    let totals = aggregate(&report.open_trips, &report.private_trips);
    warn_on_mismatch("open", stats.open_trip.total_price, totals.total_open_revenue, &report.open_trips);
    warn_on_mismatch(
        "private",
        stats.private_trip.total_price,
        totals.total_private_revenue,
        &report.private_trips,
    );
    report
}

fn warn_on_mismatch(category: &str, reported: u64, computed: u64, records: &[TripStatRecord]) {
    if reported != computed {
        tracing::warn!(
            category,
            reported,
            computed,
            records = records.len(),
            "server total_price disagrees with record sum, using record sum"
        );
    }
}
