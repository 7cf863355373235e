use thiserror::Error;

/// Shown whenever a failure carries no usable message of its own.
pub const FALLBACK_MESSAGE: &str = "Gagal memuat data";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error ({status}): {}", .message.as_deref().unwrap_or(FALLBACK_MESSAGE))]
    Api {
        status: u16,
        message: Option<String>,
    },

    #[error("Session expired or invalid, run `gapakerem login` again")]
    Unauthorized,

    #[error("Not logged in, run `gapakerem login` first")]
    NotLoggedIn,

    #[error("Invalid report period: {0}")]
    InvalidPeriod(String),

    #[error("Unexpected response: {0}")]
    Malformed(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Print error: {0}")]
    Print(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Credential store error: {0}")]
    Credentials(String),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Text for a transient notification. Server-provided messages are shown
    /// as-is; anything without one falls back to a generic line.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api { message: Some(m), .. } if !m.trim().is_empty() => m.clone(),
            AppError::Api { .. } | AppError::Malformed(_) => FALLBACK_MESSAGE.to_string(),
            AppError::Http(e) if e.is_timeout() => "Request timed out".to_string(),
            AppError::Http(e) if e.is_connect() => "Could not reach the server".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_prefers_server_message() {
        let e = AppError::Api {
            status: 400,
            message: Some("Trip tidak ditemukan".into()),
        };
        assert_eq!(e.user_message(), "Trip tidak ditemukan");
        assert!(e.to_string().contains("400"));
    }

    #[test]
    fn api_error_without_message_falls_back() {
        let e = AppError::Api { status: 500, message: None };
        assert_eq!(e.user_message(), FALLBACK_MESSAGE);
        let blank = AppError::Api {
            status: 502,
            message: Some("   ".into()),
        };
        assert_eq!(blank.user_message(), FALLBACK_MESSAGE);
    }

    #[test]
    fn malformed_payload_uses_fallback() {
        let e = AppError::Malformed("missing data.open_trip".into());
        assert_eq!(e.user_message(), FALLBACK_MESSAGE);
    }

    #[test]
    fn local_errors_show_their_own_text() {
        assert!(AppError::NotLoggedIn.user_message().contains("gapakerem login"));
        let e = AppError::InvalidPeriod("month 13".into());
        assert_eq!(e.user_message(), "Invalid report period: month 13");
    }
}
