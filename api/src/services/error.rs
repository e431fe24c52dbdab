//! Error handling utilities for route handlers

use axum::http::StatusCode;

/// Log a failed operation and turn it into the response status
pub trait LogErr<T> {
    /// Logged at error level, answered with 500
    fn log_500(self, context: &str) -> Result<T, StatusCode>;

    /// Server errors log at error level, client errors at warn
    fn log_status(self, context: &str, status: StatusCode) -> Result<T, StatusCode>;
}

impl<T, E: std::fmt::Display> LogErr<T> for Result<T, E> {
    fn log_500(self, context: &str) -> Result<T, StatusCode> {
        self.log_status(context, StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn log_status(self, context: &str, status: StatusCode) -> Result<T, StatusCode> {
        self.map_err(|e| {
            if status.is_server_error() {
                tracing::error!(error = %e, status = status.as_u16(), "{}", context);
            } else {
                tracing::warn!(error = %e, status = status.as_u16(), "{}", context);
            }
            status
        })
    }
}

/// `None` from a lookup becomes 404
pub trait OrNotFound<T> {
    fn or_404(self) -> Result<T, StatusCode>;
}

impl<T> OrNotFound<T> for Option<T> {
    fn or_404(self) -> Result<T, StatusCode> {
        self.ok_or(StatusCode::NOT_FOUND)
    }
}
