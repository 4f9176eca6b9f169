pub mod availability;
pub mod bookings;
pub mod complexes;
pub mod health;
pub mod pitches;

use axum::http::HeaderMap;

use crate::errors::AppError;

/// Owner-facing routes carry a bearer token; everything else is fronted by
/// the external auth layer.
pub fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
