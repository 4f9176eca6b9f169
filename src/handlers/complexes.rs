use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::models::{Booking, BookingStatus};
use crate::services::statistics::{self, ComplexStatistics};
use crate::state::AppState;

// GET /api/complexes/:id/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    #[serde(default)]
    pub include_cancelled: bool,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(complex_id): Path<String>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status = match query.status.as_deref() {
        Some(s) => Some(
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::InvalidInput(format!("unknown status: {s}")))?,
        ),
        None => None,
    };

    let db = state.db.lock().unwrap();
    let bookings =
        queries::get_complex_bookings(&db, &complex_id, status, query.include_cancelled)?;
    Ok(Json(bookings))
}

// GET /api/complexes/:id/stats
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(complex_id): Path<String>,
) -> Result<Json<ComplexStatistics>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let stats = statistics::complex_statistics(&db, &complex_id, Utc::now().naive_utc());
    Ok(Json(stats))
}
