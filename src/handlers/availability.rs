use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::TimeSlot;
use crate::services::availability;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: String,
}

// GET /api/pitches/:id/slots?date=YYYY-MM-DD
pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Path(pitch_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<TimeSlot>>, AppError> {
    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidInput(format!("invalid date: {}", query.date)))?;

    let db = state.db.lock().unwrap();
    let slots = availability::available_slots(&db, &pitch_id, date)?;
    Ok(Json(slots))
}
