use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::models::{Pitch, PitchStatus};
use crate::state::AppState;

// POST /api/pitches/:id/settings
#[derive(Deserialize)]
pub struct UpdatePitchRequest {
    pub opening_hour: Option<u32>,
    pub closing_hour: Option<u32>,
    pub match_duration: Option<i64>,
    pub price_per_hour: Option<f64>,
    pub sport_type_id: Option<String>,
    pub status: Option<String>,
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdatePitchRequest>,
) -> Result<Json<Pitch>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let mut pitch =
        queries::get_pitch(&db, &id)?.ok_or_else(|| AppError::NotFound(format!("pitch {id}")))?;

    if let Some(hour) = body.opening_hour {
        pitch.opening_hour = hour;
    }
    if let Some(hour) = body.closing_hour {
        pitch.closing_hour = hour;
    }
    if let Some(duration) = body.match_duration {
        if duration <= 0 {
            return Err(AppError::InvalidInput("match_duration must be positive".to_string()));
        }
        pitch.match_duration = duration;
    }
    if let Some(price) = body.price_per_hour {
        pitch.price_per_hour = price;
    }
    if let Some(sport_type_id) = body.sport_type_id {
        if queries::get_sport_type(&db, &sport_type_id)?.is_none() {
            return Err(AppError::NotFound(format!("sport type {sport_type_id}")));
        }
        pitch.sport_type_id = Some(sport_type_id);
    }
    if let Some(status) = body.status {
        pitch.status = PitchStatus::parse(&status);
    }

    if pitch.closing_hour <= pitch.opening_hour || pitch.closing_hour > 23 {
        return Err(AppError::InvalidInput(
            "closing_hour must be after opening_hour and at most 23".to_string(),
        ));
    }

    queries::save_pitch(&db, &pitch)?;
    Ok(Json(pitch))
}
