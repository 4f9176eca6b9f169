use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::models::{Booking, BookingStatus};
use crate::services::{lifecycle, notifications};
use crate::state::AppState;

const TIME_FMT: &str = "%Y-%m-%d %H:%M";

fn parse_time(s: &str) -> Result<NaiveDateTime, AppError> {
    NaiveDateTime::parse_from_str(s, TIME_FMT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| AppError::InvalidInput(format!("invalid time: {s}")))
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub pitch_id: String,
    pub user_id: String,
    pub start_time: String,
    pub end_time: String,
    pub total_price: f64,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let start = parse_time(&body.start_time)?;
    let end = parse_time(&body.end_time)?;

    let booking = {
        let db = state.db.lock().unwrap();
        lifecycle::create_booking_request(
            &db,
            &body.pitch_id,
            &body.user_id,
            start,
            end,
            body.total_price,
        )?
    };

    notifications::notify_booking_event(
        state.notifier.as_ref(),
        &booking,
        "Your booking request was received and is awaiting approval",
    )
    .await;

    Ok(Json(booking))
}

// POST /api/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status = BookingStatus::parse(&body.status)
        .ok_or_else(|| AppError::InvalidInput(format!("unknown status: {}", body.status)))?;

    let booking = {
        let db = state.db.lock().unwrap();
        lifecycle::update_booking_status(&db, &id, status)?
    };

    let message = match booking.status {
        BookingStatus::Approved => "Your booking was approved",
        BookingStatus::Rejected => "Your booking was rejected",
        BookingStatus::Cancelled => "Your booking was cancelled",
        _ => "Your booking status changed",
    };
    notifications::notify_booking_event(state.notifier.as_ref(), &booking, message).await;

    Ok(Json(booking))
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = {
        let db = state.db.lock().unwrap();
        lifecycle::cancel_booking(&db, &id)?
    };

    notifications::notify_booking_event(
        state.notifier.as_ref(),
        &booking,
        "Your booking was cancelled by the venue",
    )
    .await;

    Ok(Json(booking))
}

// POST /api/bookings/:id/cancel-request
pub async fn request_cancellation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        lifecycle::request_cancellation(&db, &id)?
    };
    Ok(Json(booking))
}

// POST /api/bookings/:id/modify
#[derive(Deserialize)]
pub struct ModifyRequest {
    pub start_time: String,
    pub end_time: String,
    pub total_price: f64,
}

pub async fn modify_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ModifyRequest>,
) -> Result<Json<Booking>, AppError> {
    let start = parse_time(&body.start_time)?;
    let end = parse_time(&body.end_time)?;

    let booking = {
        let db = state.db.lock().unwrap();
        lifecycle::modify_booking(&db, &id, start, end, body.total_price)?
    };
    Ok(Json(booking))
}

// POST /api/bookings/:id/modification/approve
pub async fn approve_modification(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = {
        let db = state.db.lock().unwrap();
        lifecycle::approve_modification(&db, &id)?
    };

    notifications::notify_booking_event(
        state.notifier.as_ref(),
        &booking,
        "Your modification request was approved",
    )
    .await;

    Ok(Json(booking))
}

// POST /api/bookings/:id/modification/reject
pub async fn reject_modification(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = {
        let db = state.db.lock().unwrap();
        lifecycle::reject_modification(&db, &id)?
    };

    notifications::notify_booking_event(
        state.notifier.as_ref(),
        &booking,
        "Your modification request was declined",
    )
    .await;

    Ok(Json(booking))
}
