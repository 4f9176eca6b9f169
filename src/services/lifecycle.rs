use chrono::{Duration, NaiveDateTime, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, ModificationStatus, StagedModification};
use crate::services::slots;

/// Opaque token handed to the user at creation, checked at the venue gate.
fn generate_access_code() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_uppercase()
}

fn resolve_buffer(conn: &Connection, pitch_id: &str) -> Result<i64, AppError> {
    let pitch = queries::get_pitch(conn, pitch_id)?
        .ok_or_else(|| AppError::NotFound(format!("pitch {pitch_id}")))?;

    let sport_type = match pitch.sport_type_id.as_deref() {
        Some(id) => queries::get_sport_type(conn, id)?,
        None => None,
    };
    let (_, buffer_minutes) = pitch.slot_config(sport_type.as_ref());
    Ok(buffer_minutes)
}

/// Conflict check against every pending/approved booking whose interval
/// touches the buffer-expanded window around the requested slot.
fn check_window(
    conn: &Connection,
    pitch_id: &str,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    buffer_minutes: i64,
    exclude_id: Option<&str>,
) -> Result<(), AppError> {
    let window_start = *start - Duration::minutes(buffer_minutes);
    let window_end = *end + Duration::minutes(buffer_minutes);

    let bookings =
        queries::get_overlapping_bookings(conn, pitch_id, &window_start, &window_end, exclude_id)?;
    let intervals: Vec<_> = bookings.iter().map(|b| (b.start_time, b.end_time)).collect();

    if slots::slot_conflicts(*start, *end, &intervals, buffer_minutes) {
        return Err(AppError::Conflict { buffer_minutes });
    }
    Ok(())
}

/// Create a booking request in `pending` with a fresh access code.
///
/// The availability grid the user picked from may be stale, so the conflict
/// check runs again here, inside one transaction with the insert. The
/// connection is behind a process-wide lock and the transaction makes the
/// read-check-write a single unit, so two racing creates for the same slot
/// cannot both commit through this path.
pub fn create_booking_request(
    conn: &Connection,
    pitch_id: &str,
    user_id: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    total_price: f64,
) -> Result<Booking, AppError> {
    if end <= start {
        return Err(AppError::InvalidInput("end_time must be after start_time".to_string()));
    }

    let tx = conn.unchecked_transaction()?;

    let buffer_minutes = resolve_buffer(&tx, pitch_id)?;
    check_window(&tx, pitch_id, &start, &end, buffer_minutes, None)?;

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        pitch_id: pitch_id.to_string(),
        user_id: user_id.to_string(),
        start_time: start,
        end_time: end,
        total_price,
        status: BookingStatus::Pending,
        access_code: generate_access_code(),
        staged: None,
        modification_status: None,
        created_at: now,
        updated_at: now,
    };

    queries::insert_booking(&tx, &booking)?;
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        pitch_id,
        start = %start,
        "booking request created"
    );
    Ok(booking)
}

fn load_booking(conn: &Connection, id: &str) -> Result<Booking, AppError> {
    queries::get_booking(conn, id)?.ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

/// Owner decision on a booking. The target value is restricted to
/// approved/rejected/cancelled and the transition must be legal from the
/// booking's current state.
pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> Result<Booking, AppError> {
    if !matches!(
        status,
        BookingStatus::Approved | BookingStatus::Rejected | BookingStatus::Cancelled
    ) {
        return Err(AppError::InvalidInput(format!(
            "cannot set status to {} directly",
            status.as_str()
        )));
    }

    let booking = load_booking(conn, id)?;
    if !booking.status.can_transition_to(status) {
        return Err(AppError::InvalidTransition { from: booking.status, to: status });
    }

    queries::update_booking_status(conn, id, status)?;
    tracing::info!(booking_id = id, status = status.as_str(), "booking status updated");
    load_booking(conn, id)
}

/// Administrative override: force `cancelled` regardless of current state.
pub fn cancel_booking(conn: &Connection, id: &str) -> Result<Booking, AppError> {
    let booking = load_booking(conn, id)?;
    queries::update_booking_status(conn, id, BookingStatus::Cancelled)?;
    tracing::info!(booking_id = %booking.id, "booking force-cancelled");
    load_booking(conn, id)
}

/// User asks to cancel an approved booking; the owner resolves the request
/// to cancelled or back to approved.
pub fn request_cancellation(conn: &Connection, id: &str) -> Result<Booking, AppError> {
    let booking = load_booking(conn, id)?;
    if !booking.status.can_transition_to(BookingStatus::CancelRequest) {
        return Err(AppError::InvalidTransition {
            from: booking.status,
            to: BookingStatus::CancelRequest,
        });
    }

    queries::update_booking_status(conn, id, BookingStatus::CancelRequest)?;
    load_booking(conn, id)
}

/// Move or re-price a booking.
///
/// The new slot is validated against every other booking in the
/// buffer-expanded window; the booking's own record is excluded so a booking
/// can always keep (or shrink within) its current interval. A pending booking
/// has nothing approved to protect and mutates in place; any other state
/// stages the proposal for owner sign-off without touching canonical fields.
pub fn modify_booking(
    conn: &Connection,
    id: &str,
    new_start: NaiveDateTime,
    new_end: NaiveDateTime,
    new_price: f64,
) -> Result<Booking, AppError> {
    if new_end <= new_start {
        return Err(AppError::InvalidInput("end_time must be after start_time".to_string()));
    }

    let tx = conn.unchecked_transaction()?;

    let booking = load_booking(&tx, id)?;
    if booking.status.is_terminal() {
        return Err(AppError::InvalidInput(format!(
            "cannot modify a {} booking",
            booking.status.as_str()
        )));
    }

    let buffer_minutes = resolve_buffer(&tx, &booking.pitch_id)?;
    check_window(&tx, &booking.pitch_id, &new_start, &new_end, buffer_minutes, Some(id))?;

    if booking.status == BookingStatus::Pending {
        queries::update_booking_times(&tx, id, &new_start, &new_end, new_price)?;
    } else {
        let staged = StagedModification {
            start_time: new_start,
            end_time: new_end,
            total_price: new_price,
        };
        queries::stage_modification(&tx, id, &staged)?;
    }

    let updated = load_booking(&tx, id)?;
    tx.commit()?;

    tracing::info!(
        booking_id = id,
        staged = updated.staged.is_some(),
        "booking modification recorded"
    );
    Ok(updated)
}

/// Owner accepts a staged modification: staged fields become canonical and
/// the proposal is cleared in the same statement.
pub fn approve_modification(conn: &Connection, id: &str) -> Result<Booking, AppError> {
    let booking = load_booking(conn, id)?;
    if booking.staged.is_none() {
        return Err(AppError::InvalidInput(format!(
            "booking {id} has no pending modification"
        )));
    }

    queries::apply_staged_modification(conn, id)?;
    tracing::info!(booking_id = id, "modification approved");
    load_booking(conn, id)
}

/// Owner declines a staged modification: the proposal is dropped and the
/// canonical fields stay as they were.
pub fn reject_modification(conn: &Connection, id: &str) -> Result<Booking, AppError> {
    let booking = load_booking(conn, id)?;
    if booking.staged.is_none() {
        return Err(AppError::InvalidInput(format!(
            "booking {id} has no pending modification"
        )));
    }

    queries::clear_staged_modification(conn, id, ModificationStatus::Rejected)?;
    tracing::info!(booking_id = id, "modification rejected");
    load_booking(conn, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Pitch, PitchStatus, SportType};

    fn setup() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        queries::save_pitch(
            &conn,
            &Pitch {
                id: "p1".to_string(),
                complex_id: "c1".to_string(),
                name: "Pitch 1".to_string(),
                opening_hour: 8,
                closing_hour: 23,
                price_per_hour: 60.0,
                match_duration: 90,
                sport_type_id: None,
                status: PitchStatus::Active,
            },
        )
        .unwrap();
        conn
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn create(conn: &Connection, start: &str, end: &str) -> Booking {
        create_booking_request(conn, "p1", "u1", dt(start), dt(end), 90.0).unwrap()
    }

    #[test]
    fn test_create_starts_pending_with_access_code() {
        let conn = setup();
        let booking = create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.access_code.len(), 6);
        assert!(booking.staged.is_none());
    }

    #[test]
    fn test_create_rejects_conflicting_slot() {
        let conn = setup();
        create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");

        // Starts inside the previous booking's buffer window.
        let err = create_booking_request(
            &conn,
            "p1",
            "u2",
            dt("2025-06-16 11:30"),
            dt("2025-06-16 13:00"),
            90.0,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict { buffer_minutes: 15 }));
        assert!(err.to_string().contains("15-minute buffer"));
    }

    #[test]
    fn test_create_allows_slot_past_buffer() {
        let conn = setup();
        create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");
        let booking = create(&conn, "2025-06-16 11:45", "2025-06-16 13:15");
        assert_eq!(booking.status, BookingStatus::Pending);
    }

    #[test]
    fn test_create_ignores_cancelled_and_rejected() {
        let conn = setup();
        let first = create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");
        cancel_booking(&conn, &first.id).unwrap();

        // Same slot again: the cancelled booking no longer blocks it.
        let second = create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");
        update_booking_status(&conn, &second.id, BookingStatus::Rejected).unwrap();

        // Nor does the rejected one.
        create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");
    }

    #[test]
    fn test_create_rejects_inverted_interval() {
        let conn = setup();
        let err = create_booking_request(
            &conn,
            "p1",
            "u1",
            dt("2025-06-16 11:30"),
            dt("2025-06-16 10:00"),
            90.0,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_create_unknown_pitch() {
        let conn = setup();
        let err = create_booking_request(
            &conn,
            "ghost",
            "u1",
            dt("2025-06-16 10:00"),
            dt("2025-06-16 11:30"),
            90.0,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_sport_type_buffer_used_for_conflict_check() {
        let conn = setup();
        queries::save_sport_type(
            &conn,
            &SportType {
                id: "football".to_string(),
                name: "Football".to_string(),
                match_duration: 90,
                buffer_minutes: 30,
            },
        )
        .unwrap();
        queries::save_pitch(
            &conn,
            &Pitch {
                id: "p2".to_string(),
                complex_id: "c1".to_string(),
                name: "Pitch 2".to_string(),
                opening_hour: 8,
                closing_hour: 23,
                price_per_hour: 60.0,
                match_duration: 90,
                sport_type_id: Some("football".to_string()),
                status: PitchStatus::Active,
            },
        )
        .unwrap();

        create_booking_request(&conn, "p2", "u1", dt("2025-06-16 10:00"), dt("2025-06-16 11:30"), 90.0)
            .unwrap();

        // 11:45 clears a 15-minute buffer but not the sport type's 30.
        let err = create_booking_request(
            &conn,
            "p2",
            "u2",
            dt("2025-06-16 11:45"),
            dt("2025-06-16 13:15"),
            90.0,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict { buffer_minutes: 30 }));
    }

    #[test]
    fn test_status_lifecycle_happy_path() {
        let conn = setup();
        let booking = create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");

        let booking = update_booking_status(&conn, &booking.id, BookingStatus::Approved).unwrap();
        assert_eq!(booking.status, BookingStatus::Approved);

        let booking = request_cancellation(&conn, &booking.id).unwrap();
        assert_eq!(booking.status, BookingStatus::CancelRequest);

        let booking = update_booking_status(&conn, &booking.id, BookingStatus::Cancelled).unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }

    #[test]
    fn test_cancel_request_can_revert_to_approved() {
        let conn = setup();
        let booking = create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");
        update_booking_status(&conn, &booking.id, BookingStatus::Approved).unwrap();
        request_cancellation(&conn, &booking.id).unwrap();

        let booking = update_booking_status(&conn, &booking.id, BookingStatus::Approved).unwrap();
        assert_eq!(booking.status, BookingStatus::Approved);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let conn = setup();
        let booking = create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");

        // pending -> cancelled is not in the table.
        let err = update_booking_status(&conn, &booking.id, BookingStatus::Cancelled).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        // Terminal states accept nothing.
        update_booking_status(&conn, &booking.id, BookingStatus::Rejected).unwrap();
        let err = update_booking_status(&conn, &booking.id, BookingStatus::Approved).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn test_request_cancellation_requires_approved() {
        let conn = setup();
        let booking = create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");
        let err = request_cancellation(&conn, &booking.id).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn test_admin_cancel_overrides_state() {
        let conn = setup();
        let booking = create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");
        // Even from pending, the administrative path forces cancelled.
        let booking = cancel_booking(&conn, &booking.id).unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }

    #[test]
    fn test_modify_pending_mutates_in_place() {
        let conn = setup();
        let booking = create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");

        let updated = modify_booking(
            &conn,
            &booking.id,
            dt("2025-06-16 14:00"),
            dt("2025-06-16 15:30"),
            95.0,
        )
        .unwrap();

        assert_eq!(updated.start_time, dt("2025-06-16 14:00"));
        assert_eq!(updated.end_time, dt("2025-06-16 15:30"));
        assert_eq!(updated.total_price, 95.0);
        assert!(updated.staged.is_none());
        assert!(updated.modification_status.is_none());
    }

    #[test]
    fn test_modify_approved_stages_proposal() {
        let conn = setup();
        let booking = create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");
        update_booking_status(&conn, &booking.id, BookingStatus::Approved).unwrap();

        let updated = modify_booking(
            &conn,
            &booking.id,
            dt("2025-06-16 14:00"),
            dt("2025-06-16 15:30"),
            95.0,
        )
        .unwrap();

        // Canonical fields untouched until the owner signs off.
        assert_eq!(updated.start_time, dt("2025-06-16 10:00"));
        assert_eq!(updated.total_price, 90.0);
        assert_eq!(updated.modification_status, Some(ModificationStatus::Pending));
        let staged = updated.staged.unwrap();
        assert_eq!(staged.start_time, dt("2025-06-16 14:00"));
        assert_eq!(staged.total_price, 95.0);
    }

    #[test]
    fn test_modify_excludes_own_record() {
        let conn = setup();
        let booking = create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");

        // Moving 15 minutes later overlaps the booking's own old interval,
        // which must not count against it.
        let updated = modify_booking(
            &conn,
            &booking.id,
            dt("2025-06-16 10:15"),
            dt("2025-06-16 11:45"),
            90.0,
        )
        .unwrap();
        assert_eq!(updated.start_time, dt("2025-06-16 10:15"));
    }

    #[test]
    fn test_modify_conflicts_with_other_booking() {
        let conn = setup();
        create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");
        let second = create(&conn, "2025-06-16 14:00", "2025-06-16 15:30");

        let err = modify_booking(
            &conn,
            &second.id,
            dt("2025-06-16 10:30"),
            dt("2025-06-16 12:00"),
            90.0,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[test]
    fn test_approve_modification_promotes_staged() {
        let conn = setup();
        let booking = create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");
        update_booking_status(&conn, &booking.id, BookingStatus::Approved).unwrap();
        modify_booking(&conn, &booking.id, dt("2025-06-16 14:00"), dt("2025-06-16 15:30"), 95.0)
            .unwrap();

        let booking = approve_modification(&conn, &booking.id).unwrap();
        assert_eq!(booking.start_time, dt("2025-06-16 14:00"));
        assert_eq!(booking.end_time, dt("2025-06-16 15:30"));
        assert_eq!(booking.total_price, 95.0);
        assert!(booking.staged.is_none());
        assert_eq!(booking.modification_status, Some(ModificationStatus::Approved));
    }

    #[test]
    fn test_reject_modification_keeps_canonical() {
        let conn = setup();
        let booking = create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");
        update_booking_status(&conn, &booking.id, BookingStatus::Approved).unwrap();
        modify_booking(&conn, &booking.id, dt("2025-06-16 14:00"), dt("2025-06-16 15:30"), 95.0)
            .unwrap();

        let booking = reject_modification(&conn, &booking.id).unwrap();
        assert_eq!(booking.start_time, dt("2025-06-16 10:00"));
        assert_eq!(booking.total_price, 90.0);
        assert!(booking.staged.is_none());
        assert_eq!(booking.modification_status, Some(ModificationStatus::Rejected));
    }

    #[test]
    fn test_modification_decisions_require_staged_change() {
        let conn = setup();
        let booking = create(&conn, "2025-06-16 10:00", "2025-06-16 11:30");
        assert!(approve_modification(&conn, &booking.id).is_err());
        assert!(reject_modification(&conn, &booking.id).is_err());
    }
}
