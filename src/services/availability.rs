use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{PitchStatus, SportType, TimeSlot};
use crate::services::slots;

/// Annotated slot grid for a pitch on one day.
///
/// Pitches under maintenance or closed return no slots. A failed day-range
/// query degrades to an empty list with a log line so the availability view
/// never takes the caller down with it; a missing pitch is still an error
/// because the caller asked for something that does not exist.
pub fn available_slots(
    conn: &Connection,
    pitch_id: &str,
    date: NaiveDate,
) -> Result<Vec<TimeSlot>, AppError> {
    let pitch = queries::get_pitch(conn, pitch_id)?
        .ok_or_else(|| AppError::NotFound(format!("pitch {pitch_id}")))?;

    if pitch.status != PitchStatus::Active {
        return Ok(vec![]);
    }

    let sport_type = load_sport_type(conn, pitch.sport_type_id.as_deref());
    let (match_duration, buffer_minutes) = pitch.slot_config(sport_type.as_ref());

    let mut grid = slots::generate_time_slots(
        date,
        pitch.opening_hour,
        pitch.closing_hour,
        match_duration,
        pitch.price_per_hour,
        buffer_minutes,
    );

    let day_start = match date.and_hms_opt(0, 0, 0) {
        Some(dt) => dt,
        None => return Ok(vec![]),
    };
    let day_end = match date.and_hms_opt(23, 59, 59) {
        Some(dt) => dt,
        None => return Ok(vec![]),
    };

    let bookings =
        match queries::get_overlapping_bookings(conn, pitch_id, &day_start, &day_end, None) {
            Ok(bookings) => bookings,
            Err(e) => {
                tracing::warn!(pitch_id, %e, "day-range booking query failed, degrading to empty availability");
                return Ok(vec![]);
            }
        };

    let intervals: Vec<_> = bookings.iter().map(|b| (b.start_time, b.end_time)).collect();

    for slot in &mut grid {
        slot.available = !slots::slot_conflicts(slot.start, slot.end, &intervals, buffer_minutes);
    }

    Ok(grid)
}

fn load_sport_type(conn: &Connection, id: Option<&str>) -> Option<SportType> {
    let id = id?;
    match queries::get_sport_type(conn, id) {
        Ok(st) => st,
        Err(e) => {
            tracing::warn!(sport_type_id = id, %e, "sport type lookup failed, using pitch defaults");
            None
        }
    }
}
