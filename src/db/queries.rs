use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Booking, BookingStatus, ModificationStatus, Pitch, PitchStatus, SportType, StagedModification,
};

const TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt(dt: &NaiveDateTime) -> String {
    dt.format(TIME_FMT).to_string()
}

fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Pitches & sport types ──

pub fn get_pitch(conn: &Connection, id: &str) -> anyhow::Result<Option<Pitch>> {
    let result = conn.query_row(
        "SELECT id, complex_id, name, opening_hour, closing_hour, price_per_hour, match_duration, sport_type_id, status
         FROM pitches WHERE id = ?1",
        params![id],
        |row| {
            let status: String = row.get(8)?;
            Ok(Pitch {
                id: row.get(0)?,
                complex_id: row.get(1)?,
                name: row.get(2)?,
                opening_hour: row.get(3)?,
                closing_hour: row.get(4)?,
                price_per_hour: row.get(5)?,
                match_duration: row.get(6)?,
                sport_type_id: row.get(7)?,
                status: PitchStatus::parse(&status),
            })
        },
    );

    match result {
        Ok(pitch) => Ok(Some(pitch)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_sport_type(conn: &Connection, id: &str) -> anyhow::Result<Option<SportType>> {
    let result = conn.query_row(
        "SELECT id, name, match_duration, buffer_minutes FROM sport_types WHERE id = ?1",
        params![id],
        |row| {
            Ok(SportType {
                id: row.get(0)?,
                name: row.get(1)?,
                match_duration: row.get(2)?,
                buffer_minutes: row.get(3)?,
            })
        },
    );

    match result {
        Ok(st) => Ok(Some(st)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_pitch(conn: &Connection, pitch: &Pitch) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO pitches (id, complex_id, name, opening_hour, closing_hour, price_per_hour, match_duration, sport_type_id, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
           complex_id = excluded.complex_id,
           name = excluded.name,
           opening_hour = excluded.opening_hour,
           closing_hour = excluded.closing_hour,
           price_per_hour = excluded.price_per_hour,
           match_duration = excluded.match_duration,
           sport_type_id = excluded.sport_type_id,
           status = excluded.status",
        params![
            pitch.id,
            pitch.complex_id,
            pitch.name,
            pitch.opening_hour,
            pitch.closing_hour,
            pitch.price_per_hour,
            pitch.match_duration,
            pitch.sport_type_id,
            pitch.status.as_str(),
        ],
    )?;
    Ok(())
}

pub fn save_sport_type(conn: &Connection, st: &SportType) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO sport_types (id, name, match_duration, buffer_minutes)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           match_duration = excluded.match_duration,
           buffer_minutes = excluded.buffer_minutes",
        params![st.id, st.name, st.match_duration, st.buffer_minutes],
    )?;
    Ok(())
}

pub fn count_pitches_for_complex(conn: &Connection, complex_id: &str) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pitches WHERE complex_id = ?1",
        params![complex_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, pitch_id, user_id, start_time, end_time, total_price, status, access_code, new_start_time, new_end_time, new_total_price, modification_status, created_at, updated_at";

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let start_time: String = row.get(3)?;
    let end_time: String = row.get(4)?;
    let status: String = row.get(6)?;
    let access_code: String = row.get(7)?;
    let new_start: Option<String> = row.get(8)?;
    let new_end: Option<String> = row.get(9)?;
    let new_price: Option<f64> = row.get(10)?;
    let modification_status: Option<String> = row.get(11)?;
    let created_at: String = row.get(12)?;
    let updated_at: String = row.get(13)?;

    // The staged change is all-or-nothing; a partially written proposal is
    // treated as absent.
    let staged = match (new_start, new_end, new_price) {
        (Some(s), Some(e), Some(p)) => Some(StagedModification {
            start_time: parse_dt(&s),
            end_time: parse_dt(&e),
            total_price: p,
        }),
        _ => None,
    };

    Ok(Booking {
        id: row.get(0)?,
        pitch_id: row.get(1)?,
        user_id: row.get(2)?,
        start_time: parse_dt(&start_time),
        end_time: parse_dt(&end_time),
        total_price: row.get(5)?,
        status: BookingStatus::heal_legacy(&status, &access_code),
        access_code,
        staged,
        modification_status: modification_status.as_deref().and_then(ModificationStatus::parse),
        created_at: parse_dt(&created_at),
        updated_at: parse_dt(&updated_at),
    })
}

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, pitch_id, user_id, start_time, end_time, total_price, status, access_code, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.id,
            booking.pitch_id,
            booking.user_id,
            fmt(&booking.start_time),
            fmt(&booking.end_time),
            booking.total_price,
            booking.status.as_str(),
            booking.access_code,
            fmt(&booking.created_at),
            fmt(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Pending/approved bookings on a pitch whose interval overlaps the window,
/// optionally excluding one booking id (used when revalidating a
/// modification against everything but the booking's own record).
pub fn get_overlapping_bookings(
    conn: &Connection,
    pitch_id: &str,
    window_start: &NaiveDateTime,
    window_end: &NaiveDateTime,
    exclude_id: Option<&str>,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE pitch_id = ?1
           AND start_time < ?3 AND end_time > ?2
           AND status IN ('pending', 'approved')
           AND id != ?4
         ORDER BY start_time ASC"
    ))?;

    let rows = stmt.query_map(
        params![pitch_id, fmt(window_start), fmt(window_end), exclude_id.unwrap_or("")],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let now = fmt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn update_booking_times(
    conn: &Connection,
    id: &str,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    price: f64,
) -> anyhow::Result<bool> {
    let now = fmt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET start_time = ?1, end_time = ?2, total_price = ?3, updated_at = ?4
         WHERE id = ?5",
        params![fmt(start), fmt(end), price, now, id],
    )?;
    Ok(count > 0)
}

pub fn stage_modification(
    conn: &Connection,
    id: &str,
    staged: &StagedModification,
) -> anyhow::Result<bool> {
    let now = fmt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET new_start_time = ?1, new_end_time = ?2, new_total_price = ?3,
           modification_status = 'pending', updated_at = ?4
         WHERE id = ?5",
        params![fmt(&staged.start_time), fmt(&staged.end_time), staged.total_price, now, id],
    )?;
    Ok(count > 0)
}

/// Copy the staged fields into the canonical ones and clear them, in one
/// statement so the two-phase commit cannot half-apply.
pub fn apply_staged_modification(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let now = fmt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET
           start_time = new_start_time,
           end_time = new_end_time,
           total_price = new_total_price,
           new_start_time = NULL, new_end_time = NULL, new_total_price = NULL,
           modification_status = 'approved',
           updated_at = ?1
         WHERE id = ?2 AND new_start_time IS NOT NULL",
        params![now, id],
    )?;
    Ok(count > 0)
}

pub fn clear_staged_modification(
    conn: &Connection,
    id: &str,
    status: ModificationStatus,
) -> anyhow::Result<bool> {
    let now = fmt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET
           new_start_time = NULL, new_end_time = NULL, new_total_price = NULL,
           modification_status = ?1,
           updated_at = ?2
         WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

/// A complex's bookings, newest first. `status` filters exactly, except
/// `approved` also matches legacy empty-status rows; without a filter,
/// cancelled bookings are excluded unless `include_cancelled` is set.
/// Legacy empty statuses are healed in place as they are read.
pub fn get_complex_bookings(
    conn: &Connection,
    complex_id: &str,
    status: Option<BookingStatus>,
    include_cancelled: bool,
) -> anyhow::Result<Vec<Booking>> {
    let base = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE pitch_id IN (SELECT id FROM pitches WHERE complex_id = ?1)"
    );
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status {
        Some(BookingStatus::Approved) => (
            format!("{base} AND status IN ('approved', '') ORDER BY start_time DESC"),
            vec![Box::new(complex_id.to_string()) as Box<dyn rusqlite::types::ToSql>],
        ),
        Some(s) => (
            format!("{base} AND status = ?2 ORDER BY start_time DESC"),
            vec![
                Box::new(complex_id.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(s.as_str().to_string()),
            ],
        ),
        None if include_cancelled => (
            format!("{base} ORDER BY start_time DESC"),
            vec![Box::new(complex_id.to_string()) as Box<dyn rusqlite::types::ToSql>],
        ),
        None => (
            format!("{base} AND status != 'cancelled' ORDER BY start_time DESC"),
            vec![Box::new(complex_id.to_string()) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }

    heal_legacy_statuses(conn, &bookings)?;
    Ok(bookings)
}

/// Write back statuses that `parse_booking_row` coerced from empty. The
/// in-memory rows already carry the healed value.
fn heal_legacy_statuses(conn: &Connection, bookings: &[Booking]) -> anyhow::Result<()> {
    let mut stmt = conn.prepare(
        "UPDATE bookings SET status = ?1 WHERE id = ?2 AND (status IS NULL OR status = '')",
    )?;
    for booking in bookings {
        let fixed = stmt.execute(params![booking.status.as_str(), booking.id])?;
        if fixed > 0 {
            tracing::info!(
                booking_id = %booking.id,
                status = booking.status.as_str(),
                "healed legacy booking status"
            );
        }
    }
    Ok(())
}
