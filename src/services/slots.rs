use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::models::TimeSlot;

/// Generate the candidate slot grid for one pitch on one day.
///
/// The cursor starts at the opening hour; each slot lasts `match_duration`
/// minutes and the cursor then advances by `match_duration + buffer_minutes`,
/// so consecutive slots are separated by exactly the buffer. A slot whose end
/// would pass the closing hour is dropped, never truncated.
///
/// Football at 90min + 15min buffer and padel at 60min + 15min buffer produce
/// different grids from the same opening hours.
pub fn generate_time_slots(
    date: NaiveDate,
    opening_hour: u32,
    closing_hour: u32,
    match_duration: i64,
    price_per_hour: f64,
    buffer_minutes: i64,
) -> Vec<TimeSlot> {
    let mut slots = vec![];

    let Some(mut cursor) = date.and_hms_opt(opening_hour, 0, 0) else {
        return slots;
    };
    let Some(end_of_day) = date.and_hms_opt(closing_hour, 0, 0) else {
        return slots;
    };

    let price = (price_per_hour * match_duration as f64 / 60.0).round();

    while cursor < end_of_day {
        let slot_end = cursor + Duration::minutes(match_duration);

        if slot_end <= end_of_day {
            slots.push(TimeSlot {
                start: cursor,
                end: slot_end,
                available: true,
                price,
            });
        }

        cursor += Duration::minutes(match_duration + buffer_minutes);
    }

    slots
}

/// Pure interval-overlap test with buffer extension.
///
/// Each existing booking's end is extended by `buffer_minutes`; the candidate
/// conflicts when its start falls inside `[start, extended_end)`, its end
/// falls inside `(start, extended_end]`, or it fully contains the extended
/// interval. A candidate starting exactly at the extended end is free.
pub fn slot_conflicts(
    slot_start: NaiveDateTime,
    slot_end: NaiveDateTime,
    existing: &[(NaiveDateTime, NaiveDateTime)],
    buffer_minutes: i64,
) -> bool {
    existing.iter().any(|&(booking_start, booking_end)| {
        let extended_end = booking_end + Duration::minutes(buffer_minutes);

        (slot_start >= booking_start && slot_start < extended_end)
            || (slot_end > booking_start && slot_end <= extended_end)
            || (slot_start <= booking_start && slot_end >= extended_end)
    })
}
