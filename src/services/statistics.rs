use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::models::{Booking, BookingStatus};

/// Coarse denominator for the occupancy heuristic: a flat slots-per-day
/// figure rather than each pitch's actual grid size.
const SLOTS_PER_DAY: i64 = 60;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComplexStatistics {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub cancel_request: i64,
    pub rejected: i64,
    pub total_revenue: f64,
    pub this_month: MonthStatistics,
    pub avg_booking_value: f64,
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthStatistics {
    pub bookings: i64,
    pub revenue: f64,
}

/// Aggregate a complex's non-cancelled bookings. Never fails: a broken read
/// is logged and reported as zeroes so the dashboard still renders.
pub fn complex_statistics(conn: &Connection, complex_id: &str, now: NaiveDateTime) -> ComplexStatistics {
    let bookings = match queries::get_complex_bookings(conn, complex_id, None, false) {
        Ok(bookings) => bookings,
        Err(e) => {
            tracing::warn!(complex_id, %e, "booking query failed, reporting zeroed statistics");
            vec![]
        }
    };
    let pitch_count = queries::count_pitches_for_complex(conn, complex_id).unwrap_or(0);

    aggregate(&bookings, pitch_count, now)
}

fn aggregate(bookings: &[Booking], pitch_count: i64, now: NaiveDateTime) -> ComplexStatistics {
    let count_status =
        |status: BookingStatus| bookings.iter().filter(|b| b.status == status).count() as i64;

    let total_revenue: f64 = bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Approved)
        .map(|b| b.total_price)
        .sum();

    let same_month =
        |dt: &NaiveDateTime| dt.year() == now.year() && dt.month() == now.month();

    let month_bookings = bookings.iter().filter(|b| same_month(&b.start_time)).count() as i64;
    let month_revenue: f64 = bookings
        .iter()
        .filter(|b| same_month(&b.start_time) && b.status == BookingStatus::Approved)
        .map(|b| b.total_price)
        .sum();

    let avg_booking_value = if month_bookings > 0 {
        month_revenue / month_bookings as f64
    } else {
        0.0
    };

    let total_month_slots = pitch_count * days_in_month(now.date()) * SLOTS_PER_DAY;
    let occupancy_rate = if total_month_slots > 0 {
        month_bookings as f64 / total_month_slots as f64 * 100.0
    } else {
        0.0
    };

    ComplexStatistics {
        total: bookings.len() as i64,
        pending: count_status(BookingStatus::Pending),
        approved: count_status(BookingStatus::Approved),
        cancel_request: count_status(BookingStatus::CancelRequest),
        rejected: count_status(BookingStatus::Rejected),
        total_revenue,
        this_month: MonthStatistics { bookings: month_bookings, revenue: month_revenue },
        avg_booking_value,
        occupancy_rate,
    }
}

fn days_in_month(date: NaiveDate) -> i64 {
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1);
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1);
    match (first, first_of_next) {
        (Some(a), Some(b)) => (b - a).num_days(),
        _ => 30,
    }
}
