use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A candidate reservable interval for one pitch. Never persisted; the slot
/// grid is recomputed from the pitch configuration on every availability read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub available: bool,
    pub price: f64,
}
