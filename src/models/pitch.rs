use serde::{Deserialize, Serialize};

pub const DEFAULT_BUFFER_MINUTES: i64 = 15;

/// Sport-level slot configuration. When a pitch references a sport type,
/// its duration and buffer override the pitch defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportType {
    pub id: String,
    pub name: String,
    pub match_duration: i64,
    pub buffer_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pitch {
    pub id: String,
    pub complex_id: String,
    pub name: String,
    pub opening_hour: u32,
    pub closing_hour: u32,
    pub price_per_hour: f64,
    pub match_duration: i64,
    pub sport_type_id: Option<String>,
    pub status: PitchStatus,
}

impl Pitch {
    /// Effective (match_duration, buffer_minutes) for this pitch.
    /// The sport type wins when one is attached; otherwise the pitch's own
    /// duration with the default 15-minute buffer.
    pub fn slot_config(&self, sport_type: Option<&SportType>) -> (i64, i64) {
        match (self.sport_type_id.as_deref(), sport_type) {
            (Some(_), Some(st)) => (st.match_duration, st.buffer_minutes),
            _ => (self.match_duration, DEFAULT_BUFFER_MINUTES),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PitchStatus {
    Active,
    Maintenance,
    Closed,
}

impl PitchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PitchStatus::Active => "active",
            PitchStatus::Maintenance => "maintenance",
            PitchStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "maintenance" => PitchStatus::Maintenance,
            "closed" => PitchStatus::Closed,
            _ => PitchStatus::Active,
        }
    }
}
