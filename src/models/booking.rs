use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub pitch_id: String,
    pub user_id: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub total_price: f64,
    pub status: BookingStatus,
    pub access_code: String,
    /// Proposed time/price change awaiting owner sign-off. Present or absent
    /// as a whole; canonical fields stay untouched until approval.
    pub staged: Option<StagedModification>,
    pub modification_status: Option<ModificationStatus>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StagedModification {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub total_price: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    CancelRequest,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::CancelRequest => "cancel_request",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "approved" => Some(BookingStatus::Approved),
            "rejected" => Some(BookingStatus::Rejected),
            "cancelled" => Some(BookingStatus::Cancelled),
            "cancel_request" => Some(BookingStatus::CancelRequest),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Rejected | BookingStatus::Cancelled)
    }

    /// Transition table for the booking lifecycle. Every status-changing
    /// entry point goes through this; `rejected` and `cancelled` accept
    /// nothing further.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (*self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, CancelRequest)
                | (Approved, Cancelled)
                | (CancelRequest, Cancelled)
                | (CancelRequest, Approved)
        )
    }

    /// Legacy rows were written with an empty status. An access code means
    /// the owner had already approved; without one the request never got a
    /// decision.
    pub fn heal_legacy(raw: &str, access_code: &str) -> Self {
        match Self::parse(raw) {
            Some(status) => status,
            None if !access_code.is_empty() => BookingStatus::Approved,
            None => BookingStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ModificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModificationStatus::Pending => "pending",
            ModificationStatus::Approved => "approved",
            ModificationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ModificationStatus::Pending),
            "approved" => Some(ModificationStatus::Approved),
            "rejected" => Some(ModificationStatus::Rejected),
            _ => None,
        }
    }
}
