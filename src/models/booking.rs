use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub status: BookingStatus,
    pub item: BookedItem,
    pub booker: Booker,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub item_id: i64,
    #[serde(deserialize_with = "local_datetime")]
    pub start: NaiveDateTime,
    #[serde(deserialize_with = "local_datetime")]
    pub end: NaiveDateTime,
}

/// ISO-8601 local date-time; seconds and fractions are optional.
fn local_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M"))
        .map_err(|_| de::Error::custom(format!("invalid local date-time: {raw}")))
}

/// The slice of an item a booking needs: enough to render it and to find its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedItem {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub owner_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Booker {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Waiting,
    Approved,
    Rejected,
    Canceled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Waiting => "WAITING",
            BookingStatus::Approved => "APPROVED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::Canceled => "CANCELED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "WAITING" => Some(BookingStatus::Waiting),
            "APPROVED" => Some(BookingStatus::Approved),
            "REJECTED" => Some(BookingStatus::Rejected),
            "CANCELED" => Some(BookingStatus::Canceled),
            _ => None,
        }
    }

    /// WAITING is the only status a booking can leave.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Waiting)
    }

    pub fn decided(approved: bool) -> Self {
        if approved {
            BookingStatus::Approved
        } else {
            BookingStatus::Rejected
        }
    }
}

/// Filter buckets accepted by the booking list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingState {
    All,
    Current,
    Past,
    Future,
    Waiting,
    Rejected,
}

impl BookingState {
    pub const VARIANTS: [BookingState; 6] = [
        BookingState::All,
        BookingState::Current,
        BookingState::Past,
        BookingState::Future,
        BookingState::Waiting,
        BookingState::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingState::All => "ALL",
            BookingState::Current => "CURRENT",
            BookingState::Past => "PAST",
            BookingState::Future => "FUTURE",
            BookingState::Waiting => "WAITING",
            BookingState::Rejected => "REJECTED",
        }
    }
}

impl FromStr for BookingState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingState::VARIANTS
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| AppError::UnsupportedState(s.to_string()))
    }
}

/// Which side of a booking a list query is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingRole {
    Owner,
    Booker,
}
