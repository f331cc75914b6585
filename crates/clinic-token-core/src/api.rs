//! JSON payloads exchanged with the web browser

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Payload of a booking request
///
/// Absent fields deserialize as empty strings.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BookForm {
    /// Patient name
    pub name: String,
    /// Patient phone number
    pub phone: String,
    /// Requested date, `YYYY-MM-DD`
    pub date: String,
}

/// Payload of a token lookup
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CheckTokenForm {
    /// Phone number the token was booked with
    pub phone: String,
}

/// Status of a booking
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// The token is valid
    Confirmed,
    /// The day was closed after the token was booked
    Cancelled,
}

/// Reply carrying only an outcome and a message
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusReply {
    /// Whether the request succeeded
    pub success: bool,
    /// Human-readable message
    pub message: String,
}

impl StatusReply {
    /// A successful reply
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// A failed reply
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Reply to a successful booking
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookReply {
    /// Always `true`
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// The assigned token
    pub token: u32,
    /// The booked date
    pub date: NaiveDate,
}

/// Reply to a token lookup
///
/// The booking fields are only present if `found` is set.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenReply {
    /// Always `true`
    pub success: bool,
    /// Whether a booking with the phone number exists
    pub found: bool,
    /// Patient name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Booked date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Token number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<u32>,
    /// Booking status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    /// Time of day the token was booked at, `HH:MM`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booked_at: Option<String>,
}

/// A booking as shown to administrators
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingRecord {
    /// Patient name
    pub name: String,
    /// Patient phone number
    pub phone: String,
    /// Token number
    pub token: u32,
    /// Booking status
    pub status: BookingStatus,
    /// Time of day the token was booked at, `HH:MM`
    pub booked_at: String,
}

/// All bookings of one date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayReport {
    /// The date
    pub date: NaiveDate,
    /// Whether new bookings are accepted
    pub available: bool,
    /// Number of tokens handed out
    pub booked_count: u32,
    /// Bookings in token order
    pub bookings: Vec<BookingRecord>,
}

/// Reply to an administrator's booking listing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingsReply {
    /// Always `true`
    pub success: bool,
    /// The current date
    pub today: NaiveDate,
    /// Dates in the order they received their first booking
    pub days: Vec<DayReport>,
}
