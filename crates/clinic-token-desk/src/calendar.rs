//! Per-date availability and bookings

use std::sync::Arc;

use chrono::NaiveDate;
use clinic_token_core::api::{BookingRecord, BookingStatus};
use dashmap::DashMap;
use parking_lot::Mutex;

/// A token handed out to a patient
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Booking {
    pub name: String,
    pub phone: String,
    pub token: u32,
    pub status: BookingStatus,
    /// Time of day of the booking, `HH:MM`
    pub booked_at: String,
}

impl From<Booking> for BookingRecord {
    fn from(b: Booking) -> Self {
        BookingRecord {
            name: b.name,
            phone: b.phone,
            token: b.token,
            status: b.status,
            booked_at: b.booked_at,
        }
    }
}

/// Whether a date accepts bookings and how many tokens it has handed out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayAvailability {
    pub available: bool,
    pub booked_count: u32,
}

impl Default for DayAvailability {
    fn default() -> Self {
        Self {
            available: true,
            booked_count: 0,
        }
    }
}

/// State of a single date
///
/// Always accessed under the date's lock.
#[derive(Debug, Default)]
pub struct Day {
    availability: DayAvailability,
    /// Bookings in token order
    bookings: Vec<Booking>,
}

impl Day {
    pub fn availability(&self) -> DayAvailability {
        self.availability
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    /// Append a confirmed booking and return its token
    pub fn push(&mut self, name: &str, phone: &str, booked_at: String) -> u32 {
        self.availability.booked_count += 1;
        let token = self.availability.booked_count;
        self.bookings.push(Booking {
            name: name.into(),
            phone: phone.into(),
            token,
            status: BookingStatus::Confirmed,
            booked_at,
        });
        token
    }

    /// Stop accepting bookings and cancel all existing ones
    ///
    /// Returns the number of bookings that were still confirmed.
    pub fn close(&mut self, reset_count: bool) -> usize {
        self.availability.available = false;
        if reset_count {
            self.availability.booked_count = 0;
        }
        let mut cancelled = 0;
        for booking in &mut self.bookings {
            if booking.status == BookingStatus::Confirmed {
                booking.status = BookingStatus::Cancelled;
                cancelled += 1;
            }
        }
        cancelled
    }
}

/// All dates known to the booking service
#[derive(Debug, Default)]
pub struct Calendar {
    days: DashMap<NaiveDate, Arc<Mutex<Day>>>,
    /// Dates in the order they received their first booking
    ///
    /// Only locked on its own or while holding a single day's lock.
    booked_dates: Mutex<Vec<NaiveDate>>,
}

impl Calendar {
    /// Create an empty [`Calendar`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the state of `date`, creating it on first reference
    pub fn day(&self, date: NaiveDate) -> Arc<Mutex<Day>> {
        // Clone the `Arc` so the map's shard lock is released before the
        // caller blocks on the day's lock.
        self.days
            .entry(date)
            .or_insert_with(|| Arc::new(Mutex::new(Day::default())))
            .value()
            .clone()
    }

    /// Get the state of `date` if it has been referenced before
    pub fn peek(&self, date: NaiveDate) -> Option<Arc<Mutex<Day>>> {
        self.days.get(&date).map(|day| day.value().clone())
    }

    /// Remember that `date` received its first booking
    pub fn record_first_booking(&self, date: NaiveDate) {
        self.booked_dates.lock().push(date);
    }

    /// Dates that have bookings, in the order of their first booking
    pub fn booked_dates(&self) -> Vec<NaiveDate> {
        self.booked_dates.lock().clone()
    }
}
