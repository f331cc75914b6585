//! Token allocation and the daily booking window

use std::sync::Arc;

use chrono::NaiveDate;
use clinic_token_core::Config;
use tracing::{debug, info};

use crate::calendar::{Booking, Calendar, DayAvailability};
use crate::clock::Clock;
use crate::error::BookingError;

/// Length of a valid phone number
const PHONE_DIGITS: usize = 10;

/// A successfully booked token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenGrant {
    pub token: u32,
    pub date: NaiveDate,
}

/// Availability and bookings of one date
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DaySnapshot {
    pub date: NaiveDate,
    pub availability: DayAvailability,
    pub bookings: Vec<Booking>,
}

/// The clinic's booking service
pub struct BookingService {
    max_tokens_per_day: u32,
    cutoff: chrono::NaiveTime,
    close_resets_count: bool,
    calendar: Calendar,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    /// Create a new [`BookingService`] without any bookings
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_tokens_per_day: config.max_tokens_per_day,
            cutoff: config.session_start,
            close_resets_count: config.close_resets_count,
            calendar: Calendar::new(),
            clock,
        }
    }

    /// The current local date
    pub fn today(&self) -> NaiveDate {
        self.clock.now().date()
    }

    /// Book the next token of `date` for a patient
    ///
    /// All inputs are trimmed. `date` must be written as `YYYY-MM-DD`.
    pub fn book(&self, name: &str, phone: &str, date: &str) -> Result<TokenGrant, BookingError> {
        let (name, phone, date) = (name.trim(), phone.trim(), date.trim());

        if name.is_empty() || phone.is_empty() || date.is_empty() {
            return Err(BookingError::MissingFields);
        }
        if phone.len() != PHONE_DIGITS || !phone.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BookingError::InvalidPhone);
        }
        let date = parse_date(date).ok_or(BookingError::InvalidDate)?;

        let now = self.clock.now();
        if date < now.date() {
            return Err(BookingError::PastDate);
        }
        if date == now.date() && now.time() >= self.cutoff {
            return Err(BookingError::WindowClosed);
        }

        let day = self.calendar.day(date);
        let mut day = day.lock();
        let availability = day.availability();
        if !availability.available {
            return Err(BookingError::DateClosed);
        }
        if availability.booked_count >= self.max_tokens_per_day {
            return Err(BookingError::CapacityFull);
        }

        let first = day.bookings().is_empty();
        let token = day.push(name, phone, now.format("%H:%M").to_string());
        if first {
            self.calendar.record_first_booking(date);
        }
        info!(%date, token, "token booked");

        Ok(TokenGrant { token, date })
    }

    /// Close today's bookings and cancel every token already handed out
    ///
    /// Returns the number of cancelled bookings.
    pub fn close_today(&self) -> usize {
        let today = self.today();
        let day = self.calendar.day(today);
        let cancelled = day.lock().close(self.close_resets_count);
        info!(date = %today, cancelled, "day closed");
        cancelled
    }

    /// Find the first booking made with `phone`
    ///
    /// Dates are searched in the order they received their first booking,
    /// bookings within a date in token order.
    pub fn check_token(&self, phone: &str) -> Option<(NaiveDate, Booking)> {
        let phone = phone.trim();
        for date in self.calendar.booked_dates() {
            let Some(day) = self.calendar.peek(date) else {
                continue;
            };
            let day = day.lock();
            if let Some(booking) = day.bookings().iter().find(|b| b.phone == phone) {
                return Some((date, booking.clone()));
            }
        }
        debug!("no booking found for phone number");
        None
    }

    /// Availability of `date`
    ///
    /// Dates that were never referenced report the default availability.
    pub fn availability(&self, date: NaiveDate) -> DayAvailability {
        self.calendar
            .peek(date)
            .map(|day| day.lock().availability())
            .unwrap_or_default()
    }

    /// Snapshot of all dates with bookings, in the order of their first
    /// booking
    pub fn bookings(&self) -> Vec<DaySnapshot> {
        self.calendar
            .booked_dates()
            .into_iter()
            .filter_map(|date| {
                let day = self.calendar.peek(date)?;
                let day = day.lock();
                Some(DaySnapshot {
                    date,
                    availability: day.availability(),
                    bookings: day.bookings().to_vec(),
                })
            })
            .collect()
    }
}

/// Parse a fixed-width `YYYY-MM-DD` date
fn parse_date(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    if bytes.len() != "YYYY-MM-DD".len() {
        return None;
    }
    let well_formed = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !well_formed {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
