//! 🏥 The clinic's token desk.
//!
//! Patients book numbered tokens for a date, limited per day and, for the
//! current day, to the hours before the consultation session starts. An
//! administrator can list bookings and close the current day.
//!
//! The components are the [calendar] of per-date state, the booking
//! [service], the administrator [sessions], and the [desk] answering
//! requests.

#![allow(rustdoc::private_intra_doc_links)]
use std::sync::Arc;

use clinic_token_core::Config;

pub mod calendar;
pub mod clock;
mod desk;
mod error;
pub mod service;
pub mod sessions;

pub use clock::{Clock, ManualClock, SystemClock};
pub use desk::Desk;
pub use error::BookingError;
pub use service::{BookingService, TokenGrant};
pub use sessions::{hash_password, AdminSessions};

/// Entrypoint of the token desk, reading time from the system clock
pub fn launch(config: &Config) -> Desk {
    launch_with_clock(config, Arc::new(SystemClock))
}

/// Entrypoint of the token desk, reading time from `clock`
pub fn launch_with_clock(config: &Config, clock: Arc<dyn Clock>) -> Desk {
    let service = BookingService::new(config, clock.clone());
    let sessions = AdminSessions::new(config, clock);
    Desk::new(service, sessions, config.close_requires_admin)
}
