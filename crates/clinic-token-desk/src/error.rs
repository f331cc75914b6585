use thiserror::Error;

/// Reasons for rejecting a booking
///
/// Rejections never modify any state.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Invalid phone number")]
    InvalidPhone,
    #[error("Invalid date")]
    InvalidDate,
    #[error("Cannot book past dates")]
    PastDate,
    #[error("Booking window closed")]
    WindowClosed,
    #[error("Bookings closed for this date")]
    DateClosed,
    #[error("Tokens full")]
    CapacityFull,
}

impl BookingError {
    /// Short machine-readable name of the rejection
    pub fn tag(&self) -> &'static str {
        match self {
            BookingError::MissingFields => "missing-fields",
            BookingError::InvalidPhone => "invalid-phone",
            BookingError::InvalidDate => "invalid-date",
            BookingError::PastDate => "past-date",
            BookingError::WindowClosed => "window-closed",
            BookingError::DateClosed => "date-closed",
            BookingError::CapacityFull => "capacity-full",
        }
    }
}
